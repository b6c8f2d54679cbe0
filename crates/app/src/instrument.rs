//! The one wrapper every instrumented command goes through.

use crate::deps::ObservabilityDeps;
use crate::tracking::TrackingOperation;
use std::fmt;
use tracing::warn;

/// Run `call` inside a tracking operation and return its result unchanged.
///
/// The span is current while `call` runs. An `Err` is recorded on the
/// operation before it is finalized. Recording failures are logged and never
/// replace the call's result.
pub fn instrument<T, E, I, P, F>(
    deps: &ObservabilityDeps,
    method: &str,
    payloads: I,
    call: F,
) -> Result<T, E>
where
    E: fmt::Display,
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
    F: FnOnce() -> Result<T, E>,
{
    instrument_with(deps, method, payloads, call, |_: &T| None::<E>)
}

/// Like [`instrument`], but `reply_error` may also classify an `Ok` value as
/// a failure (a client that returns error replies as values).
///
/// Either way the result is returned unchanged.
pub fn instrument_with<T, E, D, I, P, F, R>(
    deps: &ObservabilityDeps,
    method: &str,
    payloads: I,
    call: F,
    reply_error: R,
) -> Result<T, E>
where
    E: fmt::Display,
    D: fmt::Display,
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
    F: FnOnce() -> Result<T, E>,
    R: FnOnce(&T) -> Option<D>,
{
    let mut operation = TrackingOperation::with_deps(method, payloads, deps.clone());
    let scope = operation.with_span();
    let result = call();
    match &result {
        Ok(value) => {
            if let Some(error) = reply_error(value) {
                operation.record_error(&error);
            }
        },
        Err(error) => operation.record_error(error),
    }
    drop(scope);
    if let Err(failure) = operation.end() {
        warn!(method, error = %failure, "recording command measurements failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvscope_domain::{SpanStatus, TagKey, TagValue};
    use kvscope_testkit::errors::{network_timeout, recording_failed_error};
    use kvscope_testkit::in_memory::RecordingBackends;
    use std::io;

    fn deps_for(backends: &RecordingBackends) -> ObservabilityDeps {
        ObservabilityDeps::new(
            backends.stats.clone(),
            backends.tagger.clone(),
            backends.tracer.clone(),
        )
    }

    #[test]
    fn success_value_is_returned_unchanged() {
        let backends = RecordingBackends::new();
        let tracer = backends.tracer.clone();
        let result: Result<i64, io::Error> =
            instrument(&deps_for(&backends), "redis.llen", ["queue"], || {
                assert_eq!(tracer.single_span().active_scopes(), 1);
                Ok(42)
            });

        assert_eq!(result.ok(), Some(42));
        let span = backends.tracer.single_span();
        assert_eq!(span.active_scopes(), 0);
        assert_eq!(span.end_count(), 1);
        let batch = &backends.stats.batches()[0];
        assert_eq!(batch.tags.get(&TagKey::STATUS), Some(&TagValue::OK));
        assert_eq!(backends.stats.byte_samples(), vec![5.0]);
    }

    #[test]
    fn error_is_recorded_and_returned_unchanged() {
        let backends = RecordingBackends::new();
        let result: Result<(), io::Error> = instrument(
            &deps_for(&backends),
            "redis.subscribe",
            ["key1", "key2"],
            || Err(network_timeout()),
        );

        let error = result.err();
        assert_eq!(error.as_ref().map(io::Error::kind), Some(io::ErrorKind::TimedOut));
        assert_eq!(error.map(|error| error.to_string()).as_deref(), Some("network timeout"));

        let batch = &backends.stats.batches()[0];
        assert_eq!(batch.tags.get(&TagKey::STATUS), Some(&TagValue::ERROR));
        assert_eq!(
            batch.tags.get(&TagKey::ERROR),
            Some(&TagValue::sanitize("network timeout"))
        );
        assert_eq!(
            backends.tracer.single_span().last_status(),
            Some(SpanStatus::unknown("network timeout"))
        );
    }

    #[test]
    fn recording_failure_does_not_replace_the_result() {
        let backends = RecordingBackends::with_failing_stats(recording_failed_error());
        let result: Result<&str, io::Error> =
            instrument(&deps_for(&backends), "redis.get", ["k"], || Ok("v"));

        assert_eq!(result.ok(), Some("v"));
        assert_eq!(backends.tracer.single_span().end_count(), 1);
    }

    #[test]
    fn error_values_are_recorded_but_returned_as_values() {
        let backends = RecordingBackends::new();
        let result: Result<Result<i64, String>, io::Error> = instrument_with(
            &deps_for(&backends),
            "redis.llen",
            ["queue"],
            || Ok(Err("WRONGTYPE wrong kind of value".to_owned())),
            |reply| reply.as_ref().err().cloned(),
        );

        assert_eq!(
            result.ok(),
            Some(Err("WRONGTYPE wrong kind of value".to_owned()))
        );
        let batch = &backends.stats.batches()[0];
        assert_eq!(batch.tags.get(&TagKey::STATUS), Some(&TagValue::ERROR));
        assert_eq!(
            batch.tags.get(&TagKey::ERROR),
            Some(&TagValue::sanitize("WRONGTYPE wrong kind of value"))
        );
        assert_eq!(backends.tracer.single_span().end_count(), 1);
    }

    #[test]
    fn each_call_gets_its_own_operation() {
        let backends = RecordingBackends::new();
        let deps = deps_for(&backends);
        for _ in 0..3 {
            let _: Result<(), io::Error> = instrument(&deps, "redis.ping", [""; 0], || Ok(()));
        }

        assert_eq!(backends.tracer.spans().len(), 3);
        assert_eq!(backends.stats.batches().len(), 3);
        assert!(backends.stats.byte_samples().is_empty());
    }
}
