//! Instrumented redis connection.
//!
//! [`TracedConnection`] wraps any [`ConnectionLike`] and implements the same
//! trait, so every `redis::Commands` call, `Cmd::query`, and pipeline issued
//! through it is timed, measured, and traced.

mod commands;
mod resp;

pub use commands::{KeySpec, key_spec};
pub use resp::{DecodedCommand, RespError, decode_command};

use kvscope_app::{ObservabilityDeps, default_deps, instrument, instrument_with};
use redis::{Arg, Cmd, ConnectionLike, RedisError, RedisResult, Value};
use tracing::debug;

/// Method prefix used when none is configured.
pub const DEFAULT_METHOD_PREFIX: &str = "redis";

/// Method suffix for packed input that could not be decoded.
pub const UNKNOWN_COMMAND: &str = "unknown";

/// Method suffix for pipelines and transactions.
pub const PIPELINE_COMMAND: &str = "pipeline";

/// Connection decorator that tracks every command it forwards.
pub struct TracedConnection<C> {
    inner: C,
    deps: ObservabilityDeps,
    prefix: String,
}

impl<C> TracedConnection<C> {
    /// Wrap `inner`, reporting through `deps` under `prefix`.
    pub fn new(inner: C, deps: ObservabilityDeps, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            deps,
            prefix: prefix.into(),
        }
    }

    /// Wrap `inner` with the installed default backends and the `redis` prefix.
    pub fn with_defaults(inner: C) -> Self {
        Self::new(inner, default_deps(), DEFAULT_METHOD_PREFIX)
    }

    /// Method prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Wrapped connection.
    pub const fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Wrapped connection, mutably. Calls made on it are not tracked.
    pub const fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Unwrap the connection.
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn method(&self, command: &[u8]) -> String {
        format!(
            "{}.{}",
            self.prefix,
            String::from_utf8_lossy(command).to_ascii_lowercase()
        )
    }
}

impl<C: ConnectionLike> ConnectionLike for TracedConnection<C> {
    fn req_packed_command(&mut self, cmd: &[u8]) -> RedisResult<Value> {
        let (method, payloads) = match decode_command(cmd) {
            Ok(decoded) => {
                let payloads = key_spec(decoded.name).select(&decoded.args).to_vec();
                (self.method(decoded.name), payloads)
            },
            Err(error) => {
                debug!(error = %error, "packed command not decodable; tracking as unknown");
                (self.method(UNKNOWN_COMMAND.as_bytes()), Vec::new())
            },
        };
        let inner = &mut self.inner;
        instrument_with(
            &self.deps,
            &method,
            payloads,
            || inner.req_packed_command(cmd),
            reply_error,
        )
    }

    fn req_packed_commands(
        &mut self,
        cmd: &[u8],
        offset: usize,
        count: usize,
    ) -> RedisResult<Vec<Value>> {
        let method = self.method(PIPELINE_COMMAND.as_bytes());
        let inner = &mut self.inner;
        instrument_with(
            &self.deps,
            &method,
            Vec::<&[u8]>::new(),
            || inner.req_packed_commands(cmd, offset, count),
            |replies: &Vec<Value>| replies.iter().find_map(reply_error),
        )
    }

    fn req_command(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        let mut parts = cmd.args_iter().filter_map(|arg| match arg {
            Arg::Simple(bytes) => Some(bytes),
            Arg::Cursor => None,
        });
        let name = parts.next().unwrap_or_default();
        let args: Vec<&[u8]> = parts.collect();
        let payloads = key_spec(name).select(&args).to_vec();
        let method = if name.is_empty() {
            self.method(UNKNOWN_COMMAND.as_bytes())
        } else {
            self.method(name)
        };
        let inner = &mut self.inner;
        instrument_with(
            &self.deps,
            &method,
            payloads,
            || inner.req_command(cmd),
            reply_error,
        )
    }

    fn get_db(&self) -> i64 {
        self.inner.get_db()
    }

    fn check_connection(&mut self) -> bool {
        self.inner.check_connection()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// Error replies (`-ERR`, `-WRONGTYPE`, ...) arrive as values and only become
/// `Err` when the caller converts the reply.
fn reply_error(value: &Value) -> Option<RedisError> {
    match value {
        Value::ServerError(error) => Some(RedisError::from(error.clone())),
        _ => None,
    }
}

impl TracedConnection<redis::Connection> {
    /// Subscribe to `channels`, tracking the subscription round trip.
    ///
    /// The returned [`redis::PubSub`] is the client's own; messages read from
    /// it are not tracked.
    pub fn subscribe(&mut self, channels: &[&str]) -> RedisResult<redis::PubSub<'_>> {
        let method = self.method(b"subscribe");
        let connection = &mut self.inner;
        instrument(&self.deps, &method, channels, move || {
            let connection = connection;
            let mut pubsub = connection.as_pubsub();
            pubsub.subscribe(channels)?;
            Ok(pubsub)
        })
    }

    /// Subscribe to `patterns`, tracking the subscription round trip.
    pub fn psubscribe(&mut self, patterns: &[&str]) -> RedisResult<redis::PubSub<'_>> {
        let method = self.method(b"psubscribe");
        let connection = &mut self.inner;
        instrument(&self.deps, &method, patterns, move || {
            let connection = connection;
            let mut pubsub = connection.as_pubsub();
            pubsub.psubscribe(patterns)?;
            Ok(pubsub)
        })
    }
}
