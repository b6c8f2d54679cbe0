//! Commands issued through a traced connection land in the in-memory views.

use kvscope_adapters::{
    DefaultTagger, InMemoryStats, JsonViewExporter, MemoryLogSink, TracedConnection,
    TracingTracer,
};
use kvscope_app::{ObservabilityDeps, register_all_views};
use kvscope_domain::{CALLS_VIEW_NAME, DATA_TRANSFERRED_VIEW_NAME, LATENCY_VIEW_NAME};
use redis::{Commands, ConnectionLike, ErrorKind, RedisError, RedisResult, Value};
use std::collections::VecDeque;
use std::sync::Arc;

struct ScriptedConnection {
    replies: VecDeque<RedisResult<Value>>,
}

impl ConnectionLike for ScriptedConnection {
    fn req_packed_command(&mut self, _cmd: &[u8]) -> RedisResult<Value> {
        self.replies.pop_front().unwrap_or(Ok(Value::Nil))
    }

    fn req_packed_commands(
        &mut self,
        _cmd: &[u8],
        _offset: usize,
        count: usize,
    ) -> RedisResult<Vec<Value>> {
        Ok(vec![Value::Okay; count])
    }

    fn get_db(&self) -> i64 {
        0
    }

    fn check_connection(&mut self) -> bool {
        true
    }

    fn is_open(&self) -> bool {
        true
    }
}

fn wired(
    replies: Vec<RedisResult<Value>>,
) -> Result<(InMemoryStats, TracedConnection<ScriptedConnection>), Box<dyn std::error::Error>> {
    let stats = InMemoryStats::new();
    register_all_views(&stats)?;
    let deps = ObservabilityDeps::new(
        Arc::new(stats.clone()),
        Arc::new(DefaultTagger::new()),
        Arc::new(TracingTracer::new()),
    );
    let connection = TracedConnection::new(
        ScriptedConnection {
            replies: replies.into(),
        },
        deps,
        "redis",
    );
    Ok((stats, connection))
}

#[test]
fn successful_commands_fill_every_view() -> Result<(), Box<dyn std::error::Error>> {
    let (stats, mut connection) = wired(vec![Ok(Value::Okay), Ok(Value::Int(2))])?;

    let () = connection.set("key1", "value")?;
    let removed: i64 = connection.del(&["key1", "key22"][..])?;
    assert_eq!(removed, 2);

    let calls = stats.view_data(CALLS_VIEW_NAME)?.ok_or("calls view missing")?;
    let set_row = calls
        .row(&[Some("redis.set"), None, Some("OK")])
        .ok_or("set row missing")?;
    assert_eq!(set_row.data.count(), 1);
    assert!(calls.row(&[Some("redis.del"), None, Some("OK")]).is_some());

    let latency = stats.view_data(LATENCY_VIEW_NAME)?.ok_or("latency view missing")?;
    let total: u64 = latency.rows.iter().map(|row| row.data.count()).sum();
    assert_eq!(total, 2);

    let bytes = stats
        .view_data(DATA_TRANSFERRED_VIEW_NAME)?
        .ok_or("bytes view missing")?;
    let del_bytes = bytes
        .row(&[Some("redis.del"), None])
        .ok_or("del bytes row missing")?;
    assert_eq!(del_bytes.data.count(), 2);
    Ok(())
}

#[test]
fn failures_are_grouped_under_the_error_tag() -> Result<(), Box<dyn std::error::Error>> {
    let timeout = RedisError::from((ErrorKind::IoError, "network timeout"));
    let description = timeout.to_string();
    let (stats, mut connection) = wired(vec![Err(timeout)])?;

    let result: RedisResult<i64> = connection.llen("queue");
    assert!(result.is_err());

    let calls = stats.view_data(CALLS_VIEW_NAME)?.ok_or("calls view missing")?;
    let row = calls
        .row(&[Some("redis.llen"), Some(description.as_str()), Some("ERROR")])
        .ok_or("error row missing")?;
    assert_eq!(row.data.count(), 1);
    Ok(())
}

#[test]
fn snapshot_exports_one_line_per_row() -> Result<(), Box<dyn std::error::Error>> {
    let (stats, mut connection) = wired(vec![Ok(Value::Nil)])?;
    let value: Option<String> = connection.get("missing")?;
    assert!(value.is_none());

    let sink = Arc::new(MemoryLogSink::new());
    let written = JsonViewExporter::new(sink.clone()).export(&stats.all_view_data()?);
    assert_eq!(written, 3);
    for line in sink.take() {
        let parsed: serde_json::Value = serde_json::from_str(line.trim())?;
        assert_eq!(parsed["tags"]["method"], "redis.get");
    }
    Ok(())
}
