//! End-to-end: config file to bootstrap to traced commands to exported views.
//!
//! Bootstrap installs process-wide defaults, so this file holds a single test.

use kvscope_facade::{
    CALLS_VIEW_NAME, DATA_TRANSFERRED_VIEW_NAME, LATENCY_VIEW_NAME, MemoryLogSink,
    ObservabilityEnv, Runtime, TrackingOperation, bootstrap, defaults_installed,
};
use redis::{Commands, ConnectionLike, ErrorKind, RedisError, RedisResult, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn fixture_path(relative: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join(relative)
}

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

#[test]
fn traced_commands_e2e() -> Result<(), Box<dyn std::error::Error>> {
    let config = kvscope_config::load_observability_config_from_path(
        Some(&fixture_path("config/kvscope.valid.toml")),
        &ObservabilityEnv::default(),
    )?;
    assert_eq!(config.method_prefix, "sessions");

    let runtime = bootstrap(&config)?;
    assert!(defaults_installed());

    let timeout = RedisError::from((ErrorKind::IoError, "network timeout"));
    let description = timeout.to_string();
    let mut connection = runtime.wrap(ScriptedConnection {
        replies: VecDeque::from([Ok(Value::Okay), Ok(Value::Int(3)), Err(timeout)]),
    });

    let () = connection.set("session:1", "payload")?;
    let length: i64 = connection.llen("queue")?;
    assert_eq!(length, 3);
    let failed: RedisResult<Option<String>> = connection.get("session:2");
    assert!(failed.is_err());

    // Operations built without explicit deps use the installed backends.
    let mut manual = TrackingOperation::new("sessions.custom", ["abc"]);
    manual.end()?;

    let stats = runtime.stats();
    let calls = stats.view_data(CALLS_VIEW_NAME)?.ok_or("calls view missing")?;
    for method in ["sessions.set", "sessions.llen", "sessions.custom"] {
        let row = calls
            .row(&[Some(method), None, Some("OK")])
            .ok_or("ok row missing")?;
        assert_eq!(row.data.count(), 1, "{method}");
    }
    let error_row = calls
        .row(&[Some("sessions.get"), Some(description.as_str()), Some("ERROR")])
        .ok_or("error row missing")?;
    assert_eq!(error_row.data.count(), 1);

    let latency = stats.view_data(LATENCY_VIEW_NAME)?.ok_or("latency view missing")?;
    let samples: u64 = latency.rows.iter().map(|row| row.data.count()).sum();
    assert_eq!(samples, 4);

    let bytes = stats
        .view_data(DATA_TRANSFERRED_VIEW_NAME)?
        .ok_or("bytes view missing")?;
    let set_bytes = bytes
        .row(&[Some("sessions.set"), None])
        .ok_or("set bytes row missing")?;
    assert_eq!(set_bytes.data.count(), 1);

    // Same config, private sink: the export writes one line per view row.
    let sink = Arc::new(MemoryLogSink::new());
    let exporting = Runtime::build(config.clone(), sink.clone())?;
    let mut second = exporting.wrap(ScriptedConnection {
        replies: VecDeque::from([Ok(Value::Int(1))]),
    });
    let _: i64 = second.del("session:1")?;
    assert_eq!(exporting.export()?, 3);
    let lines = sink.take();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let parsed: serde_json::Value = serde_json::from_str(line.trim())?;
        assert_eq!(parsed["tags"]["method"], "sessions.del");
    }
    Ok(())
}
