//! JSON-lines exporter for view snapshots.

use crate::log_sink::LogSink;
use crate::stats::{AggregationData, ViewData, ViewRow};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Exporter that writes one JSON line per view row.
#[derive(Clone)]
pub struct JsonViewExporter {
    sink: Arc<dyn LogSink>,
}

impl JsonViewExporter {
    /// Create an exporter backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Write every row of every view. Returns the number of lines written.
    pub fn export(&self, views: &[ViewData]) -> usize {
        let timestamp_ms = now_epoch_ms();
        let mut written = 0;
        for data in views {
            for row in &data.rows {
                self.sink.write_line(&row_payload(data, row, timestamp_ms));
                written += 1;
            }
        }
        written
    }
}

fn row_payload(data: &ViewData, row: &ViewRow, timestamp_ms: u64) -> String {
    let view = &data.view;
    let mut payload = serde_json::Map::new();
    payload.insert("type".to_string(), Value::String("view".to_string()));
    payload.insert("timestampMs".to_string(), Value::from(timestamp_ms));
    payload.insert("view".to_string(), Value::String(view.name().to_string()));
    payload.insert(
        "measure".to_string(),
        Value::String(view.measure().name().to_string()),
    );
    payload.insert(
        "unit".to_string(),
        Value::String(view.measure().unit().to_string()),
    );
    payload.insert(
        "aggregation".to_string(),
        Value::String(view.aggregation().kind_name().to_string()),
    );
    payload.insert("tags".to_string(), row_tags(data, row));

    match &row.data {
        AggregationData::Count { count } => {
            payload.insert("count".to_string(), Value::from(*count));
        },
        AggregationData::Distribution(distribution) => {
            payload.insert("count".to_string(), Value::from(distribution.count));
            payload.insert("sum".to_string(), Value::from(distribution.sum));
            payload.insert("mean".to_string(), Value::from(distribution.mean));
            payload.insert("min".to_string(), Value::from(distribution.min));
            payload.insert("max".to_string(), Value::from(distribution.max));
            payload.insert(
                "buckets".to_string(),
                Value::from(distribution.bucket_counts.clone()),
            );
        },
    }
    to_line(payload)
}

fn row_tags(data: &ViewData, row: &ViewRow) -> Value {
    let mut map = serde_json::Map::new();
    for (column, value) in data.view.columns().iter().zip(&row.tags) {
        if let Some(value) = value {
            map.insert(column.to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(map)
}

fn to_line(payload: serde_json::Map<String, Value>) -> String {
    serde_json::to_string(&Value::Object(payload)).map_or_else(
        |_| "{\"type\":\"view\",\"error\":\"serialize_failed\"}\n".to_string(),
        |mut encoded| {
            encoded.push('\n');
            encoded
        },
    )
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use crate::stats::InMemoryStats;
    use kvscope_domain::{
        MEASURE_DATA_TRANSFERRED, MEASURE_LATENCY_MS, MeasureValue, TagContext, TagKey, TagValue,
        all_views,
    };
    use kvscope_ports::{StatsRecorder, ViewManager};

    #[test]
    fn rows_are_exported_as_json_lines() -> Result<(), Box<dyn std::error::Error>> {
        let stats = InMemoryStats::new();
        for view in all_views() {
            stats.register_view(&view)?;
        }
        let tags: TagContext = [
            (TagKey::METHOD, TagValue::parse("redis.llen")?),
            (TagKey::STATUS, TagValue::OK),
        ]
        .into_iter()
        .collect();
        let mut map = stats.new_measure_map();
        map.put(&MEASURE_LATENCY_MS, MeasureValue::Double(0.75))
            .put(&MEASURE_DATA_TRANSFERRED, MeasureValue::Long(4));
        map.record(&tags)?;

        let sink = Arc::new(MemoryLogSink::new());
        let exporter = JsonViewExporter::new(sink.clone());
        let written = exporter.export(&stats.all_view_data()?);
        assert_eq!(written, 3);

        let parsed: Vec<Value> = sink
            .take()
            .iter()
            .map(|line| serde_json::from_str(line.trim()))
            .collect::<Result<_, _>>()?;
        assert_eq!(parsed.len(), 3);

        let calls = parsed
            .iter()
            .find(|value| value["view"] == "kvscope/calls")
            .ok_or("missing calls row")?;
        assert_eq!(calls["type"], "view");
        assert_eq!(calls["aggregation"], "count");
        assert_eq!(calls["count"], 1);
        assert_eq!(calls["tags"]["method"], "redis.llen");
        assert_eq!(calls["tags"]["status"], "OK");
        assert!(calls["tags"].get("error").is_none());

        let bytes = parsed
            .iter()
            .find(|value| value["view"] == "kvscope/data_transferred")
            .ok_or("missing bytes row")?;
        assert_eq!(bytes["unit"], "By");
        assert_eq!(bytes["aggregation"], "distribution");
        assert_eq!(bytes["sum"], 4.0);
        assert_eq!(bytes["buckets"].as_array().map(Vec::len), Some(15));
        Ok(())
    }

    #[test]
    fn empty_views_write_nothing() {
        let sink = Arc::new(MemoryLogSink::new());
        let exporter = JsonViewExporter::new(sink.clone());
        assert_eq!(exporter.export(&[]), 0);
        assert!(sink.take().is_empty());
    }
}
