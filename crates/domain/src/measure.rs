//! Measures: named, typed quantities recorded per call.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Name of the latency measure.
pub const LATENCY_MEASURE_NAME: &str = "kvscope/latency";
/// Name of the transferred-bytes measure.
pub const DATA_TRANSFERRED_MEASURE_NAME: &str = "kvscope/data_transferred";

/// Unit for millisecond measures.
pub const UNIT_MILLISECONDS: &str = "ms";
/// Unit for byte measures.
pub const UNIT_BYTES: &str = "By";

/// Latency of each instrumented call, in fractional milliseconds.
pub const MEASURE_LATENCY_MS: Measure = Measure::new_static(
    LATENCY_MEASURE_NAME,
    "The latency of the various calls",
    UNIT_MILLISECONDS,
    MeasureKind::Double,
);

/// Bytes attributed to each instrumented call, one sample per payload string.
pub const MEASURE_DATA_TRANSFERRED: Measure = Measure::new_static(
    DATA_TRANSFERRED_MEASURE_NAME,
    "Measures the data transferred",
    UNIT_BYTES,
    MeasureKind::Long,
);

/// Numeric representation of a measure's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureKind {
    /// 64-bit floating point samples.
    Double,
    /// 64-bit integer samples.
    Long,
}

/// Named, typed quantity with a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Measure {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    unit: Cow<'static, str>,
    kind: MeasureKind,
}

impl Measure {
    const fn new_static(
        name: &'static str,
        description: &'static str,
        unit: &'static str,
        kind: MeasureKind,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            description: Cow::Borrowed(description),
            unit: Cow::Borrowed(unit),
            kind,
        }
    }

    /// Build a measure at runtime.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        kind: MeasureKind,
    ) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            description: Cow::Owned(description.into()),
            unit: Cow::Owned(unit.into()),
            kind,
        }
    }

    /// Measure name, unique per process.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Unit string (`ms`, `By`, ...).
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Sample representation.
    #[must_use]
    pub const fn kind(&self) -> MeasureKind {
        self.kind
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.unit)
    }
}

/// One sample put into a measure map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    /// Floating point sample.
    Double(f64),
    /// Integer sample.
    Long(i64),
}

impl MeasureValue {
    /// Sample widened to `f64` for aggregation.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "aggregates are kept in f64; byte counts beyond 2^53 lose precision"
    )]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Double(value) => value,
            Self::Long(value) => value as f64,
        }
    }
}

impl From<f64> for MeasureValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for MeasureValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}
