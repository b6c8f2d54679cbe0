//! Aggregations and bucket boundaries for views.

use kvscope_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::fmt;

/// Latency distribution boundaries, in milliseconds.
pub const LATENCY_BOUNDARIES_MS: [f64; 31] = [
    0.0, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 1.5, 2.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0,
    200.0, 400.0, 600.0, 800.0, 1000.0, 1500.0, 2000.0, 2500.0, 5000.0, 10000.0, 20000.0,
    40000.0, 100_000.0, 200_000.0, 500_000.0,
];

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Payload-size distribution boundaries, in bytes.
pub const BYTE_BOUNDARIES: [f64; 14] = [
    0.0,
    KIB,
    2.0 * KIB,
    4.0 * KIB,
    16.0 * KIB,
    64.0 * KIB,
    256.0 * KIB,
    MIB,
    4.0 * MIB,
    16.0 * MIB,
    64.0 * MIB,
    256.0 * MIB,
    GIB,
    4.0 * GIB,
];

/// Validation failures for bucket boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundariesError {
    /// A boundary is negative, NaN, or infinite.
    InvalidBoundary {
        /// Index of the offending boundary.
        index: usize,
        /// Offending value.
        value: f64,
    },
    /// Boundaries are not strictly ascending.
    NotAscending {
        /// Index of the first boundary not greater than its predecessor.
        index: usize,
    },
}

impl fmt::Display for BoundariesError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBoundary { .. } => {
                formatter.write_str("bucket boundaries must be finite and non-negative")
            },
            Self::NotAscending { .. } => {
                formatter.write_str("bucket boundaries must be strictly ascending")
            },
        }
    }
}

impl std::error::Error for BoundariesError {}

impl From<BoundariesError> for ErrorEnvelope {
    fn from(error: BoundariesError) -> Self {
        let envelope = Self::expected(
            ErrorCode::new("domain", "invalid_bucket_boundaries"),
            error.to_string(),
        );
        match error {
            BoundariesError::InvalidBoundary { index, value } => envelope
                .with_metadata("index", index.to_string())
                .with_metadata("value", value.to_string()),
            BoundariesError::NotAscending { index } => {
                envelope.with_metadata("index", index.to_string())
            },
        }
    }
}

/// Strictly ascending, non-negative upper bounds of distribution buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BucketBoundaries(Vec<f64>);

impl BucketBoundaries {
    /// Validate and wrap boundaries.
    pub fn new(boundaries: impl Into<Vec<f64>>) -> Result<Self, BoundariesError> {
        let boundaries = boundaries.into();
        for (index, value) in boundaries.iter().copied().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(BoundariesError::InvalidBoundary { index, value });
            }
        }
        if let Some(index) = boundaries
            .windows(2)
            .position(|pair| matches!(pair, [lower, upper] if upper <= lower))
        {
            return Err(BoundariesError::NotAscending { index: index + 1 });
        }
        Ok(Self(boundaries))
    }

    /// Latency boundaries in milliseconds.
    #[must_use]
    pub fn latency_ms() -> Self {
        Self(LATENCY_BOUNDARIES_MS.to_vec())
    }

    /// Payload-size boundaries in bytes.
    #[must_use]
    pub fn bytes() -> Self {
        Self(BYTE_BOUNDARIES.to_vec())
    }

    /// Boundary values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of buckets, including the overflow bucket.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.0.len() + 1
    }

    /// Index of the bucket a sample falls into: the first bucket whose upper
    /// boundary is greater than `value`, or the overflow bucket.
    #[must_use]
    pub fn bucket_index(&self, value: f64) -> usize {
        self.0.partition_point(|boundary| *boundary <= value)
    }
}

/// How a view folds recorded samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "boundaries", rename_all = "lowercase")]
pub enum Aggregation {
    /// Number of samples.
    Count,
    /// Histogram over fixed boundaries, plus count/sum/mean/min/max.
    Distribution(BucketBoundaries),
}

impl Aggregation {
    /// Count aggregation.
    #[must_use]
    pub const fn count() -> Self {
        Self::Count
    }

    /// Latency distribution in milliseconds.
    #[must_use]
    pub fn latency_distribution() -> Self {
        Self::Distribution(BucketBoundaries::latency_ms())
    }

    /// Payload-size distribution in bytes.
    #[must_use]
    pub fn bytes_distribution() -> Self {
        Self::Distribution(BucketBoundaries::bytes())
    }

    /// Short name used in exports.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Distribution(_) => "distribution",
        }
    }
}
