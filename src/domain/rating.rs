//! Rating values and the derived average.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::RatingId;

/// A star rating, guaranteed to be within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RatingValue(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Rating must be a number between 1 and 5, got {0}")]
pub struct InvalidRating(pub i64);

impl RatingValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, InvalidRating> {
        match u8::try_from(value) {
            Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
            _ => Err(InvalidRating(value)),
        }
    }

    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn as_i32(&self) -> i32 {
        i32::from(self.0)
    }
}

impl TryFrom<i32> for RatingValue {
    type Error = InvalidRating;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl<'de> Deserialize<'de> for RatingValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for RatingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a submission inserted a new row or rewrote the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    Created { id: RatingId },
    Updated { id: RatingId },
}

impl RatingOutcome {
    #[must_use]
    pub const fn id(&self) -> RatingId {
        match self {
            Self::Created { id } | Self::Updated { id } => *id,
        }
    }

    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Mean of a store's ratings. `NoRatings` is distinct from any mean; a store
/// nobody rated has no average rather than an average of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageRating {
    NoRatings,
    Rated { mean: f64, count: u64 },
}

impl AverageRating {
    pub const NOT_AVAILABLE: &'static str = "N/A";

    /// Builds the average from an aggregate row, where SQL `AVG` yields
    /// `NULL` for an empty group.
    #[must_use]
    pub fn from_aggregate(mean: Option<f64>, count: i64) -> Self {
        match (mean, u64::try_from(count)) {
            (Some(mean), Ok(count)) if count > 0 => Self::Rated { mean, count },
            _ => Self::NoRatings,
        }
    }

    #[must_use]
    pub const fn mean(&self) -> Option<f64> {
        match self {
            Self::NoRatings => None,
            Self::Rated { mean, .. } => Some(*mean),
        }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        match self {
            Self::NoRatings => 0,
            Self::Rated { count, .. } => *count,
        }
    }

    /// One-decimal display form, or `"N/A"`.
    #[must_use]
    pub fn display(&self) -> String {
        self.mean()
            .map_or_else(|| Self::NOT_AVAILABLE.to_string(), |m| format!("{m:.1}"))
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
