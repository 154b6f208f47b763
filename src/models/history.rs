use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::exercise::Exercise;
use super::workout::WorkoutType;

/// Stored `type` of an override record
pub const WEIGHT_OVERRIDE: &str = "WEIGHT_OVERRIDE";

/// Append-only history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkoutResult {
  /// A completed session with its per-exercise pass/fail
  Session {
    date: DateTime<Utc>,
    workout_type: WorkoutType,
    results: BTreeMap<Exercise, bool>,
    week_number: u32,
  },
  /// A manual correction of one exercise's working weight
  WeightOverride {
    date: DateTime<Utc>,
    exercise: Exercise,
    old_weight: u32,
    new_weight: u32,
    week_number: u32,
  },
}

impl WorkoutResult {
  pub fn date(&self) -> DateTime<Utc> {
    match self {
      Self::Session { date, .. } | Self::WeightOverride { date, .. } => *date,
    }
  }

  pub fn week_number(&self) -> u32 {
    match self {
      Self::Session { week_number, .. } | Self::WeightOverride { week_number, .. } => *week_number,
    }
  }

  /// Value of the `type` column in workout_history
  pub fn type_str(&self) -> &'static str {
    match self {
      Self::Session { workout_type, .. } => workout_type.as_str(),
      Self::WeightOverride { .. } => WEIGHT_OVERRIDE,
    }
  }

  pub fn is_session(&self) -> bool {
    matches!(self, Self::Session { .. })
  }

  /// (successes, recorded) for a session; overrides count as (0, 0)
  pub fn success_count(&self) -> (usize, usize) {
    match self {
      Self::Session { results, .. } => (results.values().filter(|ok| **ok).count(), results.len()),
      Self::WeightOverride { .. } => (0, 0),
    }
  }
}
