//! Progress summary for the history screen
//!
//! Derived entirely from the progression state: nothing here is stored.

use serde::{Deserialize, Serialize};

use crate::models::{Exercise, WorkoutResult};
use crate::progression::{ProgressionState, SESSIONS_PER_WEEK};

/// How many history entries the summary carries
pub const RECENT_HISTORY_LIMIT: usize = 10;

/// ---------------------------------------------------------------------------
/// Per-exercise weight vs where the program started
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseProgress {
  pub exercise: Exercise,
  pub display_name: String,
  pub current_weight: u32,
  pub weight_display: String,
  pub starting_weight: u32,
  pub delta: i64,
}

impl ExerciseProgress {
  fn compute(exercise: Exercise, current_weight: u32) -> Self {
    let starting_weight = exercise.initial_weight();
    Self {
      exercise,
      display_name: exercise.display_name().to_string(),
      current_weight,
      weight_display: exercise.weight_display(current_weight),
      starting_weight,
      delta: i64::from(current_weight) - i64::from(starting_weight),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
  /// Completed sessions (weight overrides excluded)
  pub total_workouts: usize,
  /// Share of recorded exercise results that passed, rounded percent
  pub success_rate_pct: u32,
  pub weeks_completed: usize,
  pub is_deload_week: bool,
  pub exercises: Vec<ExerciseProgress>,
  /// Newest first
  pub recent_history: Vec<WorkoutResult>,
}

impl ProgressSummary {
  pub fn compute(state: &ProgressionState) -> Self {
    let (successes, recorded) = state
      .history
      .iter()
      .filter(|entry| entry.is_session())
      .map(WorkoutResult::success_count)
      .fold((0, 0), |(s, r), (ok, total)| (s + ok, r + total));

    let total_workouts = state.history.iter().filter(|e| e.is_session()).count();

    let success_rate_pct = if recorded > 0 {
      (successes as f64 / recorded as f64 * 100.0).round() as u32
    } else {
      0
    };

    Self {
      total_workouts,
      success_rate_pct,
      weeks_completed: total_workouts / SESSIONS_PER_WEEK as usize,
      is_deload_week: state.is_deload_week,
      exercises: Exercise::ALL
        .into_iter()
        .map(|e| ExerciseProgress::compute(e, state.weight(e)))
        .collect(),
      recent_history: state
        .history
        .iter()
        .rev()
        .take(RECENT_HISTORY_LIMIT)
        .cloned()
        .collect(),
    }
  }

  pub fn get_exercise(&self, exercise: Exercise) -> Option<&ExerciseProgress> {
    self.exercises.iter().find(|e| e.exercise == exercise)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_history() {
    let summary = ProgressSummary::compute(&ProgressionState::new());
    assert_eq!(summary.total_workouts, 0);
    assert_eq!(summary.success_rate_pct, 0);
    assert_eq!(summary.weeks_completed, 0);
    assert!(summary.recent_history.is_empty());
    assert!(summary.exercises.iter().all(|e| e.delta == 0));
  }

  #[test]
  fn test_counts_sessions_not_overrides() {
    let mut state = ProgressionState::new();
    state.record_result(Exercise::Deadlift, true).unwrap();
    state.record_result(Exercise::Ohp, true).unwrap();
    state.record_result(Exercise::Row, false).unwrap();
    state.complete_workout();
    state.override_weight(Exercise::Bench, 100.0, false).unwrap();

    let summary = ProgressSummary::compute(&state);

    assert_eq!(summary.total_workouts, 1);
    // 2 of 3 passed
    assert_eq!(summary.success_rate_pct, 67);
    assert_eq!(summary.recent_history.len(), 2);
    assert!(!summary.recent_history[0].is_session());

    let bench = summary.get_exercise(Exercise::Bench).unwrap();
    assert_eq!(bench.current_weight, 100);
    assert_eq!(bench.delta, -20);
  }

  #[test]
  fn test_recent_history_is_capped_and_newest_first() {
    let mut state = ProgressionState::new();
    for _ in 0..12 {
      state.complete_workout();
    }

    let summary = ProgressSummary::compute(&state);

    assert_eq!(summary.total_workouts, 12);
    assert_eq!(summary.weeks_completed, 3);
    assert_eq!(summary.recent_history.len(), RECENT_HISTORY_LIMIT);
    assert_eq!(summary.recent_history[0].week_number(), 3);
  }

  #[test]
  fn test_pullups_display() {
    let mut state = ProgressionState::new();
    state.current_weights.insert(Exercise::Pullups, 10);

    let summary = ProgressSummary::compute(&state);
    let pullups = summary.get_exercise(Exercise::Pullups).unwrap();

    assert_eq!(pullups.weight_display, "+10 lbs");
    assert_eq!(pullups.delta, 10);
  }
}
