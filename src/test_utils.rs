//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Progression state factories
//! - Fixed timestamps

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::models::{Exercise, WorkoutResult};
use crate::progression::{ProgressionState, SESSIONS_PER_WEEK};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// `db::connect` keeps in-memory pools at one connection, so every query sees
/// the same database
pub async fn setup_test_db() -> SqlitePool {
  crate::db::connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database")
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Persist a state and its history for `user_id`
pub async fn seed_saved_state(pool: &SqlitePool, user_id: &str, state: &ProgressionState) {
  crate::store::save_state(pool, user_id, state)
    .await
    .expect("Failed to seed state");
  for record in &state.history {
    crate::store::append_history(pool, user_id, record)
      .await
      .expect("Failed to seed history");
  }
}

/// ---------------------------------------------------------------------------
/// Progression Factories
/// ---------------------------------------------------------------------------

/// Run one full week, passing or failing every exercise of each template.
/// Returns the session records in order.
pub fn seed_week_of_sessions(state: &mut ProgressionState, success: bool) -> Vec<WorkoutResult> {
  (0..SESSIONS_PER_WEEK)
    .map(|i| {
      for exercise in state.workout_type().exercises() {
        state
          .record_result(exercise, success)
          .expect("Fresh session should accept results");
      }
      state.complete_workout_at(mock_date(i64::from(SESSIONS_PER_WEEK - i))).record
    })
    .collect()
}

/// State one all-fail week away from a deload on bench
pub fn mock_state_near_deload() -> ProgressionState {
  let mut state = ProgressionState::new();
  state.consecutive_failures.insert(Exercise::Bench, 1);
  state
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// A fixed UTC timestamp N days before 2025-03-01 09:00
pub fn mock_date(days_ago: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
    .single()
    .expect("valid fixed date")
    - Duration::days(days_ago)
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    // Verify key tables exist
    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workout_state', 'current_weights', 'exercise_stats', 'workout_history', 'workout_results')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_saved_state_writes_history() {
    let pool = setup_test_db().await;
    let mut state = ProgressionState::new();
    seed_week_of_sessions(&mut state, true);

    seed_saved_state(&pool, "sam", &state).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_history")
      .fetch_one(&pool)
      .await
      .expect("Failed to count history");
    assert_eq!(count, 4);

    let results: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_results")
      .fetch_one(&pool)
      .await
      .expect("Failed to count results");
    assert_eq!(results, 12);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_week_factory_closes_week() {
    let mut state = ProgressionState::new();
    let records = seed_week_of_sessions(&mut state, true);

    assert_eq!(records.len(), 4);
    assert_eq!(state.week_number, 2);
    // dates ascend in session order
    assert!(records.windows(2).all(|w| w[0].date() < w[1].date()));
  }

  #[test]
  fn test_near_deload_factory() {
    let state = mock_state_near_deload();
    assert_eq!(state.failures(Exercise::Bench), 1);
  }
}
