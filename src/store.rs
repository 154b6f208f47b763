//! SQLite persistence for progression state and workout history
//!
//! The engine never depends on these calls succeeding: callers persist a
//! snapshot after each change and keep going in memory if it fails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::models::history::WEIGHT_OVERRIDE;
use crate::models::{Exercise, WorkoutResult, WorkoutType};
use crate::progression::ProgressionState;

// ---------------------------------------------------------------------------
/// Error Handling
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database location error: {0}")]
    Location(String),
}

impl Serialize for StoreError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

fn parse_exercise(raw: &str) -> Result<Exercise, StoreError> {
    raw.parse().map_err(StoreError::Corrupt)
}

fn to_u32(raw: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(raw).map_err(|_| StoreError::Corrupt(format!("{} out of range: {}", column, raw)))
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("Bad date {:?}: {}", raw, e)))
}

// ---------------------------------------------------------------------------
// State Snapshot
// ---------------------------------------------------------------------------

/// Load a user's progression. Anything never saved comes back at initial values.
pub async fn load_state(pool: &SqlitePool, user_id: &str) -> Result<ProgressionState, StoreError> {
    let mut state = ProgressionState::default();

    let row = sqlx::query(
        r#"
        SELECT session_count, week_number, is_deload_week, session_results_json
        FROM workout_state
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        state.session_count = to_u32(row.try_get("session_count")?, "session_count")?;
        state.week_number = to_u32(row.try_get("week_number")?, "week_number")?;
        state.is_deload_week = row.try_get("is_deload_week")?;

        let session_json: String = row.try_get("session_results_json")?;
        state.session_results = serde_json::from_str(&session_json)?;
    }

    let weights = sqlx::query("SELECT exercise, weight FROM current_weights WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    for row in weights {
        let exercise = parse_exercise(row.try_get("exercise")?)?;
        let weight = to_u32(row.try_get("weight")?, "weight")?;
        state.current_weights.insert(exercise, weight);
    }

    let stats = sqlx::query(
        r#"
        SELECT exercise, consecutive_failures, last_successful_weight, weekly_results_json
        FROM exercise_stats
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    for row in stats {
        let exercise = parse_exercise(row.try_get("exercise")?)?;
        let failures = to_u32(row.try_get("consecutive_failures")?, "consecutive_failures")?;
        state.consecutive_failures.insert(exercise, failures);

        let last_successful: Option<i64> = row.try_get("last_successful_weight")?;
        if let Some(weight) = last_successful {
            state
                .last_successful_weights
                .insert(exercise, to_u32(weight, "last_successful_weight")?);
        }

        let weekly_json: String = row.try_get("weekly_results_json")?;
        state
            .weekly_results
            .insert(exercise, serde_json::from_str(&weekly_json)?);
    }

    state.history = load_history(pool, user_id).await?;

    debug!(user_id, sessions = state.session_count, "loaded progression state");
    Ok(state)
}

/// Upsert the full snapshot (history excluded, see `append_history`)
pub async fn save_state(pool: &SqlitePool, user_id: &str, state: &ProgressionState) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO workout_state
            (user_id, session_count, week_number, is_deload_week, session_results_json, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(user_id) DO UPDATE SET
            session_count = excluded.session_count,
            week_number = excluded.week_number,
            is_deload_week = excluded.is_deload_week,
            session_results_json = excluded.session_results_json,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(i64::from(state.session_count))
    .bind(i64::from(state.week_number))
    .bind(state.is_deload_week)
    .bind(serde_json::to_string(&state.session_results)?)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    for exercise in Exercise::ALL {
        sqlx::query(
            r#"
            INSERT INTO current_weights (user_id, exercise, weight)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, exercise) DO UPDATE SET weight = excluded.weight
            "#,
        )
        .bind(user_id)
        .bind(exercise.key())
        .bind(i64::from(state.weight(exercise)))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO exercise_stats
                (user_id, exercise, consecutive_failures, last_successful_weight, weekly_results_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, exercise) DO UPDATE SET
                consecutive_failures = excluded.consecutive_failures,
                last_successful_weight = excluded.last_successful_weight,
                weekly_results_json = excluded.weekly_results_json
            "#,
        )
        .bind(user_id)
        .bind(exercise.key())
        .bind(i64::from(state.failures(exercise)))
        .bind(i64::from(state.last_successful(exercise)))
        .bind(serde_json::to_string(state.results(exercise))?)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    debug!(user_id, sessions = state.session_count, "saved progression state");
    Ok(())
}

/// Hide every history row written so far from future loads. Rows stay in the table.
pub async fn mark_reset(pool: &SqlitePool, user_id: &str) -> Result<(), StoreError> {
    let floor = sqlx::query(
        r#"
        INSERT INTO workout_state (user_id, history_floor_id, updated_at)
        VALUES (?1, (SELECT COALESCE(MAX(id), 0) FROM workout_history WHERE user_id = ?1), ?2)
        ON CONFLICT(user_id) DO UPDATE SET
            history_floor_id = excluded.history_floor_id,
            updated_at = excluded.updated_at
        RETURNING history_floor_id
        "#,
    )
    .bind(user_id)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?
    .try_get::<i64, _>("history_floor_id")?;

    debug!(user_id, floor, "marked reset");
    Ok(())
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Append one history record, returning its row id
pub async fn append_history(pool: &SqlitePool, user_id: &str, record: &WorkoutResult) -> Result<i64, StoreError> {
    let (exercise, old_weight, new_weight) = match record {
        WorkoutResult::WeightOverride {
            exercise,
            old_weight,
            new_weight,
            ..
        } => (
            Some(exercise.key()),
            Some(i64::from(*old_weight)),
            Some(i64::from(*new_weight)),
        ),
        WorkoutResult::Session { .. } => (None, None, None),
    };

    let mut tx = pool.begin().await?;

    let workout_id = sqlx::query(
        r#"
        INSERT INTO workout_history
            (user_id, date, type, exercise, old_weight, new_weight, week_number)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(record.date().to_rfc3339())
    .bind(record.type_str())
    .bind(exercise)
    .bind(old_weight)
    .bind(new_weight)
    .bind(i64::from(record.week_number()))
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    if let WorkoutResult::Session { results, .. } = record {
        for (exercise, success) in results {
            sqlx::query("INSERT INTO workout_results (workout_id, exercise, success) VALUES (?, ?, ?)")
                .bind(workout_id)
                .bind(exercise.key())
                .bind(*success)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    debug!(user_id, workout_id, kind = record.type_str(), "appended history");
    Ok(workout_id)
}

/// History for a user since their last reset, oldest first
pub async fn load_history(pool: &SqlitePool, user_id: &str) -> Result<Vec<WorkoutResult>, StoreError> {
    let floor: i64 = sqlx::query_scalar("SELECT history_floor_id FROM workout_state WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .unwrap_or(0);

    let result_rows = sqlx::query(
        r#"
        SELECT r.workout_id, r.exercise, r.success
        FROM workout_results r
        JOIN workout_history h ON h.id = r.workout_id
        WHERE h.user_id = ? AND h.id > ?
        "#,
    )
    .bind(user_id)
    .bind(floor)
    .fetch_all(pool)
    .await?;

    let mut results_by_workout: HashMap<i64, BTreeMap<Exercise, bool>> = HashMap::new();
    for row in result_rows {
        let exercise = parse_exercise(row.try_get("exercise")?)?;
        results_by_workout
            .entry(row.try_get("workout_id")?)
            .or_default()
            .insert(exercise, row.try_get("success")?);
    }

    let rows = sqlx::query(
        r#"
        SELECT id, date, type, exercise, old_weight, new_weight, week_number
        FROM workout_history
        WHERE user_id = ? AND id > ?
        ORDER BY date ASC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(floor)
    .fetch_all(pool)
    .await?;

    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        let id: i64 = row.try_get("id")?;
        let date = parse_date(row.try_get("date")?)?;
        let kind: String = row.try_get("type")?;
        let week_number = to_u32(row.try_get("week_number")?, "week_number")?;

        let record = if kind == WEIGHT_OVERRIDE {
            let exercise: Option<String> = row.try_get("exercise")?;
            let old_weight: Option<i64> = row.try_get("old_weight")?;
            let new_weight: Option<i64> = row.try_get("new_weight")?;
            let (Some(exercise), Some(old_weight), Some(new_weight)) = (exercise, old_weight, new_weight) else {
                return Err(StoreError::Corrupt(format!("Override {} is missing fields", id)));
            };
            WorkoutResult::WeightOverride {
                date,
                exercise: parse_exercise(&exercise)?,
                old_weight: to_u32(old_weight, "old_weight")?,
                new_weight: to_u32(new_weight, "new_weight")?,
                week_number,
            }
        } else {
            WorkoutResult::Session {
                date,
                workout_type: kind.parse::<WorkoutType>().map_err(StoreError::Corrupt)?,
                results: results_by_workout.remove(&id).unwrap_or_default(),
                week_number,
            }
        };
        history.push(record);
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
