//! Tauri commands for the linear progression engine
//!
//! The in-memory state is authoritative. Each mutation is followed by a
//! best-effort save: a failed write is logged and the command still succeeds.

use serde::Serialize;
use std::sync::Arc;
use tauri::State;
use tracing::warn;

use super::CommandError;
use crate::db::AppState;
use crate::models::{Exercise, WorkoutResult, WorkoutTemplate};
use crate::progression::{calculate_warmup_sets, CompletedWorkout, ProgressionState, SESSIONS_PER_WEEK};
use crate::store;
use crate::summary::ProgressSummary;

// ---------------------------------------------------------------------------
/// Workout View: what the workout screen renders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PlannedExercise {
    pub exercise: Exercise,
    pub name: String,
    pub sets: String,
    pub rest: String,
    pub weight: u32,
    pub weight_display: String,
    pub warmup_sets: Vec<String>,
    /// Pass/fail once recorded this session
    pub result: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentWorkout {
    pub template: WorkoutTemplate,
    pub exercises: Vec<PlannedExercise>,
    pub week_number: u32,
    /// 1-based position within the week
    pub session_in_week: u32,
    pub is_deload_week: bool,
    pub all_recorded: bool,
}

impl CurrentWorkout {
    pub fn from_state(state: &ProgressionState) -> Self {
        let template = state.select_workout();
        let exercises: Vec<PlannedExercise> = template
            .exercises
            .iter()
            .map(|item| {
                let weight = state.weight(item.exercise);
                PlannedExercise {
                    exercise: item.exercise,
                    name: item.name.clone(),
                    sets: item.sets.clone(),
                    rest: item.exercise.rest_hint().to_string(),
                    weight,
                    weight_display: item.exercise.weight_display(weight),
                    warmup_sets: calculate_warmup_sets(item.exercise, weight),
                    result: state.session_results.get(&item.exercise).copied(),
                }
            })
            .collect();

        Self {
            all_recorded: exercises.iter().all(|e| e.result.is_some()),
            template,
            exercises,
            week_number: state.current_week(),
            session_in_week: state.session_count % SESSIONS_PER_WEEK + 1,
            is_deload_week: state.is_deload_week,
        }
    }
}

/// Save the snapshot and optionally a new history record. Never fails.
async fn persist(app: &AppState, state: &ProgressionState, record: Option<&WorkoutResult>) {
    if let Err(e) = store::save_state(&app.db, &app.user_id, state).await {
        warn!(error = %e, user_id = %app.user_id, "failed to save progression state");
    }
    if let Some(record) = record {
        if let Err(e) = store::append_history(&app.db, &app.user_id, record).await {
            warn!(error = %e, user_id = %app.user_id, "failed to append workout history");
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Full engine state
#[tauri::command]
pub async fn get_progression_state(
    state: State<'_, Arc<AppState>>,
) -> Result<ProgressionState, CommandError> {
    Ok(state.progression.lock().await.clone())
}

/// The session to perform next, with weights and warm-ups
#[tauri::command]
pub async fn get_current_workout(
    state: State<'_, Arc<AppState>>,
) -> Result<CurrentWorkout, CommandError> {
    let progression = state.progression.lock().await;
    Ok(CurrentWorkout::from_state(&progression))
}

/// Mark one exercise passed or failed in the current session
#[tauri::command]
pub async fn record_exercise_result(
    state: State<'_, Arc<AppState>>,
    exercise: Exercise,
    success: bool,
) -> Result<CurrentWorkout, CommandError> {
    let mut progression = state.progression.lock().await;
    progression.record_result(exercise, success)?;
    persist(&state, &progression, None).await;
    Ok(CurrentWorkout::from_state(&progression))
}

/// Close the session; every 4th one also settles the week
#[tauri::command]
pub async fn complete_workout(
    state: State<'_, Arc<AppState>>,
) -> Result<CompletedWorkout, CommandError> {
    let mut progression = state.progression.lock().await;
    let completed = progression.complete_workout();
    persist(&state, &progression, Some(&completed.record)).await;
    Ok(completed)
}

/// Manually correct a working weight
#[tauri::command]
pub async fn override_exercise_weight(
    state: State<'_, Arc<AppState>>,
    exercise: Exercise,
    new_weight: f64,
    is_mid_workout: Option<bool>,
) -> Result<WorkoutResult, CommandError> {
    let mut progression = state.progression.lock().await;
    let record = progression.override_weight(exercise, new_weight, is_mid_workout.unwrap_or(false))?;
    persist(&state, &progression, Some(&record)).await;
    Ok(record)
}

#[tauri::command]
pub fn get_warmup_sets(exercise: Exercise, weight: u32) -> Vec<String> {
    calculate_warmup_sets(exercise, weight)
}

#[tauri::command]
pub async fn get_progress_summary(
    state: State<'_, Arc<AppState>>,
) -> Result<ProgressSummary, CommandError> {
    let progression = state.progression.lock().await;
    Ok(ProgressSummary::compute(&progression))
}

/// History as stored, oldest first
#[tauri::command]
pub async fn get_workout_history(
    state: State<'_, Arc<AppState>>,
) -> Result<Vec<WorkoutResult>, CommandError> {
    Ok(store::load_history(&state.db, &state.user_id).await?)
}

/// Start over from the initial weights. Stored history rows are kept but no
/// longer loaded.
#[tauri::command]
pub async fn reset_progression(
    state: State<'_, Arc<AppState>>,
) -> Result<ProgressionState, CommandError> {
    let mut progression = state.progression.lock().await;
    progression.reset();
    if let Err(e) = store::mark_reset(&state.db, &state.user_id).await {
        warn!(error = %e, user_id = %state.user_id, "failed to mark reset");
    }
    persist(&state, &progression, None).await;
    Ok(progression.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutType;
    use crate::progression::WeekKind;
    use crate::test_utils::*;
    use serial_test::serial;
    use tauri::Manager;

    async fn mock_app_with(pool: &sqlx::SqlitePool, progression: ProgressionState) -> tauri::App<tauri::test::MockRuntime> {
        seed_saved_state(pool, "sam", &progression).await;
        let state = AppState::load(pool.clone(), "sam").await.expect("Should load app state");
        let app = tauri::test::mock_app();
        app.manage(Arc::new(state));
        app
    }

    #[test]
    fn test_current_workout_view() {
        let view = CurrentWorkout::from_state(&ProgressionState::new());

        assert_eq!(view.template.workout_type, WorkoutType::AHeavy);
        assert_eq!(view.session_in_week, 1);
        assert_eq!(view.exercises[0].weight, 175);
        assert_eq!(view.exercises[0].rest, "3-4 min");
        assert_eq!(view.exercises[0].warmup_sets.len(), 3);
        assert!(!view.all_recorded);
    }

    #[tokio::test]
    #[serial]
    async fn test_record_and_complete_persist() {
        let pool = setup_test_db().await;
        let app = mock_app_with(&pool, ProgressionState::new()).await;

        for exercise in [Exercise::Deadlift, Exercise::Ohp, Exercise::Row] {
            record_exercise_result(app.state(), exercise, true)
                .await
                .expect("Should record");
        }
        let view = get_current_workout(app.state()).await.expect("Should get view");
        assert!(view.all_recorded);

        let completed = complete_workout(app.state()).await.expect("Should complete");
        assert_eq!(completed.next_workout.workout_type, WorkoutType::B);

        let stored = store::load_state(&pool, "sam").await.expect("Should reload");
        assert_eq!(stored.session_count, 1);
        assert_eq!(stored.history.len(), 1);

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_double_record_rejected() {
        let pool = setup_test_db().await;
        let app = mock_app_with(&pool, ProgressionState::new()).await;

        record_exercise_result(app.state(), Exercise::Ohp, true)
            .await
            .expect("Should record");
        let err = record_exercise_result(app.state(), Exercise::Ohp, false)
            .await
            .unwrap_err();

        assert!(err.message.contains("already"), "unexpected error: {}", err.message);

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_bench_week_deloads() {
        let pool = setup_test_db().await;
        let app = mock_app_with(&pool, mock_state_near_deload()).await;

        let mut last = None;
        for _ in 0..4 {
            let view = get_current_workout(app.state()).await.expect("Should get view");
            for planned in view.exercises {
                let pass = planned.exercise != Exercise::Bench;
                record_exercise_result(app.state(), planned.exercise, pass)
                    .await
                    .expect("Should record");
            }
            last = Some(complete_workout(app.state()).await.expect("Should complete"));
        }

        let outcome = last.and_then(|c| c.week_processed).expect("Week should close");
        assert_eq!(outcome.kind, WeekKind::DeloadStarted);

        let summary = get_progress_summary(app.state()).await.expect("Should summarize");
        assert!(summary.is_deload_week);
        assert_eq!(summary.get_exercise(Exercise::Bench).map(|e| e.current_weight), Some(90));

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_override_is_logged() {
        let pool = setup_test_db().await;
        let app = mock_app_with(&pool, ProgressionState::new()).await;

        let record = override_exercise_weight(app.state(), Exercise::Squat, 143.0, None)
            .await
            .expect("Should override");
        assert!(matches!(record, WorkoutResult::WeightOverride { new_weight: 145, .. }));

        let history = get_workout_history(app.state()).await.expect("Should load history");
        assert_eq!(history, vec![record]);

        let err = override_exercise_weight(app.state(), Exercise::Squat, -10.0, Some(true))
            .await
            .unwrap_err();
        assert!(err.message.contains("Invalid weight"));

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_state_survives_failed_save() {
        let pool = setup_test_db().await;
        let app = mock_app_with(&pool, ProgressionState::new()).await;
        pool.close().await;

        record_exercise_result(app.state(), Exercise::Deadlift, true)
            .await
            .expect("Closed database must not fail the command");

        let progression = get_progression_state(app.state()).await.expect("Should read state");
        assert_eq!(progression.results(Exercise::Deadlift), &[true]);
    }

    #[tokio::test]
    #[serial]
    async fn test_reset_hides_history_across_restart() {
        let pool = setup_test_db().await;
        let mut progression = ProgressionState::new();
        seed_week_of_sessions(&mut progression, true);
        let app = mock_app_with(&pool, progression).await;

        let fresh = reset_progression(app.state()).await.expect("Should reset");
        assert_eq!(fresh.week_number, 1);
        assert_eq!(fresh.weight(Exercise::Squat), 135);

        let stored = store::load_state(&pool, "sam").await.expect("Should reload");
        assert_eq!(stored, fresh);
        assert_eq!(ProgressSummary::compute(&stored).total_workouts, 0);

        let history = get_workout_history(app.state()).await.expect("Should load history");
        assert!(history.is_empty());

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_history")
            .fetch_one(&pool)
            .await
            .expect("Failed to count");
        assert_eq!(rows, 4);

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    #[serial]
    async fn test_restart_mid_session_rejects_rerecord() {
        let pool = setup_test_db().await;
        let app = mock_app_with(&pool, ProgressionState::new()).await;
        record_exercise_result(app.state(), Exercise::Deadlift, false)
            .await
            .expect("Should record");

        let restarted = mock_app_with(&pool, store::load_state(&pool, "sam").await.expect("Should reload")).await;
        let view = get_current_workout(restarted.state()).await.expect("Should get view");
        assert_eq!(view.exercises[0].result, Some(false));

        let err = record_exercise_result(restarted.state(), Exercise::Deadlift, true)
            .await
            .unwrap_err();
        assert!(err.message.contains("already"), "unexpected error: {}", err.message);

        teardown_test_db(pool).await;
    }

    #[test]
    fn test_warmup_command() {
        assert_eq!(get_warmup_sets(Exercise::Pullups, 0), Vec::<String>::new());
        assert_eq!(get_warmup_sets(Exercise::Bench, 120).len(), 3);
        assert_eq!(get_warmup_sets(Exercise::Squat, u32::MAX).len(), 3);
    }
}
