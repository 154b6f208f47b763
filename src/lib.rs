pub mod config;
pub mod db;
pub mod models;
pub mod progression;
pub mod store;
pub mod summary;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(test)]
pub(crate) mod test_utils;

pub use models::{Exercise, WorkoutResult, WorkoutTemplate, WorkoutType};
pub use progression::{calculate_warmup_sets, CompletedWorkout, ProgressionError, ProgressionState};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  use config::AppConfig;
  use db::AppState;
  use std::sync::Arc;
  use tauri::Manager;

  let config = AppConfig::from_env();
  if let Err(e) = config::init_tracing(&config) {
    eprintln!("Logging disabled: {}", e);
  }

  tauri::Builder::default()
    .setup(move |app| {
      // Initialize database and load the lifter's progression
      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        let loaded = match db::initialize_db(&app_handle, &config).await {
          Ok(pool) => AppState::load(pool, config.user_id.clone()).await,
          Err(e) => Err(e),
        };
        match loaded {
          Ok(state) => {
            app_handle.manage(Arc::new(state));
            tracing::info!(user_id = %config.user_id, "progression ready");
          }
          Err(e) => {
            tracing::error!(error = %e, "failed to initialize database");
          }
        }
      });
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::progression::get_progression_state,
      commands::progression::get_current_workout,
      commands::progression::record_exercise_result,
      commands::progression::complete_workout,
      commands::progression::override_exercise_weight,
      commands::progression::get_warmup_sets,
      commands::progression::get_progress_summary,
      commands::progression::get_workout_history,
      commands::progression::reset_progression,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
