use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;
use tracing::info;

use crate::progression::ProgressionState;
use crate::store::StoreError;

pub type DbPool = SqlitePool;

/// Application state: the database plus the single lifter's live progression
pub struct AppState {
  pub db: DbPool,
  pub user_id: String,
  pub progression: Mutex<ProgressionState>,
}

impl AppState {
  /// Load the user's progression from the database and hold it in memory
  pub async fn load(db: DbPool, user_id: impl Into<String>) -> Result<Self, StoreError> {
    let user_id = user_id.into();
    let progression = crate::store::load_state(&db, &user_id).await?;
    Ok(Self {
      db,
      user_id,
      progression: Mutex::new(progression),
    })
  }
}

/// Open a pool for a sqlite URL and run migrations
pub async fn connect(db_url: &str) -> Result<DbPool, StoreError> {
  info!(url = %db_url, "opening database");

  // Every connection to `sqlite::memory:` is its own database, so keep one
  let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .connect(db_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("database initialized");

  Ok(pool)
}

/// Get the path to the database file
/// Stored in the platform app data dir, e.g.
/// ~/Library/Application Support/com.samleuthold.lift-log/lift-log.db
#[cfg(feature = "desktop")]
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<std::path::PathBuf, StoreError> {
  use tauri::Manager;

  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| StoreError::Location(format!("Failed to get app data dir: {}", e)))?;

  // Create directory if it doesn't exist
  std::fs::create_dir_all(&data_dir)
    .map_err(|e| StoreError::Location(format!("Failed to create {}: {}", data_dir.display(), e)))?;

  Ok(data_dir.join("lift-log.db"))
}

/// Initialize the database connection pool, honoring a configured URL first
#[cfg(feature = "desktop")]
pub async fn initialize_db<R: tauri::Runtime>(
  app: &tauri::AppHandle<R>,
  config: &crate::config::AppConfig,
) -> Result<DbPool, StoreError> {
  let db_url = match &config.database_url {
    Some(url) => url.clone(),
    None => format!("sqlite://{}?mode=rwc", get_db_path(app)?.display()),
  };

  connect(&db_url).await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Exercise;

  #[tokio::test]
  async fn test_app_state_loads_defaults_for_new_user() {
    let pool = crate::test_utils::setup_test_db().await;

    let state = AppState::load(pool.clone(), "new-user").await.expect("Should load");

    assert_eq!(state.user_id, "new-user");
    let progression = state.progression.lock().await;
    assert_eq!(progression.weight(Exercise::Deadlift), 175);
    assert_eq!(progression.session_count, 0);
    drop(progression);

    crate::test_utils::teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_app_state_resumes_saved_progression() {
    let pool = crate::test_utils::setup_test_db().await;
    let mut saved = ProgressionState::new();
    crate::test_utils::seed_week_of_sessions(&mut saved, true);
    crate::test_utils::seed_saved_state(&pool, "sam", &saved).await;

    let state = AppState::load(pool.clone(), "sam").await.expect("Should load");

    let progression = state.progression.lock().await;
    assert_eq!(progression.week_number, 2);
    assert_eq!(progression.weight(Exercise::Squat), 140);
    assert_eq!(progression.history.len(), 4);
    drop(progression);

    crate::test_utils::teardown_test_db(pool).await;
  }
}
