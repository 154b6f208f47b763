pub mod progression;

use serde::Serialize;

use crate::progression::ProgressionError;
use crate::store::StoreError;

/// Error type that can be serialized for Tauri
#[derive(Debug, Serialize)]
pub struct CommandError {
  pub message: String,
}

impl From<ProgressionError> for CommandError {
  fn from(e: ProgressionError) -> Self {
    Self {
      message: e.to_string(),
    }
  }
}

impl From<StoreError> for CommandError {
  fn from(e: StoreError) -> Self {
    Self {
      message: e.to_string(),
    }
  }
}

impl From<String> for CommandError {
  fn from(s: String) -> Self {
    Self { message: s }
  }
}
