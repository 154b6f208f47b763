pub mod exercise;
pub mod history;
pub mod workout;

pub use exercise::{Exercise, WarmupStyle};
pub use history::WorkoutResult;
pub use workout::{TemplateExercise, WorkoutTemplate, WorkoutType};
