use serde::{Deserialize, Serialize};

use super::exercise::Exercise;

/// Which template a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutType {
  #[serde(rename = "A_HEAVY")]
  AHeavy,
  #[serde(rename = "A_LIGHT")]
  ALight,
  #[serde(rename = "B")]
  B,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateExercise {
  pub exercise: Exercise,
  pub name: String,
  pub sets: String,
}

/// A named, ordered list of exercises with a target-sets label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
  pub workout_type: WorkoutType,
  pub name: String,
  pub exercises: Vec<TemplateExercise>,
}

impl WorkoutTemplate {
  pub fn contains(&self, exercise: Exercise) -> bool {
    self.exercises.iter().any(|e| e.exercise == exercise)
  }
}

const DEFAULT_SETS: &str = "3×8";

impl WorkoutType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::AHeavy => "A_HEAVY",
      Self::ALight => "A_LIGHT",
      Self::B => "B",
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::AHeavy => "Workout A (Heavy Hinge)",
      Self::ALight => "Workout A (Light Hinge)",
      Self::B => "Workout B",
    }
  }

  pub fn exercises(self) -> [Exercise; 3] {
    match self {
      Self::AHeavy => [Exercise::Deadlift, Exercise::Ohp, Exercise::Row],
      Self::ALight => [Exercise::Rdl, Exercise::Ohp, Exercise::Row],
      Self::B => [Exercise::Squat, Exercise::Bench, Exercise::Pullups],
    }
  }

  pub fn template(self) -> WorkoutTemplate {
    WorkoutTemplate {
      workout_type: self,
      name: self.name().to_string(),
      exercises: self
        .exercises()
        .into_iter()
        .map(|exercise| TemplateExercise {
          exercise,
          name: exercise.display_name().to_string(),
          sets: DEFAULT_SETS.to_string(),
        })
        .collect(),
    }
  }
}

impl std::fmt::Display for WorkoutType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for WorkoutType {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "A_HEAVY" => Ok(Self::AHeavy),
      "A_LIGHT" => Ok(Self::ALight),
      "B" => Ok(Self::B),
      _ => Err(format!("Unknown workout type: {}", s)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_heavy_and_light_differ_only_in_hinge() {
    let heavy = WorkoutType::AHeavy.template();
    let light = WorkoutType::ALight.template();

    assert_eq!(heavy.exercises[0].exercise, Exercise::Deadlift);
    assert_eq!(light.exercises[0].exercise, Exercise::Rdl);
    assert_eq!(heavy.exercises[1..], light.exercises[1..]);
  }

  #[test]
  fn test_template_labels() {
    let b = WorkoutType::B.template();
    assert_eq!(b.name, "Workout B");
    assert!(b.contains(Exercise::Pullups));
    assert!(b.exercises.iter().all(|e| e.sets == "3×8"));
    assert_eq!(b.exercises[1].name, "Bench Press");
  }

  #[test]
  fn test_workout_type_serde() {
    assert_eq!(serde_json::to_string(&WorkoutType::AHeavy).unwrap(), "\"A_HEAVY\"");
    assert_eq!("A_LIGHT".parse::<WorkoutType>(), Ok(WorkoutType::ALight));
  }
}
