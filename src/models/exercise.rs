use serde::{Deserialize, Serialize};

/// Lowest load a barbell can carry: the empty bar
pub const BAR_WEIGHT: u32 = 45;

/// Weights move in 5 lb steps (smallest plate pair is 2.5 lb)
pub const WEIGHT_STEP: u32 = 5;

/// Heaviest weight accepted from manual entry
pub const MAX_WEIGHT: u32 = 2000;

/// The seven fixed movements of the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
  Deadlift,
  Rdl,
  Squat,
  Bench,
  Ohp,
  Row,
  Pullups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupStyle {
  Barbell,
  Bodyweight,
}

impl Exercise {
  /// Canonical order. Weekly processing walks exercises in this order.
  pub const ALL: [Exercise; 7] = [
    Exercise::Deadlift,
    Exercise::Rdl,
    Exercise::Squat,
    Exercise::Bench,
    Exercise::Ohp,
    Exercise::Row,
    Exercise::Pullups,
  ];

  pub fn key(self) -> &'static str {
    match self {
      Self::Deadlift => "deadlift",
      Self::Rdl => "rdl",
      Self::Squat => "squat",
      Self::Bench => "bench",
      Self::Ohp => "ohp",
      Self::Row => "row",
      Self::Pullups => "pullups",
    }
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Self::Deadlift => "Deadlift",
      Self::Rdl => "Romanian Deadlift",
      Self::Squat => "Back Squat",
      Self::Bench => "Bench Press",
      Self::Ohp => "Overhead Press",
      Self::Row => "Barbell Row",
      Self::Pullups => "Pull-Ups",
    }
  }

  /// Rest between working sets
  pub fn rest_hint(self) -> &'static str {
    match self {
      Self::Deadlift | Self::Rdl | Self::Squat => "3-4 min",
      Self::Bench | Self::Ohp | Self::Row | Self::Pullups => "2-3 min",
    }
  }

  pub fn warmup_style(self) -> WarmupStyle {
    match self {
      Self::Pullups => WarmupStyle::Bodyweight,
      _ => WarmupStyle::Barbell,
    }
  }

  pub fn is_barbell(self) -> bool {
    self.warmup_style() == WarmupStyle::Barbell
  }

  /// Starting working weight for a fresh program
  pub fn initial_weight(self) -> u32 {
    match self {
      Self::Deadlift => 175,
      Self::Rdl => 155,
      Self::Squat => 135,
      Self::Bench => 120,
      Self::Ohp => 75,
      Self::Row => 65,
      Self::Pullups => 0,
    }
  }

  /// Floor for any computed weight. Pull-ups carry added load only, so 0 is valid.
  pub fn min_weight(self) -> u32 {
    if self.is_barbell() {
      BAR_WEIGHT
    } else {
      0
    }
  }

  /// Human-readable load, e.g. "135 lbs", "Bodyweight", "+10 lbs"
  pub fn weight_display(self, weight: u32) -> String {
    match (self, weight) {
      (Self::Pullups, 0) => "Bodyweight".to_string(),
      (Self::Pullups, w) => format!("+{} lbs", w),
      (_, w) => format!("{} lbs", w),
    }
  }
}

impl std::fmt::Display for Exercise {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.key())
  }
}

impl std::str::FromStr for Exercise {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Exercise::ALL
      .into_iter()
      .find(|e| e.key() == s)
      .ok_or_else(|| format!("Unknown exercise: {}", s))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_key_roundtrip() {
    for exercise in Exercise::ALL {
      assert_eq!(exercise.key().parse::<Exercise>(), Ok(exercise));
    }
    assert!("curls".parse::<Exercise>().is_err());
  }

  #[test]
  fn test_serde_uses_keys() {
    let json = serde_json::to_string(&Exercise::Pullups).unwrap();
    assert_eq!(json, "\"pullups\"");
    let parsed: Exercise = serde_json::from_str("\"ohp\"").unwrap();
    assert_eq!(parsed, Exercise::Ohp);
  }

  #[test]
  fn test_pullups_are_bodyweight() {
    assert_eq!(Exercise::Pullups.warmup_style(), WarmupStyle::Bodyweight);
    assert_eq!(Exercise::Pullups.min_weight(), 0);
    assert_eq!(Exercise::Squat.min_weight(), BAR_WEIGHT);
  }

  #[test]
  fn test_weight_display() {
    assert_eq!(Exercise::Pullups.weight_display(0), "Bodyweight");
    assert_eq!(Exercise::Pullups.weight_display(10), "+10 lbs");
    assert_eq!(Exercise::Bench.weight_display(120), "120 lbs");
  }
}
