//! Linear Progression Engine
//!
//! One owned `ProgressionState` per lifter. Each exercise has:
//! - a working weight (pounds, multiples of 5)
//! - pass/fail results accumulated over the current 4-session week
//! - a consecutive all-fail week counter
//! - the last weight it was proven at
//!
//! Key principles:
//! - Decisions happen only at week boundaries (every 4th completed session)
//! - All-success week = +5 lb, anything else holds
//! - Two all-fail weeks in a row on any barbell lift = deload everything to 75%
//! - Deload lasts one week, then resumes 5 lb under the last proven weight
//! - Deadlift and RDL share fate (see `COUPLED_PAIRS`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::models::exercise::{BAR_WEIGHT, MAX_WEIGHT, WEIGHT_STEP};
use crate::models::{Exercise, WarmupStyle, WorkoutResult, WorkoutTemplate, WorkoutType};

pub const SESSIONS_PER_WEEK: u32 = 4;

/// All-fail weeks in a row that force a deload
pub const DELOAD_TRIGGER_FAILURES: u32 = 2;

/// Deload cuts working weight to this percentage
pub const DELOAD_PERCENT: u32 = 75;

// ---------------------------------------------------------------------------
/// Coupled Exercises: hinge-pattern shared fate
// ---------------------------------------------------------------------------

/// `(leader, follower)` pairs. Failure counters are mirrored between the two,
/// and the follower only progresses in a week where the leader was all-success.
pub const COUPLED_PAIRS: &[(Exercise, Exercise)] = &[(Exercise::Deadlift, Exercise::Rdl)];

/// The other member of a coupled pair, if any
pub fn coupled_partner(exercise: Exercise) -> Option<Exercise> {
    COUPLED_PAIRS.iter().find_map(|&(leader, follower)| {
        if leader == exercise {
            Some(follower)
        } else if follower == exercise {
            Some(leader)
        } else {
            None
        }
    })
}

/// The exercise whose week gates this one's progression
fn progression_leader(exercise: Exercise) -> Option<Exercise> {
    COUPLED_PAIRS
        .iter()
        .find(|(_, follower)| *follower == exercise)
        .map(|(leader, _)| *leader)
}

// ---------------------------------------------------------------------------
/// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProgressionError {
    #[error("{0} already has a result for this session")]
    AlreadyRecorded(Exercise),

    #[error("Invalid weight for {exercise}: {value} (must be between 0 and {} lbs)", MAX_WEIGHT)]
    InvalidWeight { exercise: Exercise, value: f64 },
}

// ---------------------------------------------------------------------------
/// Weight Arithmetic
// ---------------------------------------------------------------------------

fn round_down_to_step(weight: u32) -> u32 {
    weight / WEIGHT_STEP * WEIGHT_STEP
}

/// `percent`% of `weight`, truncated. Widened so no stored weight can overflow.
fn percent_of(weight: u32, percent: u32) -> u32 {
    let scaled = u64::from(weight) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// 75% of the working weight, floored to 5 lb, never under the exercise minimum
pub fn deload_weight(exercise: Exercise, weight: u32) -> u32 {
    round_down_to_step(percent_of(weight, DELOAD_PERCENT)).max(exercise.min_weight())
}

/// Weight to resume at when a deload week ends
pub fn deload_exit_weight(exercise: Exercise, last_successful: u32) -> u32 {
    last_successful
        .saturating_sub(WEIGHT_STEP)
        .max(exercise.min_weight())
}

fn all_succeeded(results: &[bool]) -> bool {
    !results.is_empty() && results.iter().all(|ok| *ok)
}

fn all_failed(results: &[bool]) -> bool {
    !results.is_empty() && results.iter().all(|ok| !*ok)
}

// ---------------------------------------------------------------------------
/// Rotation
// ---------------------------------------------------------------------------

/// Template for a session position. Deload swaps the heavy hinge day for RDL.
pub fn select_workout_type(session_count: u32, is_deload_week: bool) -> WorkoutType {
    match (session_count % SESSIONS_PER_WEEK, is_deload_week) {
        (0, true) => WorkoutType::ALight,
        (0, false) => WorkoutType::AHeavy,
        (2, _) => WorkoutType::ALight,
        _ => WorkoutType::B,
    }
}

// ---------------------------------------------------------------------------
/// Warm-up Sets
// ---------------------------------------------------------------------------

/// (percent of working weight, reps)
const WARMUP_SCHEME: [(u32, u32); 3] = [(45, 5), (65, 3), (80, 2)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupSet {
    pub weight: u32,
    pub reps: u32,
}

impl std::fmt::Display for WarmupSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} lbs × {} reps", self.weight, self.reps)
    }
}

/// Ramp-up sets before the working sets. Bodyweight movements get none.
pub fn warmup_plan(exercise: Exercise, weight: u32) -> Vec<WarmupSet> {
    if exercise.warmup_style() == WarmupStyle::Bodyweight {
        return Vec::new();
    }

    WARMUP_SCHEME
        .iter()
        .map(|&(percent, reps)| WarmupSet {
            weight: round_down_to_step(percent_of(weight, percent)).max(BAR_WEIGHT),
            reps,
        })
        .collect()
}

pub fn calculate_warmup_sets(exercise: Exercise, weight: u32) -> Vec<String> {
    warmup_plan(exercise, weight)
        .iter()
        .map(ToString::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
/// Week Outcome: what a week boundary changed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekKind {
    /// Normal week: all-success exercises went up, everything else held
    Progressed,
    /// Repeated failure: everything cut to 75%
    DeloadStarted,
    /// Deload week finished: weights restored under last proven
    DeloadEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightChange {
    pub exercise: Exercise,
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekOutcome {
    pub kind: WeekKind,
    pub changes: Vec<WeightChange>,
}

/// Result of finishing a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedWorkout {
    pub record: WorkoutResult,
    pub next_workout: WorkoutTemplate,
    pub week_processed: Option<WeekOutcome>,
}

// ---------------------------------------------------------------------------
/// Progression State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionState {
    pub current_weights: BTreeMap<Exercise, u32>,
    pub weekly_results: BTreeMap<Exercise, Vec<bool>>,
    pub consecutive_failures: BTreeMap<Exercise, u32>,
    pub last_successful_weights: BTreeMap<Exercise, u32>,
    pub session_count: u32,
    pub week_number: u32,
    pub is_deload_week: bool,
    /// Results recorded in the session currently in progress
    #[serde(default)]
    pub session_results: BTreeMap<Exercise, bool>,
    #[serde(default)]
    pub history: Vec<WorkoutResult>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        let initial_weights: BTreeMap<Exercise, u32> = Exercise::ALL
            .into_iter()
            .map(|e| (e, e.initial_weight()))
            .collect();

        Self {
            current_weights: initial_weights.clone(),
            weekly_results: Exercise::ALL.into_iter().map(|e| (e, Vec::new())).collect(),
            consecutive_failures: Exercise::ALL.into_iter().map(|e| (e, 0)).collect(),
            last_successful_weights: initial_weights,
            session_count: 0,
            week_number: 1,
            is_deload_week: false,
            session_results: BTreeMap::new(),
            history: Vec::new(),
        }
    }
}

impl ProgressionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight(&self, exercise: Exercise) -> u32 {
        self.current_weights
            .get(&exercise)
            .copied()
            .unwrap_or_else(|| exercise.initial_weight())
    }

    pub fn failures(&self, exercise: Exercise) -> u32 {
        self.consecutive_failures.get(&exercise).copied().unwrap_or(0)
    }

    pub fn last_successful(&self, exercise: Exercise) -> u32 {
        self.last_successful_weights
            .get(&exercise)
            .copied()
            .unwrap_or_else(|| exercise.initial_weight())
    }

    pub fn results(&self, exercise: Exercise) -> &[bool] {
        self.weekly_results
            .get(&exercise)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Week derived from the session count (1-based)
    pub fn current_week(&self) -> u32 {
        self.session_count / SESSIONS_PER_WEEK + 1
    }

    pub fn workout_type(&self) -> WorkoutType {
        select_workout_type(self.session_count, self.is_deload_week)
    }

    /// Template for the next session to be performed
    pub fn select_workout(&self) -> WorkoutTemplate {
        self.workout_type().template()
    }

    /// Sets the counter on an exercise and its coupled partner
    fn set_failures(&mut self, exercise: Exercise, count: u32) {
        self.consecutive_failures.insert(exercise, count);
        if let Some(partner) = coupled_partner(exercise) {
            self.consecutive_failures.insert(partner, count);
        }
    }

    // -----------------------------------------------------------------------
    // Session Flow
    // -----------------------------------------------------------------------

    /// Record pass/fail for one exercise in the current session.
    ///
    /// A second result for the same exercise in one session is rejected; the
    /// first one stands.
    pub fn record_result(&mut self, exercise: Exercise, success: bool) -> Result<(), ProgressionError> {
        if self.session_results.contains_key(&exercise) {
            return Err(ProgressionError::AlreadyRecorded(exercise));
        }

        self.session_results.insert(exercise, success);
        self.weekly_results.entry(exercise).or_default().push(success);
        debug!(%exercise, success, session = self.session_count, "recorded result");
        Ok(())
    }

    pub fn complete_workout(&mut self) -> CompletedWorkout {
        self.complete_workout_at(Utc::now())
    }

    /// Close the current session, processing the week on every 4th one
    pub fn complete_workout_at(&mut self, date: DateTime<Utc>) -> CompletedWorkout {
        let record = WorkoutResult::Session {
            date,
            workout_type: self.workout_type(),
            results: std::mem::take(&mut self.session_results),
            week_number: self.current_week(),
        };
        self.history.push(record.clone());
        self.session_count += 1;

        let week_processed = if self.session_count % SESSIONS_PER_WEEK == 0 {
            let outcome = self.process_weekly_results();
            self.week_number += 1;
            for results in self.weekly_results.values_mut() {
                results.clear();
            }
            Some(outcome)
        } else {
            None
        };

        let next_workout = self.select_workout();
        info!(
            session_count = self.session_count,
            next = %next_workout.workout_type,
            "workout completed"
        );

        CompletedWorkout {
            record,
            next_workout,
            week_processed,
        }
    }

    // -----------------------------------------------------------------------
    // Week Boundary
    // -----------------------------------------------------------------------

    /// Evaluate the week's results and move weights.
    ///
    /// Does not clear `weekly_results`; `complete_workout_at` does that after
    /// advancing the week.
    pub fn process_weekly_results(&mut self) -> WeekOutcome {
        let before = self.current_weights.clone();

        // Failure tracking (barbell lifts only)
        let mut needs_deload = false;
        for exercise in Exercise::ALL {
            if !exercise.is_barbell() {
                continue;
            }

            let (failed, any_success) = {
                let results = self.results(exercise);
                (all_failed(results), results.iter().any(|ok| *ok))
            };

            if failed {
                let count = self.failures(exercise) + 1;
                self.set_failures(exercise, count);
                if count >= DELOAD_TRIGGER_FAILURES {
                    needs_deload = true;
                }
            } else if any_success {
                self.set_failures(exercise, 0);
                let proven = self.weight(exercise);
                self.last_successful_weights.insert(exercise, proven);
            }
        }

        let kind = if needs_deload {
            for exercise in Exercise::ALL {
                let weight = deload_weight(exercise, self.weight(exercise));
                self.current_weights.insert(exercise, weight);
                self.consecutive_failures.insert(exercise, 0);
            }
            self.is_deload_week = true;
            WeekKind::DeloadStarted
        } else if self.is_deload_week {
            for exercise in Exercise::ALL {
                let deloaded = self.weight(exercise);
                let restored = deload_exit_weight(exercise, self.last_successful(exercise));
                if restored < deloaded {
                    warn!(
                        %exercise,
                        deloaded,
                        restored,
                        "deload exit resumes below the deload weight"
                    );
                }
                self.current_weights.insert(exercise, restored);
            }
            self.is_deload_week = false;
            WeekKind::DeloadEnded
        } else {
            for exercise in Exercise::ALL {
                let leader_ok = progression_leader(exercise)
                    .map_or(true, |leader| all_succeeded(self.results(leader)));

                if all_succeeded(self.results(exercise)) && leader_ok {
                    let weight = self.weight(exercise).saturating_add(WEIGHT_STEP);
                    self.current_weights.insert(exercise, weight);
                    self.last_successful_weights.insert(exercise, weight);
                }
            }
            WeekKind::Progressed
        };

        let changes: Vec<WeightChange> = Exercise::ALL
            .into_iter()
            .filter_map(|exercise| {
                let from = before
                    .get(&exercise)
                    .copied()
                    .unwrap_or_else(|| exercise.initial_weight());
                let to = self.weight(exercise);
                (from != to).then_some(WeightChange { exercise, from, to })
            })
            .collect();

        info!(
            week = self.week_number,
            ?kind,
            changed = changes.len(),
            "processed week"
        );

        WeekOutcome { kind, changes }
    }

    // -----------------------------------------------------------------------
    // Manual Corrections
    // -----------------------------------------------------------------------

    pub fn override_weight(
        &mut self,
        exercise: Exercise,
        new_weight: f64,
        is_mid_workout: bool,
    ) -> Result<WorkoutResult, ProgressionError> {
        self.override_weight_at(exercise, new_weight, is_mid_workout, Utc::now())
    }

    /// Set a working weight by hand and restart tracking for that exercise.
    ///
    /// Accepts 0 to `MAX_WEIGHT`. Rounds to the nearest 5 lb and lifts barbell
    /// exercises to at least the bar. Mid-workout, the exercise's result in the open session is dropped
    /// so it can be recorded again at the new weight.
    pub fn override_weight_at(
        &mut self,
        exercise: Exercise,
        new_weight: f64,
        is_mid_workout: bool,
        date: DateTime<Utc>,
    ) -> Result<WorkoutResult, ProgressionError> {
        if !(0.0..=f64::from(MAX_WEIGHT)).contains(&new_weight) {
            return Err(ProgressionError::InvalidWeight {
                exercise,
                value: new_weight,
            });
        }

        let steps = (new_weight / f64::from(WEIGHT_STEP)).round() as u32;
        let rounded = (steps * WEIGHT_STEP).max(exercise.min_weight());
        let old_weight = self.weight(exercise);

        self.current_weights.insert(exercise, rounded);
        self.set_failures(exercise, 0);
        self.last_successful_weights.insert(exercise, rounded);
        self.weekly_results.insert(exercise, Vec::new());
        if is_mid_workout {
            self.session_results.remove(&exercise);
        }

        let record = WorkoutResult::WeightOverride {
            date,
            exercise,
            old_weight,
            new_weight: rounded,
            week_number: self.current_week(),
        };
        self.history.push(record.clone());

        info!(%exercise, old_weight, new_weight = rounded, "weight override");
        Ok(record)
    }

    /// Back to the initial program
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
