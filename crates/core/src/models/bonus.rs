//! Daily bonus rule models

use serde::{Deserialize, Serialize};

/// Reward table entry: cubes granted for reaching a given streak day.
///
/// The table is finite; streak days beyond the last entry keep earning the
/// last entry's reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRule {
    pub day: i64,
    pub reward: i64,
}
