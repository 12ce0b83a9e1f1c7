//! Focus-time guard: advisory protection of recurring weekly blocks.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A protected weekly block of hours. `day_of_week` uses 0 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusBlock {
    pub day_of_week: u8,
    pub start_hour: u32,
    pub end_hour: u32,
    pub is_active: bool,
}

/// The active block protecting `at`, if any.
///
/// Hours are half-open `[start_hour, end_hour)`. Advisory only: callers
/// flag the collision, they never block the operation.
pub fn protecting_block(at: DateTime<Utc>, blocks: &[FocusBlock]) -> Option<&FocusBlock> {
    let day_of_week = at.weekday().num_days_from_sunday() as u8;
    let hour = at.hour();
    blocks.iter().find(|block| {
        block.is_active
            && block.day_of_week == day_of_week
            && hour >= block.start_hour
            && hour < block.end_hour
    })
}
