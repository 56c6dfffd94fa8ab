//! Levels derived from a point total.

use serde::{Deserialize, Serialize};

/// Level standing for a point total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub current_level_points: u64,
    pub next_level_points: u64,
    pub points_to_next: u64,
}

/// Points needed to reach `level`: `100 * (level - 1)^2`.
pub fn points_for_level(level: u32) -> u64 {
    let n = u64::from(level.saturating_sub(1));
    100 * n * n
}

/// `floor(sqrt(points / 100)) + 1`, in integer arithmetic.
pub fn level_for_points(points: u64) -> u32 {
    isqrt(points / 100) as u32 + 1
}

pub fn calculate_level(points: u64) -> LevelProgress {
    let level = level_for_points(points);
    let current_level_points = points_for_level(level);
    let next_level_points = points_for_level(level + 1);
    LevelProgress {
        level,
        current_level_points,
        next_level_points,
        points_to_next: next_level_points - points,
    }
}

fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}
