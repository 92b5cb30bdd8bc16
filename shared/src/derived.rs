use serde::{Deserialize, Serialize};

use crate::record::CountingStats;

/// Weights of the "Points" leaderboard stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsFormula {
    pub goal_weight: u32,
    pub assist_weight: u32,
}

impl PointsFormula {
    /// Goals count double, assists count once.
    pub const DEFAULT: PointsFormula = PointsFormula {
        goal_weight: 2,
        assist_weight: 1,
    };

    pub fn points(self, stats: &CountingStats) -> u32 {
        stats
            .goals
            .saturating_mul(self.goal_weight)
            .saturating_add(stats.assists.saturating_mul(self.assist_weight))
    }
}

impl Default for PointsFormula {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Stats computed from summed counts. Never stored; rebuilt from the counts on every read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub points: u32,
    pub goals_per_90: f64,
    pub assists_per_90: f64,
    pub shot_accuracy: f64,
    pub save_percentage: f64,
}

impl DerivedStats {
    pub fn compute(stats: &CountingStats, formula: PointsFormula) -> Self {
        Self {
            points: formula.points(stats),
            goals_per_90: per_90(stats.goals, stats.minutes_played),
            assists_per_90: per_90(stats.assists, stats.minutes_played),
            shot_accuracy: ratio(stats.shots_on_target, stats.shots),
            save_percentage: ratio(
                stats.saves,
                stats.saves.saturating_add(stats.goals_against),
            ),
        }
    }
}

/// Rate per 90 minutes; 0.0 when no minutes were played.
pub fn per_90(count: u32, minutes: u32) -> f64 {
    if minutes == 0 {
        return 0.0;
    }
    f64::from(count) * 90.0 / f64::from(minutes)
}

/// `part / whole`; 0.0 when `whole` is zero.
pub fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    f64::from(part) / f64::from(whole)
}
