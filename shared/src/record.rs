use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Men, Gender::Women];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "men" => Ok(Self::Men),
            "women" => Ok(Self::Women),
            _ => Err(format!("unknown gender '{raw}' (expected 'men' or 'women')")),
        }
    }
}

/// Per-week counting stats. Every field is additive across weeks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingStats {
    pub matches_played: u32,
    pub minutes_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub shots: u32,
    pub shots_on_target: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub saves: u32,
    pub goals_against: u32,
    pub fouls_won: u32,
}

impl CountingStats {
    /// Elementwise sum, saturating at `u32::MAX`.
    pub fn accumulate(&mut self, week: &CountingStats) {
        self.matches_played = self.matches_played.saturating_add(week.matches_played);
        self.minutes_played = self.minutes_played.saturating_add(week.minutes_played);
        self.goals = self.goals.saturating_add(week.goals);
        self.assists = self.assists.saturating_add(week.assists);
        self.shots = self.shots.saturating_add(week.shots);
        self.shots_on_target = self.shots_on_target.saturating_add(week.shots_on_target);
        self.yellow_cards = self.yellow_cards.saturating_add(week.yellow_cards);
        self.red_cards = self.red_cards.saturating_add(week.red_cards);
        self.saves = self.saves.saturating_add(week.saves);
        self.goals_against = self.goals_against.saturating_add(week.goals_against);
        self.fouls_won = self.fouls_won.saturating_add(week.fouls_won);
    }
}

/// Identity of a player across weekly snapshots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerKey {
    pub name: String,
    pub team: String,
    pub gender: Gender,
}

/// One player's row in a single weekly snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerWeekRecord {
    pub name: String,
    pub team: String,
    pub gender: Gender,
    pub division: String,
    pub position: String,
    pub stats: CountingStats,
}

impl PlayerWeekRecord {
    pub fn key(&self) -> PlayerKey {
        PlayerKey {
            name: self.name.clone(),
            team: self.team.clone(),
            gender: self.gender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!(" Women ".parse::<Gender>(), Ok(Gender::Women));
        assert_eq!("MEN".parse::<Gender>(), Ok(Gender::Men));
        assert!("mixed".parse::<Gender>().is_err());
    }

    #[test]
    fn accumulate_sums_every_field() {
        let mut total = CountingStats {
            goals: 1,
            minutes_played: 90,
            ..CountingStats::default()
        };
        total.accumulate(&CountingStats {
            goals: 2,
            assists: 1,
            minutes_played: 45,
            fouls_won: 3,
            ..CountingStats::default()
        });
        assert_eq!(total.goals, 3);
        assert_eq!(total.assists, 1);
        assert_eq!(total.minutes_played, 135);
        assert_eq!(total.fouls_won, 3);
    }

    #[test]
    fn accumulate_saturates_instead_of_wrapping() {
        let mut total = CountingStats {
            minutes_played: u32::MAX - 1,
            ..CountingStats::default()
        };
        total.accumulate(&CountingStats {
            minutes_played: 10,
            ..CountingStats::default()
        });
        assert_eq!(total.minutes_played, u32::MAX);
    }
}
