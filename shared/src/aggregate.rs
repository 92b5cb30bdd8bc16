use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::derived::{DerivedStats, PointsFormula};
use crate::error::{Result, ScoutedError};
use crate::record::{CountingStats, Gender, PlayerKey, PlayerWeekRecord};
use crate::snapshot::{SnapshotSource, WeeklySnapshot};
use crate::week::WeekCode;

/// Season-to-date totals for one player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativePlayerRecord {
    pub name: String,
    pub team: String,
    pub gender: Gender,
    /// Latest week's value.
    pub division: String,
    /// Latest week's value.
    pub position: String,
    #[serde(flatten)]
    pub stats: CountingStats,
    /// Number of weekly snapshots the player appeared in.
    pub weeks_played: u32,
}

impl CumulativePlayerRecord {
    fn from_first_week(record: &PlayerWeekRecord) -> Self {
        Self {
            name: record.name.clone(),
            team: record.team.clone(),
            gender: record.gender,
            division: String::new(),
            position: String::new(),
            stats: CountingStats::default(),
            weeks_played: 0,
        }
    }

    pub fn key(&self) -> PlayerKey {
        PlayerKey {
            name: self.name.clone(),
            team: self.team.clone(),
            gender: self.gender,
        }
    }

    pub fn derived(&self, formula: PointsFormula) -> DerivedStats {
        DerivedStats::compute(&self.stats, formula)
    }
}

/// Running totals keyed by (name, team, gender) over an ascending run of weeks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    weeks: Vec<WeekCode>,
    players: HashMap<PlayerKey, CumulativePlayerRecord>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weeks(&self) -> &[WeekCode] {
        &self.weeks
    }

    pub fn latest_week(&self) -> Option<WeekCode> {
        self.weeks.last().copied()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, key: &PlayerKey) -> Option<&CumulativePlayerRecord> {
        self.players.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = &CumulativePlayerRecord> {
        self.players.values()
    }

    /// First player with this exact name, by (team, gender) order when the name is shared.
    pub fn find_by_name(&self, name: &str) -> Option<&CumulativePlayerRecord> {
        self.players
            .iter()
            .filter(|(key, _)| key.name == name)
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, record)| record)
    }

    /// Fold one snapshot into the totals.
    ///
    /// Snapshots must arrive in strictly ascending week order because division and
    /// position take the latest week's value.
    pub fn apply_week(&mut self, snapshot: &WeeklySnapshot) -> Result<()> {
        if let Some(last) = self.latest_week()
            && snapshot.week <= last
        {
            return Err(ScoutedError::invalid(format!(
                "week {} applied after week {last}; weeks must be strictly ascending",
                snapshot.week
            )));
        }

        let mut seen_this_week: HashSet<PlayerKey> = HashSet::new();
        for record in &snapshot.records {
            let key = record.key();
            let total = self
                .players
                .entry(key.clone())
                .or_insert_with(|| CumulativePlayerRecord::from_first_week(record));
            total.stats.accumulate(&record.stats);
            total.division.clone_from(&record.division);
            total.position.clone_from(&record.position);
            if seen_this_week.insert(key) {
                total.weeks_played += 1;
            }
        }

        self.weeks.push(snapshot.week);
        Ok(())
    }
}

/// Sum every supplied week's snapshot for `gender`.
///
/// Each week is loaded in full before any of its rows touch the totals, so a loader
/// failure leaves no half-applied week behind.
pub fn aggregate<S: SnapshotSource + ?Sized>(
    source: &S,
    gender: Gender,
    weeks: &[WeekCode],
) -> Result<Leaderboard> {
    if let Some(pair) = weeks.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(ScoutedError::invalid(format!(
            "weeks must be strictly ascending, found {} before {}",
            pair[0], pair[1]
        )));
    }

    let mut leaderboard = Leaderboard::new();
    for &week in weeks {
        let snapshot = source.load_players(gender, week)?;
        leaderboard.apply_week(&snapshot)?;
    }
    Ok(leaderboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapshotKind;
    use crate::snapshot::MemorySource;

    fn week(raw: &str) -> WeekCode {
        raw.parse().expect("valid week code")
    }

    fn player(name: &str, team: &str, division: &str, position: &str, goals: u32) -> PlayerWeekRecord {
        PlayerWeekRecord {
            name: name.to_owned(),
            team: team.to_owned(),
            gender: Gender::Women,
            division: division.to_owned(),
            position: position.to_owned(),
            stats: CountingStats {
                matches_played: 1,
                minutes_played: 90,
                goals,
                ..CountingStats::default()
            },
        }
    }

    fn snapshot(raw_week: &str, records: Vec<PlayerWeekRecord>) -> WeeklySnapshot {
        WeeklySnapshot {
            week: week(raw_week),
            gender: Gender::Women,
            records,
        }
    }

    fn three_week_source() -> MemorySource {
        MemorySource::new()
            .with_players(snapshot(
                "20250817",
                vec![
                    player("Alice", "TeamA", "d1", "Forward", 1),
                    player("Bea", "TeamB", "d2", "Defender", 0),
                ],
            ))
            .with_players(snapshot(
                "20250824",
                vec![player("Alice", "TeamA", "d1", "Midfielder", 2)],
            ))
            .with_players(snapshot(
                "20250831",
                vec![
                    player("Alice", "TeamA", "d2", "Midfielder", 0),
                    player("Bea", "TeamB", "d2", "Goalkeeper", 1),
                ],
            ))
    }

    #[test]
    fn sums_goals_across_weeks() {
        let source = MemorySource::new()
            .with_players(snapshot("20250817", vec![player("Alice", "TeamA", "d1", "F", 1)]))
            .with_players(snapshot("20250824", vec![player("Alice", "TeamA", "d1", "F", 2)]));

        let board = aggregate(&source, Gender::Women, &[week("20250817"), week("20250824")])
            .expect("aggregation should succeed");

        let alice = board.find_by_name("Alice").expect("Alice should be aggregated");
        assert_eq!(alice.stats.goals, 3);
        assert_eq!(alice.stats.minutes_played, 180);
        assert_eq!(alice.weeks_played, 2);
    }

    #[test]
    fn latest_week_wins_for_display_attributes() {
        let source = three_week_source();
        let board = aggregate(
            &source,
            Gender::Women,
            &[week("20250817"), week("20250824"), week("20250831")],
        )
        .expect("aggregation should succeed");

        let alice = board.find_by_name("Alice").expect("Alice present");
        assert_eq!(alice.division, "d2");
        assert_eq!(alice.position, "Midfielder");
        let bea = board.find_by_name("Bea").expect("Bea present");
        assert_eq!(bea.position, "Goalkeeper");
    }

    #[test]
    fn player_missing_from_interior_week_keeps_totals() {
        let source = three_week_source();
        let board = aggregate(
            &source,
            Gender::Women,
            &[week("20250817"), week("20250824"), week("20250831")],
        )
        .expect("aggregation should succeed");

        let bea = board.find_by_name("Bea").expect("Bea present");
        assert_eq!(bea.stats.goals, 1);
        assert_eq!(bea.stats.matches_played, 2);
        assert_eq!(bea.weeks_played, 2);
    }

    #[test]
    fn incremental_application_matches_full_aggregation() {
        let source = three_week_source();
        let all_weeks = [week("20250817"), week("20250824"), week("20250831")];

        let mut incremental = aggregate(&source, Gender::Women, &all_weeks[..2])
            .expect("prefix aggregation should succeed");
        let last = source
            .load_players(Gender::Women, all_weeks[2])
            .expect("last week present");
        incremental.apply_week(&last).expect("apply next week");

        let full = aggregate(&source, Gender::Women, &all_weeks).expect("full aggregation");
        assert_eq!(incremental, full);
    }

    #[test]
    fn duplicate_rows_in_one_week_are_summed_once_per_week() {
        let source = MemorySource::new().with_players(snapshot(
            "20250817",
            vec![
                player("Alice", "TeamA", "d1", "F", 1),
                player("Alice", "TeamA", "d1", "F", 2),
            ],
        ));
        let board = aggregate(&source, Gender::Women, &[week("20250817")]).expect("aggregate");
        let alice = board.find_by_name("Alice").expect("Alice present");
        assert_eq!(alice.stats.goals, 3);
        assert_eq!(alice.weeks_played, 1);
    }

    #[test]
    fn same_name_on_different_teams_stays_separate() {
        let source = MemorySource::new().with_players(snapshot(
            "20250817",
            vec![
                player("Sam Lee", "TeamB", "d1", "F", 4),
                player("Sam Lee", "TeamA", "d1", "F", 1),
            ],
        ));
        let board = aggregate(&source, Gender::Women, &[week("20250817")]).expect("aggregate");
        assert_eq!(board.len(), 2);
        let first = board.find_by_name("Sam Lee").expect("Sam present");
        assert_eq!(first.team, "TeamA");
    }

    #[test]
    fn missing_week_propagates_without_partial_result() {
        let source = three_week_source();
        let err = aggregate(
            &source,
            Gender::Women,
            &[week("20250817"), week("20250907")],
        )
        .expect_err("missing week should fail");
        assert!(matches!(
            err,
            ScoutedError::MissingSnapshot {
                kind: SnapshotKind::Players,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unordered_weeks() {
        let source = three_week_source();
        let err = aggregate(&source, Gender::Women, &[week("20250824"), week("20250817")])
            .expect_err("descending weeks should fail");
        assert!(matches!(err, ScoutedError::InvalidViewRequest(_)));

        let mut board = Leaderboard::new();
        let snap = source
            .load_players(Gender::Women, week("20250824"))
            .expect("week present");
        board.apply_week(&snap).expect("first apply");
        assert!(board.apply_week(&snap).is_err());
        assert_eq!(board.weeks().len(), 1);
    }

    #[test]
    fn empty_week_list_yields_empty_board() {
        let board = aggregate(&MemorySource::new(), Gender::Men, &[]).expect("aggregate");
        assert!(board.is_empty());
        assert_eq!(board.latest_week(), None);
    }
}
