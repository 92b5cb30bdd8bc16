use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutedError, SnapshotKind};
use crate::matches::MatchRecord;
use crate::record::{CountingStats, Gender, PlayerWeekRecord};
use crate::week::WeekCode;

pub const COL_NAME: &str = "Name";
pub const COL_TEAM: &str = "Team";
pub const COL_GENDER: &str = "Gender";
pub const COL_DIVISION: &str = "Division";
pub const COL_POSITION: &str = "Dominant Position";
pub const COL_MATCHES_PLAYED: &str = "Matches Played";
pub const COL_MINUTES_PLAYED: &str = "Minutes Played";
pub const COL_GOALS: &str = "Goals";
pub const COL_ASSISTS: &str = "Assists";
pub const COL_SHOTS: &str = "Shots";
pub const COL_SHOTS_ON_TARGET: &str = "Shots On Target";
pub const COL_YELLOW_CARDS: &str = "Yellow Cards";
pub const COL_RED_CARDS: &str = "Red Cards";
pub const COL_SAVES: &str = "Saves";
pub const COL_GOALS_AGAINST: &str = "Goals Against";
pub const COL_FOULS_WON: &str = "Fouls Won";

/// All player rows of one gender for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySnapshot {
    pub week: WeekCode,
    pub gender: Gender,
    pub records: Vec<PlayerWeekRecord>,
}

/// All match rows (both genders) for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub week: WeekCode,
    pub matches: Vec<MatchRecord>,
}

/// Access to weekly snapshots by already-resolved week identifier.
pub trait SnapshotSource {
    fn load_players(&self, gender: Gender, week: WeekCode) -> Result<WeeklySnapshot>;
    fn load_matches(&self, week: WeekCode) -> Result<MatchSnapshot>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &S {
    fn load_players(&self, gender: Gender, week: WeekCode) -> Result<WeeklySnapshot> {
        (**self).load_players(gender, week)
    }

    fn load_matches(&self, week: WeekCode) -> Result<MatchSnapshot> {
        (**self).load_matches(week)
    }
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Arc<S> {
    fn load_players(&self, gender: Gender, week: WeekCode) -> Result<WeeklySnapshot> {
        (**self).load_players(gender, week)
    }

    fn load_matches(&self, week: WeekCode) -> Result<MatchSnapshot> {
        (**self).load_matches(week)
    }
}

/// Snapshot source backed by already-parsed snapshots held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    players: HashMap<(Gender, WeekCode), WeeklySnapshot>,
    matches: HashMap<WeekCode, MatchSnapshot>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(mut self, snapshot: WeeklySnapshot) -> Self {
        self.insert_players(snapshot);
        self
    }

    pub fn with_matches(mut self, snapshot: MatchSnapshot) -> Self {
        self.matches.insert(snapshot.week, snapshot);
        self
    }

    pub fn insert_players(&mut self, snapshot: WeeklySnapshot) {
        self.players
            .insert((snapshot.gender, snapshot.week), snapshot);
    }
}

impl SnapshotSource for MemorySource {
    fn load_players(&self, gender: Gender, week: WeekCode) -> Result<WeeklySnapshot> {
        self.players
            .get(&(gender, week))
            .cloned()
            .ok_or(ScoutedError::MissingSnapshot {
                kind: SnapshotKind::Players,
                week,
            })
    }

    fn load_matches(&self, week: WeekCode) -> Result<MatchSnapshot> {
        self.matches
            .get(&week)
            .cloned()
            .ok_or(ScoutedError::MissingSnapshot {
                kind: SnapshotKind::Matches,
                week,
            })
    }
}

/// Header-resolved view over one CSV source; every cell access reports its row and column.
struct Table<'a> {
    source_name: &'a str,
    headers: StringRecord,
}

impl<'a> Table<'a> {
    fn new<R: Read>(source_name: &'a str, reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()
            .map_err(|source| ScoutedError::Csv {
                source_name: source_name.to_owned(),
                source,
            })?
            .clone();
        Ok(Self {
            source_name,
            headers,
        })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == column)
    }

    fn required(&self, column: &str) -> Result<usize> {
        self.optional(column)
            .ok_or_else(|| self.malformed(1, column, "required column is missing"))
    }

    fn malformed(&self, row: u64, column: &str, reason: impl Into<String>) -> ScoutedError {
        ScoutedError::MalformedRecord {
            source_name: self.source_name.to_owned(),
            row,
            column: column.to_owned(),
            reason: reason.into(),
        }
    }

    fn text(&self, record: &StringRecord, row: u64, idx: usize) -> Result<String> {
        record
            .get(idx)
            .map(|cell| cell.trim().to_owned())
            .ok_or_else(|| self.malformed(row, &self.headers[idx], "cell is missing"))
    }

    fn count(&self, record: &StringRecord, row: u64, idx: usize) -> Result<u32> {
        let cell = self.text(record, row, idx)?;
        parse_count(&cell).map_err(|reason| self.malformed(row, &self.headers[idx], reason))
    }

    fn optional_count(&self, record: &StringRecord, row: u64, idx: Option<usize>) -> Result<Option<u32>> {
        let Some(idx) = idx else {
            return Ok(None);
        };
        let cell = self.text(record, row, idx)?;
        if cell.is_empty() {
            return Ok(None);
        }
        parse_count(&cell)
            .map(Some)
            .map_err(|reason| self.malformed(row, &self.headers[idx], reason))
    }

    fn optional_text(&self, record: &StringRecord, row: u64, idx: Option<usize>) -> Result<String> {
        match idx {
            Some(idx) => self.text(record, row, idx),
            None => Ok(String::new()),
        }
    }
}

/// Parse a counting-stat cell. The data producer writes floats, so `3.0` reads as 3.
pub fn parse_count(cell: &str) -> std::result::Result<u32, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Err("expected a count, found an empty cell".to_owned());
    }
    if let Ok(value) = cell.parse::<u32>() {
        return Ok(value);
    }
    let value: f64 = cell
        .parse()
        .map_err(|_| format!("expected a count, found '{cell}'"))?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(format!("expected a non-negative whole count, found '{cell}'"));
    }
    Ok(value as u32)
}

fn record_row(record: &StringRecord, index: usize) -> u64 {
    record
        .position()
        .map(|pos| pos.line())
        .unwrap_or(index as u64 + 2)
}

fn csv_error(source_name: &str, source: csv::Error) -> ScoutedError {
    ScoutedError::Csv {
        source_name: source_name.to_owned(),
        source,
    }
}

/// Parse a `{gender}s_players_{week}.csv` snapshot.
///
/// The whole input is consumed before returning, so a failure never yields a partial snapshot.
pub fn parse_player_snapshot<R: Read>(
    source_name: &str,
    gender: Gender,
    week: WeekCode,
    input: R,
) -> Result<WeeklySnapshot> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let table = Table::new(source_name, &mut reader)?;

    let name = table.required(COL_NAME)?;
    let team = table.required(COL_TEAM)?;
    let division = table.required(COL_DIVISION)?;
    let position = table.required(COL_POSITION)?;
    let gender_col = table.optional(COL_GENDER);
    let matches_played = table.required(COL_MATCHES_PLAYED)?;
    let minutes_played = table.required(COL_MINUTES_PLAYED)?;
    let goals = table.required(COL_GOALS)?;
    let assists = table.required(COL_ASSISTS)?;
    let shots = table.required(COL_SHOTS)?;
    let shots_on_target = table.required(COL_SHOTS_ON_TARGET)?;
    let yellow_cards = table.required(COL_YELLOW_CARDS)?;
    let red_cards = table.required(COL_RED_CARDS)?;
    let saves = table.required(COL_SAVES)?;
    let goals_against = table.required(COL_GOALS_AGAINST)?;
    let fouls_won = table.required(COL_FOULS_WON)?;

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(source_name, e))?;
        let row = record_row(&record, index);

        if let Some(idx) = gender_col {
            let raw = table.text(&record, row, idx)?;
            let row_gender: Gender = raw
                .parse()
                .map_err(|reason: String| table.malformed(row, COL_GENDER, reason))?;
            if row_gender != gender {
                return Err(table.malformed(
                    row,
                    COL_GENDER,
                    format!("'{row_gender}' row in a {gender} snapshot"),
                ));
            }
        }

        let player_name = table.text(&record, row, name)?;
        if player_name.is_empty() {
            return Err(table.malformed(row, COL_NAME, "player name is empty"));
        }

        records.push(PlayerWeekRecord {
            name: player_name,
            team: table.text(&record, row, team)?,
            gender,
            division: table.text(&record, row, division)?,
            position: table.text(&record, row, position)?,
            stats: CountingStats {
                matches_played: table.count(&record, row, matches_played)?,
                minutes_played: table.count(&record, row, minutes_played)?,
                goals: table.count(&record, row, goals)?,
                assists: table.count(&record, row, assists)?,
                shots: table.count(&record, row, shots)?,
                shots_on_target: table.count(&record, row, shots_on_target)?,
                yellow_cards: table.count(&record, row, yellow_cards)?,
                red_cards: table.count(&record, row, red_cards)?,
                saves: table.count(&record, row, saves)?,
                goals_against: table.count(&record, row, goals_against)?,
                fouls_won: table.count(&record, row, fouls_won)?,
            },
        });
    }

    Ok(WeeklySnapshot {
        week,
        gender,
        records,
    })
}

/// Parse a `matches_{week}.csv` snapshot. Scores and shot counts may be blank for unplayed games.
pub fn parse_match_snapshot<R: Read>(
    source_name: &str,
    week: WeekCode,
    input: R,
) -> Result<MatchSnapshot> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let table = Table::new(source_name, &mut reader)?;

    let gender = table.required("gender")?;
    let division = table.optional("division");
    let game_id = table.optional("game_id");
    let date = table.optional("date");
    let status = table.optional("status");
    let start_time = table.optional("start_time");
    let home_team_full = table.optional("home_team_full");
    let home_team_short = table.optional("home_team_short");
    let home_team_score = table.optional("home_team_score");
    let home_record = table.optional("home_record");
    let home_conference = table.optional("home_conference");
    let away_team_full = table.optional("away_team_full");
    let away_team_short = table.optional("away_team_short");
    let away_team_score = table.optional("away_team_score");
    let away_record = table.optional("away_record");
    let away_conference = table.optional("away_conference");
    let home_shots = table.optional("home_shots");
    let home_sot = table.optional("home_sot");
    let away_shots = table.optional("away_shots");
    let away_sot = table.optional("away_sot");

    let mut matches = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(source_name, e))?;
        let row = record_row(&record, index);

        let raw_gender = table.text(&record, row, gender)?;
        let gender: Gender = raw_gender
            .parse()
            .map_err(|reason: String| table.malformed(row, "gender", reason))?;

        matches.push(MatchRecord {
            gender,
            division: table.optional_text(&record, row, division)?,
            game_id: table.optional_text(&record, row, game_id)?,
            date: table.optional_text(&record, row, date)?,
            status: table.optional_text(&record, row, status)?,
            start_time: table.optional_text(&record, row, start_time)?,
            home_team_full: table.optional_text(&record, row, home_team_full)?,
            home_team_short: table.optional_text(&record, row, home_team_short)?,
            home_team_score: table.optional_count(&record, row, home_team_score)?,
            home_record: table.optional_text(&record, row, home_record)?,
            home_conference: table.optional_text(&record, row, home_conference)?,
            away_team_full: table.optional_text(&record, row, away_team_full)?,
            away_team_short: table.optional_text(&record, row, away_team_short)?,
            away_team_score: table.optional_count(&record, row, away_team_score)?,
            away_record: table.optional_text(&record, row, away_record)?,
            away_conference: table.optional_text(&record, row, away_conference)?,
            home_shots: table.optional_count(&record, row, home_shots)?,
            home_shots_on_target: table.optional_count(&record, row, home_sot)?,
            away_shots: table.optional_count(&record, row, away_shots)?,
            away_shots_on_target: table.optional_count(&record, row, away_sot)?,
        });
    }

    Ok(MatchSnapshot { week, matches })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Name,Team,Gender,Division,Matches Played,Minutes Played,Goals,Assists,Shots,Shots On Target,Yellow Cards,Red Cards,Saves,Goals Against,Fouls Won,Positions Seen,Dominant Position,Points";

    fn week() -> WeekCode {
        "20250824".parse().expect("valid week code")
    }

    #[test]
    fn parses_player_rows_with_float_counts() {
        let csv = format!(
            "{HEADER}\n\
             Alice Smith,Stanford,women,d1,2.0,180.0,3.0,1.0,7.0,4.0,0.0,0.0,0.0,0.0,2.0,\"F, M\",Forward,7.0\n\
             Bea Jones, UCLA ,women,d1,2,170,0,0,1,0,1,0,9,2,0,G,Goalkeeper,0\n"
        );
        let snapshot = parse_player_snapshot("womens_players_20250824.csv", Gender::Women, week(), csv.as_bytes())
            .expect("snapshot should parse");

        assert_eq!(snapshot.records.len(), 2);
        let alice = &snapshot.records[0];
        assert_eq!(alice.name, "Alice Smith");
        assert_eq!(alice.position, "Forward");
        assert_eq!(alice.stats.goals, 3);
        assert_eq!(alice.stats.minutes_played, 180);
        assert_eq!(alice.stats.fouls_won, 2);

        let bea = &snapshot.records[1];
        assert_eq!(bea.team, "UCLA");
        assert_eq!(bea.stats.saves, 9);
    }

    #[test]
    fn malformed_count_names_row_and_column() {
        let csv = format!(
            "{HEADER}\n\
             Alice,Stanford,women,d1,1,90,1,0,2,1,0,0,0,0,0,F,Forward,2\n\
             Bea,UCLA,women,d1,1,ninety,0,0,0,0,0,0,0,0,0,G,Goalkeeper,0\n"
        );
        let err = parse_player_snapshot("womens.csv", Gender::Women, week(), csv.as_bytes())
            .expect_err("non-numeric minutes should fail");

        match err {
            ScoutedError::MalformedRecord {
                source_name,
                row,
                column,
                ..
            } => {
                assert_eq!(source_name, "womens.csv");
                assert_eq!(row, 3);
                assert_eq!(column, COL_MINUTES_PLAYED);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_required_column_fails_at_header_row() {
        let csv = "Name,Team,Gender,Division,Dominant Position\nAlice,Stanford,women,d1,Forward\n";
        let err = parse_player_snapshot("womens.csv", Gender::Women, week(), csv.as_bytes())
            .expect_err("missing stat columns should fail");
        assert!(matches!(
            err,
            ScoutedError::MalformedRecord { row: 1, ref column, .. } if column == COL_MATCHES_PLAYED
        ));
    }

    #[test]
    fn rejects_rows_of_the_other_gender() {
        let csv = format!("{HEADER}\nAlex,Duke,men,d1,1,90,0,0,0,0,0,0,0,0,0,D,Defender,0\n");
        let err = parse_player_snapshot("womens.csv", Gender::Women, week(), csv.as_bytes())
            .expect_err("men row in women snapshot should fail");
        assert!(matches!(
            err,
            ScoutedError::MalformedRecord { row: 2, ref column, .. } if column == COL_GENDER
        ));
    }

    #[test]
    fn parse_count_accepts_whole_numbers_only() {
        assert_eq!(parse_count("4"), Ok(4));
        assert_eq!(parse_count(" 4.0 "), Ok(4));
        assert!(parse_count("").is_err());
        assert!(parse_count("-1").is_err());
        assert!(parse_count("2.5").is_err());
        assert!(parse_count("NaN").is_err());
        assert!(parse_count("inf").is_err());
    }

    #[test]
    fn parses_match_rows_with_blank_scores() {
        let csv = "gender,division,game_id,boxscore_id,date,status,start_time,home_team_full,home_team_short,home_team_score,home_record,home_conference,away_team_full,away_team_short,away_team_score,away_record,away_conference,home_shots,home_sot,away_shots,away_sot\n\
                   men,d1,1,11,08/21/2025,final,7:00PM ET,Duke Blue Devils,Duke,2.0,1-0,ACC,UNC Tar Heels,UNC,1.0,0-1,ACC,12,5,8,3\n\
                   women,d2,2,22,08/22/2025,pre,6:00PM ET,A,A,,0-0,GLIAC,B,B,,0-0,GLVC,,,,\n";
        let snapshot = parse_match_snapshot("matches_20250824.csv", week(), csv.as_bytes())
            .expect("match snapshot should parse");

        assert_eq!(snapshot.matches.len(), 2);
        let first = &snapshot.matches[0];
        assert_eq!(first.gender, Gender::Men);
        assert_eq!(first.home_team_score, Some(2));
        assert_eq!(first.away_shots_on_target, Some(3));
        let second = &snapshot.matches[1];
        assert_eq!(second.home_team_score, None);
        assert_eq!(second.home_shots, None);
        assert_eq!(second.away_conference, "GLVC");
    }

    #[test]
    fn match_score_garbage_is_malformed() {
        let csv = "gender,date,home_team_score,away_team_score\nmen,08/21/2025,two,1\n";
        let err = parse_match_snapshot("matches.csv", week(), csv.as_bytes())
            .expect_err("non-numeric score should fail");
        assert!(matches!(
            err,
            ScoutedError::MalformedRecord { row: 2, ref column, .. } if column == "home_team_score"
        ));
    }

    #[test]
    fn memory_source_reports_missing_weeks() {
        let source = MemorySource::new().with_players(WeeklySnapshot {
            week: week(),
            gender: Gender::Men,
            records: Vec::new(),
        });
        assert!(source.load_players(Gender::Men, week()).is_ok());
        let err = source
            .load_players(Gender::Women, week())
            .expect_err("women snapshot was never inserted");
        assert!(err.is_missing_snapshot());
        assert!(source.load_matches(week()).is_err());
    }
}
