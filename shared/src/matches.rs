use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutedError};
use crate::record::Gender;
use crate::snapshot::MatchSnapshot;
use crate::view::restriction;

const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%m-%d-%Y", "%Y-%m-%d"];

/// One scoreboard row. Scores and shot counts are absent until the match has been played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub gender: Gender,
    pub division: String,
    pub game_id: String,
    pub date: String,
    pub status: String,
    pub start_time: String,
    pub home_team_full: String,
    pub home_team_short: String,
    pub home_team_score: Option<u32>,
    pub home_record: String,
    pub home_conference: String,
    pub away_team_full: String,
    pub away_team_short: String,
    pub away_team_score: Option<u32>,
    pub away_record: String,
    pub away_conference: String,
    pub home_shots: Option<u32>,
    pub home_shots_on_target: Option<u32>,
    pub away_shots: Option<u32>,
    pub away_shots_on_target: Option<u32>,
}

impl MatchRecord {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_match_date(&self.date)
    }

    fn involves_conference(&self, conference: &str) -> bool {
        self.home_conference == conference || self.away_conference == conference
    }
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Score as rendered on the scoreboard: `-` until a score exists.
pub fn clean_score(score: Option<u32>) -> String {
    score.map_or_else(|| "-".to_owned(), |value| value.to_string())
}

fn display_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value.to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    pub gender: Gender,
    pub division: Option<String>,
    pub conference: Option<String>,
}

impl MatchRequest {
    /// Build a request from raw query pairs. Unknown parameter names are rejected.
    pub fn from_params<'a, I>(params: I, default_gender: Gender) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self {
            gender: default_gender,
            division: None,
            conference: None,
        };
        for (name, value) in params {
            match name {
                "gender" => {
                    request.gender = value.parse().map_err(ScoutedError::InvalidViewRequest)?;
                }
                "division" => request.division = restriction(value),
                "conference" => request.conference = restriction(value),
                other => {
                    return Err(ScoutedError::invalid(format!(
                        "unknown match filter '{other}'"
                    )));
                }
            }
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRow {
    pub home_team_short: String,
    pub away_team_short: String,
    pub home_team_score: String,
    pub away_team_score: String,
    pub home_conference: String,
    pub away_conference: String,
    pub division: String,
    pub status: String,
    pub start_time: String,
}

impl From<&MatchRecord> for MatchRow {
    fn from(record: &MatchRecord) -> Self {
        Self {
            home_team_short: display_or(&record.home_team_short, "N/A"),
            away_team_short: display_or(&record.away_team_short, "N/A"),
            home_team_score: clean_score(record.home_team_score),
            away_team_score: clean_score(record.away_team_score),
            home_conference: record.home_conference.clone(),
            away_conference: record.away_conference.clone(),
            division: record.division.clone(),
            status: record.status.clone(),
            start_time: record.start_time.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDay {
    pub date: String,
    pub matches: Vec<MatchRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub gender: Gender,
    pub days: Vec<MatchDay>,
    pub divisions: Vec<String>,
    pub conferences: Vec<String>,
    pub total_matches: usize,
}

/// Most recent first; unparseable dates sort after every real date.
fn cmp_by_date_desc(a: &MatchRecord, b: &MatchRecord) -> Ordering {
    match (a.parsed_date(), b.parsed_date()) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.date.cmp(&a.date),
    }
}

/// Filter, sort and group every supplied week's matches for display.
pub fn build_match_view(snapshots: &[MatchSnapshot], request: &MatchRequest) -> MatchView {
    let mut records: Vec<&MatchRecord> = snapshots
        .iter()
        .flat_map(|snapshot| snapshot.matches.iter())
        .filter(|record| record.gender == request.gender)
        .collect();

    let divisions: BTreeSet<&str> = records
        .iter()
        .map(|record| record.division.as_str())
        .filter(|division| !division.is_empty())
        .collect();
    let conferences: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| [record.home_conference.as_str(), record.away_conference.as_str()])
        .filter(|conference| !conference.is_empty())
        .collect();
    let divisions: Vec<String> = divisions.into_iter().map(str::to_owned).collect();
    let conferences: Vec<String> = conferences.into_iter().map(str::to_owned).collect();

    if let Some(division) = request.division.as_deref() {
        records.retain(|record| record.division == division);
    }
    if let Some(conference) = request.conference.as_deref() {
        records.retain(|record| record.involves_conference(conference));
    }

    // Stable sort keeps file order within a day.
    records.sort_by(|a, b| cmp_by_date_desc(a, b));

    let total_matches = records.len();
    let mut days: Vec<MatchDay> = Vec::new();
    let mut current: Option<MatchDay> = None;
    for record in records {
        let date = display_or(&record.date, "Unknown Date");
        match current.as_mut() {
            Some(day) if day.date == date => {
                day.matches.push(MatchRow::from(record));
                continue;
            }
            _ => {}
        }
        if let Some(day) = current.replace(MatchDay {
            date,
            matches: vec![MatchRow::from(record)],
        }) {
            days.push(day);
        }
    }
    days.extend(current);

    MatchView {
        gender: request.gender,
        days,
        divisions,
        conferences,
        total_matches,
    }
}
