use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::CumulativePlayerRecord;
use crate::colors::position_color;
use crate::derived::{DerivedStats, PointsFormula};
use crate::error::{Result, ScoutedError};
use crate::record::Gender;
use crate::week::WeekCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Name,
    Team,
    Gender,
    Division,
    Position,
    MatchesPlayed,
    MinutesPlayed,
    Goals,
    Assists,
    Shots,
    ShotsOnTarget,
    YellowCards,
    RedCards,
    Saves,
    GoalsAgainst,
    FoulsWon,
    WeeksPlayed,
    Points,
    #[serde(rename = "goals_per_90")]
    GoalsPer90,
    #[serde(rename = "assists_per_90")]
    AssistsPer90,
    ShotAccuracy,
    SavePercentage,
}

impl SortColumn {
    pub const ALL: [SortColumn; 22] = [
        SortColumn::Name,
        SortColumn::Team,
        SortColumn::Gender,
        SortColumn::Division,
        SortColumn::Position,
        SortColumn::MatchesPlayed,
        SortColumn::MinutesPlayed,
        SortColumn::Goals,
        SortColumn::Assists,
        SortColumn::Shots,
        SortColumn::ShotsOnTarget,
        SortColumn::YellowCards,
        SortColumn::RedCards,
        SortColumn::Saves,
        SortColumn::GoalsAgainst,
        SortColumn::FoulsWon,
        SortColumn::WeeksPlayed,
        SortColumn::Points,
        SortColumn::GoalsPer90,
        SortColumn::AssistsPer90,
        SortColumn::ShotAccuracy,
        SortColumn::SavePercentage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Team => "team",
            Self::Gender => "gender",
            Self::Division => "division",
            Self::Position => "position",
            Self::MatchesPlayed => "matches_played",
            Self::MinutesPlayed => "minutes_played",
            Self::Goals => "goals",
            Self::Assists => "assists",
            Self::Shots => "shots",
            Self::ShotsOnTarget => "shots_on_target",
            Self::YellowCards => "yellow_cards",
            Self::RedCards => "red_cards",
            Self::Saves => "saves",
            Self::GoalsAgainst => "goals_against",
            Self::FoulsWon => "fouls_won",
            Self::WeeksPlayed => "weeks_played",
            Self::Points => "points",
            Self::GoalsPer90 => "goals_per_90",
            Self::AssistsPer90 => "assists_per_90",
            Self::ShotAccuracy => "shot_accuracy",
            Self::SavePercentage => "save_percentage",
        }
    }

    /// Column header as written in the snapshot CSVs and shown in the table.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Team => "Team",
            Self::Gender => "Gender",
            Self::Division => "Division",
            Self::Position => "Dominant Position",
            Self::MatchesPlayed => "Matches Played",
            Self::MinutesPlayed => "Minutes Played",
            Self::Goals => "Goals",
            Self::Assists => "Assists",
            Self::Shots => "Shots",
            Self::ShotsOnTarget => "Shots On Target",
            Self::YellowCards => "Yellow Cards",
            Self::RedCards => "Red Cards",
            Self::Saves => "Saves",
            Self::GoalsAgainst => "Goals Against",
            Self::FoulsWon => "Fouls Won",
            Self::WeeksPlayed => "Weeks Played",
            Self::Points => "Points",
            Self::GoalsPer90 => "Goals Per 90",
            Self::AssistsPer90 => "Assists Per 90",
            Self::ShotAccuracy => "Shot Accuracy",
            Self::SavePercentage => "Save Percentage",
        }
    }

    fn value(self, row: &LeaderboardRow) -> SortValue<'_> {
        let stats = &row.player.stats;
        match self {
            Self::Name => SortValue::Text(&row.player.name),
            Self::Team => SortValue::Text(&row.player.team),
            Self::Gender => SortValue::Text(row.player.gender.as_str()),
            Self::Division => SortValue::Text(&row.player.division),
            Self::Position => SortValue::Text(&row.player.position),
            Self::MatchesPlayed => SortValue::Count(stats.matches_played),
            Self::MinutesPlayed => SortValue::Count(stats.minutes_played),
            Self::Goals => SortValue::Count(stats.goals),
            Self::Assists => SortValue::Count(stats.assists),
            Self::Shots => SortValue::Count(stats.shots),
            Self::ShotsOnTarget => SortValue::Count(stats.shots_on_target),
            Self::YellowCards => SortValue::Count(stats.yellow_cards),
            Self::RedCards => SortValue::Count(stats.red_cards),
            Self::Saves => SortValue::Count(stats.saves),
            Self::GoalsAgainst => SortValue::Count(stats.goals_against),
            Self::FoulsWon => SortValue::Count(stats.fouls_won),
            Self::WeeksPlayed => SortValue::Count(row.player.weeks_played),
            Self::Points => SortValue::Count(row.derived.points),
            Self::GoalsPer90 => SortValue::Rate(row.derived.goals_per_90),
            Self::AssistsPer90 => SortValue::Rate(row.derived.assists_per_90),
            Self::ShotAccuracy => SortValue::Rate(row.derived.shot_accuracy),
            Self::SavePercentage => SortValue::Rate(row.derived.save_percentage),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SortColumn {
    type Err = ScoutedError;

    /// Accepts the snake_case key or the CSV header spelling.
    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.key() == raw || column.label() == raw)
            .ok_or_else(|| ScoutedError::invalid(format!("unknown sort column '{raw}'")))
    }
}

enum SortValue<'a> {
    Text(&'a str),
    Count(u32),
    Rate(f64),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Count(a), Self::Count(b)) => a.cmp(b),
            (Self::Rate(a), Self::Rate(b)) => a.total_cmp(b),
            // A column always yields one variant.
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = ScoutedError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ScoutedError::invalid(format!(
                "unknown sort direction '{raw}' (expected 'asc' or 'desc')"
            ))),
        }
    }
}

/// `all` and blank values mean "no restriction".
pub(crate) fn restriction(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(value.to_owned())
    }
}

/// Exact-match (case-sensitive) filters plus a case-insensitive name search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilters {
    pub position: Option<String>,
    pub team: Option<String>,
    pub division: Option<String>,
    pub search: Option<String>,
}

impl ViewFilters {
    /// Record predicate for these filters. The search needle is lowercased once here.
    pub fn matcher(&self) -> impl Fn(&CumulativePlayerRecord) -> bool + '_ {
        fn field_matches(filter: Option<&str>, value: &str) -> bool {
            filter.is_none_or(|expected| expected == value)
        }

        let needle = self.search.as_deref().map(str::to_lowercase);
        move |player: &CumulativePlayerRecord| {
            field_matches(self.position.as_deref(), &player.position)
                && field_matches(self.team.as_deref(), &player.team)
                && field_matches(self.division.as_deref(), &player.division)
                && needle
                    .as_deref()
                    .is_none_or(|needle| player.name.to_lowercase().contains(needle))
        }
    }
}

/// Defaults applied to parameters the caller left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDefaults {
    pub gender: Gender,
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        Self {
            gender: Gender::Men,
            page_size: 50,
            max_page_size: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRequest {
    /// `None` selects the most recent week.
    pub week: Option<WeekCode>,
    /// The gender whose snapshots this request reads.
    pub gender: Gender,
    pub filters: ViewFilters,
    pub sort: SortColumn,
    pub direction: SortDirection,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl ViewRequest {
    pub fn new(defaults: ViewDefaults) -> Self {
        Self {
            week: None,
            gender: defaults.gender,
            filters: ViewFilters::default(),
            sort: SortColumn::Points,
            direction: SortDirection::Desc,
            page: 1,
            page_size: defaults.page_size,
        }
    }

    /// Build a request from raw query pairs.
    ///
    /// Unknown parameter names and unparseable values are rejected rather than replaced
    /// by defaults. `all` or a blank value for a filter means "no restriction".
    pub fn from_params<'a, I>(params: I, defaults: ViewDefaults) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::new(defaults);
        for (name, value) in params {
            match name {
                "week" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        request.week = Some(value.parse().map_err(|e| {
                            ScoutedError::invalid(format!("invalid week: {e}"))
                        })?);
                    }
                }
                "gender" => {
                    request.gender = value.parse().map_err(ScoutedError::InvalidViewRequest)?;
                }
                "position" => request.filters.position = restriction(value),
                "team" => request.filters.team = restriction(value),
                "division" => request.filters.division = restriction(value),
                "search" => {
                    let value = value.trim();
                    request.filters.search = (!value.is_empty()).then(|| value.to_owned());
                }
                "sort" => request.sort = value.parse()?,
                "order" => request.direction = value.parse()?,
                "page" => request.page = parse_positive(name, value)?,
                "page_size" => {
                    let size = parse_positive(name, value)?;
                    if size > defaults.max_page_size {
                        return Err(ScoutedError::invalid(format!(
                            "page_size {size} exceeds the maximum of {}",
                            defaults.max_page_size
                        )));
                    }
                    request.page_size = size;
                }
                other => {
                    return Err(ScoutedError::invalid(format!(
                        "unknown view parameter '{other}'"
                    )));
                }
            }
        }
        Ok(request)
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(parsed) if parsed >= 1 => Ok(parsed),
        _ => Err(ScoutedError::invalid(format!(
            "{name} must be a positive integer, found '{value}'"
        ))),
    }
}

/// A leaderboard line: summed counts, derived stats and the position badge class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    #[serde(flatten)]
    pub player: CumulativePlayerRecord,
    #[serde(flatten)]
    pub derived: DerivedStats,
    pub position_color: String,
}

impl LeaderboardRow {
    pub fn new(player: &CumulativePlayerRecord, formula: PointsFormula) -> Self {
        Self {
            player: player.clone(),
            derived: player.derived(formula),
            position_color: position_color(&player.position).to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    pub rows: Vec<LeaderboardRow>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

impl ViewResult {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            rows: Vec::new(),
            total_count: 0,
            total_pages: 1,
            page,
            page_size,
        }
    }
}

/// Distinct dropdown values of the unfiltered table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub teams: Vec<String>,
    pub positions: Vec<String>,
    pub divisions: Vec<String>,
}

impl FilterOptions {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CumulativePlayerRecord>,
    {
        let mut teams = BTreeSet::new();
        let mut positions = BTreeSet::new();
        let mut divisions = BTreeSet::new();
        for record in records {
            teams.insert(record.team.as_str());
            positions.insert(record.position.as_str());
            divisions.insert(record.division.as_str());
        }
        let owned = |set: BTreeSet<&str>| set.into_iter().map(str::to_owned).collect();
        Self {
            teams: owned(teams),
            positions: owned(positions),
            divisions: owned(divisions),
        }
    }
}

/// Requested column first, then name, team and gender ascending whatever the direction.
fn cmp_rows(
    a: &LeaderboardRow,
    b: &LeaderboardRow,
    column: SortColumn,
    direction: SortDirection,
) -> Ordering {
    let primary = column.value(a).compare(&column.value(b));
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary
        .then_with(|| a.player.name.cmp(&b.player.name))
        .then_with(|| a.player.team.cmp(&b.player.team))
        .then_with(|| a.player.gender.cmp(&b.player.gender))
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Filter, sort and slice one page out of the aggregated records.
pub fn apply_view<'a, I>(records: I, request: &ViewRequest, formula: PointsFormula) -> ViewResult
where
    I: IntoIterator<Item = &'a CumulativePlayerRecord>,
{
    let matches = request.filters.matcher();
    let mut rows: Vec<LeaderboardRow> = records
        .into_iter()
        .filter(|record| matches(record))
        .map(|record| LeaderboardRow::new(record, formula))
        .collect();

    rows.sort_by(|a, b| cmp_rows(a, b, request.sort, request.direction));

    let page_size = request.page_size.max(1);
    let page = request.page.max(1);
    let total_count = rows.len();
    let offset = (page - 1).saturating_mul(page_size);
    let rows = if offset >= total_count {
        Vec::new()
    } else {
        rows.into_iter().skip(offset).take(page_size).collect()
    };

    ViewResult {
        rows,
        total_count,
        total_pages: total_pages(total_count, page_size),
        page,
        page_size,
    }
}
