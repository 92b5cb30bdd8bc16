use axum::Json;
use axum::extract::{Path, Query, State};
use scouted_shared::error::Result as ScoutedResult;
use scouted_shared::{
    FilterOptions, Gender, LeaderboardRow, MatchRequest, MatchSnapshot, MatchView, ScoutedError,
    SnapshotSource, SortColumn, SortDirection, ViewRequest, ViewResult, WeekCode, WeekInfo,
    apply_view, build_match_view,
};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::ApiError;
use crate::state::AppState;

type QueryPairs = Vec<(String, String)>;

fn pairs(params: &QueryPairs) -> impl Iterator<Item = (&str, &str)> {
    params
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
}

/// Requested week, or the gender's most recent week when none was given.
fn resolve_week(
    catalog: &Catalog,
    gender: Gender,
    requested: Option<WeekCode>,
) -> Option<WeekCode> {
    requested.or_else(|| catalog.player_weeks(gender).last().copied())
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalog = state.catalog().await;
    Json(serde_json::json!({
        "status": "ok",
        "weeks": catalog.weeks().len(),
        "snapshot_files": catalog.file_count(),
        "data_version": format!("{:08x}", catalog.version()),
        "scanned_at": catalog.scanned_at().to_rfc3339(),
        "cached_leaderboards": state.cache.len(),
    }))
}

pub async fn get_weeks(State(state): State<AppState>) -> Json<Vec<WeekInfo>> {
    Json(state.catalog().await.week_infos())
}

#[derive(Debug, Serialize)]
pub struct PlayersResponse {
    /// `None` only when no week has data for the gender.
    pub week: Option<WeekInfo>,
    pub gender: Gender,
    pub sort: SortColumn,
    pub order: SortDirection,
    #[serde(flatten)]
    pub result: ViewResult,
    pub filters: FilterOptions,
}

pub async fn get_players(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<PlayersResponse>, ApiError> {
    let request = ViewRequest::from_params(pairs(&params), state.settings.view_defaults)?;
    let gender = request.gender;
    let catalog = state.catalog().await;

    let Some(week) = resolve_week(&catalog, gender, request.week) else {
        return Ok(Json(PlayersResponse {
            week: None,
            gender,
            sort: request.sort,
            order: request.direction,
            result: ViewResult::empty(request.page, request.page_size),
            filters: FilterOptions::default(),
        }));
    };

    let leaderboard = state.leaderboard(catalog, gender, week).await?;
    let result = apply_view(leaderboard.records(), &request, state.settings.points);

    Ok(Json(PlayersResponse {
        week: Some(WeekInfo::from(week)),
        gender,
        sort: request.sort,
        order: request.direction,
        result,
        filters: FilterOptions::from_records(leaderboard.records()),
    }))
}

#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub week: WeekInfo,
    pub player: LeaderboardRow,
}

fn parse_player_params<'a, I>(
    params: I,
    default_gender: Gender,
) -> ScoutedResult<(Option<WeekCode>, Gender)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut week = None;
    let mut gender = default_gender;
    for (name, value) in params {
        match name {
            "week" if value.trim().is_empty() => week = None,
            "week" => {
                week = Some(
                    value
                        .parse()
                        .map_err(|e| ScoutedError::invalid(format!("invalid week: {e}")))?,
                );
            }
            "gender" => gender = value.parse().map_err(ScoutedError::InvalidViewRequest)?,
            other => {
                return Err(ScoutedError::invalid(format!(
                    "unknown player parameter '{other}'"
                )));
            }
        }
    }
    Ok((week, gender))
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<PlayerResponse>, ApiError> {
    let (requested, gender) =
        parse_player_params(pairs(&params), state.settings.default_gender())?;
    let catalog = state.catalog().await;
    let Some(week) = resolve_week(&catalog, gender, requested) else {
        return Err(ApiError::PlayerNotFound(name));
    };

    let leaderboard = state.leaderboard(catalog, gender, week).await?;
    let player = leaderboard
        .find_by_name(name.trim())
        .ok_or_else(|| ApiError::PlayerNotFound(name.clone()))?;

    Ok(Json(PlayerResponse {
        week: WeekInfo::from(week),
        player: LeaderboardRow::new(player, state.settings.points),
    }))
}

pub async fn get_matches(
    State(state): State<AppState>,
    Query(params): Query<QueryPairs>,
) -> Result<Json<MatchView>, ApiError> {
    let request = MatchRequest::from_params(pairs(&params), state.settings.default_gender())?;
    let catalog = state.catalog().await;

    let view = tokio::task::spawn_blocking(move || -> ScoutedResult<MatchView> {
        let snapshots = catalog
            .match_weeks()
            .into_iter()
            .map(|week| catalog.load_matches(week))
            .collect::<ScoutedResult<Vec<MatchSnapshot>>>()?;
        Ok(build_match_view(&snapshots, &request))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("match view failed: {e}")))??;

    Ok(Json(view))
}
