//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`LeagueService`](crate::services::LeagueService). Body and query rejections
//! are reported as `INVALID_ARGUMENT`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::{
    HealthResponse, ListResponse, MatchListQuery, MatchPatch, MatchdayPatch, NewMatch,
    NewMatchday, NewPlayer, NewTeam, NewTournament, PlayerListQuery, PlayerPatch,
    RecalculateResponse, ScoreInput, ScoresBatch, ScoresBatchResult, StandingsByMatchdayRequest,
    StandingsQuery, StandingsResponse, TeamListQuery, TeamPatch, TournamentListQuery,
    TournamentPatch, WithId,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    LeagueId, Match, MatchId, Matchday, MatchdayId, Player, PlayerId, Team, TeamId, Tournament,
    TournamentId,
};
use crate::services::parse_matchday_param;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a document.
pub type CreatedResult<T> = Result<(StatusCode, Json<WithId<T>>), AppError>;

fn created<T>(doc: WithId<T>) -> (StatusCode, Json<WithId<T>>) {
    (StatusCode::CREATED, Json(doc))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.league.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Teams
// =============================================================================

/// GET /v1/leagues/{league_id}/teams
pub async fn list_teams(
    State(state): State<AppState>,
    Path(league): Path<LeagueId>,
    query: Result<Query<TeamListQuery>, QueryRejection>,
) -> HandlerResult<ListResponse<WithId<Team>>> {
    let Query(query) = query?;
    let ids = query.team_ids();
    let teams = state.league.list_teams(&league, ids.as_deref()).await?;
    Ok(Json(teams.into()))
}

/// POST /v1/leagues/{league_id}/teams
pub async fn create_team(
    State(state): State<AppState>,
    Path(league): Path<LeagueId>,
    body: Result<Json<NewTeam>, JsonRejection>,
) -> CreatedResult<Team> {
    let Json(input) = body?;
    Ok(created(state.league.create_team(&league, input).await?))
}

/// GET /v1/leagues/{league_id}/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    Path((league, team)): Path<(LeagueId, TeamId)>,
) -> HandlerResult<WithId<Team>> {
    Ok(Json(state.league.get_team(&league, &team).await?))
}

/// PATCH /v1/leagues/{league_id}/teams/{team_id}
pub async fn update_team(
    State(state): State<AppState>,
    Path((league, team)): Path<(LeagueId, TeamId)>,
    body: Result<Json<TeamPatch>, JsonRejection>,
) -> HandlerResult<WithId<Team>> {
    let Json(patch) = body?;
    Ok(Json(state.league.update_team(&league, &team, patch).await?))
}

/// DELETE /v1/leagues/{league_id}/teams/{team_id}
pub async fn delete_team(
    State(state): State<AppState>,
    Path((league, team)): Path<(LeagueId, TeamId)>,
) -> Result<StatusCode, AppError> {
    state.league.delete_team(&league, &team).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Players
// =============================================================================

/// GET /v1/leagues/{league_id}/players
pub async fn list_players(
    State(state): State<AppState>,
    Path(league): Path<LeagueId>,
    query: Result<Query<PlayerListQuery>, QueryRejection>,
) -> HandlerResult<ListResponse<WithId<Player>>> {
    let Query(query) = query?;
    let players = state
        .league
        .list_players(&league, query.team_id.as_ref())
        .await?;
    Ok(Json(players.into()))
}

/// POST /v1/leagues/{league_id}/players
pub async fn create_player(
    State(state): State<AppState>,
    Path(league): Path<LeagueId>,
    body: Result<Json<NewPlayer>, JsonRejection>,
) -> CreatedResult<Player> {
    let Json(input) = body?;
    Ok(created(state.league.create_player(&league, input).await?))
}

/// GET /v1/leagues/{league_id}/players/{player_id}
pub async fn get_player(
    State(state): State<AppState>,
    Path((league, player)): Path<(LeagueId, PlayerId)>,
) -> HandlerResult<WithId<Player>> {
    Ok(Json(state.league.get_player(&league, &player).await?))
}

/// PATCH /v1/leagues/{league_id}/players/{player_id}
pub async fn update_player(
    State(state): State<AppState>,
    Path((league, player)): Path<(LeagueId, PlayerId)>,
    body: Result<Json<PlayerPatch>, JsonRejection>,
) -> HandlerResult<WithId<Player>> {
    let Json(patch) = body?;
    Ok(Json(state.league.update_player(&league, &player, patch).await?))
}

/// DELETE /v1/leagues/{league_id}/players/{player_id}
pub async fn delete_player(
    State(state): State<AppState>,
    Path((league, player)): Path<(LeagueId, PlayerId)>,
) -> Result<StatusCode, AppError> {
    state.league.delete_player(&league, &player).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Tournaments
// =============================================================================

/// GET /v1/leagues/{league_id}/tournaments
pub async fn list_tournaments(
    State(state): State<AppState>,
    Path(league): Path<LeagueId>,
    query: Result<Query<TournamentListQuery>, QueryRejection>,
) -> HandlerResult<ListResponse<WithId<Tournament>>> {
    let Query(query) = query?;
    let tournaments = state.league.list_tournaments(&league, query.status).await?;
    Ok(Json(tournaments.into()))
}

/// POST /v1/leagues/{league_id}/tournaments
pub async fn create_tournament(
    State(state): State<AppState>,
    Path(league): Path<LeagueId>,
    body: Result<Json<NewTournament>, JsonRejection>,
) -> CreatedResult<Tournament> {
    let Json(input) = body?;
    Ok(created(state.league.create_tournament(&league, input).await?))
}

/// GET /v1/leagues/{league_id}/tournaments/{tournament_id}
pub async fn get_tournament(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
) -> HandlerResult<WithId<Tournament>> {
    Ok(Json(state.league.get_tournament(&league, &tournament).await?))
}

/// PATCH /v1/leagues/{league_id}/tournaments/{tournament_id}
pub async fn update_tournament(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
    body: Result<Json<TournamentPatch>, JsonRejection>,
) -> HandlerResult<WithId<Tournament>> {
    let Json(patch) = body?;
    Ok(Json(
        state
            .league
            .update_tournament(&league, &tournament, patch)
            .await?,
    ))
}

/// DELETE /v1/leagues/{league_id}/tournaments/{tournament_id}
pub async fn delete_tournament(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
) -> Result<StatusCode, AppError> {
    state.league.delete_tournament(&league, &tournament).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Matchdays
// =============================================================================

/// GET /v1/leagues/{league_id}/tournaments/{tournament_id}/matchdays
pub async fn list_matchdays(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
) -> HandlerResult<ListResponse<WithId<Matchday>>> {
    let matchdays = state.league.list_matchdays(&league, &tournament).await?;
    Ok(Json(matchdays.into()))
}

/// POST /v1/leagues/{league_id}/tournaments/{tournament_id}/matchdays
pub async fn create_matchday(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
    body: Result<Json<NewMatchday>, JsonRejection>,
) -> CreatedResult<Matchday> {
    let Json(input) = body?;
    Ok(created(
        state
            .league
            .create_matchday(&league, &tournament, input)
            .await?,
    ))
}

/// GET /v1/leagues/{league_id}/tournaments/{tournament_id}/matchdays/{matchday_id}
pub async fn get_matchday(
    State(state): State<AppState>,
    Path((league, tournament, matchday)): Path<(LeagueId, TournamentId, MatchdayId)>,
) -> HandlerResult<WithId<Matchday>> {
    Ok(Json(
        state
            .league
            .get_matchday(&league, &tournament, &matchday)
            .await?,
    ))
}

/// PATCH /v1/leagues/{league_id}/tournaments/{tournament_id}/matchdays/{matchday_id}
pub async fn update_matchday(
    State(state): State<AppState>,
    Path((league, tournament, matchday)): Path<(LeagueId, TournamentId, MatchdayId)>,
    body: Result<Json<MatchdayPatch>, JsonRejection>,
) -> HandlerResult<WithId<Matchday>> {
    let Json(patch) = body?;
    Ok(Json(
        state
            .league
            .update_matchday(&league, &tournament, &matchday, patch)
            .await?,
    ))
}

/// DELETE /v1/leagues/{league_id}/tournaments/{tournament_id}/matchdays/{matchday_id}
pub async fn delete_matchday(
    State(state): State<AppState>,
    Path((league, tournament, matchday)): Path<(LeagueId, TournamentId, MatchdayId)>,
) -> Result<StatusCode, AppError> {
    state
        .league
        .delete_matchday(&league, &tournament, &matchday)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Matches
// =============================================================================

/// GET /v1/leagues/{league_id}/tournaments/{tournament_id}/matches
pub async fn list_matches(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
    query: Result<Query<MatchListQuery>, QueryRejection>,
) -> HandlerResult<ListResponse<WithId<Match>>> {
    let Query(query) = query?;
    let matches = state
        .league
        .list_matches(&league, &tournament, query.matchday_id.as_ref())
        .await?;
    Ok(Json(matches.into()))
}

/// POST /v1/leagues/{league_id}/tournaments/{tournament_id}/matches
pub async fn create_match(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
    body: Result<Json<NewMatch>, JsonRejection>,
) -> CreatedResult<Match> {
    let Json(input) = body?;
    Ok(created(
        state.league.create_match(&league, &tournament, input).await?,
    ))
}

/// GET /v1/leagues/{league_id}/tournaments/{tournament_id}/matches/{match_id}
pub async fn get_match(
    State(state): State<AppState>,
    Path((league, tournament, id)): Path<(LeagueId, TournamentId, MatchId)>,
) -> HandlerResult<WithId<Match>> {
    Ok(Json(state.league.get_match(&league, &tournament, &id).await?))
}

/// PATCH /v1/leagues/{league_id}/tournaments/{tournament_id}/matches/{match_id}
pub async fn update_match(
    State(state): State<AppState>,
    Path((league, tournament, id)): Path<(LeagueId, TournamentId, MatchId)>,
    body: Result<Json<MatchPatch>, JsonRejection>,
) -> HandlerResult<WithId<Match>> {
    let Json(patch) = body?;
    Ok(Json(
        state
            .league
            .update_match(&league, &tournament, &id, patch)
            .await?,
    ))
}

/// PATCH /v1/leagues/{league_id}/tournaments/{tournament_id}/matches/{match_id}/score
pub async fn update_score(
    State(state): State<AppState>,
    Path((league, tournament, id)): Path<(LeagueId, TournamentId, MatchId)>,
    body: Result<Json<ScoreInput>, JsonRejection>,
) -> HandlerResult<WithId<Match>> {
    let Json(score) = body?;
    Ok(Json(
        state
            .league
            .update_score(&league, &tournament, &id, score)
            .await?,
    ))
}

/// PATCH /v1/leagues/{league_id}/tournaments/{tournament_id}/matches/scores-batch
pub async fn update_scores_batch(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
    body: Result<Json<ScoresBatch>, JsonRejection>,
) -> HandlerResult<ScoresBatchResult> {
    let Json(batch) = body?;
    Ok(Json(
        state
            .league
            .update_scores_batch(&league, &tournament, batch)
            .await?,
    ))
}

/// DELETE /v1/leagues/{league_id}/tournaments/{tournament_id}/matches/{match_id}
pub async fn delete_match(
    State(state): State<AppState>,
    Path((league, tournament, id)): Path<(LeagueId, TournamentId, MatchId)>,
) -> Result<StatusCode, AppError> {
    state.league.delete_match(&league, &tournament, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Standings
// =============================================================================

/// GET /v1/leagues/{league_id}/tournaments/{tournament_id}/standings
///
/// Persisted table, or the table as of `?matchday=N`.
pub async fn get_standings(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
    query: Result<Query<StandingsQuery>, QueryRejection>,
) -> HandlerResult<StandingsResponse> {
    let Query(query) = query?;
    let matchday = query
        .matchday
        .as_deref()
        .map(|raw| parse_matchday_param(Some(raw)))
        .transpose()?;
    let standings = state
        .league
        .standings(&league, &tournament, query.matchday.as_deref())
        .await?;
    Ok(Json(StandingsResponse {
        tournament_id: tournament,
        matchday,
        standings,
    }))
}

/// POST /v1/leagues/{league_id}/tournaments/{tournament_id}/standings/recalculate
pub async fn recalculate_standings(
    State(state): State<AppState>,
    Path((league, tournament)): Path<(LeagueId, TournamentId)>,
) -> HandlerResult<RecalculateResponse> {
    let written = state
        .league
        .recalculate_standings(&league, &tournament)
        .await?;
    Ok(Json(RecalculateResponse { written }))
}

/// POST /v1/standings/by-matchday
///
/// Callable form of the matchday-filtered standings query.
pub async fn standings_by_matchday(
    State(state): State<AppState>,
    body: Result<Json<StandingsByMatchdayRequest>, JsonRejection>,
) -> HandlerResult<StandingsResponse> {
    let Json(request) = body?;
    let standings = state
        .league
        .standings_as_of(
            &request.league_id,
            &request.tournament_id,
            request.matchday_number,
        )
        .await?;
    Ok(Json(StandingsResponse {
        tournament_id: request.tournament_id,
        matchday: Some(request.matchday_number),
        standings,
    }))
}
