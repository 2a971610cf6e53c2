//! Data Transfer Objects for the HTTP API.
//!
//! Request bodies for writes are the service input types, re-exported here.
//! Stored documents go out as `WithId<T>`, the document fields plus its `id`.

use serde::{Deserialize, Serialize};

pub use crate::api::{StandingRow, WithId};
pub use crate::services::{
    MatchPatch, MatchdayPatch, NewMatch, NewMatchday, NewPlayer, NewTeam, NewTournament,
    PlayerPatch, ScoreInput, ScoresBatch, ScoresBatchResult, TeamPatch, TournamentPatch,
};

use crate::api::{LeagueId, MatchdayId, TeamId, TournamentId, TournamentStatus};

/// Query parameters for the team list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TeamListQuery {
    /// Comma-separated team ids (optional)
    #[serde(default)]
    pub ids: Option<String>,
}

impl TeamListQuery {
    /// Parsed `ids`, ignoring empty entries.
    pub fn team_ids(&self) -> Option<Vec<TeamId>> {
        self.ids.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(TeamId::from)
                .collect()
        })
    }
}

/// Query parameters for the player list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerListQuery {
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

/// Query parameters for the tournament list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TournamentListQuery {
    #[serde(default)]
    pub status: Option<TournamentStatus>,
}

/// Query parameters for the match list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MatchListQuery {
    #[serde(default)]
    pub matchday_id: Option<MatchdayId>,
}

/// Query parameters for the standings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StandingsQuery {
    /// Matchday cutoff; kept raw so a non-integer is reported as INVALID_ARGUMENT
    #[serde(default)]
    pub matchday: Option<String>,
}

/// Body of the callable matchday-filtered standings query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsByMatchdayRequest {
    pub league_id: LeagueId,
    pub tournament_id: TournamentId,
    pub matchday_number: i64,
}

/// A ranked league table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub tournament_id: TournamentId,
    /// Cutoff the table was computed for; absent for the persisted table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchday: Option<i64>,
    pub standings: Vec<StandingRow>,
}

/// Result of a manual standings rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculateResponse {
    /// Standings documents written or pruned
    pub written: usize,
}

/// List response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    /// Total count
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Store connection status
    pub database: String,
}
