//! Service layer for league business logic.
//!
//! This module sits between the HTTP handlers and the document store. The
//! standings calculator is pure; everything else talks to storage through
//! [`DocumentStore`](crate::db::DocumentStore) and reports failures as
//! [`ServiceError`].

pub mod error;
pub mod inputs;
pub mod league;
pub mod propagation;
pub mod standings;
pub mod standings_query;
pub mod standings_trigger;
pub mod triggers;

pub use error::{ServiceError, ServiceResult};
pub use inputs::{
    MatchPatch, MatchScore, MatchdayPatch, NewMatch, NewMatchday, NewPlayer, NewTeam,
    NewTournament, PlayerPatch, ScoreInput, ScoresBatch, ScoresBatchResult, TeamPatch,
    TournamentPatch, MAX_SCORE,
};
pub use league::LeagueService;
pub use propagation::{propagate_team_changes, TeamChange};
pub use standings::{compute_standings, rank_standings, CompletedMatch, StandingRow, TeamInfo};
pub use standings_query::{
    compute_tournament_table, parse_matchday_param, read_persisted_standings,
    standings_as_of_matchday,
};
pub use standings_trigger::recalculate_standings;
pub use triggers::{route_changes, DispatchReport, TriggerDispatcher, TriggerEvent, TriggerMode};
