//! Public API surface for the league backend.
//!
//! This file consolidates the identifier types and the stored document shapes.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::{
    Match, MatchStatus, Matchday, MatchdayStatus, Player, PointsPolicy, Standing, Team,
    Tournament, TournamentStatus,
};
pub use crate::services::standings::{CompletedMatch, StandingRow, TeamInfo};

use serde::{Deserialize, Serialize};

crate::define_id_type!(LeagueId);
crate::define_id_type!(TeamId);
crate::define_id_type!(PlayerId);
crate::define_id_type!(TournamentId);
crate::define_id_type!(MatchdayId);
crate::define_id_type!(MatchId);

/// A stored document paired with its id, the shape returned by list/get endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithId<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T> WithId<T> {
    pub fn new(id: impl Into<String>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}
