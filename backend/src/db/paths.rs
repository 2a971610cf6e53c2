//! Document layout of a league.
//!
//! ```text
//! leagues/{league}/teams/{team}
//! leagues/{league}/players/{player}
//! leagues/{league}/tournaments/{tournament}
//! leagues/{league}/tournaments/{tournament}/matchdays/{matchday}
//! leagues/{league}/tournaments/{tournament}/matches/{match}
//! leagues/{league}/tournaments/{tournament}/standings/{team}
//! ```

use crate::api::{LeagueId, MatchId, MatchdayId, PlayerId, TeamId, TournamentId};
use crate::db::repository::{CollectionPath, DocumentPath, RepositoryResult};

fn collection(path: String) -> CollectionPath {
    // Built from id segments; malformed ids are rejected when a path is committed.
    CollectionPath::from_trusted(path)
}

pub fn teams(league: &LeagueId) -> CollectionPath {
    collection(format!("leagues/{}/teams", league))
}

pub fn team(league: &LeagueId, team: &TeamId) -> DocumentPath {
    teams(league).doc(team.as_str())
}

pub fn players(league: &LeagueId) -> CollectionPath {
    collection(format!("leagues/{}/players", league))
}

pub fn player(league: &LeagueId, player: &PlayerId) -> DocumentPath {
    players(league).doc(player.as_str())
}

pub fn tournaments(league: &LeagueId) -> CollectionPath {
    collection(format!("leagues/{}/tournaments", league))
}

pub fn tournament(league: &LeagueId, tournament: &TournamentId) -> DocumentPath {
    tournaments(league).doc(tournament.as_str())
}

pub fn matchdays(league: &LeagueId, tournament: &TournamentId) -> CollectionPath {
    collection(format!("leagues/{}/tournaments/{}/matchdays", league, tournament))
}

pub fn matchday(league: &LeagueId, tournament: &TournamentId, matchday: &MatchdayId) -> DocumentPath {
    matchdays(league, tournament).doc(matchday.as_str())
}

pub fn matches(league: &LeagueId, tournament: &TournamentId) -> CollectionPath {
    collection(format!("leagues/{}/tournaments/{}/matches", league, tournament))
}

pub fn match_doc(league: &LeagueId, tournament: &TournamentId, id: &MatchId) -> DocumentPath {
    matches(league, tournament).doc(id.as_str())
}

pub fn standings(league: &LeagueId, tournament: &TournamentId) -> CollectionPath {
    collection(format!("leagues/{}/tournaments/{}/standings", league, tournament))
}

pub fn standing(league: &LeagueId, tournament: &TournamentId, team: &TeamId) -> DocumentPath {
    standings(league, tournament).doc(team.as_str())
}

/// A document path recognised as part of the league layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaguePath {
    Team(LeagueId, TeamId),
    Player(LeagueId, PlayerId),
    Tournament(LeagueId, TournamentId),
    Matchday(LeagueId, TournamentId, MatchdayId),
    Match(LeagueId, TournamentId, MatchId),
    Standing(LeagueId, TournamentId, TeamId),
}

impl LeaguePath {
    /// Classify a document path; unknown layouts yield `None`.
    pub fn parse(path: &DocumentPath) -> Option<Self> {
        match path.segments().as_slice() {
            ["leagues", l, "teams", t] => Some(Self::Team((*l).into(), (*t).into())),
            ["leagues", l, "players", p] => Some(Self::Player((*l).into(), (*p).into())),
            ["leagues", l, "tournaments", t] => Some(Self::Tournament((*l).into(), (*t).into())),
            ["leagues", l, "tournaments", t, "matchdays", md] => {
                Some(Self::Matchday((*l).into(), (*t).into(), (*md).into()))
            }
            ["leagues", l, "tournaments", t, "matches", m] => {
                Some(Self::Match((*l).into(), (*t).into(), (*m).into()))
            }
            ["leagues", l, "tournaments", t, "standings", team] => {
                Some(Self::Standing((*l).into(), (*t).into(), (*team).into()))
            }
            _ => None,
        }
    }
}

/// Reject ids that would break the path layout.
pub fn check_id(kind: &str, id: &str) -> RepositoryResult<()> {
    if id.is_empty() || id.contains('/') {
        return Err(crate::db::repository::RepositoryError::validation(format!(
            "invalid {} id '{}'",
            kind, id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_league_layout() {
        let l = LeagueId::new("l1");
        let t = TournamentId::new("t1");
        assert_eq!(team(&l, &TeamId::new("a")).as_str(), "leagues/l1/teams/a");
        assert_eq!(
            standing(&l, &t, &TeamId::new("a")).as_str(),
            "leagues/l1/tournaments/t1/standings/a"
        );
        assert_eq!(matches(&l, &t).as_str(), "leagues/l1/tournaments/t1/matches");
    }

    #[test]
    fn test_parse_round_trips_match_and_team_paths() {
        let l = LeagueId::new("l1");
        let t = TournamentId::new("t1");
        let m = MatchId::new("m9");
        assert_eq!(
            LeaguePath::parse(&match_doc(&l, &t, &m)),
            Some(LeaguePath::Match(l.clone(), t.clone(), m))
        );
        assert_eq!(
            LeaguePath::parse(&team(&l, &TeamId::new("a"))),
            Some(LeaguePath::Team(l, TeamId::new("a")))
        );
    }

    #[test]
    fn test_check_id_rejects_slashes() {
        assert!(check_id("team", "a/b").is_err());
        assert!(check_id("team", "").is_err());
        assert!(check_id("team", "hawks").is_ok());
    }
}
