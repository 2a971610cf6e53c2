//! Read side of the league table: input loading shared with the persisted
//! recompute, the matchday-filtered query, and the persisted-table read.

use serde_json::Value;
use std::collections::HashMap;

use super::error::{ServiceError, ServiceResult};
use super::standings::{compute_standings, rank_standings, CompletedMatch, StandingRow, TeamInfo};
use crate::api::{LeagueId, Match, MatchStatus, Standing, Team, TeamId, Tournament, TournamentId};
use crate::db::repository::{Direction, DocumentStore, FieldPath, Query};
use crate::db::services::{decode_with_id, get_typed, query_in_chunks};
use crate::db::paths;
use crate::models::fields;

/// Display info for every resolvable team in `team_ids`.
///
/// Ids without a team document, or whose document does not decode, are absent
/// from the map.
pub async fn load_team_info(
    store: &dyn DocumentStore,
    league: &LeagueId,
    team_ids: &[TeamId],
) -> ServiceResult<HashMap<TeamId, TeamInfo>> {
    let ids: Vec<Value> = team_ids
        .iter()
        .map(|id| Value::String(id.as_str().to_string()))
        .collect();
    let docs = query_in_chunks(store, &paths::teams(league), FieldPath::DocumentId, ids).await?;

    let mut info = HashMap::with_capacity(docs.len());
    for doc in docs {
        match decode_with_id::<Team>(&doc) {
            Ok(team) => {
                info.insert(
                    TeamId::new(team.id),
                    TeamInfo::new(team.data.name, team.data.logo, Some(team.data.color)),
                );
            }
            Err(e) => tracing::debug!(path = %doc.path, error = %e, "unreadable team skipped"),
        }
    }
    Ok(info)
}

/// Completed matches of a tournament, optionally up to a matchday number.
pub async fn load_completed_matches(
    store: &dyn DocumentStore,
    league: &LeagueId,
    tournament: &TournamentId,
    cutoff: Option<i64>,
) -> ServiceResult<Vec<CompletedMatch>> {
    let mut query = Query::collection(paths::matches(league, tournament))
        .where_eq(fields::STATUS, MatchStatus::Completed.as_str());
    if let Some(cutoff) = cutoff {
        query = query.where_lte(fields::MATCHDAY_NUMBER, cutoff);
    }

    let docs = store.query(&query).await?;
    let matches = docs
        .iter()
        .filter_map(|doc| match doc.decode::<Match>() {
            Ok(m) => CompletedMatch::from_match(&m).or_else(|| {
                tracing::debug!(path = %doc.path, "completed match without scores skipped");
                None
            }),
            Err(e) => {
                tracing::debug!(path = %doc.path, error = %e, "unreadable match skipped");
                None
            }
        })
        .collect();
    Ok(matches)
}

/// Compute a tournament's table from the store.
///
/// Returns `Ok(None)` when the tournament document does not exist.
pub async fn compute_tournament_table(
    store: &dyn DocumentStore,
    league: &LeagueId,
    tournament_id: &TournamentId,
    cutoff: Option<i64>,
) -> ServiceResult<Option<Vec<StandingRow>>> {
    let Some(tournament) =
        get_typed::<Tournament>(store, &paths::tournament(league, tournament_id)).await?
    else {
        return Ok(None);
    };
    let tournament = tournament.data;

    let (matches, team_info) = futures::try_join!(
        load_completed_matches(store, league, tournament_id, cutoff),
        load_team_info(store, league, &tournament.team_ids),
    )?;

    Ok(Some(compute_standings(
        &matches,
        &tournament.team_ids,
        &team_info,
        &tournament.points_policy(),
    )))
}

/// The table as it stood after matchday `cutoff`. Nothing is persisted.
pub async fn standings_as_of_matchday(
    store: &dyn DocumentStore,
    league: &LeagueId,
    tournament: &TournamentId,
    cutoff: i64,
) -> ServiceResult<Vec<StandingRow>> {
    compute_tournament_table(store, league, tournament, Some(cutoff))
        .await?
        .ok_or_else(|| ServiceError::not_found("tournament", tournament))
}

/// Parse the `matchday` request parameter.
pub fn parse_matchday_param(raw: Option<&str>) -> ServiceResult<i64> {
    let raw = raw.ok_or_else(|| ServiceError::invalid("matchday is required"))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::invalid(format!("matchday must be an integer, got '{}'", raw)))
}

/// The persisted table, ranked at read time.
pub async fn read_persisted_standings(
    store: &dyn DocumentStore,
    league: &LeagueId,
    tournament: &TournamentId,
) -> ServiceResult<Vec<StandingRow>> {
    let query = Query::collection(paths::standings(league, tournament))
        .order_by(fields::POINTS, Direction::Descending)
        .order_by(fields::SCORE_DIFFERENCE, Direction::Descending)
        .order_by(fields::SCORE_FOR, Direction::Descending);

    let rows = store
        .query(&query)
        .await?
        .iter()
        .map(|doc| doc.decode::<Standing>().map(StandingRow::from))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rank_standings(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matchday_param() {
        assert_eq!(parse_matchday_param(Some("3")).unwrap(), 3);
        assert_eq!(parse_matchday_param(Some(" 12 ")).unwrap(), 12);
        assert_eq!(parse_matchday_param(Some("0")).unwrap(), 0);
        assert!(matches!(
            parse_matchday_param(Some("abc")),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_matchday_param(Some("2.5")),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_matchday_param(None),
            Err(ServiceError::InvalidArgument(_))
        ));
    }
}
