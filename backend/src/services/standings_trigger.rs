//! Persisted standings recompute, run after any match write.

use std::collections::HashSet;

use super::error::ServiceResult;
use super::standings_query::compute_tournament_table;
use crate::api::{LeagueId, TeamId, TournamentId};
use crate::db::paths;
use crate::db::repository::{DocumentChange, DocumentStore, Fields, Query, WriteBatch};
use crate::models::fields;

/// Recompute a tournament's table and overwrite its standings collection.
///
/// One `standings/{teamId}` document is written per table row, stamped with
/// `lastUpdated`. Standings of teams no longer in the table are deleted in the
/// same batch. A tournament that no longer exists is a no-op. Re-running with
/// unchanged inputs rewrites the same table.
pub async fn recalculate_standings(
    store: &dyn DocumentStore,
    league: &LeagueId,
    tournament: &TournamentId,
) -> ServiceResult<Vec<DocumentChange>> {
    let Some(table) = compute_tournament_table(store, league, tournament, None).await? else {
        tracing::debug!(%league, %tournament, "tournament gone; standings recompute skipped");
        return Ok(Vec::new());
    };

    let current: HashSet<TeamId> = table.iter().map(|row| row.team_id.clone()).collect();
    let existing = store
        .query(&Query::collection(paths::standings(league, tournament)))
        .await?;

    let mut batch = WriteBatch::new();
    for row in &table {
        let data = Fields::from_serializable(row)?.server_timestamp(fields::LAST_UPDATED);
        batch.set(paths::standing(league, tournament, &row.team_id), data);
    }
    let mut pruned = 0usize;
    for doc in existing {
        if !current.contains(&TeamId::new(doc.id())) {
            batch.delete(doc.path);
            pruned += 1;
        }
    }

    if batch.is_empty() {
        return Ok(Vec::new());
    }
    let changes = store.commit(batch).await?;
    tracing::info!(
        %league,
        %tournament,
        rows = table.len(),
        pruned,
        "standings recomputed"
    );
    Ok(changes)
}
