//! Fan-out of team name and logo changes to the documents that copy them.
//!
//! Players carry `teamName`; matches carry `homeTeamName`/`homeTeamLogo` and
//! `awayTeamName`/`awayTeamLogo`; standings carry `teamName`/`teamLogo`.
//! Numeric standings fields are never touched here.

use serde_json::Value;

use super::error::ServiceResult;
use crate::api::{LeagueId, Team, TeamId, TournamentId};
use crate::db::paths;
use crate::db::repository::{
    DocumentChange, DocumentPath, DocumentStore, Fields, Query, WriteBatch,
};
use crate::models::fields;

/// Which copied fields a team update affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamChange {
    pub name_changed: bool,
    pub logo_changed: bool,
}

impl TeamChange {
    pub fn between(before: &Team, after: &Team) -> Self {
        Self {
            name_changed: before.name != after.name,
            logo_changed: before.logo != after.logo,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.name_changed && !self.logo_changed
    }

    fn fields(&self, name_field: &str, logo_field: &str, after: &Team) -> Fields {
        let mut update = Fields::new();
        if self.name_changed {
            update = update.set(name_field, after.name.clone());
        }
        if self.logo_changed {
            update = update.set(logo_field, logo_value(after));
        }
        update
    }
}

fn logo_value(team: &Team) -> Value {
    match team.logo.as_deref() {
        Some(logo) if !logo.is_empty() => Value::String(logo.to_string()),
        _ => Value::Null,
    }
}

/// Commit one group of updates (the players, or one tournament) atomically.
///
/// A group larger than the store's write limit cannot be one batch; it is
/// split into limit-sized batches and a warning is logged.
async fn commit_updates(
    store: &dyn DocumentStore,
    scope: &str,
    updates: Vec<(DocumentPath, Fields)>,
) -> ServiceResult<Vec<DocumentChange>> {
    let limit = store.limits().max_batch_writes.max(1);
    if updates.len() > limit {
        tracing::warn!(
            scope,
            documents = updates.len(),
            limit,
            "propagation exceeds the batch limit; committing in several batches"
        );
    }
    let mut changes = Vec::new();
    for chunk in updates.chunks(limit) {
        let mut batch = WriteBatch::new();
        for (path, update) in chunk {
            batch.update(path.clone(), update.clone());
        }
        changes.extend(store.commit(batch).await?);
    }
    Ok(changes)
}

async fn tournament_updates(
    store: &dyn DocumentStore,
    league: &LeagueId,
    tournament: &TournamentId,
    team_id: &TeamId,
    change: TeamChange,
    after: &Team,
) -> ServiceResult<Vec<(DocumentPath, Fields)>> {
    let matches = paths::matches(league, tournament);
    let home_query =
        Query::collection(matches.clone()).where_eq(fields::HOME_TEAM_ID, team_id.as_str());
    let away_query = Query::collection(matches).where_eq(fields::AWAY_TEAM_ID, team_id.as_str());
    let standing_path = paths::standing(league, tournament, team_id);
    let (home, away, standing) = futures::try_join!(
        store.query(&home_query),
        store.query(&away_query),
        store.get(&standing_path),
    )?;

    let mut updates = Vec::with_capacity(home.len() + away.len() + 1);
    for doc in home {
        updates.push((
            doc.path,
            change.fields(fields::HOME_TEAM_NAME, fields::HOME_TEAM_LOGO, after),
        ));
    }
    for doc in away {
        updates.push((
            doc.path,
            change.fields(fields::AWAY_TEAM_NAME, fields::AWAY_TEAM_LOGO, after),
        ));
    }
    if let Some(doc) = standing {
        updates.push((
            doc.path,
            change.fields(fields::TEAM_NAME, fields::TEAM_LOGO, after),
        ));
    }
    Ok(updates)
}

/// Copy a team's new name and/or logo onto its players, matches and standings.
///
/// Player updates commit in their own batch; each tournament's match and
/// standing updates commit in one batch per tournament. Standings documents are
/// only updated, never created. Returns every committed change.
pub async fn propagate_team_changes(
    store: &dyn DocumentStore,
    league: &LeagueId,
    team_id: &TeamId,
    before: &Team,
    after: &Team,
) -> ServiceResult<Vec<DocumentChange>> {
    let change = TeamChange::between(before, after);
    if change.is_empty() {
        return Ok(Vec::new());
    }

    let mut changes = Vec::new();

    if change.name_changed {
        let query =
            Query::collection(paths::players(league)).where_eq(fields::TEAM_ID, team_id.as_str());
        let players = store.query(&query).await?;
        let updates = players
            .into_iter()
            .map(|doc| (doc.path, Fields::new().set(fields::TEAM_NAME, after.name.clone())))
            .collect();
        changes.extend(commit_updates(store, "players", updates).await?);
    }

    let tournaments = store
        .query(&Query::collection(paths::tournaments(league)))
        .await?;
    for doc in tournaments {
        let tournament = TournamentId::new(doc.id());
        let updates = tournament_updates(store, league, &tournament, team_id, change, after).await?;
        if !updates.is_empty() {
            changes.extend(commit_updates(store, tournament.as_str(), updates).await?);
        }
    }

    tracing::info!(
        %league,
        team = %team_id,
        name_changed = change.name_changed,
        logo_changed = change.logo_changed,
        documents = changes.len(),
        "team changes propagated"
    );
    Ok(changes)
}
