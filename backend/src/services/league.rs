//! League CRUD with derived-counter maintenance.
//!
//! Every write that creates, deletes or moves a child document adjusts the
//! parent's counter (`playerCount`, `matchdayCount`, `matchCount`,
//! `completedMatchCount`) in the same atomic batch. Committed changes are handed
//! to the [`TriggerDispatcher`], which keeps standings and copied team fields
//! in step.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::inputs::{
    MatchPatch, MatchdayPatch, NewMatch, NewMatchday, NewPlayer, NewTeam, NewTournament,
    PlayerPatch, ScoreInput, ScoresBatch, ScoresBatchResult, TeamPatch, TournamentPatch,
};
use super::standings::StandingRow;
use super::standings_query::{
    parse_matchday_param, read_persisted_standings, standings_as_of_matchday,
};
use super::standings_trigger::recalculate_standings;
use super::triggers::{TriggerDispatcher, TriggerMode};
use crate::api::{
    LeagueId, Match, MatchId, MatchStatus, Matchday, MatchdayId, MatchdayStatus, Player,
    PlayerId, PointsPolicy, Team, TeamId, Tournament, TournamentId, TournamentStatus, WithId,
};
use crate::db::paths;
use crate::db::repository::{
    Direction, DocumentChange, DocumentPath, DocumentStore, FieldPath, Fields, Query,
    RepositoryError, WriteBatch,
};
use crate::db::services::{decode_with_id, get_typed, query_in_chunks, query_typed};
use crate::models::{fields, DEFAULT_TEAM_COLOR};

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

fn nullable(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn team_ids_value(ids: &[TeamId]) -> Value {
    let mut seen = std::collections::HashSet::new();
    Value::Array(
        ids.iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| Value::from(id.as_str()))
            .collect(),
    )
}

fn check_ids(ids: &[(&str, &str)]) -> ServiceResult<()> {
    for (kind, id) in ids {
        paths::check_id(kind, id)
            .map_err(|_| ServiceError::invalid(format!("invalid {} id '{}'", kind, id)))?;
    }
    Ok(())
}

fn score_fields(score: &ScoreInput) -> Fields {
    Fields::new()
        .set(fields::HOME_SCORE, score.home_score)
        .set(fields::AWAY_SCORE, score.away_score)
        .set(fields::STATUS, MatchStatus::Completed.as_str())
        .server_timestamp(fields::UPDATED_AT)
}

/// Counter delta for adding (`+1`) or removing (`-1`) a match from a matchday.
fn match_counters(delta: i64, completed: bool) -> Fields {
    let update = Fields::new().increment(fields::MATCH_COUNT, delta);
    if completed {
        update.increment(fields::COMPLETED_MATCH_COUNT, delta)
    } else {
        update
    }
}

/// The post-commit snapshot of `path`.
fn snapshot<T: DeserializeOwned>(
    changes: &[DocumentChange],
    path: &DocumentPath,
) -> ServiceResult<WithId<T>> {
    let doc = changes
        .iter()
        .find(|c| &c.path == path)
        .and_then(|c| c.after.as_ref())
        .ok_or_else(|| {
            ServiceError::Internal(RepositoryError::internal(format!(
                "commit returned no snapshot for {}",
                path
            )))
        })?;
    Ok(decode_with_id(doc)?)
}

/// Entry point for every league read and write.
#[derive(Clone)]
pub struct LeagueService {
    store: Arc<dyn DocumentStore>,
    triggers: TriggerDispatcher,
}

impl std::fmt::Debug for LeagueService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeagueService")
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

impl LeagueService {
    pub fn new(store: Arc<dyn DocumentStore>, mode: TriggerMode) -> Self {
        let triggers = TriggerDispatcher::new(store.clone(), mode);
        Self { store, triggers }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn triggers(&self) -> &TriggerDispatcher {
        &self.triggers
    }

    pub async fn health_check(&self) -> ServiceResult<bool> {
        Ok(crate::db::health_check(self.store()).await?)
    }

    async fn commit(&self, batch: WriteBatch) -> ServiceResult<Vec<DocumentChange>> {
        let changes = self.store.commit(batch).await?;
        self.triggers.dispatch(changes.clone()).await;
        Ok(changes)
    }

    /// Load a document addressed by the request; absence is NotFound.
    async fn require<T: DeserializeOwned>(
        &self,
        path: &DocumentPath,
        entity: &str,
        id: &str,
    ) -> ServiceResult<WithId<T>> {
        get_typed::<T>(self.store(), path)
            .await?
            .ok_or_else(|| ServiceError::not_found(entity, id))
    }

    /// Load a document referenced from a request body; absence is InvalidArgument.
    async fn require_reference<T: DeserializeOwned>(
        &self,
        path: &DocumentPath,
        entity: &str,
        id: &str,
    ) -> ServiceResult<WithId<T>> {
        get_typed::<T>(self.store(), path)
            .await?
            .ok_or_else(|| ServiceError::invalid(format!("{} {} does not exist", entity, id)))
    }

    // ---------------------------------------------------------------- teams

    /// Teams ordered by name; `ids` restricts the result to those teams.
    pub async fn list_teams(
        &self,
        league: &LeagueId,
        ids: Option<&[TeamId]>,
    ) -> ServiceResult<Vec<WithId<Team>>> {
        check_ids(&[("league", league.as_str())])?;
        let Some(ids) = ids else {
            let query =
                Query::collection(paths::teams(league)).order_by(fields::NAME, Direction::Ascending);
            return Ok(query_typed(self.store(), &query).await?);
        };

        let values = ids.iter().map(|id| Value::from(id.as_str())).collect();
        let docs =
            query_in_chunks(self.store(), &paths::teams(league), FieldPath::DocumentId, values)
                .await?;
        let mut teams = docs
            .iter()
            .map(decode_with_id::<Team>)
            .collect::<Result<Vec<_>, _>>()?;
        teams.sort_by(|a, b| a.data.name.cmp(&b.data.name).then_with(|| a.id.cmp(&b.id)));
        Ok(teams)
    }

    pub async fn get_team(&self, league: &LeagueId, team: &TeamId) -> ServiceResult<WithId<Team>> {
        check_ids(&[("league", league.as_str()), ("team", team.as_str())])?;
        self.require(&paths::team(league, team), "team", team.as_str())
            .await
    }

    pub async fn create_team(&self, league: &LeagueId, input: NewTeam) -> ServiceResult<WithId<Team>> {
        check_ids(&[("league", league.as_str())])?;
        input.validate()?;

        let id = TeamId::new(new_id());
        let path = paths::team(league, &id);
        let data = Fields::new()
            .set(fields::NAME, input.name.trim())
            .set(fields::LOGO, nullable(input.logo))
            .set(
                fields::COLOR,
                input.color.unwrap_or_else(|| DEFAULT_TEAM_COLOR.to_string()),
            )
            .set(fields::PLAYER_COUNT, 0)
            .set(fields::IS_ACTIVE, true)
            .server_timestamp(fields::CREATED_AT)
            .server_timestamp(fields::UPDATED_AT);

        let mut batch = WriteBatch::new();
        batch.set(path.clone(), data);
        let changes = self.commit(batch).await?;
        tracing::info!(%league, team = %id, "team created");
        snapshot(&changes, &path)
    }

    /// Patch a team. Name and logo changes fan out to copies through the triggers.
    pub async fn update_team(
        &self,
        league: &LeagueId,
        team: &TeamId,
        patch: TeamPatch,
    ) -> ServiceResult<WithId<Team>> {
        check_ids(&[("league", league.as_str()), ("team", team.as_str())])?;
        patch.validate()?;
        let path = paths::team(league, team);
        self.require::<Team>(&path, "team", team.as_str()).await?;

        let mut data = Fields::new()
            .set_opt(fields::NAME, patch.name.map(|n| n.trim().to_string()))
            .set_opt(fields::COLOR, patch.color)
            .set_opt(fields::IS_ACTIVE, patch.is_active)
            .server_timestamp(fields::UPDATED_AT);
        if let Some(logo) = patch.logo {
            data = data.set(fields::LOGO, nullable(logo));
        }

        let mut batch = WriteBatch::new();
        batch.update(path.clone(), data);
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Delete a team. Deleting an absent team succeeds.
    pub async fn delete_team(&self, league: &LeagueId, team: &TeamId) -> ServiceResult<()> {
        check_ids(&[("league", league.as_str()), ("team", team.as_str())])?;
        let mut batch = WriteBatch::new();
        batch.delete(paths::team(league, team));
        let changes = self.commit(batch).await?;
        if !changes.is_empty() {
            tracing::info!(%league, %team, "team deleted");
        }
        Ok(())
    }

    // -------------------------------------------------------------- players

    /// Players ordered by name, or by shirt number within one team.
    pub async fn list_players(
        &self,
        league: &LeagueId,
        team: Option<&TeamId>,
    ) -> ServiceResult<Vec<WithId<Player>>> {
        check_ids(&[("league", league.as_str())])?;
        let query = match team {
            Some(team) => Query::collection(paths::players(league))
                .where_eq(fields::TEAM_ID, team.as_str())
                .order_by(fields::NUMBER, Direction::Ascending),
            None => Query::collection(paths::players(league))
                .order_by(fields::NAME, Direction::Ascending),
        };
        Ok(query_typed(self.store(), &query).await?)
    }

    pub async fn get_player(
        &self,
        league: &LeagueId,
        player: &PlayerId,
    ) -> ServiceResult<WithId<Player>> {
        check_ids(&[("league", league.as_str()), ("player", player.as_str())])?;
        self.require(&paths::player(league, player), "player", player.as_str())
            .await
    }

    pub async fn create_player(
        &self,
        league: &LeagueId,
        input: NewPlayer,
    ) -> ServiceResult<WithId<Player>> {
        check_ids(&[("league", league.as_str()), ("team", input.team_id.as_str())])?;
        input.validate()?;

        let team_path = paths::team(league, &input.team_id);
        let team = self
            .require_reference::<Team>(&team_path, "team", input.team_id.as_str())
            .await?;

        let id = PlayerId::new(new_id());
        let path = paths::player(league, &id);
        let data = Fields::new()
            .set(fields::NAME, input.name.trim())
            .set(fields::NUMBER, input.number)
            .set(fields::POSITION, input.position.trim())
            .set(fields::TEAM_ID, input.team_id.as_str())
            .set(fields::TEAM_NAME, team.data.name)
            .server_timestamp(fields::CREATED_AT)
            .server_timestamp(fields::UPDATED_AT);

        let mut batch = WriteBatch::new();
        batch
            .set(path.clone(), data)
            .update(team_path, Fields::new().increment(fields::PLAYER_COUNT, 1));
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Patch a player. A team change moves the player between team counters.
    pub async fn update_player(
        &self,
        league: &LeagueId,
        player: &PlayerId,
        patch: PlayerPatch,
    ) -> ServiceResult<WithId<Player>> {
        check_ids(&[("league", league.as_str()), ("player", player.as_str())])?;
        patch.validate()?;
        let path = paths::player(league, player);
        let current = self
            .require::<Player>(&path, "player", player.as_str())
            .await?;

        let mut data = Fields::new()
            .set_opt(fields::NAME, patch.name.map(|n| n.trim().to_string()))
            .set_opt(fields::NUMBER, patch.number)
            .set_opt(fields::POSITION, patch.position.map(|p| p.trim().to_string()))
            .server_timestamp(fields::UPDATED_AT);
        let mut counters = Vec::new();

        if let Some(new_team) = patch.team_id.filter(|t| *t != current.data.team_id) {
            check_ids(&[("team", new_team.as_str())])?;
            let new_path = paths::team(league, &new_team);
            let old_path = paths::team(league, &current.data.team_id);
            let (target, previous) = futures::try_join!(
                get_typed::<Team>(self.store(), &new_path),
                self.store.get(&old_path),
            )?;
            let target = target.ok_or_else(|| {
                ServiceError::invalid(format!("team {} does not exist", new_team))
            })?;

            data = data
                .set(fields::TEAM_ID, new_team.as_str())
                .set(fields::TEAM_NAME, target.data.name);
            counters.push((new_path, Fields::new().increment(fields::PLAYER_COUNT, 1)));
            if previous.is_some() {
                counters.push((old_path, Fields::new().increment(fields::PLAYER_COUNT, -1)));
            }
        }

        let mut batch = WriteBatch::new();
        batch.update(path.clone(), data);
        for (team_path, update) in counters {
            batch.update(team_path, update);
        }
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    pub async fn delete_player(&self, league: &LeagueId, player: &PlayerId) -> ServiceResult<()> {
        check_ids(&[("league", league.as_str()), ("player", player.as_str())])?;
        let path = paths::player(league, player);
        let current = self
            .require::<Player>(&path, "player", player.as_str())
            .await?;
        let team_path = paths::team(league, &current.data.team_id);
        let team_exists = self.store.get(&team_path).await?.is_some();

        let mut batch = WriteBatch::new();
        batch.delete(path);
        if team_exists {
            batch.update(team_path, Fields::new().increment(fields::PLAYER_COUNT, -1));
        }
        self.commit(batch).await?;
        tracing::info!(%league, %player, team = %current.data.team_id, "player deleted");
        Ok(())
    }

    // ---------------------------------------------------------- tournaments

    /// Tournaments, most recent start date first.
    pub async fn list_tournaments(
        &self,
        league: &LeagueId,
        status: Option<TournamentStatus>,
    ) -> ServiceResult<Vec<WithId<Tournament>>> {
        check_ids(&[("league", league.as_str())])?;
        let mut query = Query::collection(paths::tournaments(league));
        if let Some(status) = status {
            query = query.where_eq(fields::STATUS, status.as_str());
        }
        let query = query.order_by(fields::START_DATE, Direction::Descending);
        Ok(query_typed(self.store(), &query).await?)
    }

    pub async fn get_tournament(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
    ) -> ServiceResult<WithId<Tournament>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        self.require(
            &paths::tournament(league, tournament),
            "tournament",
            tournament.as_str(),
        )
        .await
    }

    pub async fn create_tournament(
        &self,
        league: &LeagueId,
        input: NewTournament,
    ) -> ServiceResult<WithId<Tournament>> {
        check_ids(&[("league", league.as_str())])?;
        for team in &input.team_ids {
            check_ids(&[("team", team.as_str())])?;
        }
        input.validate()?;

        let defaults = PointsPolicy::default();
        let id = TournamentId::new(new_id());
        let path = paths::tournament(league, &id);
        let data = Fields::new()
            .set(fields::NAME, input.name.trim())
            .set(
                fields::STATUS,
                input.status.unwrap_or(TournamentStatus::Upcoming).as_str(),
            )
            .set(fields::START_DATE, date_value(input.start_date))
            .set(fields::END_DATE, date_value(input.end_date))
            .set(fields::TEAM_IDS, team_ids_value(&input.team_ids))
            .set(fields::POINTS_WIN, input.points_win.unwrap_or(defaults.win))
            .set(fields::POINTS_DRAW, input.points_draw.unwrap_or(defaults.draw))
            .set(fields::POINTS_LOSS, input.points_loss.unwrap_or(defaults.loss))
            .set(fields::MATCHDAY_COUNT, 0)
            .server_timestamp(fields::CREATED_AT)
            .server_timestamp(fields::UPDATED_AT);

        let mut batch = WriteBatch::new();
        batch.set(path.clone(), data);
        let changes = self.commit(batch).await?;
        tracing::info!(%league, tournament = %id, teams = input.team_ids.len(), "tournament created");
        snapshot(&changes, &path)
    }

    /// Patch a tournament. Roster and points changes recompute its standings.
    pub async fn update_tournament(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        patch: TournamentPatch,
    ) -> ServiceResult<WithId<Tournament>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        if let Some(team_ids) = &patch.team_ids {
            for team in team_ids {
                check_ids(&[("team", team.as_str())])?;
            }
        }
        patch.validate()?;
        let path = paths::tournament(league, tournament);
        let current = self
            .require::<Tournament>(&path, "tournament", tournament.as_str())
            .await?;

        let start = patch.start_date.unwrap_or(current.data.start_date);
        let end = patch.end_date.unwrap_or(current.data.end_date);
        if end < start {
            return Err(ServiceError::invalid(format!(
                "endDate {} is before startDate {}",
                end, start
            )));
        }

        let data = Fields::new()
            .set_opt(fields::NAME, patch.name.map(|n| n.trim().to_string()))
            .set_opt(fields::STATUS, patch.status.map(|s| s.as_str()))
            .set_opt(fields::START_DATE, patch.start_date.map(date_value))
            .set_opt(fields::END_DATE, patch.end_date.map(date_value))
            .set_opt(fields::TEAM_IDS, patch.team_ids.as_deref().map(team_ids_value))
            .set_opt(fields::POINTS_WIN, patch.points_win)
            .set_opt(fields::POINTS_DRAW, patch.points_draw)
            .set_opt(fields::POINTS_LOSS, patch.points_loss)
            .server_timestamp(fields::UPDATED_AT);

        let mut batch = WriteBatch::new();
        batch.update(path.clone(), data);
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Delete a tournament with its matchdays, matches and standings.
    ///
    /// Deleting an absent tournament succeeds. Children are removed in batches
    /// of the store's write limit, the tournament document first.
    pub async fn delete_tournament(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
    ) -> ServiceResult<()> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        let matchdays = Query::collection(paths::matchdays(league, tournament));
        let matches = Query::collection(paths::matches(league, tournament));
        let standings = Query::collection(paths::standings(league, tournament));
        let (matchdays, matches, standings) = futures::try_join!(
            self.store.query(&matchdays),
            self.store.query(&matches),
            self.store.query(&standings),
        )?;

        let mut targets = vec![paths::tournament(league, tournament)];
        targets.extend(
            matchdays
                .into_iter()
                .chain(matches)
                .chain(standings)
                .map(|doc| doc.path),
        );

        let limit = self.store.limits().max_batch_writes.max(1);
        let mut removed = 0;
        for chunk in targets.chunks(limit) {
            let mut batch = WriteBatch::new();
            for path in chunk {
                batch.delete(path.clone());
            }
            removed += self.commit(batch).await?.len();
        }
        tracing::info!(%league, %tournament, documents = removed, "tournament deleted");
        Ok(())
    }

    // ------------------------------------------------------------ matchdays

    pub async fn list_matchdays(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
    ) -> ServiceResult<Vec<WithId<Matchday>>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        let query = Query::collection(paths::matchdays(league, tournament))
            .order_by(fields::NUMBER, Direction::Ascending);
        Ok(query_typed(self.store(), &query).await?)
    }

    pub async fn get_matchday(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        matchday: &MatchdayId,
    ) -> ServiceResult<WithId<Matchday>> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("matchday", matchday.as_str()),
        ])?;
        self.require(
            &paths::matchday(league, tournament, matchday),
            "matchday",
            matchday.as_str(),
        )
        .await
    }

    async fn check_number_free(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        number: i64,
        except: Option<&MatchdayId>,
    ) -> ServiceResult<()> {
        let query = Query::collection(paths::matchdays(league, tournament))
            .where_eq(fields::NUMBER, number);
        let clash = self
            .store
            .query(&query)
            .await?
            .into_iter()
            .any(|doc| except.map_or(true, |id| doc.id() != id.as_str()));
        if clash {
            return Err(ServiceError::invalid(format!(
                "matchday number {} already exists in tournament {}",
                number, tournament
            )));
        }
        Ok(())
    }

    pub async fn create_matchday(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        input: NewMatchday,
    ) -> ServiceResult<WithId<Matchday>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        input.validate()?;

        let tournament_path = paths::tournament(league, tournament);
        let (exists, ()) = futures::try_join!(
            async {
                Ok::<_, ServiceError>(self.store.get(&tournament_path).await?.is_some())
            },
            self.check_number_free(league, tournament, input.number, None),
        )?;
        if !exists {
            return Err(ServiceError::not_found("tournament", tournament));
        }

        let id = MatchdayId::new(new_id());
        let path = paths::matchday(league, tournament, &id);
        let data = Fields::new()
            .set(fields::NUMBER, input.number)
            .set(fields::LABEL, input.label())
            .set(fields::DATE, date_value(input.date))
            .set(
                fields::STATUS,
                input.status.unwrap_or(MatchdayStatus::Upcoming).as_str(),
            )
            .set(fields::MATCH_COUNT, 0)
            .set(fields::COMPLETED_MATCH_COUNT, 0)
            .server_timestamp(fields::CREATED_AT)
            .server_timestamp(fields::UPDATED_AT);

        let mut batch = WriteBatch::new();
        batch
            .set(path.clone(), data)
            .update(tournament_path, Fields::new().increment(fields::MATCHDAY_COUNT, 1));
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Patch a matchday. Renumbering rewrites `matchdayNumber` on its matches
    /// in the same batch.
    pub async fn update_matchday(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        matchday: &MatchdayId,
        patch: MatchdayPatch,
    ) -> ServiceResult<WithId<Matchday>> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("matchday", matchday.as_str()),
        ])?;
        patch.validate()?;
        let path = paths::matchday(league, tournament, matchday);
        let current = self
            .require::<Matchday>(&path, "matchday", matchday.as_str())
            .await?;

        let mut data = Fields::new()
            .set_opt(fields::LABEL, patch.label)
            .set_opt(fields::DATE, patch.date.map(date_value))
            .set_opt(fields::STATUS, patch.status.map(|s| s.as_str()))
            .server_timestamp(fields::UPDATED_AT);

        let mut renumbered = Vec::new();
        if let Some(number) = patch.number.filter(|n| *n != current.data.number) {
            let query = Query::collection(paths::matches(league, tournament))
                .where_eq(fields::MATCHDAY_ID, matchday.as_str());
            let ((), matches) = futures::try_join!(
                self.check_number_free(league, tournament, number, Some(matchday)),
                async { Ok::<_, ServiceError>(self.store.query(&query).await?) },
            )?;
            data = data.set(fields::NUMBER, number);
            renumbered = matches
                .into_iter()
                .map(|doc| {
                    (
                        doc.path,
                        Fields::new()
                            .set(fields::MATCHDAY_NUMBER, number)
                            .server_timestamp(fields::UPDATED_AT),
                    )
                })
                .collect();
        }

        let mut batch = WriteBatch::new();
        batch.update(path.clone(), data);
        for (match_path, update) in renumbered {
            batch.update(match_path, update);
        }
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Delete a matchday and its matches.
    pub async fn delete_matchday(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        matchday: &MatchdayId,
    ) -> ServiceResult<()> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("matchday", matchday.as_str()),
        ])?;
        let path = paths::matchday(league, tournament, matchday);
        self.require::<Matchday>(&path, "matchday", matchday.as_str())
            .await?;

        let tournament_path = paths::tournament(league, tournament);
        let query = Query::collection(paths::matches(league, tournament))
            .where_eq(fields::MATCHDAY_ID, matchday.as_str());
        let (parent, matches) = futures::try_join!(
            self.store.get(&tournament_path),
            self.store.query(&query),
        )?;

        let mut batch = WriteBatch::new();
        for doc in &matches {
            batch.delete(doc.path.clone());
        }
        batch.delete(path);
        if parent.is_some() {
            batch.update(
                tournament_path,
                Fields::new().increment(fields::MATCHDAY_COUNT, -1),
            );
        }
        self.commit(batch).await?;
        tracing::info!(%league, %tournament, %matchday, matches = matches.len(), "matchday deleted");
        Ok(())
    }

    // -------------------------------------------------------------- matches

    /// Matches ordered by date, optionally restricted to one matchday.
    pub async fn list_matches(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        matchday: Option<&MatchdayId>,
    ) -> ServiceResult<Vec<WithId<Match>>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        let mut query = Query::collection(paths::matches(league, tournament));
        if let Some(matchday) = matchday {
            query = query.where_eq(fields::MATCHDAY_ID, matchday.as_str());
        }
        let query = query.order_by(fields::DATE, Direction::Ascending);
        Ok(query_typed(self.store(), &query).await?)
    }

    pub async fn get_match(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        id: &MatchId,
    ) -> ServiceResult<WithId<Match>> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("match", id.as_str()),
        ])?;
        self.require(&paths::match_doc(league, tournament, id), "match", id.as_str())
            .await
    }

    /// Schedule a match. Team names and logos and the matchday number are copied
    /// onto the match.
    pub async fn create_match(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        input: NewMatch,
    ) -> ServiceResult<WithId<Match>> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("matchday", input.matchday_id.as_str()),
            ("team", input.home_team_id.as_str()),
            ("team", input.away_team_id.as_str()),
        ])?;
        input.validate()?;

        let matchday_path = paths::matchday(league, tournament, &input.matchday_id);
        let home_path = paths::team(league, &input.home_team_id);
        let away_path = paths::team(league, &input.away_team_id);
        let (matchday, home, away) = futures::try_join!(
            self.require_reference::<Matchday>(
                &matchday_path,
                "matchday",
                input.matchday_id.as_str()
            ),
            self.require_reference::<Team>(&home_path, "team", input.home_team_id.as_str()),
            self.require_reference::<Team>(&away_path, "team", input.away_team_id.as_str()),
        )?;

        let id = MatchId::new(new_id());
        let path = paths::match_doc(league, tournament, &id);
        let data = Fields::new()
            .set(fields::MATCHDAY_ID, input.matchday_id.as_str())
            .set(fields::MATCHDAY_NUMBER, matchday.data.number)
            .set(fields::HOME_TEAM_ID, input.home_team_id.as_str())
            .set(fields::HOME_TEAM_NAME, home.data.name)
            .set(fields::HOME_TEAM_LOGO, nullable(home.data.logo))
            .set(fields::AWAY_TEAM_ID, input.away_team_id.as_str())
            .set(fields::AWAY_TEAM_NAME, away.data.name)
            .set(fields::AWAY_TEAM_LOGO, nullable(away.data.logo))
            .set(fields::HOME_SCORE, Value::Null)
            .set(fields::AWAY_SCORE, Value::Null)
            .set(fields::DATE, date_value(input.date))
            .set(fields::TIME, input.time.unwrap_or_default())
            .set(fields::VENUE, input.venue.unwrap_or_default())
            .set(fields::STATUS, MatchStatus::Scheduled.as_str())
            .server_timestamp(fields::CREATED_AT)
            .server_timestamp(fields::UPDATED_AT);

        let mut batch = WriteBatch::new();
        batch
            .set(path.clone(), data)
            .update(matchday_path, match_counters(1, false));
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Reschedule a match, possibly onto another matchday.
    pub async fn update_match(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        id: &MatchId,
        patch: MatchPatch,
    ) -> ServiceResult<WithId<Match>> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("match", id.as_str()),
        ])?;
        let path = paths::match_doc(league, tournament, id);
        let current = self.require::<Match>(&path, "match", id.as_str()).await?;

        let mut data = Fields::new()
            .set_opt(fields::DATE, patch.date.map(date_value))
            .set_opt(fields::TIME, patch.time)
            .set_opt(fields::VENUE, patch.venue)
            .server_timestamp(fields::UPDATED_AT);
        let mut counters = Vec::new();

        if let Some(target) = patch
            .matchday_id
            .filter(|md| *md != current.data.matchday_id)
        {
            check_ids(&[("matchday", target.as_str())])?;
            let target_path = paths::matchday(league, tournament, &target);
            let old_path = paths::matchday(league, tournament, &current.data.matchday_id);
            let (next, previous) = futures::try_join!(
                self.require_reference::<Matchday>(&target_path, "matchday", target.as_str()),
                async { Ok::<_, ServiceError>(self.store.get(&old_path).await?) },
            )?;

            let completed = current.data.is_completed();
            data = data
                .set(fields::MATCHDAY_ID, target.as_str())
                .set(fields::MATCHDAY_NUMBER, next.data.number);
            counters.push((target_path, match_counters(1, completed)));
            if previous.is_some() {
                counters.push((old_path, match_counters(-1, completed)));
            }
        }

        let mut batch = WriteBatch::new();
        batch.update(path.clone(), data);
        for (matchday_path, update) in counters {
            batch.update(matchday_path, update);
        }
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Record one match's final score.
    pub async fn update_score(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        id: &MatchId,
        score: ScoreInput,
    ) -> ServiceResult<WithId<Match>> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("match", id.as_str()),
        ])?;
        score.validate()?;
        let path = paths::match_doc(league, tournament, id);
        let current = self.require::<Match>(&path, "match", id.as_str()).await?;

        let mut batch = WriteBatch::new();
        batch.update(path.clone(), score_fields(&score));
        if !current.data.is_completed() {
            let matchday_path = paths::matchday(league, tournament, &current.data.matchday_id);
            if self.store.get(&matchday_path).await?.is_some() {
                batch.update(
                    matchday_path,
                    Fields::new().increment(fields::COMPLETED_MATCH_COUNT, 1),
                );
            }
        }
        let changes = self.commit(batch).await?;
        snapshot(&changes, &path)
    }

    /// Record final scores for several matches of one matchday in one batch.
    ///
    /// Every match must exist and belong to `matchdayId`. A match listed more
    /// than once is written once with its last score. `completedMatchCount`
    /// grows by the number of matches that were not completed before.
    pub async fn update_scores_batch(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        input: ScoresBatch,
    ) -> ServiceResult<ScoresBatchResult> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("matchday", input.matchday_id.as_str()),
        ])?;

        let mut entries: Vec<(MatchId, ScoreInput)> = Vec::with_capacity(input.scores.len());
        let mut positions: HashMap<MatchId, usize> = HashMap::new();
        for entry in input.scores {
            check_ids(&[("match", entry.match_id.as_str())])?;
            entry.score.validate()?;
            match positions.get(&entry.match_id) {
                Some(&i) => entries[i].1 = entry.score,
                None => {
                    positions.insert(entry.match_id.clone(), entries.len());
                    entries.push((entry.match_id, entry.score));
                }
            }
        }
        if entries.is_empty() {
            return Ok(ScoresBatchResult::default());
        }

        let limit = self.store.limits().max_batch_writes;
        if entries.len() + 1 > limit {
            return Err(ServiceError::invalid(format!(
                "scores batch has {} matches, limit is {}",
                entries.len(),
                limit.saturating_sub(1)
            )));
        }

        let matchday_path = paths::matchday(league, tournament, &input.matchday_id);
        let matches = paths::matches(league, tournament);
        let ids = entries
            .iter()
            .map(|(id, _)| Value::from(id.as_str()))
            .collect();
        let (matchday, docs) = futures::try_join!(
            self.store.get(&matchday_path),
            query_in_chunks(self.store(), &matches, FieldPath::DocumentId, ids),
        )?;
        if matchday.is_none() {
            return Err(ServiceError::not_found("matchday", &input.matchday_id));
        }
        let stored: HashMap<String, Match> = docs
            .iter()
            .map(|doc| decode_with_id::<Match>(doc).map(|m| (m.id, m.data)))
            .collect::<Result<_, _>>()?;

        let mut batch = WriteBatch::new();
        let mut newly_completed = 0usize;
        for (id, score) in &entries {
            let current = stored
                .get(id.as_str())
                .ok_or_else(|| ServiceError::not_found("match", id))?;
            if current.matchday_id != input.matchday_id {
                return Err(ServiceError::invalid(format!(
                    "match {} belongs to matchday {}, not {}",
                    id, current.matchday_id, input.matchday_id
                )));
            }
            if !current.is_completed() {
                newly_completed += 1;
            }
            batch.update(paths::match_doc(league, tournament, id), score_fields(score));
        }
        if newly_completed > 0 {
            batch.update(
                matchday_path,
                Fields::new().increment(fields::COMPLETED_MATCH_COUNT, newly_completed as i64),
            );
        }

        self.commit(batch).await?;
        tracing::info!(
            %league,
            %tournament,
            matchday = %input.matchday_id,
            updated = entries.len(),
            newly_completed,
            "scores recorded"
        );
        Ok(ScoresBatchResult {
            updated: entries.len(),
            newly_completed,
        })
    }

    pub async fn delete_match(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        id: &MatchId,
    ) -> ServiceResult<()> {
        check_ids(&[
            ("league", league.as_str()),
            ("tournament", tournament.as_str()),
            ("match", id.as_str()),
        ])?;
        let path = paths::match_doc(league, tournament, id);
        let current = self.require::<Match>(&path, "match", id.as_str()).await?;
        let matchday_path = paths::matchday(league, tournament, &current.data.matchday_id);
        let matchday_exists = self.store.get(&matchday_path).await?.is_some();

        let mut batch = WriteBatch::new();
        batch.delete(path);
        if matchday_exists {
            batch.update(
                matchday_path,
                match_counters(-1, current.data.is_completed()),
            );
        }
        self.commit(batch).await?;
        Ok(())
    }

    // ------------------------------------------------------------ standings

    /// The tournament table: persisted when `matchday` is absent, otherwise
    /// computed up to that matchday number.
    pub async fn standings(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        matchday: Option<&str>,
    ) -> ServiceResult<Vec<StandingRow>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        match matchday {
            Some(raw) => {
                let cutoff = parse_matchday_param(Some(raw))?;
                standings_as_of_matchday(self.store(), league, tournament, cutoff).await
            }
            None => {
                self.require::<Tournament>(
                    &paths::tournament(league, tournament),
                    "tournament",
                    tournament.as_str(),
                )
                .await?;
                read_persisted_standings(self.store(), league, tournament).await
            }
        }
    }

    /// The table as it stood after matchday `matchday_number`.
    pub async fn standings_as_of(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
        matchday_number: i64,
    ) -> ServiceResult<Vec<StandingRow>> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        standings_as_of_matchday(self.store(), league, tournament, matchday_number).await
    }

    /// Rebuild the persisted table now; returns the number of documents written.
    pub async fn recalculate_standings(
        &self,
        league: &LeagueId,
        tournament: &TournamentId,
    ) -> ServiceResult<usize> {
        check_ids(&[("league", league.as_str()), ("tournament", tournament.as_str())])?;
        self.require::<Tournament>(
            &paths::tournament(league, tournament),
            "tournament",
            tournament.as_str(),
        )
        .await?;
        Ok(recalculate_standings(self.store(), league, tournament)
            .await?
            .len())
    }
}
