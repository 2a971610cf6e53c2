//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// League fixtures
// ---------------------------------------------------------------------------

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::sync::Arc;

use league_standings::api::{LeagueId, MatchId, MatchdayId, TeamId, TournamentId};
use league_standings::db::repository::{CollectionPath, DocumentPath, DocumentStore, Query};
use league_standings::db::LocalRepository;
use league_standings::models::fields;
use league_standings::services::{
    LeagueService, NewMatch, NewMatchday, NewTeam, NewTournament, ScoreInput, TriggerMode,
};

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).expect("valid fixture date")
}

/// A league with one tournament, one matchday, and the given teams.
pub struct LeagueFixture {
    pub repo: LocalRepository,
    pub service: LeagueService,
    pub league: LeagueId,
    pub tournament: TournamentId,
    pub matchday: MatchdayId,
    pub teams: Vec<TeamId>,
}

impl LeagueFixture {
    pub async fn new(team_names: &[&str]) -> Self {
        Self::with_repo(LocalRepository::new(), team_names).await
    }

    pub async fn with_repo(repo: LocalRepository, team_names: &[&str]) -> Self {
        let service = LeagueService::new(Arc::new(repo.clone()), TriggerMode::Inline);
        let league = LeagueId::new("l1");

        let mut teams = Vec::new();
        for name in team_names {
            let team = service
                .create_team(
                    &league,
                    NewTeam {
                        name: name.to_string(),
                        logo: None,
                        color: None,
                    },
                )
                .await
                .expect("create team");
            teams.push(TeamId::new(team.id));
        }

        let tournament = service
            .create_tournament(
                &league,
                NewTournament {
                    name: "Spring Cup".to_string(),
                    status: None,
                    start_date: date(1),
                    end_date: date(31),
                    team_ids: teams.clone(),
                    points_win: None,
                    points_draw: None,
                    points_loss: None,
                },
            )
            .await
            .expect("create tournament");
        let tournament = TournamentId::new(tournament.id);

        let fixture = Self {
            repo,
            service,
            league,
            tournament,
            matchday: MatchdayId::new(""),
            teams,
        };
        let matchday = fixture.add_matchday(1).await;
        Self { matchday, ..fixture }
    }

    pub async fn add_matchday(&self, number: i64) -> MatchdayId {
        let matchday = self
            .service
            .create_matchday(
                &self.league,
                &self.tournament,
                NewMatchday {
                    number,
                    label: None,
                    date: date(number as u32 * 7),
                    status: None,
                },
            )
            .await
            .expect("create matchday");
        MatchdayId::new(matchday.id)
    }

    pub async fn schedule(&self, matchday: &MatchdayId, home: usize, away: usize) -> MatchId {
        let created = self
            .service
            .create_match(
                &self.league,
                &self.tournament,
                NewMatch {
                    matchday_id: matchday.clone(),
                    home_team_id: self.teams[home].clone(),
                    away_team_id: self.teams[away].clone(),
                    date: date(7),
                    time: Some("18:00".to_string()),
                    venue: None,
                },
            )
            .await
            .expect("create match");
        MatchId::new(created.id)
    }

    /// Schedule and complete a match.
    pub async fn play(
        &self,
        matchday: &MatchdayId,
        home: usize,
        away: usize,
        home_score: i64,
        away_score: i64,
    ) -> MatchId {
        let id = self.schedule(matchday, home, away).await;
        self.service
            .update_score(
                &self.league,
                &self.tournament,
                &id,
                ScoreInput {
                    home_score,
                    away_score,
                },
            )
            .await
            .expect("record score");
        id
    }

    pub fn team_path(&self, index: usize) -> DocumentPath {
        DocumentPath::parse(format!("leagues/l1/teams/{}", self.teams[index])).expect("path")
    }

    pub fn standings_collection(&self) -> CollectionPath {
        CollectionPath::parse(format!("leagues/l1/tournaments/{}/standings", self.tournament))
            .expect("path")
    }

    /// Stored document fields, `None` when absent.
    pub async fn fields_of(&self, path: &DocumentPath) -> Option<Map<String, Value>> {
        self.repo
            .get(path)
            .await
            .expect("get")
            .map(|doc| doc.data)
    }

    pub async fn counter(&self, path: &DocumentPath, field: &str) -> i64 {
        self.fields_of(path)
            .await
            .and_then(|data| data.get(field).and_then(Value::as_i64))
            .unwrap_or(0)
    }

    /// Persisted standings documents by team id, without `lastUpdated`.
    pub async fn standings_snapshot(&self) -> Vec<(String, Map<String, Value>)> {
        let docs = self
            .repo
            .query(&Query::collection(self.standings_collection()))
            .await
            .expect("query standings");
        docs.into_iter()
            .map(|doc| {
                let id = doc.id().to_string();
                let mut data = doc.data;
                data.remove(fields::LAST_UPDATED);
                (id, data)
            })
            .collect()
    }
}
