//! Change-event routing from committed batches to the trigger handlers.
//!
//! Every service write hands its [`DocumentChange`] list to a
//! [`TriggerDispatcher`]. Match writes recompute the tournament's standings,
//! team updates fan out name and logo copies, and tournament roster or points
//! policy changes recompute standings too. Changes produced by a handler are
//! routed again, so a team rename that rewrites match copies also refreshes the
//! affected tables.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use super::error::ServiceResult;
use super::propagation::{propagate_team_changes, TeamChange};
use super::standings_trigger::recalculate_standings;
use crate::api::{LeagueId, Team, TeamId, TournamentId};
use crate::db::paths::LeaguePath;
use crate::db::repository::{Document, DocumentChange, DocumentStore};
use crate::models::fields;

/// Upper bound on handler-to-handler cascades.
const MAX_CASCADE_DEPTH: usize = 4;

/// How handlers run relative to the write that produced the changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Await handlers before returning.
    Inline,
    /// Run handlers on a spawned tokio task.
    #[default]
    Background,
}

impl FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" | "sync" => Ok(Self::Inline),
            "background" | "async" => Ok(Self::Background),
            other => Err(format!(
                "Unknown trigger mode '{}'. Valid options: inline, background",
                other
            )),
        }
    }
}

/// Work derived from a committed batch.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    RecalculateStandings {
        league: LeagueId,
        tournament: TournamentId,
    },
    PropagateTeam {
        league: LeagueId,
        team: TeamId,
        before: Box<Team>,
        after: Box<Team>,
    },
}

fn decode_team(doc: &Document) -> Option<Team> {
    match doc.decode::<Team>() {
        Ok(team) => Some(team),
        Err(e) => {
            tracing::debug!(path = %doc.path, error = %e, "unreadable team snapshot ignored");
            None
        }
    }
}

fn standings_inputs_changed(before: &Document, after: &Document) -> bool {
    [
        fields::TEAM_IDS,
        fields::POINTS_WIN,
        fields::POINTS_DRAW,
        fields::POINTS_LOSS,
    ]
    .iter()
    .any(|field| before.get(field) != after.get(field))
}

/// Map a batch's changes to trigger events.
///
/// Standings recomputes are de-duplicated per tournament and keep the order in
/// which their tournament first appeared. Standings, player and matchday writes
/// produce no events.
pub fn route_changes(changes: &[DocumentChange]) -> Vec<TriggerEvent> {
    let mut events = Vec::new();
    let mut recomputes: HashSet<(LeagueId, TournamentId)> = HashSet::new();
    let mut recompute = |events: &mut Vec<TriggerEvent>, league: LeagueId, tournament: TournamentId| {
        if recomputes.insert((league.clone(), tournament.clone())) {
            events.push(TriggerEvent::RecalculateStandings { league, tournament });
        }
    };

    for change in changes {
        match LeaguePath::parse(&change.path) {
            Some(LeaguePath::Match(league, tournament, _)) => {
                recompute(&mut events, league, tournament);
            }
            Some(LeaguePath::Team(league, team)) => {
                let (Some(before), Some(after)) = (&change.before, &change.after) else {
                    continue;
                };
                let (Some(before), Some(after)) = (decode_team(before), decode_team(after)) else {
                    continue;
                };
                if TeamChange::between(&before, &after).is_empty() {
                    continue;
                }
                events.push(TriggerEvent::PropagateTeam {
                    league,
                    team,
                    before: Box::new(before),
                    after: Box::new(after),
                });
            }
            Some(LeaguePath::Tournament(league, tournament)) => {
                if let (Some(before), Some(after)) = (&change.before, &change.after) {
                    if standings_inputs_changed(before, after) {
                        recompute(&mut events, league, tournament);
                    }
                }
            }
            _ => {}
        }
    }
    events
}

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers executed, across every cascade round.
    pub handled: usize,
    /// Handlers that returned an error.
    pub failed: usize,
    /// Documents written by handlers.
    pub written: usize,
}

/// Runs trigger handlers against a shared store.
#[derive(Clone)]
pub struct TriggerDispatcher {
    store: Arc<dyn DocumentStore>,
    mode: TriggerMode,
}

impl std::fmt::Debug for TriggerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerDispatcher")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl TriggerDispatcher {
    pub fn new(store: Arc<dyn DocumentStore>, mode: TriggerMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Hand a committed batch's changes to the handlers.
    ///
    /// Never fails: handler errors are logged. In background mode this returns
    /// as soon as the task is spawned.
    pub async fn dispatch(&self, changes: Vec<DocumentChange>) {
        let events = route_changes(&changes);
        if events.is_empty() {
            return;
        }
        match self.mode {
            TriggerMode::Inline => {
                self.run_events(events).await;
            }
            TriggerMode::Background => {
                let dispatcher = self.clone();
                tokio::spawn(async move {
                    dispatcher.run_events(events).await;
                });
            }
        }
    }

    /// Route `changes` and run every resulting handler to completion.
    pub async fn run(&self, changes: &[DocumentChange]) -> DispatchReport {
        self.run_events(route_changes(changes)).await
    }

    async fn run_events(&self, mut events: Vec<TriggerEvent>) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut depth = 0;

        while !events.is_empty() {
            if depth == MAX_CASCADE_DEPTH {
                tracing::warn!(
                    pending = events.len(),
                    depth,
                    "trigger cascade depth reached; remaining events dropped"
                );
                break;
            }
            depth += 1;

            let mut produced = Vec::new();
            for event in &events {
                report.handled += 1;
                match self.handle(event).await {
                    Ok(changes) => {
                        report.written += changes.len();
                        produced.extend(changes);
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(event = ?event, error = %e, "trigger handler failed");
                    }
                }
            }
            events = route_changes(&produced);
        }
        report
    }

    async fn handle(&self, event: &TriggerEvent) -> ServiceResult<Vec<DocumentChange>> {
        let store = self.store.as_ref();
        match event {
            TriggerEvent::RecalculateStandings { league, tournament } => {
                recalculate_standings(store, league, tournament).await
            }
            TriggerEvent::PropagateTeam {
                league,
                team,
                before,
                after,
            } => propagate_team_changes(store, league, team, before, after).await,
        }
    }
}
