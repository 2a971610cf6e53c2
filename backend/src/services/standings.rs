//! League table computation.
//!
//! [`compute_standings`] is a total, side-effect-free function shared by the
//! persisted recompute and the matchday-filtered query. [`rank_standings`]
//! holds the ordering rules and is also applied to persisted rows on read.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::api::{Match, PointsPolicy, Standing, TeamId};
use crate::models::DEFAULT_TEAM_COLOR;

/// Display fields of a team copied onto its standing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub name: String,
    pub logo: Option<String>,
    pub color: String,
}

impl TeamInfo {
    pub fn new(name: impl Into<String>, logo: Option<String>, color: Option<String>) -> Self {
        Self {
            name: name.into(),
            logo: logo.filter(|l| !l.is_empty()),
            color: color
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_TEAM_COLOR.to_string()),
        }
    }
}

/// Final result of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMatch {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_score: i64,
    pub away_score: i64,
}

impl CompletedMatch {
    pub fn new(home: impl Into<TeamId>, away: impl Into<TeamId>, home_score: i64, away_score: i64) -> Self {
        Self {
            home_team_id: home.into(),
            away_team_id: away.into(),
            home_score,
            away_score,
        }
    }

    /// `None` unless the match is completed with both scores set.
    pub fn from_match(m: &Match) -> Option<Self> {
        m.final_score().map(|(home_score, away_score)| Self {
            home_team_id: m.home_team_id.clone(),
            away_team_id: m.away_team_id.clone(),
            home_score,
            away_score,
        })
    }
}

/// One ranked line of a league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub team_logo: Option<String>,
    pub team_color: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub score_for: i64,
    pub score_against: i64,
    pub score_difference: i64,
    pub points: i64,
    pub rank: u32,
}

impl StandingRow {
    fn zeroed(team_id: TeamId, info: &TeamInfo) -> Self {
        Self {
            team_id,
            team_name: info.name.clone(),
            team_logo: info.logo.clone(),
            team_color: info.color.clone(),
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            score_for: 0,
            score_against: 0,
            score_difference: 0,
            points: 0,
            rank: 0,
        }
    }

    // Stored documents may hold values beyond the input bounds; saturate.
    fn record(&mut self, scored: i64, conceded: i64, policy: &PointsPolicy) {
        self.played = self.played.saturating_add(1);
        self.score_for = self.score_for.saturating_add(scored);
        self.score_against = self.score_against.saturating_add(conceded);
        let awarded = match scored.cmp(&conceded) {
            Ordering::Greater => {
                self.won = self.won.saturating_add(1);
                policy.win
            }
            Ordering::Less => {
                self.lost = self.lost.saturating_add(1);
                policy.loss
            }
            Ordering::Equal => {
                self.drawn = self.drawn.saturating_add(1);
                policy.draw
            }
        };
        self.points = self.points.saturating_add(awarded);
    }
}

impl From<Standing> for StandingRow {
    fn from(s: Standing) -> Self {
        Self {
            team_id: s.team_id,
            team_name: s.team_name,
            team_logo: s.team_logo,
            team_color: s.team_color,
            played: s.played,
            won: s.won,
            drawn: s.drawn,
            lost: s.lost,
            score_for: s.score_for,
            score_against: s.score_against,
            score_difference: s.score_difference,
            points: s.points,
            rank: s.rank,
        }
    }
}

/// Table order: points, then score difference, then score for (all
/// descending), then team id ascending.
pub fn compare_rows(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.score_difference.cmp(&a.score_difference))
        .then_with(|| b.score_for.cmp(&a.score_for))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Recompute score differences, sort, and assign 1-based positional ranks.
pub fn rank_standings(mut rows: Vec<StandingRow>) -> Vec<StandingRow> {
    for row in rows.iter_mut() {
        row.score_difference = row.score_for.saturating_sub(row.score_against);
    }
    rows.sort_by(compare_rows);
    for (position, row) in rows.iter_mut().enumerate() {
        row.rank = u32::try_from(position + 1).unwrap_or(u32::MAX);
    }
    rows
}

/// Build the ranked table for `team_ids` from completed matches.
///
/// Teams without an entry in `team_info` are left out. Matches involving a
/// team outside the table are skipped. Duplicate ids in `team_ids` count once.
pub fn compute_standings(
    matches: &[CompletedMatch],
    team_ids: &[TeamId],
    team_info: &HashMap<TeamId, TeamInfo>,
    policy: &PointsPolicy,
) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = Vec::with_capacity(team_ids.len());
    let mut index: HashMap<TeamId, usize> = HashMap::with_capacity(team_ids.len());

    for team_id in team_ids {
        if index.contains_key(team_id) {
            continue;
        }
        match team_info.get(team_id) {
            Some(info) => {
                index.insert(team_id.clone(), rows.len());
                rows.push(StandingRow::zeroed(team_id.clone(), info));
            }
            None => tracing::debug!(team_id = %team_id, "team has no info; left out of table"),
        }
    }

    for m in matches {
        let (Some(&home), Some(&away)) = (index.get(&m.home_team_id), index.get(&m.away_team_id))
        else {
            tracing::debug!(
                home = %m.home_team_id,
                away = %m.away_team_id,
                "match references a team outside the table; skipped"
            );
            continue;
        };
        rows[home].record(m.home_score, m.away_score, policy);
        rows[away].record(m.away_score, m.home_score, policy);
    }

    rank_standings(rows)
}

#[cfg(test)]
#[path = "standings_tests.rs"]
mod standings_tests;
