//! Stored document shapes for the league collections.
//!
//! Field names are camelCase on the wire and in the store. Derived fields
//! (`playerCount`, `matchdayCount`, `matchCount`, `completedMatchCount`) are
//! maintained by the service layer and default to zero when absent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{MatchdayId, TeamId};

/// Stored field names used by queries and partial updates.
pub mod fields {
    pub const NAME: &str = "name";
    pub const LOGO: &str = "logo";
    pub const COLOR: &str = "color";
    pub const NUMBER: &str = "number";
    pub const STATUS: &str = "status";
    pub const DATE: &str = "date";
    pub const START_DATE: &str = "startDate";
    pub const END_DATE: &str = "endDate";
    pub const LABEL: &str = "label";
    pub const POSITION: &str = "position";
    pub const TIME: &str = "time";
    pub const VENUE: &str = "venue";
    pub const IS_ACTIVE: &str = "isActive";
    pub const TEAM_IDS: &str = "teamIds";
    pub const POINTS_WIN: &str = "pointsWin";
    pub const POINTS_DRAW: &str = "pointsDraw";
    pub const POINTS_LOSS: &str = "pointsLoss";
    pub const TEAM_ID: &str = "teamId";
    pub const TEAM_NAME: &str = "teamName";
    pub const TEAM_LOGO: &str = "teamLogo";
    pub const PLAYER_COUNT: &str = "playerCount";
    pub const MATCHDAY_COUNT: &str = "matchdayCount";
    pub const MATCH_COUNT: &str = "matchCount";
    pub const COMPLETED_MATCH_COUNT: &str = "completedMatchCount";
    pub const MATCHDAY_ID: &str = "matchdayId";
    pub const MATCHDAY_NUMBER: &str = "matchdayNumber";
    pub const HOME_TEAM_ID: &str = "homeTeamId";
    pub const HOME_TEAM_NAME: &str = "homeTeamName";
    pub const HOME_TEAM_LOGO: &str = "homeTeamLogo";
    pub const AWAY_TEAM_ID: &str = "awayTeamId";
    pub const AWAY_TEAM_NAME: &str = "awayTeamName";
    pub const AWAY_TEAM_LOGO: &str = "awayTeamLogo";
    pub const HOME_SCORE: &str = "homeScore";
    pub const AWAY_SCORE: &str = "awayScore";
    pub const POINTS: &str = "points";
    pub const SCORE_DIFFERENCE: &str = "scoreDifference";
    pub const SCORE_FOR: &str = "scoreFor";
    pub const LAST_UPDATED: &str = "lastUpdated";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

pub const DEFAULT_TEAM_COLOR: &str = "#000000";

fn default_team_color() -> String {
    DEFAULT_TEAM_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_points_win() -> i64 {
    PointsPolicy::default().win
}

fn default_points_draw() -> i64 {
    PointsPolicy::default().draw
}

fn default_points_loss() -> i64 {
    PointsPolicy::default().loss
}

/// Points awarded per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsPolicy {
    pub win: i64,
    pub draw: i64,
    pub loss: i64,
}

impl Default for PointsPolicy {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default = "default_team_color")]
    pub color: String,
    #[serde(default)]
    pub player_count: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub number: u32,
    pub position: String,
    pub team_id: TeamId,
    /// Copy of the owning team's name.
    #[serde(default)]
    pub team_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Upcoming,
    Active,
    Finished,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub name: String,
    pub status: TournamentStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Participating teams, in registration order.
    #[serde(default)]
    pub team_ids: Vec<TeamId>,
    #[serde(default = "default_points_win")]
    pub points_win: i64,
    #[serde(default = "default_points_draw")]
    pub points_draw: i64,
    #[serde(default = "default_points_loss")]
    pub points_loss: i64,
    #[serde(default)]
    pub matchday_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tournament {
    pub fn points_policy(&self) -> PointsPolicy {
        PointsPolicy {
            win: self.points_win,
            draw: self.points_draw,
            loss: self.points_loss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchdayStatus {
    Upcoming,
    InProgress,
    Completed,
}

impl MatchdayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchday {
    /// Competition order within the tournament; also the standings cutoff key.
    pub number: i64,
    pub label: String,
    pub date: NaiveDate,
    pub status: MatchdayStatus,
    #[serde(default)]
    pub match_count: i64,
    #[serde(default)]
    pub completed_match_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub matchday_id: MatchdayId,
    /// Copy of the matchday's number, kept in step with `matchday_id`.
    pub matchday_number: i64,
    pub home_team_id: TeamId,
    #[serde(default)]
    pub home_team_name: String,
    #[serde(default)]
    pub home_team_logo: Option<String>,
    pub away_team_id: TeamId,
    #[serde(default)]
    pub away_team_name: String,
    #[serde(default)]
    pub away_team_logo: Option<String>,
    #[serde(default)]
    pub home_score: Option<i64>,
    #[serde(default)]
    pub away_score: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub venue: String,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Final score, present only for a completed match with both scores set.
    pub fn final_score(&self) -> Option<(i64, i64)> {
        match (self.status, self.home_score, self.away_score) {
            (MatchStatus::Completed, Some(home), Some(away)) => Some((home, away)),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}

/// Persisted standings row. `rank` and `score_difference` are recomputed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub team_id: TeamId,
    pub team_name: String,
    #[serde(default)]
    pub team_logo: Option<String>,
    #[serde(default = "default_team_color")]
    pub team_color: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub score_for: i64,
    pub score_against: i64,
    #[serde(default)]
    pub score_difference: i64,
    pub points: i64,
    #[serde(default)]
    pub rank: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}
