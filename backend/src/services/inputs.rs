//! Request payloads accepted by [`LeagueService`](super::league::LeagueService).
//!
//! Patch types use `Option` for "leave unchanged". `TeamPatch::logo` is doubly
//! optional so an explicit `null` clears the logo.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::{ServiceError, ServiceResult};
use crate::api::{MatchId, MatchdayId, MatchdayStatus, TeamId, TournamentStatus};

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn required_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn optional_text(field: &str, value: Option<&String>) -> ServiceResult<()> {
    value.map_or(Ok(()), |v| required_text(field, v))
}

fn date_range(start: NaiveDate, end: NaiveDate) -> ServiceResult<()> {
    if end < start {
        return Err(ServiceError::invalid(format!(
            "endDate {} is before startDate {}",
            end, start
        )));
    }
    Ok(())
}

/// Largest accepted score for one side of a match.
pub const MAX_SCORE: i64 = u32::MAX as i64;

fn points_value(field: &str, value: Option<i64>) -> ServiceResult<()> {
    match value {
        Some(v) if i32::try_from(v).is_err() => Err(ServiceError::invalid(format!(
            "{} must fit in a 32-bit integer, got {}",
            field, v
        ))),
        _ => Ok(()),
    }
}

fn points_policy(win: Option<i64>, draw: Option<i64>, loss: Option<i64>) -> ServiceResult<()> {
    points_value("pointsWin", win)?;
    points_value("pointsDraw", draw)?;
    points_value("pointsLoss", loss)
}

fn matchday_number(number: i64) -> ServiceResult<()> {
    if number < 1 {
        return Err(ServiceError::invalid(format!(
            "matchday number must be at least 1, got {}",
            number
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewTeam {
    pub fn validate(&self) -> ServiceResult<()> {
        required_text("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo: Option<Option<String>>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl TeamPatch {
    pub fn validate(&self) -> ServiceResult<()> {
        optional_text("name", self.name.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    pub number: u32,
    pub position: String,
    pub team_id: TeamId,
}

impl NewPlayer {
    pub fn validate(&self) -> ServiceResult<()> {
        required_text("name", &self.name)?;
        required_text("position", &self.position)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

impl PlayerPatch {
    pub fn validate(&self) -> ServiceResult<()> {
        optional_text("name", self.name.as_ref())?;
        optional_text("position", self.position.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTournament {
    pub name: String,
    #[serde(default)]
    pub status: Option<TournamentStatus>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub team_ids: Vec<TeamId>,
    #[serde(default)]
    pub points_win: Option<i64>,
    #[serde(default)]
    pub points_draw: Option<i64>,
    #[serde(default)]
    pub points_loss: Option<i64>,
}

impl NewTournament {
    pub fn validate(&self) -> ServiceResult<()> {
        required_text("name", &self.name)?;
        date_range(self.start_date, self.end_date)?;
        points_policy(self.points_win, self.points_draw, self.points_loss)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<TournamentStatus>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub team_ids: Option<Vec<TeamId>>,
    #[serde(default)]
    pub points_win: Option<i64>,
    #[serde(default)]
    pub points_draw: Option<i64>,
    #[serde(default)]
    pub points_loss: Option<i64>,
}

impl TournamentPatch {
    pub fn validate(&self) -> ServiceResult<()> {
        optional_text("name", self.name.as_ref())?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            date_range(start, end)?;
        }
        points_policy(self.points_win, self.points_draw, self.points_loss)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatchday {
    pub number: i64,
    #[serde(default)]
    pub label: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: Option<MatchdayStatus>,
}

impl NewMatchday {
    pub fn validate(&self) -> ServiceResult<()> {
        matchday_number(self.number)
    }

    /// Explicit label, or "Matchday {number}".
    pub fn label(&self) -> String {
        self.label
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| format!("Matchday {}", self.number))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchdayPatch {
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<MatchdayStatus>,
}

impl MatchdayPatch {
    pub fn validate(&self) -> ServiceResult<()> {
        self.number.map_or(Ok(()), matchday_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatch {
    pub matchday_id: MatchdayId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl NewMatch {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.home_team_id == self.away_team_id {
            return Err(ServiceError::invalid(format!(
                "a team cannot play itself: {}",
                self.home_team_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPatch {
    #[serde(default)]
    pub matchday_id: Option<MatchdayId>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

/// Final score of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput {
    pub home_score: i64,
    pub away_score: i64,
}

impl ScoreInput {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.home_score < 0 || self.away_score < 0 {
            return Err(ServiceError::invalid(format!(
                "scores must be non-negative, got {}-{}",
                self.home_score, self.away_score
            )));
        }
        if self.home_score > MAX_SCORE || self.away_score > MAX_SCORE {
            return Err(ServiceError::invalid(format!(
                "scores must not exceed {}, got {}-{}",
                MAX_SCORE, self.home_score, self.away_score
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub match_id: MatchId,
    #[serde(flatten)]
    pub score: ScoreInput,
}

/// Body of the scores-batch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresBatch {
    pub matchday_id: MatchdayId,
    pub scores: Vec<MatchScore>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresBatchResult {
    /// Distinct matches written.
    pub updated: usize,
    /// Matches that moved into the completed status.
    pub newly_completed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_team_patch_distinguishes_null_logo_from_absent() {
        let cleared: TeamPatch = serde_json::from_value(json!({ "logo": null })).unwrap();
        assert_eq!(cleared.logo, Some(None));

        let untouched: TeamPatch = serde_json::from_value(json!({ "name": "Eagles" })).unwrap();
        assert_eq!(untouched.logo, None);

        let set: TeamPatch =
            serde_json::from_value(json!({ "logo": "https://img/e.png" })).unwrap();
        assert_eq!(set.logo, Some(Some("https://img/e.png".to_string())));
    }

    #[test]
    fn test_negative_scores_are_rejected() {
        let score = ScoreInput {
            home_score: -1,
            away_score: 2,
        };
        assert!(matches!(
            score.validate(),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_score_upper_bound() {
        let at_limit = ScoreInput {
            home_score: MAX_SCORE,
            away_score: 0,
        };
        assert!(at_limit.validate().is_ok());
        let over = ScoreInput {
            home_score: 0,
            away_score: MAX_SCORE + 1,
        };
        assert!(matches!(over.validate(), Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn test_points_policy_must_fit_i32() {
        let patch = TournamentPatch {
            points_win: Some(i64::from(i32::MAX) + 1),
            ..TournamentPatch::default()
        };
        assert!(matches!(patch.validate(), Err(ServiceError::InvalidArgument(_))));

        let negative = TournamentPatch {
            points_loss: Some(-1),
            ..TournamentPatch::default()
        };
        assert!(negative.validate().is_ok());
    }

    #[test]
    fn test_scores_batch_wire_format() {
        let batch: ScoresBatch = serde_json::from_value(json!({
            "matchdayId": "md1",
            "scores": [{ "matchId": "m1", "homeScore": 2, "awayScore": 0 }]
        }))
        .unwrap();
        assert_eq!(batch.scores[0].match_id.as_str(), "m1");
        assert_eq!(batch.scores[0].score.home_score, 2);
    }

    #[test]
    fn test_tournament_dates_must_be_ordered() {
        let tournament: NewTournament = serde_json::from_value(json!({
            "name": "Cup",
            "startDate": "2026-06-01",
            "endDate": "2026-03-01"
        }))
        .unwrap();
        assert!(tournament.validate().is_err());
    }

    #[test]
    fn test_matchday_label_defaults_to_number() {
        let md: NewMatchday =
            serde_json::from_value(json!({ "number": 4, "date": "2026-03-28" })).unwrap();
        assert_eq!(md.label(), "Matchday 4");
        assert!(md.validate().is_ok());

        let zero: NewMatchday =
            serde_json::from_value(json!({ "number": 0, "date": "2026-03-28" })).unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_new_match_rejects_same_teams() {
        let m: NewMatch = serde_json::from_value(json!({
            "matchdayId": "md1",
            "homeTeamId": "a",
            "awayTeamId": "a",
            "date": "2026-03-07"
        }))
        .unwrap();
        assert!(m.validate().is_err());
    }
}
