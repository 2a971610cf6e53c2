//! End-to-end tests of the REST API against the in-memory store.

#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use league_standings::db::LocalRepository;
use league_standings::http::{create_router, AppState};
use league_standings::services::TriggerMode;

fn app() -> Router {
    create_router(AppState::new(
        Arc::new(LocalRepository::new()),
        TriggerMode::Inline,
    ))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, uri: &str, body: Value) -> String {
    let (status, created) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created["id"].as_str().unwrap().to_string()
}

/// Two teams, one tournament, one matchday with one scheduled match.
struct Season {
    hawks: String,
    bears: String,
    tournament: String,
    matchday: String,
    game: String,
}

async fn season(app: &Router) -> Season {
    let hawks = create(app, "/v1/leagues/l1/teams", json!({ "name": "Hawks" })).await;
    let bears = create(app, "/v1/leagues/l1/teams", json!({ "name": "Bears" })).await;
    let tournament = create(
        app,
        "/v1/leagues/l1/tournaments",
        json!({
            "name": "Spring Cup",
            "startDate": "2026-03-01",
            "endDate": "2026-05-31",
            "teamIds": [hawks, bears],
        }),
    )
    .await;
    let base = format!("/v1/leagues/l1/tournaments/{}", tournament);
    let matchday = create(
        app,
        &format!("{}/matchdays", base),
        json!({ "number": 1, "date": "2026-03-07" }),
    )
    .await;
    let game = create(
        app,
        &format!("{}/matches", base),
        json!({
            "matchdayId": matchday,
            "homeTeamId": hawks,
            "awayTeamId": bears,
            "date": "2026-03-07",
            "time": "18:00",
        }),
    )
    .await;
    Season {
        hawks,
        bears,
        tournament,
        matchday,
        game,
    }
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_create_team_returns_document() {
    let app = app();
    let (status, team) = send(
        &app,
        Method::POST,
        "/v1/leagues/l1/teams",
        Some(json!({ "name": "Hawks" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(team["name"], "Hawks");
    assert_eq!(team["color"], "#000000");
    assert_eq!(team["playerCount"], 0);

    let uri = format!("/v1/leagues/l1/teams/{}", team["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], team["id"]);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_argument() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/leagues/l1/teams")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_blank_team_name_is_rejected() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/leagues/l1/teams",
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_non_integer_matchday_is_invalid_argument() {
    let app = app();
    let s = season(&app).await;
    let uri = format!(
        "/v1/leagues/l1/tournaments/{}/standings?matchday=abc",
        s.tournament
    );
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_unknown_tournament_standings_is_not_found() {
    let (status, body) = send(
        &app(),
        Method::GET,
        "/v1/leagues/l1/tournaments/ghost/standings?matchday=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_scores_batch_then_standings() {
    let app = app();
    let s = season(&app).await;
    let base = format!("/v1/leagues/l1/tournaments/{}", s.tournament);

    let (status, result) = send(
        &app,
        Method::PATCH,
        &format!("{}/matches/scores-batch", base),
        Some(json!({
            "matchdayId": s.matchday,
            "scores": [{ "matchId": s.game, "homeScore": 21, "awayScore": 14 }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", result);
    assert_eq!(result["updated"], 1);
    assert_eq!(result["newlyCompleted"], 1);

    let (status, table) = send(&app, Method::GET, &format!("{}/standings", base), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["tournamentId"], s.tournament.as_str());
    assert!(table.get("matchday").is_none());
    let rows = table["standings"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["teamId"], s.hawks.as_str());
    assert_eq!(rows[0]["points"], 3);
    assert_eq!(rows[0]["scoreDifference"], 7);
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[1]["teamId"], s.bears.as_str());
    assert_eq!(rows[1]["rank"], 2);

    let (status, matchday) = send(
        &app,
        Method::GET,
        &format!("{}/matchdays/{}", base, s.matchday),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matchday["matchCount"], 1);
    assert_eq!(matchday["completedMatchCount"], 1);
}

#[tokio::test]
async fn test_single_score_and_matchday_query() {
    let app = app();
    let s = season(&app).await;
    let base = format!("/v1/leagues/l1/tournaments/{}", s.tournament);

    let (status, game) = send(
        &app,
        Method::PATCH,
        &format!("{}/matches/{}/score", base, s.game),
        Some(json!({ "homeScore": 1, "awayScore": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", game);
    assert_eq!(game["status"], "completed");

    let (status, table) = send(
        &app,
        Method::GET,
        &format!("{}/standings?matchday=1", base),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["matchday"], 1);
    let rows = table["standings"].as_array().unwrap();
    assert!(rows.iter().all(|r| r["points"] == 1 && r["drawn"] == 1));
}

#[tokio::test]
async fn test_standings_by_matchday_callable() {
    let app = app();
    let s = season(&app).await;
    let base = format!("/v1/leagues/l1/tournaments/{}", s.tournament);
    send(
        &app,
        Method::PATCH,
        &format!("{}/matches/{}/score", base, s.game),
        Some(json!({ "homeScore": 0, "awayScore": 2 })),
    )
    .await;

    let (status, table) = send(
        &app,
        Method::POST,
        "/v1/standings/by-matchday",
        Some(json!({
            "leagueId": "l1",
            "tournamentId": s.tournament,
            "matchdayNumber": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", table);
    assert_eq!(table["matchday"], 1);
    assert_eq!(table["standings"][0]["teamId"], s.bears.as_str());

    let (status, before) = send(
        &app,
        Method::POST,
        "/v1/standings/by-matchday",
        Some(json!({
            "leagueId": "l1",
            "tournamentId": s.tournament,
            "matchdayNumber": 0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(before["standings"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["played"] == 0));
}

#[tokio::test]
async fn test_recalculate_endpoint() {
    let app = app();
    let s = season(&app).await;
    let uri = format!(
        "/v1/leagues/l1/tournaments/{}/standings/recalculate",
        s.tournament
    );
    let (status, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["written"], 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/leagues/l1/tournaments/ghost/standings/recalculate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_team_rename_visible_on_match() {
    let app = app();
    let s = season(&app).await;
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/leagues/l1/teams/{}", s.hawks),
        Some(json!({ "name": "Eagles" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, game) = send(
        &app,
        Method::GET,
        &format!(
            "/v1/leagues/l1/tournaments/{}/matches/{}",
            s.tournament, s.game
        ),
        None,
    )
    .await;
    assert_eq!(game["homeTeamName"], "Eagles");
}
