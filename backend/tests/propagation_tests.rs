//! Team name and logo fan-out to players, matches and standings.

mod support;

use league_standings::api::{PlayerId, Team, TeamId};
use league_standings::db::repository::{DocumentPath, StoreLimits};
use league_standings::db::LocalRepository;
use league_standings::models::fields;
use league_standings::services::{
    propagate_team_changes, NewPlayer, NewTeam, NewTournament, TeamPatch,
};
use serde_json::json;
use support::{date, LeagueFixture};

async fn add_player(f: &LeagueFixture, team: usize, name: &str, number: u32) -> PlayerId {
    let player = f
        .service
        .create_player(
            &f.league,
            NewPlayer {
                name: name.to_string(),
                number,
                position: "Forward".to_string(),
                team_id: f.teams[team].clone(),
            },
        )
        .await
        .unwrap();
    PlayerId::new(player.id)
}

fn player_path(id: &PlayerId) -> DocumentPath {
    DocumentPath::parse(format!("leagues/l1/players/{}", id)).unwrap()
}

#[tokio::test]
async fn test_rename_reaches_players_matches_and_standings() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    let p1 = add_player(&f, 0, "Ana", 9).await;
    let p2 = add_player(&f, 0, "Bo", 10).await;
    let m = f.play(&f.matchday, 0, 1, 21, 14).await;
    let standing_path = DocumentPath::parse(format!(
        "leagues/l1/tournaments/{}/standings/{}",
        f.tournament, f.teams[0]
    ))
    .unwrap();
    let before = f.fields_of(&standing_path).await.unwrap();

    f.service
        .update_team(
            &f.league,
            &f.teams[0],
            TeamPatch {
                name: Some("Eagles".to_string()),
                ..TeamPatch::default()
            },
        )
        .await
        .unwrap();

    for player in [&p1, &p2] {
        let data = f.fields_of(&player_path(player)).await.unwrap();
        assert_eq!(data.get(fields::TEAM_NAME), Some(&json!("Eagles")));
    }

    let stored = f.service.get_match(&f.league, &f.tournament, &m).await.unwrap();
    assert_eq!(stored.data.home_team_name, "Eagles");
    assert_eq!(stored.data.away_team_name, "Bears");

    let after = f.fields_of(&standing_path).await.unwrap();
    assert_eq!(after.get(fields::TEAM_NAME), Some(&json!("Eagles")));
    for field in ["played", "won", "drawn", "lost", "scoreFor", "scoreAgainst", "points"] {
        assert_eq!(before.get(field), after.get(field), "{} changed", field);
    }
}

#[tokio::test]
async fn test_logo_change_skips_players() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    let p1 = add_player(&f, 1, "Cy", 4).await;
    let m = f.play(&f.matchday, 0, 1, 0, 1).await;
    let player_before = f.fields_of(&player_path(&p1)).await.unwrap();

    f.service
        .update_team(
            &f.league,
            &f.teams[1],
            TeamPatch {
                logo: Some(Some("https://img/bears.png".to_string())),
                ..TeamPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(f.fields_of(&player_path(&p1)).await.unwrap(), player_before);
    let stored = f.service.get_match(&f.league, &f.tournament, &m).await.unwrap();
    assert_eq!(
        stored.data.away_team_logo.as_deref(),
        Some("https://img/bears.png")
    );
    assert_eq!(stored.data.away_team_name, "Bears");

    let table = f
        .service
        .standings(&f.league, &f.tournament, None)
        .await
        .unwrap();
    let bears = table.iter().find(|r| r.team_id == f.teams[1]).unwrap();
    assert_eq!(bears.team_logo.as_deref(), Some("https://img/bears.png"));
}

#[tokio::test]
async fn test_color_change_writes_only_the_team() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    add_player(&f, 0, "Ana", 9).await;
    f.play(&f.matchday, 0, 1, 2, 0).await;
    let commits = f.repo.commit_count();

    f.service
        .update_team(
            &f.league,
            &f.teams[0],
            TeamPatch {
                color: Some("#ff0000".to_string()),
                ..TeamPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(f.repo.commit_count(), commits + 1);
}

#[tokio::test]
async fn test_missing_standing_is_not_created() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    let other = f
        .service
        .create_tournament(
            &f.league,
            NewTournament {
                name: "Autumn Cup".to_string(),
                status: None,
                start_date: date(1),
                end_date: date(30),
                team_ids: vec![f.teams[1].clone()],
                points_win: None,
                points_draw: None,
                points_loss: None,
            },
        )
        .await
        .unwrap();

    f.service
        .update_team(
            &f.league,
            &f.teams[0],
            TeamPatch {
                name: Some("Eagles".to_string()),
                ..TeamPatch::default()
            },
        )
        .await
        .unwrap();

    let path = DocumentPath::parse(format!(
        "leagues/l1/tournaments/{}/standings/{}",
        other.id, f.teams[0]
    ))
    .unwrap();
    assert!(f.fields_of(&path).await.is_none());
}

#[tokio::test]
async fn test_player_updates_split_by_batch_limit() {
    let repo = LocalRepository::with_limits(StoreLimits {
        max_in_values: 30,
        max_batch_writes: 2,
    });
    let f = LeagueFixture::with_repo(repo, &["Hawks"]).await;
    let mut players = Vec::new();
    for n in 1..=5 {
        players.push(add_player(&f, 0, &format!("P{}", n), n).await);
    }

    let before: Team = serde_json::from_value(json!({ "name": "Hawks" })).unwrap();
    let after: Team = serde_json::from_value(json!({ "name": "Eagles" })).unwrap();
    let changes = propagate_team_changes(&f.repo, &f.league, &f.teams[0], &before, &after)
        .await
        .unwrap();
    assert_eq!(changes.len(), 5);

    for player in &players {
        let data = f.fields_of(&player_path(player)).await.unwrap();
        assert_eq!(data.get(fields::TEAM_NAME), Some(&json!("Eagles")));
    }
}

#[tokio::test]
async fn test_tournament_over_batch_limit_is_still_fully_renamed() {
    let repo = LocalRepository::with_limits(StoreLimits {
        max_in_values: 30,
        max_batch_writes: 2,
    });
    let f = LeagueFixture::with_repo(repo, &["Hawks", "Bears"]).await;
    let mut games = Vec::new();
    for (hs, aws) in [(1, 0), (0, 0), (2, 3)] {
        games.push(f.play(&f.matchday, 0, 1, hs, aws).await);
    }

    f.service
        .update_team(
            &f.league,
            &f.teams[0],
            TeamPatch {
                name: Some("Eagles".to_string()),
                ..TeamPatch::default()
            },
        )
        .await
        .unwrap();

    for game in &games {
        let stored = f.service.get_match(&f.league, &f.tournament, game).await.unwrap();
        assert_eq!(stored.data.home_team_name, "Eagles");
    }
    let table = f
        .service
        .standings(&f.league, &f.tournament, None)
        .await
        .unwrap();
    let eagles = table.iter().find(|r| r.team_id == f.teams[0]).unwrap();
    assert_eq!(eagles.team_name, "Eagles");
    assert_eq!((eagles.won, eagles.drawn, eagles.lost), (1, 1, 1));
}

#[tokio::test]
async fn test_unchanged_team_propagates_nothing() {
    let f = LeagueFixture::new(&["Hawks"]).await;
    let team: Team = serde_json::from_value(json!({ "name": "Hawks" })).unwrap();
    let commits = f.repo.commit_count();

    let changes = propagate_team_changes(&f.repo, &f.league, &TeamId::new("any"), &team, &team)
        .await
        .unwrap();
    assert!(changes.is_empty());
    assert_eq!(f.repo.commit_count(), commits);
}

#[tokio::test]
async fn test_new_player_copies_team_name() {
    let f = LeagueFixture::new(&["Hawks"]).await;
    let team = f
        .service
        .create_team(
            &f.league,
            NewTeam {
                name: "Owls".to_string(),
                logo: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let player = f
        .service
        .create_player(
            &f.league,
            NewPlayer {
                name: "Dee".to_string(),
                number: 1,
                position: "Keeper".to_string(),
                team_id: TeamId::new(team.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(player.data.team_name, "Owls");
}
