//! Persisted standings: recompute on match writes, idempotence, pruning, and
//! agreement with the matchday-filtered query.

mod support;

use league_standings::api::TournamentId;
use league_standings::services::{
    recalculate_standings, ServiceError, TeamPatch, TournamentPatch,
};
use support::LeagueFixture;

#[tokio::test]
async fn test_score_update_persists_ranked_table() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    f.play(&f.matchday, 0, 1, 21, 14).await;

    let table = f
        .service
        .standings(&f.league, &f.tournament, None)
        .await
        .unwrap();
    assert_eq!(table.len(), 2);

    let hawks = &table[0];
    assert_eq!(hawks.team_id, f.teams[0]);
    assert_eq!(hawks.team_name, "Hawks");
    assert_eq!((hawks.played, hawks.won, hawks.drawn, hawks.lost), (1, 1, 0, 0));
    assert_eq!(
        (hawks.score_for, hawks.score_against, hawks.score_difference),
        (21, 14, 7)
    );
    assert_eq!((hawks.points, hawks.rank), (3, 1));

    let bears = &table[1];
    assert_eq!(bears.team_id, f.teams[1]);
    assert_eq!((bears.points, bears.rank, bears.score_difference), (0, 2, -7));
}

#[tokio::test]
async fn test_scheduled_match_creates_zeroed_rows() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    f.schedule(&f.matchday, 0, 1).await;

    let table = f
        .service
        .standings(&f.league, &f.tournament, None)
        .await
        .unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.iter().all(|r| r.played == 0 && r.points == 0));
    // Full tie falls back to team id.
    assert!(table[0].team_id < table[1].team_id);
}

#[tokio::test]
async fn test_recompute_twice_yields_identical_table() {
    let f = LeagueFixture::new(&["Hawks", "Bears", "Owls"]).await;
    f.play(&f.matchday, 0, 1, 2, 2).await;
    f.play(&f.matchday, 2, 0, 1, 3).await;

    let first = f.standings_snapshot().await;
    recalculate_standings(&f.repo, &f.league, &f.tournament)
        .await
        .unwrap();
    let second = f.standings_snapshot().await;

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_persisted_table_equals_query_at_last_matchday() {
    let f = LeagueFixture::new(&["Hawks", "Bears", "Owls"]).await;
    let second = f.add_matchday(2).await;
    f.play(&f.matchday, 0, 1, 3, 1).await;
    f.play(&f.matchday, 1, 2, 0, 0).await;
    f.play(&second, 2, 0, 4, 2).await;

    let persisted = f
        .service
        .standings(&f.league, &f.tournament, None)
        .await
        .unwrap();
    let as_of_last = f
        .service
        .standings(&f.league, &f.tournament, Some("2"))
        .await
        .unwrap();
    assert_eq!(persisted, as_of_last);
}

#[tokio::test]
async fn test_matchday_cutoff_excludes_later_results() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    let second = f.add_matchday(2).await;
    f.play(&f.matchday, 0, 1, 1, 0).await;
    f.play(&second, 1, 0, 5, 0).await;

    let after_first = f
        .service
        .standings_as_of(&f.league, &f.tournament, 1)
        .await
        .unwrap();
    assert_eq!(after_first[0].team_id, f.teams[0]);
    assert_eq!(after_first[0].played, 1);

    let before_start = f
        .service
        .standings_as_of(&f.league, &f.tournament, 0)
        .await
        .unwrap();
    assert!(before_start.iter().all(|r| r.played == 0));
}

#[tokio::test]
async fn test_vanished_tournament_is_a_no_op() {
    let f = LeagueFixture::new(&["Hawks"]).await;
    let commits = f.repo.commit_count();
    let documents = f.repo.len();

    let changes = recalculate_standings(&f.repo, &f.league, &TournamentId::new("ghost"))
        .await
        .unwrap();
    assert!(changes.is_empty());
    assert_eq!(f.repo.commit_count(), commits);
    assert_eq!(f.repo.len(), documents);
}

#[tokio::test]
async fn test_team_removed_from_roster_loses_its_standing() {
    let f = LeagueFixture::new(&["Hawks", "Bears", "Owls"]).await;
    f.play(&f.matchday, 0, 1, 1, 0).await;
    assert_eq!(f.standings_snapshot().await.len(), 3);

    f.service
        .update_tournament(
            &f.league,
            &f.tournament,
            TournamentPatch {
                team_ids: Some(vec![f.teams[0].clone(), f.teams[1].clone()]),
                ..TournamentPatch::default()
            },
        )
        .await
        .unwrap();

    let snapshot = f.standings_snapshot().await;
    let ids: Vec<&str> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(snapshot.len(), 2);
    assert!(!ids.contains(&f.teams[2].as_str()));
}

#[tokio::test]
async fn test_points_policy_change_recomputes_points() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    f.play(&f.matchday, 0, 1, 1, 0).await;

    f.service
        .update_tournament(
            &f.league,
            &f.tournament,
            TournamentPatch {
                points_win: Some(2),
                points_loss: Some(1),
                ..TournamentPatch::default()
            },
        )
        .await
        .unwrap();

    let table = f
        .service
        .standings(&f.league, &f.tournament, None)
        .await
        .unwrap();
    assert_eq!(table[0].points, 2);
    assert_eq!(table[1].points, 1);
}

#[tokio::test]
async fn test_failed_commit_leaves_persisted_table_untouched() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    let m = f.play(&f.matchday, 0, 1, 1, 0).await;
    let before = f.standings_snapshot().await;

    f.repo.set_fail_commits(true);
    let result = recalculate_standings(&f.repo, &f.league, &f.tournament).await;
    assert!(matches!(result, Err(ServiceError::Internal(_))));

    let rescore = f
        .service
        .update_score(
            &f.league,
            &f.tournament,
            &m,
            league_standings::services::ScoreInput {
                home_score: 0,
                away_score: 9,
            },
        )
        .await;
    assert!(matches!(rescore, Err(ServiceError::Internal(_))));
    f.repo.set_fail_commits(false);

    assert_eq!(f.standings_snapshot().await, before);
    let stored = f.service.get_match(&f.league, &f.tournament, &m).await.unwrap();
    assert_eq!(stored.data.final_score(), Some((1, 0)));
}

#[tokio::test]
async fn test_matchday_parameter_must_be_an_integer() {
    let f = LeagueFixture::new(&["Hawks"]).await;
    let result = f
        .service
        .standings(&f.league, &f.tournament, Some("abc"))
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_unknown_tournament_is_not_found() {
    let f = LeagueFixture::new(&["Hawks"]).await;
    let ghost = TournamentId::new("ghost");

    let filtered = f.service.standings(&f.league, &ghost, Some("1")).await;
    assert!(matches!(filtered, Err(ServiceError::NotFound { .. })));

    let persisted = f.service.standings(&f.league, &ghost, None).await;
    assert!(matches!(persisted, Err(ServiceError::NotFound { .. })));
}

#[tokio::test]
async fn test_empty_team_color_and_logo_fall_back_to_defaults() {
    let f = LeagueFixture::new(&["Hawks", "Bears"]).await;
    f.play(&f.matchday, 0, 1, 2, 1).await;

    f.service
        .update_team(
            &f.league,
            &f.teams[0],
            TeamPatch {
                color: Some(String::new()),
                logo: Some(Some(String::new())),
                ..TeamPatch::default()
            },
        )
        .await
        .unwrap();
    f.service
        .recalculate_standings(&f.league, &f.tournament)
        .await
        .unwrap();

    for table in [
        f.service
            .standings(&f.league, &f.tournament, None)
            .await
            .unwrap(),
        f.service
            .standings(&f.league, &f.tournament, Some("1"))
            .await
            .unwrap(),
    ] {
        let hawks = table.iter().find(|r| r.team_id == f.teams[0]).unwrap();
        assert_eq!(hawks.team_color, "#000000");
        assert_eq!(hawks.team_logo, None);
    }
}
