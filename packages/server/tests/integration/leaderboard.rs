use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use crate::common::{TestApp, routes};

/// Event with three registered participants; returns (event_id, owner token,
/// participant user ids in registration order).
async fn scored_event(app: &TestApp) -> (i32, String, Vec<i32>) {
    let owner = app
        .create_user_with_role("owner@example.com", "securepass", "organizer")
        .await;
    let event_id = app.create_event(&owner, "Code Sprint", 50, 0).await;

    let mut user_ids = Vec::new();
    for email in ["alice@example.com", "bob@example.com", "carol@example.com"] {
        let token = app.create_authenticated_user(email, "securepass").await;
        app.register_for_event(event_id, &token).await;
        user_ids.push(app.user_id(email).await);
    }

    (event_id, owner, user_ids)
}

mod scoring {
    use super::*;

    #[tokio::test]
    async fn the_owner_scores_and_the_board_ranks_highest_first() {
        let app = TestApp::spawn().await;
        let (event_id, owner, users) = scored_event(&app).await;

        for (user_id, score) in [(users[0], 30), (users[1], 50), (users[2], 10)] {
            let res = app
                .put_with_token(
                    &routes::leaderboard_score(event_id, user_id),
                    &json!({"score": score}),
                    &owner,
                )
                .await;
            assert_eq!(res.status, 200, "score update failed: {}", res.text);
        }

        let board = app.get_without_token(&routes::leaderboard(event_id)).await;
        assert_eq!(board.status, 200);
        let entries = board.body.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["user_id"], users[1]);
        assert_eq!(entries[0]["score"], 50);
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[1]["user_id"], users[0]);
        assert_eq!(entries[2]["user_id"], users[2]);
        assert_eq!(entries[2]["rank"], 3);
    }

    #[tokio::test]
    async fn participants_start_at_zero() {
        let app = TestApp::spawn().await;
        let (event_id, owner, users) = scored_event(&app).await;

        let res = app
            .get_with_token(&routes::leaderboard_score(event_id, users[0]), &owner)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["score"], 0);
    }

    #[tokio::test]
    async fn only_the_owner_or_admin_may_score() {
        let app = TestApp::spawn().await;
        let (event_id, _, users) = scored_event(&app).await;
        let stranger = app
            .create_user_with_role("other@example.com", "securepass", "organizer")
            .await;

        let res = app
            .put_with_token(
                &routes::leaderboard_score(event_id, users[0]),
                &json!({"score": 99}),
                &stranger,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn scoring_an_unregistered_user_is_not_found() {
        let app = TestApp::spawn().await;
        let (event_id, owner, _) = scored_event(&app).await;

        let res = app
            .put_with_token(
                &routes::leaderboard_score(event_id, 9999),
                &json!({"score": 10}),
                &owner,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn negative_scores_are_rejected() {
        let app = TestApp::spawn().await;
        let (event_id, owner, users) = scored_event(&app).await;

        let res = app
            .put_with_token(
                &routes::leaderboard_score(event_id, users[0]),
                &json!({"score": -5}),
                &owner,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn score_updates_are_emitted_to_the_event_room() {
        let app = TestApp::spawn().await;
        let (event_id, owner, users) = scored_event(&app).await;
        let mut rx = app.hub.subscribe();

        app.put_with_token(
            &routes::leaderboard_score(event_id, users[0]),
            &json!({"score": 42}),
            &owner,
        )
        .await;

        let envelope = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for fan-out")
            .expect("hub channel closed");
        assert_eq!(envelope.event, "scoreUpdated");
        assert_eq!(envelope.room.as_deref(), Some(format!("event-{event_id}").as_str()));
        assert_eq!(envelope.data["score"], 42);
    }
}

mod standings {
    use super::*;

    #[tokio::test]
    async fn top_performers_sum_scores_across_events() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_user_with_role("owner@example.com", "securepass", "organizer")
            .await;
        let sprint = app.create_event(&owner, "Code Sprint", 50, 0).await;
        let quiz = app.create_event(&owner, "Tech Quiz", 50, 0).await;

        let alice = app.create_authenticated_user("alice@example.com", "securepass").await;
        let bob = app.create_authenticated_user("bob@example.com", "securepass").await;
        app.register_for_event(sprint, &alice).await;
        app.register_for_event(quiz, &alice).await;
        app.register_for_event(sprint, &bob).await;
        let alice_id = app.user_id("alice@example.com").await;
        let bob_id = app.user_id("bob@example.com").await;

        for (event_id, user_id, score) in
            [(sprint, alice_id, 30), (quiz, alice_id, 20), (sprint, bob_id, 40)]
        {
            let res = app
                .put_with_token(
                    &routes::leaderboard_score(event_id, user_id),
                    &json!({"score": score}),
                    &owner,
                )
                .await;
            assert_eq!(res.status, 200);
        }

        let top = app.get_without_token(routes::LEADERBOARD_TOP).await;
        assert_eq!(top.status, 200);
        let entries = top.body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["user_id"], alice_id);
        assert_eq!(entries[0]["total_score"], 50);
        assert_eq!(entries[0]["events"], 2);
        assert_eq!(entries[1]["user_id"], bob_id);
        assert_eq!(entries[1]["total_score"], 40);
    }

    #[tokio::test]
    async fn the_limit_parameter_caps_the_top_list() {
        let app = TestApp::spawn().await;
        let (event_id, owner, users) = scored_event(&app).await;
        for (i, user_id) in users.iter().enumerate() {
            app.put_with_token(
                &routes::leaderboard_score(event_id, *user_id),
                &json!({"score": (i as i32 + 1) * 10}),
                &owner,
            )
            .await;
        }

        let path = format!("{}?limit=1", routes::LEADERBOARD_TOP);
        let top = app.get_without_token(&path).await;
        assert_eq!(top.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn colleges_are_ranked_by_their_participants_total() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_user_with_role("owner@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&owner, "Code Sprint", 50, 0).await;

        for (email, college) in [
            ("alice@example.com", "North College"),
            ("bob@example.com", "North College"),
            ("carol@example.com", "South College"),
        ] {
            app.create_authenticated_user(email, "securepass").await;
            app.set_user_college(email, college).await;
        }
        // The ledger snapshots the college at registration time, so the
        // college must be in place before registering.
        let mut ids = Vec::new();
        for email in ["alice@example.com", "bob@example.com", "carol@example.com"] {
            let login = serde_json::json!({"email": email, "password": "securepass"});
            let token = app.post_without_token(routes::LOGIN, &login).await.body["token"]
                .as_str()
                .unwrap()
                .to_string();
            app.register_for_event(event_id, &token).await;
            ids.push(app.user_id(email).await);
        }

        for (user_id, score) in [(ids[0], 10), (ids[1], 15), (ids[2], 20)] {
            app.put_with_token(
                &routes::leaderboard_score(event_id, user_id),
                &json!({"score": score}),
                &owner,
            )
            .await;
        }

        let colleges = app.get_without_token(routes::LEADERBOARD_COLLEGES).await;
        assert_eq!(colleges.status, 200);
        let entries = colleges.body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["college"], "North College");
        assert_eq!(entries[0]["total_score"], 25);
        assert_eq!(entries[0]["participants"], 2);
        assert_eq!(entries[1]["college"], "South College");
        assert_eq!(entries[1]["total_score"], 20);
    }

    #[tokio::test]
    async fn the_board_for_an_unknown_event_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::leaderboard(9999)).await;

        assert_eq!(res.status, 404);
    }
}
