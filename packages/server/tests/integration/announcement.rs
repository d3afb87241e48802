use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;

use crate::common::{TestApp, routes};

mod crud {
    use super::*;

    #[tokio::test]
    async fn an_organizer_can_publish_a_site_wide_announcement() {
        let app = TestApp::spawn().await;
        let token = app
            .create_user_with_role("org@example.com", "securepass", "organizer")
            .await;

        let res = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "Venue change", "body": "Moved to hall B"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["title"], "Venue change");
        assert!(res.body["event_id"].is_null());
    }

    #[tokio::test]
    async fn participants_cannot_publish_announcements() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("user@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "Spam", "body": "Spam"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn event_announcements_require_owning_the_event() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_user_with_role("owner@example.com", "securepass", "organizer")
            .await;
        let other = app
            .create_user_with_role("other@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&owner, "Tech Fest", 100, 0).await;

        let res = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "Update", "body": "Delayed", "event_id": event_id}),
                &other,
            )
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "Update", "body": "Delayed", "event_id": event_id}),
                &owner,
            )
            .await;
        assert_eq!(res.status, 201);
        assert_eq!(res.body["event_id"], event_id);
    }

    #[tokio::test]
    async fn event_filter_includes_site_wide_announcements() {
        let app = TestApp::spawn().await;
        let token = app
            .create_user_with_role("org@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&token, "Tech Fest", 100, 0).await;
        let other_event = app.create_event(&token, "Chess Night", 100, 0).await;

        app.post_with_token(
            routes::ANNOUNCEMENTS,
            &json!({"title": "Site-wide", "body": "Hello all"}),
            &token,
        )
        .await;
        app.post_with_token(
            routes::ANNOUNCEMENTS,
            &json!({"title": "Fest only", "body": "Hello fest", "event_id": event_id}),
            &token,
        )
        .await;
        app.post_with_token(
            routes::ANNOUNCEMENTS,
            &json!({"title": "Chess only", "body": "Hello chess", "event_id": other_event}),
            &token,
        )
        .await;

        let res = app
            .get_with_token(
                &format!("{}?event_id={event_id}", routes::ANNOUNCEMENTS),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        let titles: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Site-wide"));
        assert!(titles.contains(&"Fest only"));
    }

    #[tokio::test]
    async fn only_the_author_or_manager_can_delete() {
        let app = TestApp::spawn().await;
        let author = app
            .create_user_with_role("author@example.com", "securepass", "organizer")
            .await;
        let other = app
            .create_user_with_role("other@example.com", "securepass", "organizer")
            .await;
        let admin = app
            .create_user_with_role("admin@example.com", "securepass", "admin")
            .await;

        let first = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "First", "body": "First"}),
                &author,
            )
            .await;
        let second = app
            .post_with_token(
                routes::ANNOUNCEMENTS,
                &json!({"title": "Second", "body": "Second"}),
                &author,
            )
            .await;

        let res = app
            .delete_with_token(&routes::announcement(first.id()), &other)
            .await;
        assert_eq!(res.status, 403);

        let res = app
            .delete_with_token(&routes::announcement(first.id()), &author)
            .await;
        assert_eq!(res.status, 204);

        // announcement:manage overrides authorship.
        let res = app
            .delete_with_token(&routes::announcement(second.id()), &admin)
            .await;
        assert_eq!(res.status, 204);
    }
}

mod fan_out {
    use super::*;

    #[tokio::test]
    async fn event_announcements_are_emitted_to_the_event_room() {
        let app = TestApp::spawn().await;
        let token = app
            .create_user_with_role("org@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&token, "Tech Fest", 100, 0).await;
        let mut rx = app.hub.subscribe();

        app.post_with_token(
            routes::ANNOUNCEMENTS,
            &json!({"title": "Update", "body": "Delayed", "event_id": event_id}),
            &token,
        )
        .await;

        let envelope = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for fan-out")
            .expect("hub channel closed");
        assert_eq!(envelope.event, "announcementCreated");
        assert_eq!(envelope.room.as_deref(), Some(format!("event-{event_id}").as_str()));
        assert_eq!(envelope.data["title"], "Update");
    }

    #[tokio::test]
    async fn site_wide_announcements_are_emitted_globally() {
        let app = TestApp::spawn().await;
        let token = app
            .create_user_with_role("org@example.com", "securepass", "organizer")
            .await;
        let mut rx = app.hub.subscribe();

        app.post_with_token(
            routes::ANNOUNCEMENTS,
            &json!({"title": "Hello", "body": "Everyone"}),
            &token,
        )
        .await;

        let envelope = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for fan-out")
            .expect("hub channel closed");
        assert_eq!(envelope.event, "announcementCreated");
        assert!(envelope.room.is_none());
    }

    #[tokio::test]
    async fn role_requests_notify_the_admin_room() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("user@example.com", "securepass")
            .await;
        let mut rx = app.hub.subscribe();

        app.post_with_token(routes::ROLE_REQUEST, &json!({}), &token)
            .await;

        let first = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for fan-out")
            .expect("hub channel closed");
        assert_eq!(first.event, "roleRequestCreated");
        assert_eq!(first.room.as_deref(), Some("role-admin"));

        // The same notification also goes out globally.
        let second = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for fan-out")
            .expect("hub channel closed");
        assert_eq!(second.event, "roleRequestCreated");
        assert!(second.room.is_none());
    }
}
