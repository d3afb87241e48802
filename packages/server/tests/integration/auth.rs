use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "alice@example.com",
                    "password": "securepass",
                    "first_name": "Alice",
                    "last_name": "Smith",
                }),
            )
            .await;

        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_email() {
        let app = TestApp::spawn().await;
        let body = json!({
            "email": "alice@example.com",
            "password": "securepass",
            "first_name": "Alice",
            "last_name": "Smith",
        });

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(
            first.status, 201,
            "First registration failed: {}",
            first.text
        );

        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "alice@example.com",
                    "password": "securepass",
                    "first_name": "Alice",
                    "last_name": "Smith",
                }),
            )
            .await;
        assert_eq!(first.status, 201);

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "Alice@Example.com",
                    "password": "securepass",
                    "first_name": "Alice",
                    "last_name": "Smith",
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_password_that_is_too_short() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "alice@example.com",
                    "password": "short",
                    "first_name": "Alice",
                    "last_name": "Smith",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn cannot_register_with_an_invalid_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "not-an-email",
                    "password": "securepass",
                    "first_name": "Alice",
                    "last_name": "Smith",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_a_token_and_role() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice@example.com", "securepass")
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "participant");
    }

    #[tokio::test]
    async fn login_with_a_wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice@example.com", "securepass")
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn login_with_an_unknown_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ghost@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_current_user() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("alice@example.com", "securepass")
            .await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "alice@example.com");
        assert_eq!(res.body["role"], "participant");
    }

    #[tokio::test]
    async fn me_without_a_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn me_with_a_garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn profile_fields_can_be_updated() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("alice@example.com", "securepass")
            .await;

        let res = app
            .put_with_token(
                routes::PROFILE,
                &json!({"first_name": "Alicia", "college": "New College"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["first_name"], "Alicia");
        assert_eq!(res.body["college"], "New College");

        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["first_name"], "Alicia");
    }
}
