use serde_json::json;

use crate::common::{TestApp, routes};

mod create_user {
    use super::*;

    #[tokio::test]
    async fn creating_a_user_with_valid_payload_succeeds() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@example.com", "password": "testpass123", "name": "Test Name"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "test@example.com");
        assert_eq!(res.body["name"], "Test Name");
        assert!(res.body.get("password").is_none());

        let user = app.find_user("test@example.com").await.expect("user stored");
        assert_ne!(user.password, "testpass123");
        assert!(user.password.starts_with("$argon2"));
        assert!(user.is_active);
        assert!(!user.is_staff);
    }

    #[tokio::test]
    async fn email_domain_is_normalized() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "Test2@EXAMPLE.com", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "Test2@example.com");
        assert_eq!(res.body["name"], "");
    }

    #[tokio::test]
    async fn creating_a_user_that_already_exists_fails() {
        let app = TestApp::spawn().await;
        let body = json!({"email": "test@example.com", "password": "testpass123"});

        let first = app.post_without_token(routes::CREATE_USER, &body).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app.post_without_token(routes::CREATE_USER, &body).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn duplicate_check_uses_the_normalized_email() {
        let app = TestApp::spawn().await;

        let first = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@example.com", "password": "testpass123"}),
            )
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@EXAMPLE.COM", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn password_must_be_more_than_four_characters() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@example.com", "password": "pw"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.find_user("test@example.com").await.is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::CREATE_USER, &json!({"password": "testpass123"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod token {
    use super::*;

    async fn register(app: &TestApp) {
        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@example.com", "password": "testpass123"}),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn token_is_issued_for_valid_credentials() {
        let app = TestApp::spawn().await;
        register(&app).await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let token = res.body["token"].as_str().expect("token present");
        assert_eq!(token.len(), 40);
    }

    #[tokio::test]
    async fn repeated_logins_reuse_the_same_token() {
        let app = TestApp::spawn().await;
        register(&app).await;
        let body = json!({"email": "test@example.com", "password": "testpass123"});

        let first = app.post_without_token(routes::TOKEN, &body).await;
        let second = app.post_without_token(routes::TOKEN, &body).await;

        assert_eq!(first.status, 200);
        assert_eq!(first.body["token"], second.body["token"]);
    }

    #[tokio::test]
    async fn token_is_not_issued_for_a_wrong_password() {
        let app = TestApp::spawn().await;
        register(&app).await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": "wrong"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        assert!(res.body.get("token").is_none());
    }

    #[tokio::test]
    async fn token_is_not_issued_for_an_unknown_user() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "nobody@example.com", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn token_requires_both_fields() {
        let app = TestApp::spawn().await;
        register(&app).await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": ""}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn profile_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PROFILE).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::PROFILE, "not-a-real-token").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn bearer_scheme_is_accepted() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app
            .client
            .get(app.url(routes::PROFILE))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("request sent");

        assert_eq!(res.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn retrieving_the_profile_succeeds() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app.get_with_token(routes::PROFILE, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.body,
            json!({"email": "test@example.com", "name": "Test User"})
        );
    }

    #[tokio::test]
    async fn post_is_not_allowed_on_profile() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app
            .post_with_token(routes::PROFILE, &json!({}), &token)
            .await;

        assert_eq!(res.status, 405);
    }

    #[tokio::test]
    async fn patch_updates_name_and_password() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app
            .patch_with_token(
                routes::PROFILE,
                &json!({"name": "Updated name", "password": "newpassword123"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Updated name");
        assert_eq!(res.body["email"], "test@example.com");

        let login = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": "newpassword123"}),
            )
            .await;
        assert_eq!(login.status, 200, "{}", login.text);
    }

    #[tokio::test]
    async fn patch_cannot_take_another_users_email() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("first@example.com", "testpass123")
            .await;
        let token = app
            .create_authenticated_user("second@example.com", "testpass123")
            .await;

        let res = app
            .patch_with_token(
                routes::PROFILE,
                &json!({"email": "first@example.com"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn put_replaces_the_profile() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app
            .put_with_token(
                routes::PROFILE,
                &json!({"email": "new@EXAMPLE.com", "password": "otherpass"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body, json!({"email": "new@example.com", "name": ""}));
        assert!(app.find_user("test@example.com").await.is_none());
    }
}
