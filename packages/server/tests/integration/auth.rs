use reqwest::Method;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn every_protected_endpoint_requires_a_token() {
    let app = TestApp::spawn().await;

    let endpoints = [
        (Method::GET, routes::PROFILE.to_string()),
        (Method::PATCH, routes::PROFILE.to_string()),
        (Method::PUT, routes::PROFILE.to_string()),
        (Method::GET, routes::TAGS.to_string()),
        (Method::POST, routes::TAGS.to_string()),
        (Method::PATCH, routes::tag(1)),
        (Method::DELETE, routes::tag(1)),
        (Method::GET, routes::INGREDIENTS.to_string()),
        (Method::POST, routes::INGREDIENTS.to_string()),
        (Method::PATCH, routes::ingredient(1)),
        (Method::DELETE, routes::ingredient(1)),
        (Method::GET, routes::RECIPES.to_string()),
        (Method::POST, routes::RECIPES.to_string()),
        (Method::GET, routes::recipe(1)),
        (Method::PATCH, routes::recipe(1)),
        (Method::PUT, routes::recipe(1)),
        (Method::DELETE, routes::recipe(1)),
        (Method::POST, routes::recipe_upload_image(1)),
    ];

    for (method, path) in endpoints {
        let res = app.send_without_token(method.clone(), &path).await;

        assert_eq!(res.status, 401, "{method} {path}: {}", res.text);
        assert_eq!(res.body["code"], "TOKEN_MISSING", "{method} {path}");
    }
}

#[tokio::test]
async fn public_endpoints_do_not_require_a_token() {
    let app = TestApp::spawn().await;

    let create = app.send_without_token(Method::POST, routes::CREATE_USER).await;
    let token = app.send_without_token(Method::POST, routes::TOKEN).await;

    // Rejected for the empty body, not for the missing token.
    assert_eq!(create.status, 400);
    assert_eq!(token.status, 400);
}
