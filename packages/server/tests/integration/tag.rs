use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn listing_tags_requires_authentication() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::TAGS).await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn tags_are_listed_by_name_descending() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let vegan = app.create_tag(&token, "Vegan").await;
    let dessert = app.create_tag(&token, "Dessert").await;

    let res = app.get_with_token(routes::TAGS, &token).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.ids(), vec![vegan, dessert]);
    assert_eq!(res.body[0], json!({"id": vegan, "name": "Vegan"}));
}

#[tokio::test]
async fn tags_are_limited_to_the_authenticated_user() {
    let app = TestApp::spawn().await;
    let other = app
        .create_authenticated_user("other@example.com", "testpass123")
        .await;
    app.create_tag(&other, "Fruity").await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let comfort = app.create_tag(&token, "Comfort Food").await;

    let res = app.get_with_token(routes::TAGS, &token).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, json!([{"id": comfort, "name": "Comfort Food"}]));
}

#[tokio::test]
async fn creating_a_tag_with_a_blank_name_fails() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;

    let res = app
        .post_with_token(routes::TAGS, &json!({"name": "  "}), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn assigned_only_filters_to_tags_used_by_recipes() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let breakfast = app.create_tag(&token, "Breakfast").await;
    app.create_tag(&token, "Lunch").await;
    app.create_recipe(&token, "Coriander eggs", json!({"tags": [breakfast]}))
        .await;

    let res = app
        .get_with_token(&format!("{}?assigned_only=1", routes::TAGS), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.ids(), vec![breakfast]);
}

#[tokio::test]
async fn assigned_only_returns_each_tag_once() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let breakfast = app.create_tag(&token, "Breakfast").await;
    app.create_tag(&token, "Lunch").await;
    app.create_recipe(&token, "Pancakes", json!({"tags": [breakfast]}))
        .await;
    app.create_recipe(&token, "Porridge", json!({"tags": [breakfast]}))
        .await;

    let res = app
        .get_with_token(&format!("{}?assigned_only=1", routes::TAGS), &token)
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.ids(), vec![breakfast]);
}

#[tokio::test]
async fn assigned_only_rejects_non_numeric_values() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;

    let res = app
        .get_with_token(&format!("{}?assigned_only=yes", routes::TAGS), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn renaming_a_tag_succeeds() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let id = app.create_tag(&token, "After Dinner").await;

    let res = app
        .patch_with_token(&routes::tag(id), &json!({"name": "Dessert"}), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body, json!({"id": id, "name": "Dessert"}));
}

#[tokio::test]
async fn deleting_a_tag_detaches_it_from_recipes() {
    let app = TestApp::spawn().await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;
    let id = app.create_tag(&token, "Breakfast").await;
    let recipe = app
        .create_recipe(&token, "Pancakes", json!({"tags": [id]}))
        .await;

    let res = app.delete_with_token(&routes::tag(id), &token).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let list = app.get_with_token(routes::TAGS, &token).await;
    assert_eq!(list.body, json!([]));

    let detail = app.get_with_token(&routes::recipe(recipe), &token).await;
    assert_eq!(detail.status, 200);
    assert_eq!(detail.body["tags"], json!([]));
}

#[tokio::test]
async fn other_users_tags_cannot_be_modified() {
    let app = TestApp::spawn().await;
    let other = app
        .create_authenticated_user("other@example.com", "testpass123")
        .await;
    let id = app.create_tag(&other, "Private").await;
    let token = app
        .create_authenticated_user("test@example.com", "testpass123")
        .await;

    let patch = app
        .patch_with_token(&routes::tag(id), &json!({"name": "Mine"}), &token)
        .await;
    let delete = app.delete_with_token(&routes::tag(id), &token).await;

    assert_eq!(patch.status, 404);
    assert_eq!(delete.status, 404);
}
