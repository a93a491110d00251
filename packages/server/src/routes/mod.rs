use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/user", user_routes())
        .nest("/recipe", recipe_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::create_user))
        .routes(routes!(handlers::user::create_token))
        .routes(routes!(
            handlers::user::get_profile,
            handlers::user::update_profile,
            handlers::user::replace_profile
        ))
}

fn recipe_routes() -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::tag::list_tags, handlers::tag::create_tag))
        .routes(routes!(
            handlers::tag::rename_tag,
            handlers::tag::delete_tag
        ))
        .routes(routes!(
            handlers::ingredient::list_ingredients,
            handlers::ingredient::create_ingredient
        ))
        .routes(routes!(
            handlers::ingredient::rename_ingredient,
            handlers::ingredient::delete_ingredient
        ))
        .routes(routes!(
            handlers::recipe::list_recipes,
            handlers::recipe::create_recipe
        ))
        .routes(routes!(
            handlers::recipe::get_recipe,
            handlers::recipe::update_recipe,
            handlers::recipe::replace_recipe,
            handlers::recipe::delete_recipe
        ));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::recipe::upload_image))
        .layer(handlers::recipe::image_upload_body_limit());

    crud.merge(upload)
}
