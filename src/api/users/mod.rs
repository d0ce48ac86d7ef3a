pub mod create;
pub mod get;
pub mod list;
pub mod me;
pub mod subscribe;
pub mod subscriptions;

use crate::api::MiniRecipe;
use crate::models::{Recipe, User};
use crate::schema::{follows, recipes};
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(create::create_user))
        .route("/me", get(me::me))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/{id}", get(get::get_user))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_user,
        list::list_users,
        get::get_user,
        me::me,
        subscribe::subscribe,
        subscribe::unsubscribe,
        subscriptions::list_subscriptions,
    ),
    components(schemas(
        UserProfile,
        SubscriptionEntry,
        create::CreateUserRequest,
        list::ListUsersResponse,
        subscriptions::ListSubscriptionsResponse,
    ))
)]
pub struct ApiDoc;

/// Public user representation, annotated with whether the viewer follows them.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// A followee in the subscription feed: profile plus a capped recipe list
/// and the uncapped recipe count.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionEntry {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<MiniRecipe>,
    pub recipes_count: i64,
}

pub fn follow_exists(
    conn: &mut PgConnection,
    follower_id: Uuid,
    followee_id: Uuid,
) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::followee_id.eq(followee_id)),
    ))
    .get_result(conn)
}

/// Build a profile as seen by `viewer`. Anonymous viewers never count as
/// subscribed.
pub fn profile_for(
    conn: &mut PgConnection,
    viewer: Option<&User>,
    user: &User,
) -> QueryResult<UserProfile> {
    let is_subscribed = match viewer {
        Some(viewer) if viewer.id != user.id => follow_exists(conn, viewer.id, user.id)?,
        _ => false,
    };

    Ok(UserProfile {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    })
}

/// Build a subscription feed entry for a followee. `recipes_limit` caps the
/// embedded recipe list; the count is always the total.
pub fn subscription_entry(
    conn: &mut PgConnection,
    author: &User,
    recipes_limit: Option<i64>,
) -> QueryResult<SubscriptionEntry> {
    let mut query = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .order(recipes::created_at.desc())
        .select(Recipe::as_select())
        .into_boxed();

    if let Some(limit) = recipes_limit {
        query = query.limit(limit.max(0));
    }

    let author_recipes: Vec<Recipe> = query.load(conn)?;

    let recipes_count: i64 = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .count()
        .get_result(conn)?;

    Ok(SubscriptionEntry {
        id: author.id,
        email: author.email.clone(),
        username: author.username.clone(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        is_subscribed: true,
        recipes: author_recipes.iter().map(MiniRecipe::from).collect(),
        recipes_count,
    })
}
