use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::pagination::{PageParams, PaginationMetadata};
use crate::schema::{follows, users};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::{subscription_entry, SubscriptionEntry};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionsParams {
    /// Cap on the number of recipes embedded per followee
    pub recipes_limit: Option<i64>,
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Number of items per page (default: 6, max: 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListSubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionEntry>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Users the requester follows", body = ListSubscriptionsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<SubscriptionsParams>,
) -> impl IntoResponse {
    let page_params = PageParams {
        page: params.page,
        limit: params.limit,
    };

    let mut conn = get_conn!(pool);

    let total: i64 = match follows::table
        .filter(follows::follower_id.eq(user.id))
        .count()
        .get_result(&mut conn)
    {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("Failed to count subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response();
        }
    };

    let followee_ids = follows::table
        .filter(follows::follower_id.eq(user.id))
        .select(follows::followee_id);

    let followees: Vec<User> = match users::table
        .filter(users::id.eq_any(followee_ids))
        .order(users::created_at.desc())
        .select(User::as_select())
        .limit(page_params.limit())
        .offset(page_params.offset())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut entries = Vec::with_capacity(followees.len());
    for author in &followees {
        match subscription_entry(&mut conn, author, params.recipes_limit) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::error!("Failed to build subscription entry: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch subscriptions".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(ListSubscriptionsResponse {
            subscriptions: entries,
            pagination: PaginationMetadata::new(total, &page_params),
        }),
    )
        .into_response()
}
