//! Users endpoints: profiles, friendships and analytics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use bacefook_common::{AppError, AppResult, DateRange, DayCount, Paginated};
use bacefook_core::{
    CreateUserInput, UpdateUserInput,
    views::{
        InfluentialFriend, Message, NetworkGraph, PointsEntry, StrengthEntry, UserProfile,
        UserSummary,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Listing query.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Free-text filter over usernames, emails and names.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

/// Time window query. Bounds are RFC 3339 or `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// Inclusive lower bound.
    pub from: Option<String>,
    /// Inclusive upper bound.
    pub to: Option<String>,
}

impl RangeQuery {
    fn range(&self) -> AppResult<DateRange> {
        DateRange::parse(self.from.as_deref(), self.to.as_deref())
    }
}

/// Leaderboard query.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Inclusive lower bound.
    pub from: Option<String>,
    /// Inclusive upper bound.
    pub to: Option<String>,
    /// Maximum number of entries.
    pub limit: Option<u64>,
}

/// Network graph query.
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    /// Username, first name or last name.
    pub name: String,
}

/// Add friend request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddFriendRequest {
    /// User to befriend.
    #[validate(length(min = 1))]
    pub friend_id: String,
}

/// Count response.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Number of matching events.
    pub count: u64,
}

/// Time series response.
#[derive(Debug, Serialize)]
pub struct SeriesResponse {
    /// Per-day counts, oldest first.
    pub series: Vec<DayCount>,
}

async fn network_graph(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> AppResult<ApiResponse<NetworkGraph>> {
    let name = query.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let graph = state.analytics_service.network_graph_by_name(name).await?;
    Ok(ApiResponse::ok(graph))
}

async fn strength_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<ApiResponse<Vec<StrengthEntry>>> {
    let range = DateRange::parse(query.from.as_deref(), query.to.as_deref())?;
    let board = state
        .analytics_service
        .network_strength_leaderboard(&range, query.limit)
        .await?;
    Ok(ApiResponse::ok(board))
}

async fn points_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<ApiResponse<Vec<PointsEntry>>> {
    let range = DateRange::parse(query.from.as_deref(), query.to.as_deref())?;
    let board = state
        .analytics_service
        .referral_points_leaderboard(&range, query.limit)
        .await?;
    Ok(ApiResponse::ok(board))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<UserProfile>> {
    info!(username = %input.username, "Registering user");
    let profile = state.user_service.create(input).await?;
    Ok(ApiResponse::created(profile))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Paginated<UserProfile>>> {
    let page = state
        .user_service
        .find_all(query.search.as_deref(), query.page, query.limit)
        .await?;
    Ok(ApiResponse::ok(page))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.user_service.find_one(&id).await?;
    Ok(ApiResponse::ok(profile))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserProfile>> {
    info!(user_id = %id, "Updating user");
    let profile = state.user_service.update(&id, input).await?;
    Ok(ApiResponse::ok(profile))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    info!(user_id = %id, "Deleting user");
    state.user_service.remove(&id).await?;
    Ok(no_content())
}

async fn add_friend(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddFriendRequest>,
) -> AppResult<ApiResponse<Message>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    info!(user_id = %id, friend_id = %req.friend_id, "Adding friend");
    let message = state
        .friendship_service
        .add_friend(&id, &req.friend_id)
        .await?;
    Ok(ApiResponse::created(message))
}

async fn remove_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Message>> {
    info!(user_id = %id, friend_id = %friend_id, "Removing friend");
    let message = state
        .friendship_service
        .remove_friend(&id, &friend_id)
        .await?;
    Ok(ApiResponse::ok(message))
}

async fn friends(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Paginated<UserSummary>>> {
    let page = state
        .friendship_service
        .get_friends(&id, query.page, query.limit)
        .await?;
    Ok(ApiResponse::ok(page))
}

async fn referral_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state
        .analytics_service
        .referral_count(&id, &query.range()?)
        .await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

async fn referral_timeseries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> AppResult<ApiResponse<SeriesResponse>> {
    let series = state
        .analytics_service
        .referral_timeseries(&id, &query.range()?)
        .await?;
    Ok(ApiResponse::ok(SeriesResponse { series }))
}

async fn friends_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state
        .analytics_service
        .friends_count(&id, &query.range()?)
        .await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

async fn friends_timeseries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> AppResult<ApiResponse<SeriesResponse>> {
    let series = state
        .analytics_service
        .friends_timeseries(&id, &query.range()?)
        .await?;
    Ok(ApiResponse::ok(SeriesResponse { series }))
}

async fn top_influential_friends(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<InfluentialFriend>>> {
    let top = state.analytics_service.top_influential_friends(&id).await?;
    Ok(ApiResponse::ok(top))
}

/// Routes mounted under `/users`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/network-graph", get(network_graph))
        .route("/leaderboard/network-strength", get(strength_leaderboard))
        .route("/leaderboard/referral-points", get(points_leaderboard))
        .route("/", post(create).get(list))
        .route("/{id}", get(show).patch(update).delete(remove))
        .route("/{id}/friends", post(add_friend).get(friends))
        .route("/{id}/friends/{friend_id}", delete(remove_friend))
        .route("/{id}/referral-count", get(referral_count))
        .route("/{id}/referral-timeseries", get(referral_timeseries))
        .route("/{id}/friends-count", get(friends_count))
        .route("/{id}/friends-timeseries", get(friends_timeseries))
        .route("/{id}/top-influential-friends", get(top_influential_friends))
}
