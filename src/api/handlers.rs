use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Category, CategoryScore, Image, PreferenceInsights, PreferenceRecord, Rating, ViewRecord};
use crate::services::insights::DEFAULT_VIEW_HISTORY_LIMIT;

use super::AppState;

/// Images returned per feed request unless the client asks otherwise
const DEFAULT_RECOMMENDATION_LIMIT: i64 = 12;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    /// "all" (default), "for-you", or a category name
    pub category: Option<String>,
    pub limit: Option<i64>,
    /// Required for the "for-you" feed
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PreferenceRequest {
    pub user_id: String,
    pub image_id: String,
    /// 1 for like, -1 for dislike
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct ViewTimeRequest {
    pub session_id: String,
    pub user_id: String,
    pub image_id: String,
    /// Seconds the image stayed on screen
    pub view_time: f64,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub original: Image,
    pub similar: Vec<Image>,
}

// Handlers

/// Recommendation feed: popular, per-category, or personalized
pub async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<ImagesQuery>,
) -> AppResult<Json<Vec<Image>>> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);

    let images = match params.category.as_deref().unwrap_or("all") {
        "all" => state.recommender.initial(limit).await?,
        "for-you" => {
            let user_id = params.user_id.as_deref().ok_or_else(|| {
                AppError::InvalidInput("user_id is required for the for-you feed".to_string())
            })?;
            state.recommender.personalized(user_id, limit).await?
        }
        other => match other.parse::<Category>() {
            Ok(category) => state.recommender.by_category(category, limit).await?,
            // An unknown category is an empty feed, not an error.
            Err(_) => Vec::new(),
        },
    };

    Ok(Json(images))
}

/// The requested image together with its ranked similar images
pub async fn similar_images(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<SimilarResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT);

    let original = state
        .recommender
        .get_image(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("image {image_id} not found")))?;

    let similar = state.recommender.similar_to(&image_id, limit).await?;

    Ok(Json(SimilarResponse { original, similar }))
}

/// Records a like/dislike and reinforces the user's similarity edges
pub async fn record_preference(
    State(state): State<AppState>,
    Json(request): Json<PreferenceRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    let rating = Rating::try_from(request.rating)
        .map_err(|value| AppError::InvalidInput(format!("rating must be 1 or -1, got {value}")))?;

    let success = state
        .scorer
        .record_rating(&request.user_id, &request.image_id, rating)
        .await?;

    state.scorer.reinforce_similarity(&request.user_id).await?;

    Ok(Json(FeedbackResponse { success }))
}

/// Records how long an image was viewed
pub async fn record_view_time(
    State(state): State<AppState>,
    Json(request): Json<ViewTimeRequest>,
) -> AppResult<Json<FeedbackResponse>> {
    let success = state
        .scorer
        .record_view_time(
            &request.session_id,
            &request.user_id,
            &request.image_id,
            request.view_time,
        )
        .await?;

    Ok(Json(FeedbackResponse { success }))
}

/// Full rating history for a user, most recent first
pub async fn user_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<PreferenceRecord>>> {
    let history = state.tracker.rating_history(&user_id).await?;
    Ok(Json(history))
}

/// Category preference ranking for a user
pub async fn user_categories(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<CategoryScore>>> {
    let ranking = state.tracker.category_ranking(&user_id).await?;
    Ok(Json(ranking))
}

/// Recent view history for a user
pub async fn user_views(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<ViewRecord>>> {
    let limit = params.limit.unwrap_or(DEFAULT_VIEW_HISTORY_LIMIT);
    let history = state.tracker.view_history(&user_id, limit).await?;
    Ok(Json(history))
}

/// Aggregated interaction summary for a user
pub async fn user_insights(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<PreferenceInsights>> {
    let insights = state.tracker.insights(&user_id).await?;
    Ok(Json(insights))
}
