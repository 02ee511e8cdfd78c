// Website CRUD HTTP routes
//
// Ordinary request/response plumbing for the dashboard: manage website
// records and read a website's recent activity. Authentication for these
// routes is handled by the deployment's gateway, not here.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use glance_storage::{CreateWebsite, Database, EventRow, PageViewRow, WebsiteRow, WebsiteStatsRow};

use crate::error::ApiError;

/// App state for website routes
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/websites", post(create_website).get(list_websites))
        .route(
            "/api/websites/:id",
            get(get_website).put(update_website).delete(delete_website),
        )
        .route("/api/websites/:id/activity", get(website_activity))
        .with_state(state)
}

// ============================================
// DTOs
// ============================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWebsiteRequest {
    #[schema(example = "My Blog")]
    pub name: String,
    #[schema(example = "blog.example.com")]
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateWebsiteRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

impl From<WebsiteRow> for Website {
    fn from(row: WebsiteRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            domain: row.domain,
            created_at: row.created_at,
        }
    }
}

/// Website with its traffic counters, for the dashboard list view
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteWithStats {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub total_views: i64,
    pub unique_sessions: i64,
}

impl From<WebsiteStatsRow> for WebsiteWithStats {
    fn from(row: WebsiteStatsRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            domain: row.domain,
            created_at: row.created_at,
            total_views: row.total_views,
            unique_sessions: row.unique_sessions,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageViewRecord {
    pub path: String,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device_type: Option<String>,
    pub duration: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<PageViewRow> for PageViewRecord {
    fn from(row: PageViewRow) -> Self {
        Self {
            path: row.path,
            referrer: row.referrer,
            country: row.country,
            browser: row.browser,
            os: row.os,
            device_type: row.device_type,
            duration: row.duration,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_name: String,
    pub event_data: Option<serde_json::Value>,
    pub path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            event_name: row.event_name,
            event_data: row.event_data,
            path: row.path,
            created_at: row.created_at,
        }
    }
}

/// Recent traffic for one website
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub page_views: Vec<PageViewRecord>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Maximum number of rows per kind. Defaults to 50.
    #[param(example = 50)]
    pub limit: Option<i64>,
}

const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
const MAX_ACTIVITY_LIMIT: i64 = 500;

// ============================================
// HTTP Handlers
// ============================================

/// POST /api/websites - Create a website
#[utoipa::path(
    post,
    path = "/api/websites",
    request_body = CreateWebsiteRequest,
    responses(
        (status = 201, description = "Website created", body = Website),
        (status = 400, description = "Missing fields or domain already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "websites"
)]
pub async fn create_website(
    State(state): State<AppState>,
    Json(req): Json<CreateWebsiteRequest>,
) -> Result<(StatusCode, Json<Website>), ApiError> {
    if req.name.trim().is_empty() || req.domain.trim().is_empty() {
        return Err(ApiError::bad_request("name and domain are required"));
    }

    let created = state
        .db
        .create_website(CreateWebsite {
            name: req.name.trim().to_string(),
            domain: req.domain.trim().to_string(),
        })
        .await?;

    match created {
        Some(row) => Ok((StatusCode::CREATED, Json(row.into()))),
        None => Err(ApiError::bad_request("domain already exists")),
    }
}

/// GET /api/websites - List websites with traffic counters
#[utoipa::path(
    get,
    path = "/api/websites",
    responses(
        (status = 200, description = "List of websites", body = [WebsiteWithStats]),
        (status = 500, description = "Internal server error")
    ),
    tag = "websites"
)]
pub async fn list_websites(
    State(state): State<AppState>,
) -> Result<Json<Vec<WebsiteWithStats>>, ApiError> {
    let rows = state.db.list_websites().await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/websites/{id} - Get a website
#[utoipa::path(
    get,
    path = "/api/websites/{id}",
    params(("id" = Uuid, Path, description = "Website ID")),
    responses(
        (status = 200, description = "Website found", body = Website),
        (status = 404, description = "Website not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "websites"
)]
pub async fn get_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Website>, ApiError> {
    let row = state
        .db
        .get_website(id)
        .await?
        .ok_or(ApiError::NotFound("website"))?;
    Ok(Json(row.into()))
}

/// PUT /api/websites/{id} - Rename a website
#[utoipa::path(
    put,
    path = "/api/websites/{id}",
    params(("id" = Uuid, Path, description = "Website ID")),
    request_body = UpdateWebsiteRequest,
    responses(
        (status = 200, description = "Website updated", body = Website),
        (status = 404, description = "Website not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "websites"
)]
pub async fn update_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateWebsiteRequest>,
) -> Result<Json<Website>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    let row = state
        .db
        .update_website_name(id, req.name.trim())
        .await?
        .ok_or(ApiError::NotFound("website"))?;
    Ok(Json(row.into()))
}

/// DELETE /api/websites/{id} - Delete a website and its recorded traffic
#[utoipa::path(
    delete,
    path = "/api/websites/{id}",
    params(("id" = Uuid, Path, description = "Website ID")),
    responses(
        (status = 204, description = "Website deleted"),
        (status = 404, description = "Website not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "websites"
)]
pub async fn delete_website(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_website(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("website"))
    }
}

/// GET /api/websites/{id}/activity - Recent page views and events
#[utoipa::path(
    get,
    path = "/api/websites/{id}/activity",
    params(("id" = Uuid, Path, description = "Website ID"), ActivityQuery),
    responses(
        (status = 200, description = "Recent activity", body = ActivityResponse),
        (status = 404, description = "Website not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "websites"
)]
pub async fn website_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ApiError> {
    state
        .db
        .get_website(id)
        .await?
        .ok_or(ApiError::NotFound("website"))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let page_views = state.db.recent_page_views(id, limit).await?;
    let events = state.db.recent_events(id, limit).await?;

    Ok(Json(ActivityResponse {
        page_views: page_views.into_iter().map(Into::into).collect(),
        events: events.into_iter().map(Into::into).collect(),
    }))
}
