//! Movie CRUD handlers plus the user-directed single-movie save.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::db::models::{Movie, MovieStatus};
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::services::renderer::RenderError;
use crate::services::MovieExtractor;
use crate::AppState;

const POSTER_LIST_SELECTOR: &str = "section.poster-list";

#[derive(Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<Movie>,
    pub count: usize,
    pub retrieved_at: String,
}

fn list_response(movies: Vec<Movie>) -> Json<MovieListResponse> {
    Json(MovieListResponse {
        count: movies.len(),
        movies,
        retrieved_at: Utc::now().to_rfc3339(),
    })
}

/// GET /movies
pub async fn list_movies(State(state): State<AppState>) -> Json<MovieListResponse> {
    let conn = state.db.lock().await;
    list_response(queries::list_movies(&conn, None))
}

/// GET /movies/favourites
pub async fn list_favourites(State(state): State<AppState>) -> Json<MovieListResponse> {
    let conn = state.db.lock().await;
    list_response(queries::list_movies(&conn, Some(MovieStatus::Favorite)))
}

/// GET /movies/saved
pub async fn list_saved(State(state): State<AppState>) -> Json<MovieListResponse> {
    let conn = state.db.lock().await;
    list_response(queries::list_movies(&conn, Some(MovieStatus::Saved)))
}

#[derive(Deserialize)]
pub struct SaveMovieRequest {
    /// Film slug as it appears in the page URL, e.g. "bring-her-back".
    pub movie_title: Option<String>,
    pub status: Option<String>,
}

/// POST /movies — scrape a single film page and upsert it.
///
/// Unlike the favourites batch, this path sets the requested status
/// unconditionally, so a user can demote a favourite back to SAVED.
pub async fn save_movie(
    State(state): State<AppState>,
    Json(body): Json<SaveMovieRequest>,
) -> Result<(StatusCode, Json<Movie>)> {
    let slug = body
        .movie_title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("movie_title is required".to_string()))?;

    let status = match body.status.as_deref() {
        None => MovieStatus::Saved,
        Some(value) => MovieStatus::parse(value).ok_or_else(|| {
            AppError::BadRequest("Invalid status. Must be SAVED or FAVORITE".to_string())
        })?,
    };

    let base_url = &state.config.letterboxd.base_url;
    let url = format!("{}/film/{}/", base_url, slug);
    let timeout = Duration::from_secs(state.config.scraper.timeout_secs);

    let html = state
        .renderer
        .render(&url, POSTER_LIST_SELECTOR, timeout)
        .await
        .map_err(|e| match e {
            RenderError::Timeout(msg) => AppError::Timeout(msg),
            RenderError::Browser(msg) => {
                tracing::error!(slug, error = %msg, "Failed to render film page");
                AppError::NotFound(format!("failed to scrape movie page for '{}'", slug))
            }
        })?;

    let mut movie = MovieExtractor::new(base_url.clone())
        .extract_single(&html, &url)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    // Year is the other half of the uniqueness key; without it the record
    // is incomplete and must not be persisted.
    if movie.year.len() != 4 {
        return Err(AppError::Unprocessable(
            "release year could not be determined from the page".to_string(),
        ));
    }

    movie.image_url = state.images.normalize(&movie.image_url);

    let mut conn = state.db.lock().await;
    let (saved, created) = queries::upsert_single(
        &mut conn,
        &movie.title,
        &movie.year,
        &movie.image_url,
        &movie.link_url,
        status,
    )
    .ok_or_else(|| AppError::Internal("failed to save movie to database".to_string()))?;

    let code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(saved)))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub movie_id: i64,
    pub new_status: MovieStatus,
    pub updated_at: String,
}

/// PUT /movies/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>> {
    let status = body
        .status
        .as_deref()
        .and_then(MovieStatus::parse)
        .ok_or_else(|| {
            AppError::BadRequest("Invalid status. Must be SAVED or FAVORITE".to_string())
        })?;

    let conn = state.db.lock().await;
    if !queries::set_status(&conn, id, status) {
        return Err(AppError::NotFound(format!("movie {}", id)));
    }

    Ok(Json(UpdateStatusResponse {
        message: format!("Movie status updated to {}", status),
        movie_id: id,
        new_status: status,
        updated_at: Utc::now().to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub movie_id: i64,
    pub deleted_at: String,
}

/// DELETE /movies/{id}
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let conn = state.db.lock().await;
    if !queries::delete_movie(&conn, id) {
        return Err(AppError::NotFound(format!("movie {}", id)));
    }

    Ok(Json(DeleteResponse {
        message: "Movie deleted successfully".to_string(),
        movie_id: id,
        deleted_at: Utc::now().to_rfc3339(),
    }))
}
