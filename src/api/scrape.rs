//! Scrape endpoints: render the profile favourites page and either return the
//! extracted records or reconcile them into the store.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

use crate::db::models::{MovieStatus, ScrapedMovie};
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::services::renderer::RenderError;
use crate::services::MovieExtractor;
use crate::AppState;

// Waiting for a container inside the favourites section covers both the
// anchor and at least one rendered poster.
const FAVOURITES_SELECTOR: &str = "#favourites .poster-container";

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub movies: Vec<ScrapedMovie>,
    pub count: usize,
    pub scraped_at: String,
}

#[derive(Serialize)]
pub struct SaveFavouritesResponse {
    pub message: String,
    pub scraped_count: usize,
    pub total_favourites: usize,
    pub saved_at: String,
}

async fn render_favourites(state: &AppState) -> Result<Vec<ScrapedMovie>> {
    let username = state
        .config
        .letterboxd
        .username
        .as_deref()
        .ok_or(AppError::NotConfigured("letterboxd username"))?;

    let base_url = &state.config.letterboxd.base_url;
    let url = format!("{}/{}/", base_url, username);
    let timeout = Duration::from_secs(state.config.scraper.timeout_secs);

    let html = state
        .renderer
        .render(&url, FAVOURITES_SELECTOR, timeout)
        .await
        .map_err(|e| match e {
            RenderError::Timeout(msg) => AppError::Timeout(msg),
            RenderError::Browser(msg) => AppError::Internal(msg),
        })?;

    let movies = MovieExtractor::new(base_url.clone())
        .extract_list(&html)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    tracing::info!(username, count = movies.len(), "Scraped favourites");

    Ok(movies)
}

/// GET /scrape/favourites — render and extract without persisting.
pub async fn scrape_favourites(State(state): State<AppState>) -> Result<Json<ScrapeResponse>> {
    let movies = render_favourites(&state).await?;

    Ok(Json(ScrapeResponse {
        count: movies.len(),
        movies,
        scraped_at: Utc::now().to_rfc3339(),
    }))
}

/// POST /scrape/favourites/save — render, extract, normalize poster URLs,
/// and reconcile the batch into the store.
///
/// Records without a usable year are skipped before persistence, same as
/// title-less containers during extraction; one broken poster must not sink
/// the rest of the batch.
pub async fn save_favourites(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SaveFavouritesResponse>)> {
    let movies: Vec<ScrapedMovie> = render_favourites(&state)
        .await?
        .into_iter()
        .filter(|movie| {
            if movie.year.len() == 4 {
                return true;
            }
            tracing::warn!(title = %movie.title, "Favourite has no usable year, skipping");
            false
        })
        .map(|mut movie| {
            movie.image_url = state.images.normalize(&movie.image_url);
            movie
        })
        .collect();

    if movies.is_empty() {
        return Err(AppError::NotFound(
            "no complete movie records found on page".to_string(),
        ));
    }

    let mut conn = state.db.lock().await;
    if !queries::upsert_favourites(&mut conn, &movies) {
        return Err(AppError::Internal(
            "failed to save favourites to database".to_string(),
        ));
    }

    let total_favourites = queries::list_movies(&conn, Some(MovieStatus::Favorite)).len();

    Ok((
        StatusCode::CREATED,
        Json(SaveFavouritesResponse {
            message: "Successfully saved favourites to database".to_string(),
            scraped_count: movies.len(),
            total_favourites,
            saved_at: Utc::now().to_rfc3339(),
        }),
    ))
}
