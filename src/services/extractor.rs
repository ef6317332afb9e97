//! Extraction of movie records from rendered Letterboxd HTML.
//!
//! Works on fully rendered markup: the poster grid is populated by JavaScript,
//! so the raw HTTP response of a profile page carries none of the data
//! attributes read here.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::db::models::ScrapedMovie;

lazy_static! {
    // Trailing "(1985)" in a caption like "Ran (1985)"
    static ref CAPTION_YEAR_RE: Regex = Regex::new(r"\((\d{4})\)$").unwrap();
    static ref FAVOURITES_SEL: Selector = Selector::parse("#favourites").unwrap();
    static ref POSTER_LIST_SEL: Selector = Selector::parse("section.poster-list").unwrap();
    static ref CONTAINER_SEL: Selector = Selector::parse(".poster-container").unwrap();
    static ref POSTER_SEL: Selector = Selector::parse(".film-poster").unwrap();
    static ref IMG_SEL: Selector = Selector::parse("img").unwrap();
    static ref FRAME_TITLE_SEL: Selector = Selector::parse(".frame-title").unwrap();
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("favourites section not found on page")]
    MissingFavourites,

    #[error("no movies found, possibly failed to load dynamic content")]
    NoMovies,

    #[error("poster list section not found on page")]
    MissingPosterList,

    #[error("film poster not found in section")]
    MissingPoster,

    #[error("movie title not found")]
    MissingTitle,
}

/// Parses rendered profile and film pages into [`ScrapedMovie`] records.
pub struct MovieExtractor {
    base_url: String,
}

impl MovieExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Extract every favourite from a rendered profile page.
    ///
    /// A container without a title is skipped with a warning; an empty result
    /// after processing all containers is a hard failure, since it means the
    /// dynamic content never loaded.
    pub fn extract_list(&self, html: &str) -> Result<Vec<ScrapedMovie>, ExtractError> {
        let document = Html::parse_document(html);
        let favourites = document
            .select(&FAVOURITES_SEL)
            .next()
            .ok_or(ExtractError::MissingFavourites)?;

        let mut movies = Vec::new();
        for container in favourites.select(&CONTAINER_SEL) {
            match self.movie_from_container(container) {
                Some(movie) => movies.push(movie),
                None => tracing::warn!("Poster container missing title, skipping"),
            }
        }

        if movies.is_empty() {
            return Err(ExtractError::NoMovies);
        }

        Ok(movies)
    }

    /// Extract the movie from a rendered single-film page.
    ///
    /// `page_url` becomes the record's link_url; single-film pages carry no
    /// usable film link in the DOM.
    pub fn extract_single(&self, html: &str, page_url: &str) -> Result<ScrapedMovie, ExtractError> {
        let document = Html::parse_document(html);
        let section = document
            .select(&POSTER_LIST_SEL)
            .next()
            .ok_or(ExtractError::MissingPosterList)?;

        let poster = section
            .select(&POSTER_SEL)
            .next()
            .ok_or(ExtractError::MissingPoster)?;

        let title = attr_trimmed(poster, "data-film-name");
        if title.is_empty() {
            return Err(ExtractError::MissingTitle);
        }

        let mut year = attr_trimmed(poster, "data-film-release-year");
        if year.is_empty() {
            year = caption_year(section);
        }

        Ok(ScrapedMovie {
            title,
            year,
            image_url: poster_image(poster),
            link_url: page_url.to_string(),
        })
    }

    fn movie_from_container(&self, container: ElementRef<'_>) -> Option<ScrapedMovie> {
        let poster = container.select(&POSTER_SEL).next()?;

        let title = attr_trimmed(poster, "data-film-name");
        if title.is_empty() {
            return None;
        }

        let mut year = attr_trimmed(poster, "data-film-release-year");
        if year.is_empty() {
            year = caption_year(container);
        }

        let film_link = attr_trimmed(poster, "data-film-link");
        let link_url = if film_link.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.base_url, film_link)
        };

        Some(ScrapedMovie {
            title,
            year,
            image_url: poster_image(poster),
            link_url,
        })
    }
}

fn attr_trimmed(element: ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or("").trim().to_string()
}

fn poster_image(poster: ElementRef<'_>) -> String {
    poster
        .select(&IMG_SEL)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Recover a year from a `.frame-title` caption, the sole fallback when the
/// poster carries no release-year attribute.
fn caption_year(scope: ElementRef<'_>) -> String {
    scope
        .select(&FRAME_TITLE_SEL)
        .next()
        .and_then(|caption| {
            let text = caption.text().collect::<String>();
            CAPTION_YEAR_RE
                .captures(text.trim())
                .map(|caps| caps[1].to_string())
        })
        .unwrap_or_default()
}
