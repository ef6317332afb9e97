//! Data models for persisted and scraped movies.

use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Status of a stored movie.
///
/// `Favorite` marks entries found on the profile favourites shelf (or promoted
/// by hand); `Saved` marks user-directed single saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovieStatus {
    Saved,
    Favorite,
}

impl MovieStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovieStatus::Saved => "SAVED",
            MovieStatus::Favorite => "FAVORITE",
        }
    }

    /// Parse an incoming status value. Validation happens once here, at the
    /// boundary; everything past it carries the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SAVED" => Some(MovieStatus::Saved),
            "FAVORITE" => Some(MovieStatus::Favorite),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovieStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie row from the `movies` table.
#[derive(Debug, Clone, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: String,
    pub status: MovieStatus,
    pub image_url: String,
    pub link_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Movie {
    /// Map a row in SELECT column order: id, title, year, status, image_url,
    /// link_url, created_at, updated_at.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status_str: String = row.get(3)?;
        let status = MovieStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown movie status '{}'", status_str).into(),
            )
        })?;

        Ok(Movie {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            status,
            image_url: row.get(4)?,
            link_url: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

/// A movie extracted from a rendered page, not yet persisted.
///
/// `year` may be empty when the page carried no usable release year; callers
/// that require complete data must reject such records before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedMovie {
    pub title: String,
    pub year: String,
    pub image_url: String,
    pub link_url: String,
}
