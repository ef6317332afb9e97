//! Reconciliation queries over the `movies` table.
//!
//! Scraped favourites are merged into persisted state under a
//! status-preservation rule: a row already marked FAVORITE is never demoted by
//! a scrape, while `upsert_single` overwrites unconditionally for
//! user-directed saves. None of these functions raise across the boundary;
//! failures are logged and reported as flags so handlers map them uniformly.

use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Movie, MovieStatus, ScrapedMovie};

const SELECT_COLUMNS: &str = "id, title, year, status, image_url, link_url, created_at, updated_at";

/// Merge a batch of scraped favourites into the store as one transaction.
///
/// Per record: absent rows are inserted with FAVORITE status; rows already
/// FAVORITE are left untouched; SAVED rows are promoted and get their image
/// and link refreshed. A failure partway rolls the whole batch back.
pub fn upsert_favourites(conn: &mut Connection, movies: &[ScrapedMovie]) -> bool {
    match upsert_favourites_tx(conn, movies) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Failed to save favourites batch");
            false
        }
    }
}

fn upsert_favourites_tx(conn: &mut Connection, movies: &[ScrapedMovie]) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    for movie in movies {
        let existing: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, status FROM movies WHERE title = ?1 AND year = ?2",
                params![movie.title, movie.year],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            None => {
                tx.execute(
                    "INSERT INTO movies (title, year, status, image_url, link_url)
                     VALUES (?1, ?2, 'FAVORITE', ?3, ?4)",
                    params![movie.title, movie.year, movie.image_url, movie.link_url],
                )?;
            }
            // Favourite status is sticky; scraping never demotes
            Some((_, status)) if status == MovieStatus::Favorite.as_str() => {}
            Some((id, _)) => {
                tx.execute(
                    "UPDATE movies
                     SET status = 'FAVORITE', image_url = ?2, link_url = ?3,
                         updated_at = datetime('now')
                     WHERE id = ?1",
                    params![id, movie.image_url, movie.link_url],
                )?;
            }
        }
    }

    tx.commit()
}

/// Unconditionally upsert a single movie by (title, year).
///
/// Unlike the batch path this overwrites status in either direction, so a
/// user-directed save can demote a favourite. Returns the stored row and
/// whether it was newly created, or None on failure.
pub fn upsert_single(
    conn: &mut Connection,
    title: &str,
    year: &str,
    image_url: &str,
    link_url: &str,
    status: MovieStatus,
) -> Option<(Movie, bool)> {
    match upsert_single_tx(conn, title, year, image_url, link_url, status) {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::error!(title, year, error = %e, "Failed to save movie");
            None
        }
    }
}

fn upsert_single_tx(
    conn: &mut Connection,
    title: &str,
    year: &str,
    image_url: &str,
    link_url: &str,
    status: MovieStatus,
) -> rusqlite::Result<(Movie, bool)> {
    let tx = conn.transaction()?;

    let existed: bool = tx
        .query_row(
            "SELECT 1 FROM movies WHERE title = ?1 AND year = ?2",
            params![title, year],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    tx.execute(
        "INSERT INTO movies (title, year, status, image_url, link_url)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (title, year) DO UPDATE SET
             status = excluded.status,
             image_url = excluded.image_url,
             link_url = excluded.link_url,
             updated_at = datetime('now')",
        params![title, year, status.as_str(), image_url, link_url],
    )?;

    let movie = tx.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM movies WHERE title = ?1 AND year = ?2"),
        params![title, year],
        Movie::from_row,
    )?;

    tx.commit()?;
    Ok((movie, !existed))
}

/// List movies, optionally filtered by status, newest-created first.
pub fn list_movies(conn: &Connection, status: Option<MovieStatus>) -> Vec<Movie> {
    let result = match status {
        Some(status) => collect_movies(
            conn,
            &format!(
                "SELECT {SELECT_COLUMNS} FROM movies WHERE status = ?1
                 ORDER BY created_at DESC, id DESC"
            ),
            params![status.as_str()],
        ),
        None => collect_movies(
            conn,
            &format!("SELECT {SELECT_COLUMNS} FROM movies ORDER BY created_at DESC, id DESC"),
            params![],
        ),
    };

    match result {
        Ok(movies) => movies,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list movies");
            Vec::new()
        }
    }
}

fn collect_movies(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<Movie>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, Movie::from_row)?;
    rows.collect()
}

/// Update a movie's status by id. Returns false when the id is unknown.
pub fn set_status(conn: &Connection, id: i64, status: MovieStatus) -> bool {
    match conn.execute(
        "UPDATE movies SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, status.as_str()],
    ) {
        Ok(updated) => updated > 0,
        Err(e) => {
            tracing::error!(id, error = %e, "Failed to update movie status");
            false
        }
    }
}

/// Delete a movie by id. Returns false when the id is unknown.
pub fn delete_movie(conn: &Connection, id: i64) -> bool {
    match conn.execute("DELETE FROM movies WHERE id = ?1", params![id]) {
        Ok(deleted) => deleted > 0,
        Err(e) => {
            tracing::error!(id, error = %e, "Failed to delete movie");
            false
        }
    }
}
