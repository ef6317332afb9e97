//! JSON API handlers.

pub mod movies;
pub mod scrape;
