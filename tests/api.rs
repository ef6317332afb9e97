//! End-to-end route tests against the full router with an in-memory database
//! and a stub renderer returning fixture HTML.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use boxd::config::Config;
use boxd::db;
use boxd::services::renderer::{PageRenderer, RenderError};
use boxd::services::{AuthService, ImageOptimizer};
use boxd::AppState;

const USERNAME: &str = "moviefan";
const SECRET_WORD: &str = "sesame";

const PROFILE_HTML: &str = r#"<html><body>
<section id="favourites"><ul class="poster-list">
  <li class="poster-container">
    <div class="film-poster" data-film-name="Heat" data-film-release-year="1995"
         data-film-link="/film/heat-1995/">
      <img src="https://a.ltrbxd.com/resized/heat-0-230-0-345-crop.jpg?v=1"/>
    </div>
  </li>
  <li class="poster-container">
    <div class="film-poster" data-film-name="Ran" data-film-link="/film/ran/">
      <img src="https://a.ltrbxd.com/resized/ran-0-230-0-345-crop.jpg"/>
    </div>
    <span class="frame-title">Ran (1985)</span>
  </li>
</ul></section>
</body></html>"#;

const FILM_HTML: &str = r#"<html><body>
<section class="poster-list">
  <div class="film-poster" data-film-name="Bring Her Back" data-film-release-year="2025">
    <img src="https://a.ltrbxd.com/resized/bring-her-back-0-230-0-345-crop.jpg?v=2"/>
  </div>
</section>
</body></html>"#;

const PROFILE_HTML_PARTIAL: &str = r#"<html><body>
<section id="favourites"><ul class="poster-list">
  <li class="poster-container">
    <div class="film-poster" data-film-name="Heat" data-film-release-year="1995"
         data-film-link="/film/heat-1995/">
      <img src="https://a.ltrbxd.com/resized/heat-0-230-0-345-crop.jpg?v=1"/>
    </div>
  </li>
  <li class="poster-container">
    <div class="film-poster" data-film-name="Mystery Film" data-film-link="/film/mystery-film/"></div>
  </li>
</ul></section>
</body></html>"#;

const PROFILE_HTML_ALL_YEARLESS: &str = r#"<html><body>
<section id="favourites"><ul class="poster-list">
  <li class="poster-container">
    <div class="film-poster" data-film-name="Mystery Film"></div>
  </li>
</ul></section>
</body></html>"#;

const FILM_HTML_NO_YEAR: &str = r#"<html><body>
<section class="poster-list">
  <div class="film-poster" data-film-name="Mystery Film"></div>
</section>
</body></html>"#;

struct StubRenderer {
    html: String,
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn render(
        &self,
        _url: &str,
        _wait_selector: &str,
        _timeout: Duration,
    ) -> Result<String, RenderError> {
        Ok(self.html.clone())
    }
}

struct TimeoutRenderer;

#[async_trait]
impl PageRenderer for TimeoutRenderer {
    async fn render(
        &self,
        url: &str,
        _wait_selector: &str,
        _timeout: Duration,
    ) -> Result<String, RenderError> {
        Err(RenderError::Timeout(format!("navigation to {url}")))
    }
}

fn test_state(renderer: Arc<dyn PageRenderer>) -> AppState {
    let mut config = Config::default();
    config.letterboxd.username = Some(USERNAME.to_string());
    config.auth.jwt_secret = Some("test-jwt-secret".to_string());
    config.auth.secret_word = Some(SECRET_WORD.to_string());

    let conn = db::init_db_memory().expect("in-memory db");
    let auth = AuthService::new(
        config.auth.jwt_secret.clone(),
        config.letterboxd.username.clone(),
        config.auth.secret_word.clone(),
    );

    AppState {
        config: Arc::new(config),
        db: Arc::new(Mutex::new(conn)),
        auth: Arc::new(auth),
        renderer,
        images: ImageOptimizer::default(),
    }
}

fn server_with(renderer: Arc<dyn PageRenderer>) -> (TestServer, HeaderValue) {
    let state = test_state(renderer);
    let token = state.auth.issue(USERNAME, SECRET_WORD).unwrap();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
    let server = TestServer::new(boxd::router(state)).unwrap();
    (server, bearer)
}

fn profile_server() -> (TestServer, HeaderValue) {
    server_with(Arc::new(StubRenderer {
        html: PROFILE_HTML.to_string(),
    }))
}

fn film_server() -> (TestServer, HeaderValue) {
    server_with(Arc::new(StubRenderer {
        html: FILM_HTML.to_string(),
    }))
}

#[tokio::test]
async fn health_requires_no_auth() {
    let (server, _) = profile_server();

    let res = server.get("/health").await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let body: Value = res.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "sqlite");
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let (server, _) = profile_server();

    let res = server.get("/movies").await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer garbage"))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    // Token scheme must be Bearer
    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);

    let res = server
        .post("/scrape/favourites/save")
        .await;
    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scrape_favourites_returns_records_without_persisting() {
    let (server, bearer) = profile_server();

    let res = server
        .get("/scrape/favourites")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let body: Value = res.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["movies"][0]["title"], "Heat");
    assert_eq!(body["movies"][1]["year"], "1985");

    // Nothing was written to the store
    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn save_favourites_persists_normalized_batch() {
    let (server, bearer) = profile_server();

    let res = server
        .post("/scrape/favourites/save")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let body: Value = res.json();
    assert_eq!(body["scraped_count"], 2);
    assert_eq!(body["total_favourites"], 2);

    let res = server
        .get("/movies/favourites")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    let body: Value = res.json();
    assert_eq!(body["count"], 2);

    let heat = body["movies"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["title"] == "Heat")
        .unwrap();
    // Poster URL was normalized before persisting
    assert_eq!(
        heat["image_url"],
        "https://a.ltrbxd.com/resized/heat-0-2000-0-3000-crop.jpg"
    );
    assert_eq!(heat["link_url"], "https://letterboxd.com/film/heat-1995/");

    // Re-saving the same batch is idempotent and never demotes
    let res = server
        .post("/scrape/favourites/save")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>()["total_favourites"], 2);
}

#[tokio::test]
async fn save_favourites_skips_yearless_records() {
    let (server, bearer) = server_with(Arc::new(StubRenderer {
        html: PROFILE_HTML_PARTIAL.to_string(),
    }));

    // The yearless record is dropped; the complete one still lands
    let res = server
        .post("/scrape/favourites/save")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let body: Value = res.json();
    assert_eq!(body["scraped_count"], 1);
    assert_eq!(body["total_favourites"], 1);

    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, bearer)
        .await;
    let body: Value = res.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["movies"][0]["title"], "Heat");
}

#[tokio::test]
async fn save_favourites_with_no_complete_records_is_not_found() {
    let (server, bearer) = server_with(Arc::new(StubRenderer {
        html: PROFILE_HTML_ALL_YEARLESS.to_string(),
    }));

    let res = server
        .post("/scrape/favourites/save")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn render_timeout_maps_to_request_timeout() {
    let (server, bearer) = server_with(Arc::new(TimeoutRenderer));

    let res = server
        .post("/scrape/favourites/save")
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.status_code(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn save_movie_creates_then_updates() {
    let (server, bearer) = film_server();

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"movie_title": "bring-her-back"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::CREATED);

    let body: Value = res.json();
    assert_eq!(body["title"], "Bring Her Back");
    assert_eq!(body["year"], "2025");
    assert_eq!(body["status"], "SAVED");
    assert_eq!(
        body["link_url"],
        "https://letterboxd.com/film/bring-her-back/"
    );
    assert_eq!(
        body["image_url"],
        "https://a.ltrbxd.com/resized/bring-her-back-0-2000-0-3000-crop.jpg"
    );

    // Saving again updates in place (can also demote/promote explicitly)
    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"movie_title": "bring-her-back", "status": "FAVORITE"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["status"], "FAVORITE");

    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.json::<Value>()["count"], 1);
}

#[tokio::test]
async fn save_movie_validates_input() {
    let (server, bearer) = film_server();

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({}))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"movie_title": "   "}))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer)
        .json(&json!({"movie_title": "heat-1995", "status": "WATCHED"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn save_movie_rejects_incomplete_scrape() {
    let (server, bearer) = server_with(Arc::new(StubRenderer {
        html: FILM_HTML_NO_YEAR.to_string(),
    }));

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"movie_title": "mystery-film"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    // Incomplete records are never persisted
    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn update_status_unknown_id_is_not_found() {
    let (server, bearer) = film_server();

    let res = server
        .put("/movies/42/status")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"status": "FAVORITE"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    // No record was created as a side effect
    let res = server
        .get("/movies")
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn update_status_and_listing_filters() {
    let (server, bearer) = film_server();

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"movie_title": "bring-her-back"}))
        .await;
    let id = res.json::<Value>()["id"].as_i64().unwrap();

    let res = server
        .put(&format!("/movies/{id}/status"))
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"status": "FAVORITE"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.json::<Value>()["new_status"], "FAVORITE");

    let res = server
        .get("/movies/favourites")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.json::<Value>()["count"], 1);

    let res = server
        .get("/movies/saved")
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.json::<Value>()["count"], 0);

    let res = server
        .put(&format!("/movies/{id}/status"))
        .add_header(AUTHORIZATION, bearer)
        .json(&json!({"status": "BOGUS"}))
        .await;
    assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_movie_then_not_found() {
    let (server, bearer) = film_server();

    let res = server
        .post("/movies")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({"movie_title": "bring-her-back"}))
        .await;
    let id = res.json::<Value>()["id"].as_i64().unwrap();

    let res = server
        .delete(&format!("/movies/{id}"))
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    assert_eq!(res.status_code(), StatusCode::OK);

    let res = server
        .delete(&format!("/movies/{id}"))
        .add_header(AUTHORIZATION, bearer)
        .await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
}
