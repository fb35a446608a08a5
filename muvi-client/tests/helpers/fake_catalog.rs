//! In-process fake of the catalog REST service
//!
//! Serves the catalog endpoints from memory on `127.0.0.1:0` so the real reqwest client
//! can be exercised end to end. Movie records use numeric ids and years, like the real
//! service.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Everything the fake holds or has received
#[derive(Default)]
pub struct CatalogState {
    pub movies: Vec<Value>,
    pub genres: Vec<Value>,
    pub favorites: HashMap<String, Vec<String>>,
    pub requests: Vec<String>,
    pub created: Vec<Value>,
    pub updated: Vec<(String, Value)>,
    pub deleted: Vec<String>,
    /// (content type, raw multipart body)
    pub uploads: Vec<(String, String)>,
    pub base_url: String,
}

type Shared = Arc<Mutex<CatalogState>>;

pub struct FakeCatalogServer {
    pub base_url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl FakeCatalogServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake catalog");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state: Shared = Arc::new(Mutex::new(CatalogState {
            movies: seed_movies(),
            genres: vec![
                json!({"genre_id": 1, "genre_name": "Action"}),
                json!({"genre_id": 2, "genre_name": "Drama"}),
            ],
            base_url: base_url.clone(),
            ..Default::default()
        }));

        let router = Router::new()
            .route("/list-movies", get(list_movies))
            .route("/list-movies-cards", get(list_movie_cards))
            .route("/get-movies", get(get_movie))
            .route("/create-movies", post(create_movie))
            .route("/update-movies", put(update_movie))
            .route("/delete-movies", delete(delete_movie))
            .route("/list-genre", get(list_genres))
            .route("/list-fav", get(list_fav))
            .route("/toggle-fav", post(toggle_fav))
            .route("/generate-presigned-url", post(presign))
            .route("/upload", post(upload))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Drop for FakeCatalogServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seed_movies() -> Vec<Value> {
    vec![
        json!({"id": 1, "title": "Heat", "genre_id": 1, "genre_name": "Action",
               "language": "English", "release_year": 1995, "rating": "8.3",
               "summary": "A group of professional bank robbers.", "director": "Michael Mann",
               "actors": "Al Pacino, Robert De Niro", "poster_url": "https://cdn.test/heat.jpg"}),
        json!({"id": 2, "title": "Drishyam", "genre_id": 2, "genre_name": "Drama",
               "language": "Malayalam", "release_year": "2013", "rating": 8.4}),
        json!({"id": 3, "movie_id": "m-3", "title": "Mad Max: Fury Road", "genre_id": 1,
               "genre_name": "Action", "language": "English", "release_year": 2015}),
    ]
}

fn record(state: &Shared, request: String) {
    state.lock().unwrap().requests.push(request);
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn id_matches(movie: &Value, id: &str) -> bool {
    let as_text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    movie.get("id").map(as_text).as_deref() == Some(id)
        || movie.get("movie_id").map(as_text).as_deref() == Some(id)
}

async fn list_movies(State(state): State<Shared>) -> Response {
    record(&state, "GET /list-movies".to_string());
    let movies = state.lock().unwrap().movies.clone();
    Json(json!({ "movies": movies })).into_response()
}

async fn list_movie_cards(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let genre = params.get("genre_id").cloned();
    record(&state, format!("GET /list-movies-cards {:?}", genre));
    let movies: Vec<Value> = state
        .lock()
        .unwrap()
        .movies
        .iter()
        .filter(|m| match &genre {
            Some(g) => m.get("genre_id").map(|v| v.to_string()).as_deref() == Some(g.as_str()),
            None => true,
        })
        .map(|m| {
            json!({
                "id": m["id"], "movie_id": m.get("movie_id"), "title": m["title"],
                "genre_name": m["genre_name"], "language": m["language"],
                "poster_url": m.get("poster_url"), "release_year": m["release_year"],
            })
        })
        .collect();
    Json(json!({ "movies": movies })).into_response()
}

async fn get_movie(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = params.get("id").cloned().unwrap_or_default();
    record(&state, format!("GET /get-movies {}", id));
    let found = state
        .lock()
        .unwrap()
        .movies
        .iter()
        .find(|m| id_matches(m, &id))
        .cloned();
    match found {
        Some(movie) => Json(movie).into_response(),
        None => error(StatusCode::NOT_FOUND, "Movie not found"),
    }
}

async fn create_movie(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /create-movies".to_string());
    if body["title"].as_str().unwrap_or_default().is_empty() {
        return error(StatusCode::BAD_REQUEST, "title is missing");
    }
    state.lock().unwrap().created.push(body);
    (StatusCode::CREATED, Json(json!({ "message": "Movie created" }))).into_response()
}

async fn update_movie(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let id = params.get("id").cloned().unwrap_or_default();
    record(&state, format!("PUT /update-movies {}", id));
    state.lock().unwrap().updated.push((id, body));
    Json(json!({ "message": "Movie updated" })).into_response()
}

async fn delete_movie(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = params.get("id").cloned().unwrap_or_default();
    record(&state, format!("DELETE /delete-movies {}", id));
    state.lock().unwrap().deleted.push(id);
    StatusCode::NO_CONTENT.into_response()
}

async fn list_genres(State(state): State<Shared>) -> Response {
    record(&state, "GET /list-genre".to_string());
    let genres = state.lock().unwrap().genres.clone();
    Json(json!({ "genres": genres })).into_response()
}

async fn list_fav(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let Some(user_id) = headers.get("user-id").and_then(|v| v.to_str().ok()) else {
        return error(StatusCode::BAD_REQUEST, "user-id header is required");
    };
    record(&state, format!("GET /list-fav {}", user_id));
    let ids = state
        .lock()
        .unwrap()
        .favorites
        .get(user_id)
        .cloned()
        .unwrap_or_default();
    Json(json!({ "favourites": ids })).into_response()
}

async fn toggle_fav(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (Some(movie_id), Some(user_id)) = (params.get("movie_id"), params.get("user_id")) else {
        return error(StatusCode::BAD_REQUEST, "movie_id and user_id are required");
    };
    record(&state, format!("POST /toggle-fav {} {}", movie_id, user_id));

    let mut guard = state.lock().unwrap();
    let favorites = guard.favorites.entry(user_id.clone()).or_default();
    let message = match favorites.iter().position(|id| id == movie_id) {
        Some(pos) => {
            favorites.remove(pos);
            "Movie removed from favourites"
        }
        None => {
            favorites.push(movie_id.clone());
            "Movie added to favourites"
        }
    };
    Json(json!({ "message": message })).into_response()
}

async fn presign(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, format!("POST /generate-presigned-url {}", body["content_type"]));
    let file_name = body["file_name"].as_str().unwrap_or("file");
    let base_url = state.lock().unwrap().base_url.clone();
    Json(json!({
        "url": format!("{}/upload", base_url),
        "fields": { "key": format!("posters/{}", file_name), "policy": "eyJleHAiOjF9" },
        "file_url": format!("https://cdn.test/posters/{}", file_name),
    }))
    .into_response()
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    record(&state, "POST /upload".to_string());
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let text = String::from_utf8_lossy(&body).to_string();
    state.lock().unwrap().uploads.push((content_type, text));
    StatusCode::NO_CONTENT.into_response()
}
