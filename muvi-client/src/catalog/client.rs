//! HTTP catalog client

use super::CatalogApi;
use async_trait::async_trait;
use muvi_common::models::{
    ApiErrorBody, FavoriteIds, GenreList, MovieEnvelope, MovieList, MoviePayload,
    ToggleResponse, UploadRequest, UploadTarget,
};
use muvi_common::{Error, Genre, Movie, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

const USER_AGENT: &str = concat!("muvi/", env!("CARGO_PKG_VERSION"));

/// Catalog client over the service's REST endpoints
#[derive(Clone)]
pub struct HttpCatalogClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    /// Create a client for `base_url` (trailing slash optional)
    ///
    /// No request timeout is configured; a hung request stays pending.
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and return the response if its status is a success
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.error.or(body.message))
            .unwrap_or(text);

        tracing::warn!(
            status = status.as_u16(),
            request = %what,
            message = %message,
            "Catalog request failed"
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{}: {}", what, message)));
        }

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = self.send(request, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Parse(format!("{}: {}", what, e)))
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        let request = self.http_client.get(self.url("list-movies"));
        let movies = self
            .fetch_json::<MovieList>(request, "list-movies")
            .await?
            .into_vec();
        tracing::debug!(count = movies.len(), "Fetched movie list");
        Ok(movies)
    }

    async fn list_movie_cards(&self, genre_id: Option<&str>) -> Result<Vec<Movie>> {
        let mut request = self.http_client.get(self.url("list-movies-cards"));
        if let Some(genre_id) = genre_id.filter(|g| !g.is_empty()) {
            request = request.query(&[("genre_id", genre_id)]);
        }
        let movies = self
            .fetch_json::<MovieList>(request, "list-movies-cards")
            .await?
            .into_vec();
        tracing::debug!(count = movies.len(), genre_id = ?genre_id, "Fetched movie cards");
        Ok(movies)
    }

    async fn get_movie(&self, id: &str) -> Result<Movie> {
        tracing::debug!(movie_id = %id, "Fetching movie detail");
        let request = self.http_client.get(self.url("get-movies")).query(&[("id", id)]);
        let movie = self
            .fetch_json::<MovieEnvelope>(request, "get-movies")
            .await?
            .into_movie();
        Ok(movie)
    }

    async fn create_movie(&self, payload: &MoviePayload) -> Result<()> {
        let request = self.http_client.post(self.url("create-movies")).json(payload);
        self.send(request, "create-movies").await?;
        tracing::info!(title = %payload.title, "Created movie");
        Ok(())
    }

    async fn update_movie(&self, id: &str, payload: &MoviePayload) -> Result<()> {
        let request = self
            .http_client
            .put(self.url("update-movies"))
            .query(&[("id", id)])
            .json(payload);
        self.send(request, "update-movies").await?;
        tracing::info!(movie_id = %id, title = %payload.title, "Updated movie");
        Ok(())
    }

    async fn delete_movie(&self, id: &str) -> Result<()> {
        let request = self
            .http_client
            .delete(self.url("delete-movies"))
            .query(&[("id", id)]);
        self.send(request, "delete-movies").await?;
        tracing::info!(movie_id = %id, "Deleted movie");
        Ok(())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        let request = self.http_client.get(self.url("list-genre"));
        Ok(self
            .fetch_json::<GenreList>(request, "list-genre")
            .await?
            .into_vec())
    }

    async fn list_favorite_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let request = self
            .http_client
            .get(self.url("list-fav"))
            .header("user-id", user_id);
        let ids = self.fetch_json::<FavoriteIds>(request, "list-fav").await?;
        Ok(ids.favourites)
    }

    async fn toggle_favorite(&self, movie_id: &str, user_id: &str) -> Result<ToggleResponse> {
        let request = self
            .http_client
            .post(self.url("toggle-fav"))
            .query(&[("movie_id", movie_id), ("user_id", user_id)]);
        let response = self.send(request, "toggle-fav").await?;
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        // A plain-text body is treated as the message itself
        let toggle = serde_json::from_str::<ToggleResponse>(&text).unwrap_or(ToggleResponse {
            message: Some(text),
        });
        tracing::debug!(movie_id = %movie_id, message = ?toggle.message, "Toggled favorite");
        Ok(toggle)
    }

    async fn request_upload_target(&self, request: &UploadRequest) -> Result<UploadTarget> {
        let builder = self
            .http_client
            .post(self.url("generate-presigned-url"))
            .json(request);
        self.fetch_json(builder, "generate-presigned-url").await
    }

    async fn upload_file(
        &self,
        target: &UploadTarget,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let size = bytes.len();
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &target.fields {
            form = form.text(name.clone(), value.clone());
        }

        // The storage service requires the file part after every policy field
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| Error::InvalidInput(format!("Bad content type {}: {}", content_type, e)))?;
        form = form.part("file", part);

        let request = self.http_client.post(&target.url).multipart(form);
        self.send(request, "upload").await?;

        tracing::info!(file = %file_name, bytes = size, url = %target.file_url, "Uploaded file");
        Ok(())
    }
}
