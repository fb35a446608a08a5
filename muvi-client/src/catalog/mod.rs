//! Catalog service access
//!
//! [`CatalogApi`] is the seam between client state and the remote catalog. The
//! production implementation is [`HttpCatalogClient`]; tests substitute fakes.

mod client;

pub use client::HttpCatalogClient;

use async_trait::async_trait;
use muvi_common::models::{MoviePayload, ToggleResponse, UploadRequest, UploadTarget};
use muvi_common::{Genre, Movie, Result};

/// Remote movie catalog
///
/// All methods are single round trips with no retry.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Full movie list (`GET /list-movies`)
    async fn list_movies(&self) -> Result<Vec<Movie>>;

    /// Card summaries, optionally scoped to one genre (`GET /list-movies-cards`)
    async fn list_movie_cards(&self, genre_id: Option<&str>) -> Result<Vec<Movie>>;

    /// Movie detail by id (`GET /get-movies?id=`)
    async fn get_movie(&self, id: &str) -> Result<Movie>;

    async fn create_movie(&self, payload: &MoviePayload) -> Result<()>;

    async fn update_movie(&self, id: &str, payload: &MoviePayload) -> Result<()>;

    async fn delete_movie(&self, id: &str) -> Result<()>;

    async fn list_genres(&self) -> Result<Vec<Genre>>;

    /// Favorite movie ids for a user (`GET /list-fav`, `user-id` header)
    async fn list_favorite_ids(&self, user_id: &str) -> Result<Vec<String>>;

    /// Flip a movie's favorite membership server-side
    ///
    /// The service answers with a human-readable message; callers interpret it.
    async fn toggle_favorite(&self, movie_id: &str, user_id: &str) -> Result<ToggleResponse>;

    /// Ask for a pre-signed upload target for a poster image
    async fn request_upload_target(&self, request: &UploadRequest) -> Result<UploadTarget>;

    /// Send a file to a pre-signed upload target
    async fn upload_file(
        &self,
        target: &UploadTarget,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()>;
}
