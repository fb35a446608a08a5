//! In-memory fakes of the catalog and identity services

use async_trait::async_trait;
use muvi_client::catalog::CatalogApi;
use muvi_client::identity::{AuthTokens, IdentityApi, IdentityUser, SignUpOutcome};
use muvi_common::models::{MoviePayload, ToggleResponse, UploadRequest, UploadTarget};
use muvi_common::{Error, Genre, Movie, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

use super::fresh_token;

pub fn movie(id: &str, title: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: title.to_string(),
        genre_name: Some("Drama".to_string()),
        language: Some("English".to_string()),
        ..Default::default()
    }
}

#[derive(Default)]
struct CatalogState {
    movies: Vec<Movie>,
    genres: Vec<Genre>,
    favorites: HashMap<String, Vec<String>>,
    calls: Vec<String>,
    failing_ids: HashSet<String>,
    fail_list_fav: bool,
    toggle_message: Option<String>,
    created: Vec<MoviePayload>,
    updated: Vec<(String, MoviePayload)>,
    deleted: Vec<String>,
    uploads: Vec<(String, String, usize)>,
}

/// Catalog fake that records every call
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

impl MemoryCatalog {
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        let catalog = Self::default();
        catalog.state.lock().unwrap().movies = movies;
        catalog
    }

    pub fn set_genres(&self, genres: Vec<Genre>) {
        self.state.lock().unwrap().genres = genres;
    }

    pub fn set_favorites(&self, user_id: &str, ids: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .favorites
            .insert(user_id.to_string(), ids.iter().map(|s| s.to_string()).collect());
    }

    pub fn server_favorites(&self, user_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .favorites
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Make detail fetches for `id` fail
    pub fn fail_detail(&self, id: &str) {
        self.state.lock().unwrap().failing_ids.insert(id.to_string());
    }

    pub fn fail_list_fav(&self, fail: bool) {
        self.state.lock().unwrap().fail_list_fav = fail;
    }

    /// Reply with this message to every toggle instead of the real outcome
    pub fn override_toggle_message(&self, message: &str) {
        self.state.lock().unwrap().toggle_message = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn created(&self) -> Vec<MoviePayload> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn updated(&self) -> Vec<(String, MoviePayload)> {
        self.state.lock().unwrap().updated.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn uploads(&self) -> Vec<(String, String, usize)> {
        self.state.lock().unwrap().uploads.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl CatalogApi for MemoryCatalog {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        self.record("list-movies".to_string());
        Ok(self.state.lock().unwrap().movies.clone())
    }

    async fn list_movie_cards(&self, genre_id: Option<&str>) -> Result<Vec<Movie>> {
        self.record(format!("list-movies-cards {:?}", genre_id));
        let state = self.state.lock().unwrap();
        Ok(state
            .movies
            .iter()
            .filter(|m| genre_id.is_none() || m.genre_id.as_deref() == genre_id)
            .cloned()
            .collect())
    }

    async fn get_movie(&self, id: &str) -> Result<Movie> {
        self.record(format!("get-movies {}", id));
        let state = self.state.lock().unwrap();
        if state.failing_ids.contains(id) {
            return Err(Error::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        state
            .movies
            .iter()
            .find(|m| m.favorite_key() == id || m.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("movie {}", id)))
    }

    async fn create_movie(&self, payload: &MoviePayload) -> Result<()> {
        self.record("create-movies".to_string());
        self.state.lock().unwrap().created.push(payload.clone());
        Ok(())
    }

    async fn update_movie(&self, id: &str, payload: &MoviePayload) -> Result<()> {
        self.record(format!("update-movies {}", id));
        self.state
            .lock()
            .unwrap()
            .updated
            .push((id.to_string(), payload.clone()));
        Ok(())
    }

    async fn delete_movie(&self, id: &str) -> Result<()> {
        self.record(format!("delete-movies {}", id));
        self.state.lock().unwrap().deleted.push(id.to_string());
        Ok(())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        self.record("list-genre".to_string());
        Ok(self.state.lock().unwrap().genres.clone())
    }

    async fn list_favorite_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.record(format!("list-fav {}", user_id));
        let state = self.state.lock().unwrap();
        if state.fail_list_fav {
            return Err(Error::Network("connection refused".to_string()));
        }
        Ok(state.favorites.get(user_id).cloned().unwrap_or_default())
    }

    async fn toggle_favorite(&self, movie_id: &str, user_id: &str) -> Result<ToggleResponse> {
        self.record(format!("toggle-fav {} {}", movie_id, user_id));
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.toggle_message.clone() {
            return Ok(ToggleResponse {
                message: Some(message),
            });
        }

        let favorites = state.favorites.entry(user_id.to_string()).or_default();
        let message = if let Some(pos) = favorites.iter().position(|id| id == movie_id) {
            favorites.remove(pos);
            "Removed from favorites"
        } else {
            favorites.push(movie_id.to_string());
            "Added to favorites"
        };
        Ok(ToggleResponse {
            message: Some(message.to_string()),
        })
    }

    async fn request_upload_target(&self, request: &UploadRequest) -> Result<UploadTarget> {
        self.record(format!("generate-presigned-url {}", request.content_type));
        Ok(UploadTarget {
            url: "memory://upload".to_string(),
            fields: BTreeMap::from([("key".to_string(), format!("posters/{}", request.file_name))]),
            file_url: format!("https://cdn.test/posters/{}", request.file_name),
        })
    }

    async fn upload_file(
        &self,
        _target: &UploadTarget,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.record(format!("upload {}", file_name));
        self.state.lock().unwrap().uploads.push((
            file_name.to_string(),
            content_type.to_string(),
            bytes.len(),
        ));
        Ok(())
    }
}

/// Catalog whose first detail fetch of one id blocks until released
pub struct GatedCatalog {
    pub inner: MemoryCatalog,
    gated_id: String,
    used: AtomicBool,
    entered: Notify,
    gate: Notify,
}

impl GatedCatalog {
    pub fn new(inner: MemoryCatalog, gated_id: &str) -> Self {
        Self {
            inner,
            gated_id: gated_id.to_string(),
            used: AtomicBool::new(false),
            entered: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Resolves once the gated fetch is parked
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl CatalogApi for GatedCatalog {
    async fn list_movies(&self) -> Result<Vec<Movie>> {
        self.inner.list_movies().await
    }

    async fn list_movie_cards(&self, genre_id: Option<&str>) -> Result<Vec<Movie>> {
        self.inner.list_movie_cards(genre_id).await
    }

    async fn get_movie(&self, id: &str) -> Result<Movie> {
        if id == self.gated_id && !self.used.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        self.inner.get_movie(id).await
    }

    async fn create_movie(&self, payload: &MoviePayload) -> Result<()> {
        self.inner.create_movie(payload).await
    }

    async fn update_movie(&self, id: &str, payload: &MoviePayload) -> Result<()> {
        self.inner.update_movie(id, payload).await
    }

    async fn delete_movie(&self, id: &str) -> Result<()> {
        self.inner.delete_movie(id).await
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        self.inner.list_genres().await
    }

    async fn list_favorite_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.inner.list_favorite_ids(user_id).await
    }

    async fn toggle_favorite(&self, movie_id: &str, user_id: &str) -> Result<ToggleResponse> {
        self.inner.toggle_favorite(movie_id, user_id).await
    }

    async fn request_upload_target(&self, request: &UploadRequest) -> Result<UploadTarget> {
        self.inner.request_upload_target(request).await
    }

    async fn upload_file(
        &self,
        target: &UploadTarget,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.inner
            .upload_file(target, file_name, content_type, bytes)
            .await
    }
}

struct Account {
    password: String,
    confirmed: bool,
    sub: String,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    calls: Vec<String>,
    signed_out: Vec<String>,
}

/// Identity fake with a user table; tokens are unsigned JWTs
#[derive(Default)]
pub struct MemoryIdentity {
    state: Mutex<IdentityState>,
}

impl MemoryIdentity {
    pub fn with_user(email: &str, password: &str, sub: &str) -> Self {
        let identity = Self::default();
        identity.state.lock().unwrap().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                confirmed: true,
                sub: sub.to_string(),
            },
        );
        identity
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn signed_out(&self) -> Vec<String> {
        self.state.lock().unwrap().signed_out.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl IdentityApi for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.record("SignUp");
        let mut state = self.state.lock().unwrap();
        if state.accounts.contains_key(email) {
            return Err(Error::identity(
                "UsernameExistsException",
                "An account with the given email already exists.",
            ));
        }
        let sub = format!("sub-{}", state.accounts.len() + 1);
        state.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                confirmed: false,
                sub: sub.clone(),
            },
        );
        Ok(SignUpOutcome {
            user_sub: Some(sub),
            user_confirmed: false,
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()> {
        self.record("ConfirmSignUp");
        let mut state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get_mut(email)
            .ok_or_else(|| Error::identity("UserNotFoundException", "User does not exist."))?;
        if code != "123456" {
            return Err(Error::identity(
                "CodeMismatchException",
                "Invalid verification code provided, please try again.",
            ));
        }
        account.confirmed = true;
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens> {
        self.record("InitiateAuth");
        let state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get(email)
            .ok_or_else(|| Error::identity("UserNotFoundException", "User does not exist."))?;
        if account.password != password {
            return Err(Error::identity(
                "NotAuthorizedException",
                "Incorrect username or password.",
            ));
        }
        if !account.confirmed {
            return Err(Error::identity(
                "UserNotConfirmedException",
                "User is not confirmed.",
            ));
        }
        Ok(AuthTokens {
            access_token: fresh_token(&account.sub),
            id_token: fresh_token(&account.sub),
            refresh_token: Some(format!("refresh-{}", account.sub)),
            expires_in: Some(3600),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens> {
        self.record("Refresh");
        let sub = refresh_token
            .strip_prefix("refresh-")
            .ok_or_else(|| Error::identity("NotAuthorizedException", "Invalid Refresh Token"))?;
        Ok(AuthTokens {
            access_token: fresh_token(sub),
            id_token: fresh_token(sub),
            refresh_token: None,
            expires_in: Some(3600),
        })
    }

    async fn forgot_password(&self, email: &str) -> Result<()> {
        self.record("ForgotPassword");
        if !self.state.lock().unwrap().accounts.contains_key(email) {
            return Err(Error::identity("UserNotFoundException", "User does not exist."));
        }
        Ok(())
    }

    async fn confirm_password(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        self.record("ConfirmForgotPassword");
        if code != "123456" {
            return Err(Error::identity(
                "CodeMismatchException",
                "Invalid verification code provided, please try again.",
            ));
        }
        let mut state = self.state.lock().unwrap();
        let account = state
            .accounts
            .get_mut(email)
            .ok_or_else(|| Error::identity("UserNotFoundException", "User does not exist."))?;
        account.password = new_password.to_string();
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser> {
        self.record("GetUser");
        let claims = muvi_client::identity::TokenClaims::decode(access_token)?;
        let sub = claims.sub.unwrap_or_default();
        let state = self.state.lock().unwrap();
        let (email, _) = state
            .accounts
            .iter()
            .find(|(_, a)| a.sub == sub)
            .ok_or_else(|| Error::identity("NotAuthorizedException", "Access Token has been revoked"))?;
        Ok(IdentityUser {
            username: sub.clone(),
            attributes: BTreeMap::from([
                ("email".to_string(), email.clone()),
                ("sub".to_string(), sub.clone()),
            ]),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.record("GlobalSignOut");
        self.state
            .lock()
            .unwrap()
            .signed_out
            .push(access_token.to_string());
        Ok(())
    }
}
