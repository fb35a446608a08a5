//! Admin view (`/admin`)
//!
//! Movie create/update/delete, poster upload, and the filtered admin list.
//!
//! The form is validated entirely client-side; an invalid form never reaches the
//! catalog service.

use super::pagination::{paginate, Pagination, ADMIN_PAGE_SIZE};
use super::{or_na, pager_line};
use crate::catalog::CatalogApi;
use muvi_common::models::{MoviePayload, UploadRequest};
use muvi_common::{Error, FieldErrors, Genre, Movie, Result};
use std::collections::BTreeSet;
use tracing::{error, info};

const YEAR_ERROR: &str = "Enter a valid year";
const POSTER_ERROR: &str = "Poster is required";

/// Editable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormField {
    Title,
    GenreId,
    Language,
    Summary,
    PosterUrl,
    ReleaseYear,
    Director,
    Actors,
}

impl FormField {
    /// Fields that must be non-blank, in the order they are checked
    pub const REQUIRED: [FormField; 7] = [
        FormField::Title,
        FormField::GenreId,
        FormField::Language,
        FormField::Summary,
        FormField::Director,
        FormField::Actors,
        FormField::ReleaseYear,
    ];

    /// Wire name, also the key in [`FieldErrors`]
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::GenreId => "genre_id",
            FormField::Language => "language",
            FormField::Summary => "summary",
            FormField::PosterUrl => "poster_url",
            FormField::ReleaseYear => "release_year",
            FormField::Director => "director",
            FormField::Actors => "actors",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            FormField::Title,
            FormField::GenreId,
            FormField::Language,
            FormField::Summary,
            FormField::PosterUrl,
            FormField::ReleaseYear,
            FormField::Director,
            FormField::Actors,
        ]
        .into_iter()
        .find(|f| f.name() == name)
    }

    /// "genre_id" → "genre id is required"
    fn required_message(&self) -> String {
        format!("{} is required", self.name().replacen('_', " ", 1))
    }
}

/// Four digits, not after `current_year`
pub fn is_valid_year(value: &str, current_year: i32) -> bool {
    value.len() == 4
        && value.bytes().all(|b| b.is_ascii_digit())
        && value.parse::<i32>().is_ok_and(|y| y <= current_year)
}

/// Create/edit form state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieForm {
    pub title: String,
    pub genre_id: String,
    /// Display only; never submitted
    pub genre_name: String,
    pub language: String,
    pub summary: String,
    pub poster_url: String,
    pub release_year: String,
    pub director: String,
    pub actors: String,
    errors: FieldErrors,
    edit_id: Option<String>,
}

/// Which write a successful submit performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated(String),
}

impl SubmitOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SubmitOutcome::Created => "Movie created successfully!",
            SubmitOutcome::Updated(_) => "Movie updated successfully!",
        }
    }
}

impl MovieForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::GenreId => &self.genre_id,
            FormField::Language => &self.language,
            FormField::Summary => &self.summary,
            FormField::PosterUrl => &self.poster_url,
            FormField::ReleaseYear => &self.release_year,
            FormField::Director => &self.director,
            FormField::Actors => &self.actors,
        }
    }

    /// Apply an edit to one field and clear its error
    ///
    /// Release year edits that are not up to four digits are rejected (returns false).
    pub fn set_field(&mut self, field: FormField, value: &str) -> bool {
        if field == FormField::ReleaseYear
            && (value.len() > 4 || !value.bytes().all(|b| b.is_ascii_digit()))
        {
            return false;
        }

        let slot = match field {
            FormField::Title => &mut self.title,
            FormField::GenreId => &mut self.genre_id,
            FormField::Language => &mut self.language,
            FormField::Summary => &mut self.summary,
            FormField::PosterUrl => &mut self.poster_url,
            FormField::ReleaseYear => &mut self.release_year,
            FormField::Director => &mut self.director,
            FormField::Actors => &mut self.actors,
        };
        *slot = value.to_string();
        self.errors.remove(field.name());
        true
    }

    /// Pick a genre by id; the name follows from the genre list
    pub fn select_genre(&mut self, genre_id: &str, genres: &[Genre]) {
        self.genre_id = genre_id.to_string();
        self.genre_name = genres
            .iter()
            .find(|g| g.id == genre_id)
            .map(|g| g.name.clone())
            .unwrap_or_default();
        self.errors.remove(FormField::GenreId.name());
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(field.name()).map(String::as_str)
    }

    pub fn edit_id(&self) -> Option<&str> {
        self.edit_id.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.edit_id.is_some()
    }

    /// Pre-fill from an existing movie, matching its genre by id or name
    pub fn edit(&mut self, movie: &Movie, genres: &[Genre]) {
        let matched = genres.iter().find(|g| {
            movie.genre_id.as_deref() == Some(g.id.as_str())
                || movie.genre_name.as_deref() == Some(g.name.as_str())
        });
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        *self = MovieForm {
            title: movie.title.clone(),
            genre_id: matched.map(|g| g.id.clone()).unwrap_or_default(),
            genre_name: matched
                .map(|g| g.name.clone())
                .or_else(|| movie.genre_name.clone())
                .unwrap_or_default(),
            language: text(&movie.language),
            summary: text(&movie.summary),
            poster_url: text(&movie.poster_url),
            release_year: text(&movie.release_year),
            director: text(&movie.director),
            actors: text(&movie.actors),
            errors: FieldErrors::new(),
            edit_id: Some(movie.id.clone()),
        };
    }

    /// Clear every field and leave edit mode
    pub fn reset(&mut self) {
        *self = MovieForm::default();
    }

    /// Check the form; on failure the field errors are also kept on the form
    pub fn validate(&mut self, current_year: i32) -> std::result::Result<MoviePayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        for field in FormField::REQUIRED {
            if self.get(field).trim().is_empty() {
                errors.insert(field.name().to_string(), field.required_message());
            }
        }

        if !self.release_year.is_empty() && !is_valid_year(&self.release_year, current_year) {
            errors.insert(FormField::ReleaseYear.name().to_string(), YEAR_ERROR.to_string());
        }

        if self.poster_url.is_empty() {
            errors.insert(FormField::PosterUrl.name().to_string(), POSTER_ERROR.to_string());
        }

        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(errors);
        }

        self.errors.clear();
        Ok(MoviePayload {
            title: self.title.clone(),
            genre_id: self.genre_id.clone(),
            language: self.language.clone(),
            summary: self.summary.clone(),
            poster_url: self.poster_url.clone(),
            release_year: self.release_year.clone(),
            director: self.director.clone(),
            actors: self.actors.clone(),
        })
    }

    /// Validate, then create or update
    ///
    /// An invalid form returns [`Error::Validation`] without any request. A successful
    /// write resets the form.
    pub async fn submit(
        &mut self,
        catalog: &dyn CatalogApi,
        current_year: i32,
    ) -> Result<SubmitOutcome> {
        let payload = self.validate(current_year).map_err(Error::Validation)?;

        let outcome = match self.edit_id.clone() {
            Some(id) => {
                catalog.update_movie(&id, &payload).await?;
                SubmitOutcome::Updated(id)
            }
            None => {
                catalog.create_movie(&payload).await?;
                SubmitOutcome::Created
            }
        };

        self.reset();
        Ok(outcome)
    }

    /// Upload a poster image and use its URL as the poster
    pub async fn upload_poster(
        &mut self,
        catalog: &dyn CatalogApi,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let content_type = match infer::get(&bytes) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind.mime_type(),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "{} is not an image file",
                    file_name
                )))
            }
        };

        let target = catalog
            .request_upload_target(&UploadRequest {
                file_name: file_name.to_string(),
                content_type: content_type.to_string(),
            })
            .await?;

        catalog
            .upload_file(&target, file_name, content_type, bytes)
            .await?;

        self.poster_url = target.file_url.clone();
        self.errors.remove(FormField::PosterUrl.name());
        info!(file = %file_name, url = %target.file_url, "Poster uploaded");
        Ok(target.file_url)
    }
}

/// Delete a movie after explicit confirmation; returns whether a delete was sent
pub async fn delete_movie(catalog: &dyn CatalogApi, id: &str, confirmed: bool) -> Result<bool> {
    if !confirmed {
        return Ok(false);
    }
    catalog.delete_movie(id).await?;
    Ok(true)
}

/// Admin list filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminFilters {
    search: String,
    genre: String,
    language: String,
    year: String,
    page: usize,
}

impl AdminFilters {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    fn update(slot: &mut String, page: &mut usize, value: &str) {
        if slot != value {
            *slot = value.to_string();
            *page = 1;
        }
    }

    pub fn set_search(&mut self, value: &str) {
        Self::update(&mut self.search, &mut self.page, value);
    }

    /// Exact genre name; empty means all
    pub fn set_genre(&mut self, value: &str) {
        Self::update(&mut self.genre, &mut self.page, value);
    }

    /// Language, compared case-insensitively; empty means all
    pub fn set_language(&mut self, value: &str) {
        Self::update(&mut self.language, &mut self.page, value);
    }

    /// Exact release year; empty means all
    pub fn set_year(&mut self, value: &str) {
        Self::update(&mut self.year, &mut self.page, value);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        let title_match = movie
            .title
            .to_lowercase()
            .contains(&self.search.to_lowercase());
        let genre_match =
            self.genre.is_empty() || movie.genre_name.as_deref() == Some(self.genre.as_str());
        let language_match = self.language.is_empty()
            || movie.language.as_deref().unwrap_or_default().to_lowercase()
                == self.language.to_lowercase();
        let year_match =
            self.year.is_empty() || movie.release_year.as_deref() == Some(self.year.as_str());

        title_match && genre_match && language_match && year_match
    }

    pub fn apply<'a>(&self, movies: &'a [Movie]) -> Vec<&'a Movie> {
        movies.iter().filter(|m| self.matches(m)).collect()
    }
}

/// Filter choices derived from the loaded list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    /// Newest first
    pub years: Vec<String>,
}

impl Facets {
    pub fn from_movies(movies: &[Movie]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
            let mut seen = BTreeSet::new();
            values
                .flatten()
                .filter(|v| !v.is_empty())
                .filter(|v| seen.insert(*v))
                .map(str::to_string)
                .collect()
        }

        let mut years = distinct(movies.iter().map(|m| m.release_year.as_deref()));
        years.sort_by(|a, b| {
            let (ya, yb) = (a.parse::<i64>().ok(), b.parse::<i64>().ok());
            yb.cmp(&ya).then_with(|| b.cmp(a))
        });

        Facets {
            genres: distinct(movies.iter().map(|m| m.genre_name.as_deref())),
            languages: distinct(movies.iter().map(|m| m.language.as_deref())),
            years,
        }
    }
}

/// Admin screen state
#[derive(Debug, Default)]
pub struct AdminView {
    pub movies: Vec<Movie>,
    pub genres: Vec<Genre>,
    pub filters: AdminFilters,
    pub form: MovieForm,
}

impl AdminView {
    pub fn new(movies: Vec<Movie>, genres: Vec<Genre>) -> Self {
        Self {
            movies,
            genres,
            filters: AdminFilters::new(),
            form: MovieForm::new(),
        }
    }

    /// Fetch genres and movies together; each failure is logged and leaves that list empty
    pub async fn load(catalog: &dyn CatalogApi) -> Self {
        let (genres, movies) = tokio::join!(catalog.list_genres(), catalog.list_movies());
        let genres = genres.unwrap_or_else(|e| {
            error!("Error fetching genres: {}", e);
            Vec::new()
        });
        let movies = movies.unwrap_or_else(|e| {
            error!("Error fetching movies: {}", e);
            Vec::new()
        });
        Self::new(movies, genres)
    }

    /// Reload the movie list after a write
    pub async fn refresh(&mut self, catalog: &dyn CatalogApi) {
        match catalog.list_movies().await {
            Ok(movies) => self.movies = movies,
            Err(e) => error!("Error fetching movies: {}", e),
        }
    }

    pub fn facets(&self) -> Facets {
        Facets::from_movies(&self.movies)
    }

    pub fn current_page(&self) -> (Vec<&Movie>, Pagination) {
        let filtered = self.filters.apply(&self.movies);
        let (page, pagination) = paginate(&filtered, self.filters.page(), ADMIN_PAGE_SIZE);
        (page.to_vec(), pagination)
    }

    pub fn render_list(&self) -> String {
        let (movies, pagination) = self.current_page();
        if movies.is_empty() {
            return super::NO_MOVIES_FOUND.to_string();
        }
        let mut lines: Vec<String> = movies
            .iter()
            .map(|m| {
                format!(
                    "[{}] {} ({}) | {} | {}",
                    m.id,
                    m.title,
                    or_na(m.release_year.as_deref()),
                    or_na(m.genre_name.as_deref()),
                    or_na(m.language.as_deref()),
                )
            })
            .collect();
        lines.extend(pager_line(&pagination));
        lines.join("\n")
    }
}
