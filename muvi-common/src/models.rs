//! Catalog models and wire payloads
//!
//! The catalog service is loose about JSON types: ids and years arrive as numbers or
//! strings, ratings as numbers or numeric strings, and list endpoints answer either a
//! bare array or an object wrapping it. Everything here deserializes leniently and
//! normalizes to one Rust shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Movie record as returned by the catalog service
///
/// Card endpoints return a subset of the fields; detail endpoints return all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: String,
    /// Favorite key; some endpoints key favorites by this instead of `id`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::opt_string_or_number"
    )]
    pub movie_id: Option<String>,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::opt_string_or_number"
    )]
    pub genre_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub genre_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub release_year: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub poster_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub banner_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub actors: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f32_lenient")]
    pub rating: Option<f32>,
}

impl Movie {
    /// Identifier used for favorites: `movie_id` when present, otherwise `id`
    pub fn favorite_key(&self) -> &str {
        match self.movie_id.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => &self.id,
        }
    }

    /// Release year as a number, when it parses
    pub fn release_year_number(&self) -> Option<i32> {
        self.release_year.as_deref()?.trim().parse().ok()
    }

    /// Summary cut to at most `max_chars` characters
    pub fn summary_preview(&self, max_chars: usize) -> String {
        match self.summary.as_deref() {
            Some(s) if !s.trim().is_empty() => s.chars().take(max_chars).collect(),
            _ => "No summary available.".to_string(),
        }
    }

    /// Banner image, falling back to the poster
    pub fn banner_or_poster(&self) -> Option<&str> {
        self.banner_url.as_deref().or(self.poster_url.as_deref())
    }
}

/// Genre record (`{genre_id, genre_name}` on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(rename = "genre_id", alias = "id", deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(rename = "genre_name", alias = "name", default)]
    pub name: String,
}

/// `{movies: [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MovieList {
    Wrapped {
        #[serde(default)]
        movies: Vec<Movie>,
    },
    Bare(Vec<Movie>),
}

impl MovieList {
    pub fn into_vec(self) -> Vec<Movie> {
        match self {
            MovieList::Wrapped { movies } => movies,
            MovieList::Bare(movies) => movies,
        }
    }
}

/// `{movie: {...}}` or the movie itself
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MovieEnvelope {
    Wrapped { movie: Movie },
    Bare(Movie),
}

impl MovieEnvelope {
    pub fn into_movie(self) -> Movie {
        match self {
            MovieEnvelope::Wrapped { movie } => movie,
            MovieEnvelope::Bare(movie) => movie,
        }
    }
}

/// `{genres: [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GenreList {
    Wrapped { genres: Vec<Genre> },
    Bare(Vec<Genre>),
}

impl GenreList {
    pub fn into_vec(self) -> Vec<Genre> {
        match self {
            GenreList::Wrapped { genres } => genres,
            GenreList::Bare(genres) => genres,
        }
    }
}

/// Response of the favorites listing endpoint
#[derive(Debug, Default, Deserialize)]
pub struct FavoriteIds {
    #[serde(default, deserialize_with = "de::string_list")]
    pub favourites: Vec<String>,
}

/// Response of the toggle endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for a pre-signed upload target
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub content_type: String,
}

/// Pre-signed upload target
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTarget {
    /// Form POST destination
    pub url: String,
    /// Form fields that must precede the file part
    #[serde(default, deserialize_with = "de::string_map")]
    pub fields: BTreeMap<String, String>,
    /// Public URL of the object once uploaded
    pub file_url: String,
}

/// Body of create/update requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePayload {
    pub title: String,
    pub genre_id: String,
    pub language: String,
    pub summary: String,
    pub poster_url: String,
    pub release_year: String,
    pub director: String,
    pub actors: String,
}

/// Error body of the catalog service
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn scalar_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(scalar_to_string).unwrap_or_default())
    }

    /// Blank strings collapse to `None`
    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .and_then(scalar_to_string)
            .filter(|s| !s.trim().is_empty()))
    }

    pub fn opt_f32_lenient<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64().map(|f| f as f32),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<Vec<Value>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .filter_map(scalar_to_string)
            .collect())
    }

    pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
            .collect())
    }
}
