//! Detail-on-demand
//!
//! Cards carry only summary fields; selecting one fetches the full record. When the user
//! selects another card (or closes the overlay) before a fetch finishes, the earlier
//! result is discarded so it can never overwrite the newer selection.

use super::or_na;
use crate::catalog::CatalogApi;
use muvi_common::Movie;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Hover preview summary length
pub const PREVIEW_CHARS: usize = 120;

/// Overlay state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    #[default]
    Closed,
    Loading {
        id: String,
    },
    Ready(Movie),
    Failed {
        id: String,
        message: String,
    },
}

/// Fetches full records for the selected card
pub struct DetailLoader {
    generation: AtomicU64,
    state: watch::Sender<DetailState>,
}

impl Default for DetailLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailLoader {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DetailState::Closed);
        Self {
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    /// Select a movie and fetch its detail
    ///
    /// Returns the state after this call; if a newer selection superseded it, that is the
    /// newer selection's state.
    pub async fn select(&self, catalog: &dyn CatalogApi, id: &str) -> DetailState {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(DetailState::Loading { id: id.to_string() });

        let result = catalog.get_movie(id).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(movie_id = %id, "Discarding superseded detail response");
            return self.state();
        }

        let next = match result {
            Ok(movie) => DetailState::Ready(movie),
            Err(e) => {
                tracing::error!(movie_id = %id, "Could not load movie details: {}", e);
                DetailState::Failed {
                    id: id.to_string(),
                    message: "Could not load movie details.".to_string(),
                }
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Close the overlay; any in-flight fetch is discarded
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(DetailState::Closed);
    }
}

/// Full overlay text
pub fn render_detail(movie: &Movie) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", movie.title);
    if let Some(image) = movie.banner_or_poster() {
        let _ = writeln!(out, "Image: {}", image);
    }
    let _ = writeln!(out, "Genre: {}", or_na(movie.genre_name.as_deref()));
    let _ = writeln!(out, "Language: {}", or_na(movie.language.as_deref()));
    let _ = writeln!(out, "Year: {}", or_na(movie.release_year.as_deref()));
    let _ = writeln!(out, "Director: {}", or_na(movie.director.as_deref()));
    let _ = writeln!(out, "Actors: {}", or_na(movie.actors.as_deref()));
    match movie.rating {
        Some(rating) => {
            let _ = writeln!(out, "Rating: {}", rating);
        }
        None => {
            let _ = writeln!(out, "Rating: N/A");
        }
    }
    let _ = writeln!(out);
    let _ = write!(out, "Summary: {}", movie.summary_preview(usize::MAX));
    out
}

/// Hover preview text
pub fn render_preview(movie: &Movie) -> String {
    format!(
        "{} ({})\n{} | {}\n{}",
        movie.title,
        or_na(movie.release_year.as_deref()),
        or_na(movie.genre_name.as_deref()),
        or_na(movie.language.as_deref()),
        movie.summary_preview(PREVIEW_CHARS),
    )
}

/// Text for the current overlay state
pub fn render_state(state: &DetailState) -> String {
    match state {
        DetailState::Closed => String::new(),
        DetailState::Loading { .. } => super::LOADING.to_string(),
        DetailState::Ready(movie) => render_detail(movie),
        DetailState::Failed { message, .. } => message.clone(),
    }
}
