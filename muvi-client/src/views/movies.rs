//! Movies list view (`/movies`)
//!
//! Cards are fetched once per genre scope; the title filter and paging run in memory.

use super::pagination::{paginate, Pagination, MOVIES_PAGE_SIZE};
use super::{card_line, pager_line, LOADING, NO_MOVIES_FOUND};
use crate::catalog::CatalogApi;
use muvi_common::{Movie, Result};

/// Case-insensitive title substring filter; an empty query keeps everything
///
/// The query is matched as typed, surrounding whitespace included.
pub fn filter_by_title<'a>(movies: &'a [Movie], query: &str) -> Vec<&'a Movie> {
    let needle = query.to_lowercase();
    movies
        .iter()
        .filter(|m| needle.is_empty() || m.title.to_lowercase().contains(&needle))
        .collect()
}

/// What the list currently shows
#[derive(Debug, PartialEq)]
pub enum ListPage<'a> {
    Loading,
    Empty,
    Page {
        movies: Vec<&'a Movie>,
        pagination: Pagination,
    },
}

/// Movies list state
#[derive(Debug, Default)]
pub struct MovieListView {
    movies: Vec<Movie>,
    loaded: bool,
    search_query: String,
    genre_id: Option<String>,
    page: usize,
}

impl MovieListView {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Default::default()
        }
    }

    /// Fetch cards for the current genre scope
    ///
    /// On failure the list is emptied and the error returned for the caller to show.
    pub async fn load(&mut self, catalog: &dyn CatalogApi) -> Result<()> {
        self.loaded = false;
        let result = catalog.list_movie_cards(self.genre_id.as_deref()).await;
        self.loaded = true;
        match result {
            Ok(movies) => {
                self.movies = movies;
                Ok(())
            }
            Err(e) => {
                tracing::error!(genre_id = ?self.genre_id, "Error fetching movies: {}", e);
                self.movies.clear();
                Err(e)
            }
        }
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn genre_id(&self) -> Option<&str> {
        self.genre_id.as_deref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Change the title filter; a different query returns to page 1
    pub fn set_search_query(&mut self, query: &str) {
        if self.search_query != query {
            self.search_query = query.to_string();
            self.page = 1;
        }
    }

    /// Change the genre scope; returns true when the list must be reloaded
    pub fn set_genre(&mut self, genre_id: Option<&str>) -> bool {
        let genre_id = genre_id.filter(|g| !g.is_empty()).map(str::to_string);
        if self.genre_id == genre_id {
            return false;
        }
        self.genre_id = genre_id;
        self.page = 1;
        true
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn filtered(&self) -> Vec<&Movie> {
        filter_by_title(&self.movies, &self.search_query)
    }

    pub fn current_page(&self) -> ListPage<'_> {
        if !self.loaded {
            return ListPage::Loading;
        }
        let filtered = self.filtered();
        if filtered.is_empty() {
            return ListPage::Empty;
        }
        let (movies, pagination) = paginate(&filtered, self.page, MOVIES_PAGE_SIZE);
        ListPage::Page {
            movies: movies.to_vec(),
            pagination,
        }
    }

    /// Render the grid; `is_favorite` marks favorited cards
    pub fn render(&self, is_favorite: impl Fn(&Movie) -> bool) -> String {
        match self.current_page() {
            ListPage::Loading => LOADING.to_string(),
            ListPage::Empty => NO_MOVIES_FOUND.to_string(),
            ListPage::Page { movies, pagination } => {
                let mut lines: Vec<String> =
                    movies.iter().map(|&m| card_line(m, is_favorite(m))).collect();
                lines.extend(pager_line(&pagination));
                lines.join("\n")
            }
        }
    }
}
