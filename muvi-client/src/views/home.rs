//! Home view (`/`)
//!
//! One card fetch feeds a featured banner and three independently paged sections.

use super::pagination::{paginate, HOME_SECTION_PAGE_SIZE};
use super::{card_line, pager_line};
use crate::catalog::CatalogApi;
use muvi_common::Movie;

/// Release year from which a movie counts as new
pub const NEW_RELEASE_YEAR: i32 = 2023;
const SECTION_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Trending,
    TopPicks,
    NewReleases,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Trending, Section::TopPicks, Section::NewReleases];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Trending => "Trending Now",
            Section::TopPicks => "Top Picks",
            Section::NewReleases => "New Releases",
        }
    }
}

/// Home view state
#[derive(Debug, Default)]
pub struct HomeView {
    movies: Vec<Movie>,
    pages: [usize; 3],
}

impl HomeView {
    pub fn new(movies: Vec<Movie>) -> Self {
        Self {
            movies,
            pages: [1; 3],
        }
    }

    /// Fetch all cards; a failure is logged and renders empty sections
    pub async fn load(catalog: &dyn CatalogApi) -> Self {
        match catalog.list_movie_cards(None).await {
            Ok(movies) => Self::new(movies),
            Err(e) => {
                tracing::error!("Error fetching movies: {}", e);
                Self::new(Vec::new())
            }
        }
    }

    pub fn featured(&self) -> Option<&Movie> {
        self.movies.first()
    }

    /// All movies of a section, before paging
    pub fn section(&self, section: Section) -> Vec<&Movie> {
        match section {
            Section::Trending => self.movies.iter().take(SECTION_LEN).collect(),
            Section::TopPicks => self.movies.iter().skip(SECTION_LEN).take(SECTION_LEN).collect(),
            Section::NewReleases => self
                .movies
                .iter()
                .filter(|m| m.release_year_number().is_some_and(|y| y >= NEW_RELEASE_YEAR))
                .take(SECTION_LEN)
                .collect(),
        }
    }

    pub fn set_page(&mut self, section: Section, page: usize) {
        self.pages[section as usize] = page.max(1);
    }

    pub fn page(&self, section: Section) -> usize {
        self.pages[section as usize]
    }

    pub fn render(&self, is_favorite: impl Fn(&Movie) -> bool) -> String {
        let mut lines = Vec::new();
        if let Some(featured) = self.featured() {
            lines.push(format!("★ {}", featured.title));
            lines.push(featured.summary_preview(usize::MAX));
        }

        for section in Section::ALL {
            let movies = self.section(section);
            if movies.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(section.title().to_string());
            let (page, pagination) = paginate(&movies, self.page(section), HOME_SECTION_PAGE_SIZE);
            lines.extend(page.iter().map(|&m| card_line(m, is_favorite(m))));
            lines.extend(pager_line(&pagination));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movies(n: usize) -> Vec<Movie> {
        (0..n)
            .map(|i| Movie {
                id: i.to_string(),
                title: format!("Movie {}", i),
                release_year: Some(if i % 2 == 0 { "2024" } else { "2019" }.to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_sections() {
        let view = HomeView::new(movies(25));
        assert_eq!(view.featured().unwrap().id, "0");

        let trending = view.section(Section::Trending);
        assert_eq!(trending.len(), 10);
        assert_eq!(trending[0].id, "0");

        let top = view.section(Section::TopPicks);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].id, "10");

        let new = view.section(Section::NewReleases);
        assert_eq!(new.len(), 10);
        assert!(new.iter().all(|m| m.release_year.as_deref() == Some("2024")));
    }

    #[test]
    fn test_sections_page_independently() {
        let mut view = HomeView::new(movies(12));
        view.set_page(Section::Trending, 2);
        assert_eq!(view.page(Section::Trending), 2);
        assert_eq!(view.page(Section::TopPicks), 1);
    }

    #[test]
    fn test_empty_home() {
        let view = HomeView::new(Vec::new());
        assert!(view.featured().is_none());
        assert_eq!(view.render(|_| false), "");
    }
}
