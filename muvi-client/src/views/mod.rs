//! View models
//!
//! Each view owns the state a screen needs (loaded records, filters, current page) and
//! renders itself as plain text for the terminal front end.

pub mod admin;
pub mod detail;
pub mod favorites;
pub mod home;
pub mod movies;
pub mod pagination;
pub mod profile;

use muvi_common::Movie;
use pagination::Pagination;

pub const LOADING: &str = "Loading...";
pub const CHECKING_AUTH: &str = "Checking authentication...";
pub const NO_MOVIES_FOUND: &str = "No movies found.";

/// Fallback for absent optional fields
pub(crate) fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "N/A",
    }
}

/// One-line card: favorite marker, id, title, genre, language
pub fn card_line(movie: &Movie, favorite: bool) -> String {
    let title = if movie.title.is_empty() {
        "Untitled"
    } else {
        movie.title.as_str()
    };
    format!(
        "{} [{}] {}  | Genre: {} | Language: {}",
        if favorite { '♥' } else { '♡' },
        movie.favorite_key(),
        title,
        or_na(movie.genre_name.as_deref()),
        or_na(movie.language.as_deref()),
    )
}

/// Pager footer, only when there is more than one page
pub fn pager_line(pagination: &Pagination) -> Option<String> {
    (pagination.total_pages > 1)
        .then(|| format!("Page {} of {}", pagination.page, pagination.total_pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_line_fallbacks() {
        let movie = Movie {
            id: "7".to_string(),
            ..Default::default()
        };
        assert_eq!(
            card_line(&movie, true),
            "♥ [7] Untitled  | Genre: N/A | Language: N/A"
        );
    }

    #[test]
    fn test_pager_hidden_for_single_page() {
        let p = pagination::calculate_pagination(4, 1, 6);
        assert_eq!(pager_line(&p), None);
        let p = pagination::calculate_pagination(7, 2, 6);
        assert_eq!(pager_line(&p).as_deref(), Some("Page 2 of 2"));
    }
}
