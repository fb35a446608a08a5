//! Favorites view (`/favourites`)

use super::card_line;
use muvi_common::Movie;

pub const NO_FAVORITES: &str = "You haven't added any favorite movies yet.";

/// Render the favorites list; every entry is a favorite by definition
pub fn render(favorites: &[Movie]) -> String {
    if favorites.is_empty() {
        return NO_FAVORITES.to_string();
    }
    let mut lines = vec![format!("My Favourites ({})", favorites.len())];
    lines.extend(favorites.iter().map(|m| card_line(m, true)));
    lines.join("\n")
}
