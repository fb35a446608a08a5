//! Route table and navigation guard
//!
//! Every navigation resolves to exactly one [`Navigation`]: a neutral checking state
//! while the session is unknown, a render, or a redirect.

use crate::session::SessionState;

/// Routes the client knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    ForgotPassword,
    ConfirmPassword,
    ResetPassword,
    Home,
    Movies,
    MovieDetail(String),
    Favourites,
    Admin,
    Profile,
}

/// Who may see a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Signed-out users only (login, signup, password reset)
    AuthOnly,
    /// Signed-in users only
    Protected,
}

impl Route {
    /// Parse a path; query strings and trailing slashes are ignored
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        let route = match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/forgot-password" => Route::ForgotPassword,
            "/confirm-password" => Route::ConfirmPassword,
            "/reset-password" => Route::ResetPassword,
            "/movies" => Route::Movies,
            "/favourites" => Route::Favourites,
            "/admin" => Route::Admin,
            "/profile" => Route::Profile,
            other => {
                let id = other.strip_prefix("/movie/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Route::MovieDetail(id.to_string())
            }
        };
        Some(route)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Signup => "/signup".to_string(),
            Route::ForgotPassword => "/forgot-password".to_string(),
            Route::ConfirmPassword => "/confirm-password".to_string(),
            Route::ResetPassword => "/reset-password".to_string(),
            Route::Home => "/".to_string(),
            Route::Movies => "/movies".to_string(),
            Route::MovieDetail(id) => format!("/movie/{}", id),
            Route::Favourites => "/favourites".to_string(),
            Route::Admin => "/admin".to_string(),
            Route::Profile => "/profile".to_string(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login
            | Route::Signup
            | Route::ForgotPassword
            | Route::ConfirmPassword
            | Route::ResetPassword => Access::AuthOnly,
            _ => Access::Protected,
        }
    }
}

/// Result of one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session not resolved yet; show the checking placeholder
    Checking,
    RenderProtected(Route),
    RenderPublic(Route),
    Redirect {
        to: String,
        /// Location the user attempted, kept for returning after login
        from: Option<String>,
    },
}

/// Decide what a navigation to `path` shows
pub fn navigate(path: &str, session: &SessionState) -> Navigation {
    if !session.is_resolved() {
        return Navigation::Checking;
    }

    let Some(route) = Route::parse(path) else {
        tracing::debug!(path = %path, "Unknown route");
        return Navigation::Redirect {
            to: Route::Home.path(),
            from: None,
        };
    };

    match (route.access(), session.is_authenticated()) {
        (Access::Protected, true) => Navigation::RenderProtected(route),
        (Access::Protected, false) => Navigation::Redirect {
            to: Route::Login.path(),
            from: Some(path.to_string()),
        },
        (Access::AuthOnly, true) => Navigation::Redirect {
            to: Route::Home.path(),
            from: None,
        },
        (Access::AuthOnly, false) => Navigation::RenderPublic(route),
    }
}

/// Follow redirects until a render (or checking) is reached
///
/// Returns the final navigation and the redirect chain that led to it.
pub fn resolve(path: &str, session: &SessionState) -> (Navigation, Vec<String>) {
    const MAX_REDIRECTS: usize = 4;

    let mut current = path.to_string();
    let mut chain = Vec::new();
    for _ in 0..MAX_REDIRECTS {
        match navigate(&current, session) {
            Navigation::Redirect { to, .. } => {
                chain.push(to.clone());
                current = to;
            }
            other => return (other, chain),
        }
    }
    (navigate(&current, session), chain)
}
