//! MUVI client library
//!
//! Client-side state for the MUVI movie catalog: session tracking, favorites, guarded
//! navigation, and the catalog and identity service clients they run on.

pub mod app;
pub mod auth_flows;
pub mod catalog;
pub mod favorites;
pub mod identity;
pub mod router;
pub mod session;
pub mod store;
pub mod views;

pub use app::App;
