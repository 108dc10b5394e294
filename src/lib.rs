pub mod app;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod locale;
pub mod routing;
pub mod state;

#[cfg(test)]
pub mod testing;
