//! Application state passed to all handlers and the edge middleware.

use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::config::Settings;
use crate::routing::EdgeRouter;

#[derive(Clone)]
pub struct AppState {
    /// Session backend (users, sessions)
    pub sessions: Arc<dyn SessionProvider>,
    pub settings: Arc<Settings>,
    pub edge: Arc<EdgeRouter>,
}

impl AppState {
    pub fn new(sessions: Arc<dyn SessionProvider>, settings: Settings) -> Self {
        let edge = EdgeRouter::new(&settings.locales);
        Self {
            sessions,
            settings: Arc::new(settings),
            edge: Arc::new(edge),
        }
    }
}
