//! Admin authentication: session gate, session store and sign-in/out.

pub mod db;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;

pub use gate::{authorize, Decision, ADMIN_HOME_PATH, SIGN_IN_PATH};
pub use handlers::{sign_in_page, sign_in_submit, sign_out};
pub use middleware::AdminSession;
pub use session::{Session, SessionError, SessionLookup, SessionProvider, SESSION_COOKIE_NAME};
pub use store::SqliteSessionStore;
