//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > defaults.

use serde::Deserialize;
use std::path::PathBuf;

use crate::locale::{LocalePrefix, LocaleSettings};

// ==================== Defaults ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3001;

/// Session lifetime in hours (1 week)
pub const SESSION_TTL_HOURS: i64 = 24 * 7;

/// Sessions with less than this much lifetime left are rotated on access
pub const SESSION_REFRESH_WITHIN_HOURS: i64 = 24;

/// Public URL prefix under which admin music files are served
pub const MUSIC_PUBLIC_PREFIX: &str = "/admin-music";

// ==================== config.toml structure ====================

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerSection>,
    database: Option<DatabaseSection>,
    auth: Option<AuthSection>,
    i18n: Option<I18nSection>,
    media: Option<MediaSection>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    addr: Option<String>,
    port: Option<u16>,
    trust_proxy_headers: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthSection {
    session_ttl_hours: Option<i64>,
    refresh_within_hours: Option<i64>,
    secure_cookies: Option<bool>,
    admin_username: Option<String>,
    admin_password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct I18nSection {
    locales: Option<Vec<String>>,
    default_locale: Option<String>,
    prefix: Option<LocalePrefix>,
    cookie_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaSection {
    music_dir: Option<String>,
    static_dir: Option<String>,
}

// ==================== Resolved settings ====================

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub session_ttl_hours: i64,
    pub refresh_within_hours: i64,
    /// Set the Secure flag on session cookies (enable behind HTTPS)
    pub secure_cookies: bool,
    /// Bootstrap admin account created on startup when both are set
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: SESSION_TTL_HOURS,
            refresh_within_hours: SESSION_REFRESH_WITHIN_HOURS,
            secure_cookies: false,
            admin_username: None,
            admin_password: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub server_port: u16,
    /// Honor X-Forwarded-Host/-Proto (only behind a proxy that sets them)
    pub trust_proxy_headers: bool,
    pub database_path: PathBuf,
    pub music_dir: PathBuf,
    pub static_dir: PathBuf,
    pub auth: AuthSettings,
    pub locales: LocaleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: SERVER_ADDR.to_string(),
            server_port: SERVER_PORT,
            trust_proxy_headers: false,
            database_path: PathBuf::from("data/studio.db"),
            music_dir: PathBuf::from("public/admin-music"),
            static_dir: PathBuf::from("static"),
            auth: AuthSettings::default(),
            locales: LocaleSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config.toml, then the environment, then defaults.
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut settings = Self::default();
        settings.apply_env();

        match std::fs::read_to_string("config.toml") {
            Ok(contents) => match Self::overlay_toml(settings.clone(), &contents) {
                Ok(overlaid) => {
                    tracing::info!("Loaded configuration from config.toml");
                    settings = overlaid;
                }
                Err(e) => tracing::warn!("Ignoring unreadable config.toml: {}", e),
            },
            Err(_) => tracing::debug!("No config.toml found, using environment and defaults"),
        }

        settings
    }

    /// Parse a config.toml document on top of the defaults.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        Self::overlay_toml(Self::default(), contents)
    }

    fn overlay_toml(mut self, contents: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(contents)?;

        if let Some(server) = file.server {
            if let Some(addr) = server.addr {
                self.server_addr = addr;
            }
            if let Some(port) = server.port {
                self.server_port = port;
            }
            if let Some(trust) = server.trust_proxy_headers {
                self.trust_proxy_headers = trust;
            }
        }
        if let Some(path) = file.database.and_then(|db| db.path) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(auth) = file.auth {
            if let Some(ttl) = auth.session_ttl_hours {
                self.auth.session_ttl_hours = ttl;
            }
            if let Some(window) = auth.refresh_within_hours {
                self.auth.refresh_within_hours = window;
            }
            if let Some(secure) = auth.secure_cookies {
                self.auth.secure_cookies = secure;
            }
            if auth.admin_username.is_some() {
                self.auth.admin_username = auth.admin_username;
            }
            if auth.admin_password.is_some() {
                self.auth.admin_password = auth.admin_password;
            }
        }
        if let Some(i18n) = file.i18n {
            if let Some(locales) = i18n.locales.filter(|l| !l.is_empty()) {
                self.locales.locales = locales;
            }
            if let Some(default_locale) = i18n.default_locale {
                self.locales.default_locale = default_locale;
            }
            if let Some(prefix) = i18n.prefix {
                self.locales.prefix = prefix;
            }
            if let Some(cookie_name) = i18n.cookie_name {
                self.locales.cookie_name = cookie_name;
            }
        }
        if let Some(media) = file.media {
            if let Some(dir) = media.music_dir {
                self.music_dir = PathBuf::from(dir);
            }
            if let Some(dir) = media.static_dir {
                self.static_dir = PathBuf::from(dir);
            }
        }

        // A default locale outside the configured list would make every redirect loop
        if !self.locales.locales.contains(&self.locales.default_locale) {
            tracing::warn!(
                "Default locale '{}' is not in {:?}, using '{}'",
                self.locales.default_locale,
                self.locales.locales,
                self.locales.locales[0]
            );
            self.locales.default_locale = self.locales.locales[0].clone();
        }

        Ok(self)
    }

    fn apply_env(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server_port = port;
        }
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            tracing::info!("Using database from DATABASE_PATH env: {}", path);
            self.database_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("MUSIC_DIR") {
            self.music_dir = PathBuf::from(dir);
        }
        if let Ok(username) = std::env::var("ADMIN_USERNAME") {
            self.auth.admin_username = Some(username);
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }
        if let Ok(secure) = std::env::var("SECURE_COOKIES") {
            self.auth.secure_cookies = env_flag(&secure);
        }
        if let Ok(trust) = std::env::var("TRUST_PROXY_HEADERS") {
            self.trust_proxy_headers = env_flag(&trust);
        }
    }

    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }
}

fn env_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr(), "0.0.0.0:3001");
        assert_eq!(settings.locales.default_locale, "fr");
        assert_eq!(settings.auth.session_ttl_hours, 24 * 7);
        assert!(!settings.trust_proxy_headers);
    }

    #[test]
    fn test_toml_overrides() {
        let settings = Settings::from_toml(
            r#"
            [server]
            port = 8080
            trust_proxy_headers = true

            [auth]
            secure_cookies = true

            [i18n]
            locales = ["en", "fr"]
            default_locale = "en"
            prefix = "as-needed"

            [media]
            music_dir = "/srv/music"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server_port, 8080);
        assert!(settings.trust_proxy_headers);
        assert!(settings.auth.secure_cookies);
        assert_eq!(settings.locales.default_locale, "en");
        assert_eq!(settings.locales.prefix, LocalePrefix::AsNeeded);
        assert_eq!(settings.music_dir, PathBuf::from("/srv/music"));
        // Untouched sections keep their defaults
        assert_eq!(settings.server_addr, SERVER_ADDR);
    }

    #[test]
    fn test_unknown_default_locale_falls_back() {
        let settings = Settings::from_toml(
            r#"
            [i18n]
            default_locale = "de"
            "#,
        )
        .unwrap();
        assert_eq!(settings.locales.default_locale, "fr");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Settings::from_toml("[server\nport = ").is_err());
    }
}
