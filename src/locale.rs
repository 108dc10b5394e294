//! Locale negotiation for public pages.
//!
//! Resolution order: locale cookie, then Accept-Language, then the default locale.
//! Every request gets exactly one [`LocaleOutcome`].

use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::cookies::CookieMutations;

/// Locale cookie lifetime (1 year)
const LOCALE_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// How locale prefixes appear in visible URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalePrefix {
    /// Every public URL carries a locale prefix
    #[default]
    Always,
    /// The default locale is served without a prefix via an internal rewrite
    AsNeeded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocaleSettings {
    pub locales: Vec<String>,
    pub default_locale: String,
    pub prefix: LocalePrefix,
    pub cookie_name: String,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            locales: vec!["fr".to_string(), "en".to_string()],
            default_locale: "fr".to_string(),
            prefix: LocalePrefix::Always,
            cookie_name: "ub_locale".to_string(),
        }
    }
}

/// The locale resolved for a request, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

/// The parts of a request locale negotiation looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub cookie_locale: Option<&'a str>,
    pub accept_language: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleOutcome {
    /// Send the client to a URL with the right prefix
    Redirect { location: String, locale: String },
    /// Route the request as if it had been made to `path_and_query`
    Rewrite { path_and_query: String, locale: String },
    /// Already correctly prefixed
    Pass { locale: String },
}

impl LocaleOutcome {
    pub fn locale(&self) -> &str {
        match self {
            Self::Redirect { locale, .. } | Self::Rewrite { locale, .. } | Self::Pass { locale } => {
                locale
            }
        }
    }
}

impl LocaleSettings {
    pub fn is_supported(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// Split `/fr/about` into `("fr", "/about")`. `/fr` yields `("fr", "/")`.
    pub fn split_prefix<'p>(&self, path: &'p str) -> Option<(&str, &'p str)> {
        let trimmed = path.strip_prefix('/')?;
        let (first, rest) = match trimmed.find('/') {
            Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
            None => (trimmed, "/"),
        };
        self.locales
            .iter()
            .find(|l| l.as_str() == first)
            .map(|l| (l.as_str(), rest))
    }

    /// Pick the locale for a request that does not name one in its path.
    pub fn resolve(&self, cookie_locale: Option<&str>, accept_language: Option<&str>) -> String {
        if let Some(locale) = cookie_locale.filter(|l| self.is_supported(l)) {
            return locale.to_string();
        }

        if let Some(header) = accept_language {
            for (tag, _) in parse_accept_language(header) {
                let primary = tag.split('-').next().unwrap_or_default();
                if let Some(locale) = self.locales.iter().find(|l| l.eq_ignore_ascii_case(primary)) {
                    return locale.clone();
                }
            }
        }

        self.default_locale.clone()
    }

    pub fn negotiate(&self, request: &LocaleRequest<'_>) -> LocaleOutcome {
        if let Some((locale, rest)) = self.split_prefix(request.path) {
            if self.prefix == LocalePrefix::AsNeeded && locale == self.default_locale {
                return LocaleOutcome::Redirect {
                    location: with_query(rest, request.query),
                    locale: locale.to_string(),
                };
            }
            return LocaleOutcome::Pass {
                locale: locale.to_string(),
            };
        }

        let locale = self.resolve(request.cookie_locale, request.accept_language);
        let prefixed = with_query(&prefixed_path(&locale, request.path), request.query);

        if self.prefix == LocalePrefix::AsNeeded && locale == self.default_locale {
            LocaleOutcome::Rewrite {
                path_and_query: prefixed,
                locale,
            }
        } else {
            LocaleOutcome::Redirect {
                location: prefixed,
                locale,
            }
        }
    }

    /// Visible URL of `rest` (e.g. `/about`) in `locale`.
    pub fn localized_path(&self, locale: &str, rest: &str) -> String {
        if self.prefix == LocalePrefix::AsNeeded && locale == self.default_locale {
            if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            }
        } else {
            prefixed_path(locale, rest)
        }
    }

    /// Cookie changes that remember `locale`, empty when the client already has it.
    pub fn remember(&self, current: Option<&str>, locale: &str) -> CookieMutations {
        let mut mutations = CookieMutations::new();
        if current != Some(locale) {
            mutations.set(
                Cookie::build((self.cookie_name.clone(), locale.to_string()))
                    .path("/")
                    .same_site(SameSite::Lax)
                    .max_age(time::Duration::days(LOCALE_COOKIE_MAX_AGE_DAYS))
                    .build(),
            );
        }
        mutations
    }
}

fn prefixed_path(locale: &str, path: &str) -> String {
    if path == "/" || path.is_empty() {
        format!("/{}", locale)
    } else if path.starts_with('/') {
        format!("/{}{}", locale, path)
    } else {
        format!("/{}/{}", locale, path)
    }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}

/// Parse an Accept-Language header into tags ordered by descending quality.
/// Entries with `q=0` or an unparsable quality are dropped.
pub fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.trim().split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let mut quality = 1.0_f32;
            for param in pieces {
                if let Some(q) = param.trim().strip_prefix("q=") {
                    quality = q.trim().parse().ok()?;
                }
            }
            (quality > 0.0).then(|| (tag.to_ascii_lowercase(), quality))
        })
        .collect();

    // Stable sort keeps header order among equal qualities
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
}

/// Display strings for the locale switcher.
pub fn locale_label(locale: &str) -> &'static str {
    match locale {
        "fr" => "Français",
        "en" => "English",
        _ => "",
    }
}
