pub mod admin;
pub mod music;
pub mod pages;

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};

use crate::error::{render, AppError};
use crate::filters;
use crate::locale::{locale_label, Locale, LocaleSettings};
use crate::state::AppState;
use pages::{nav_label, page_copy, PageCopy, PAGE_SLUGS};

#[derive(Debug, Clone)]
pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "public/page.html")]
pub struct PageTemplate {
    pub locale: String,
    pub copy: PageCopy,
    pub nav: Vec<NavLink>,
    /// The same page in every locale, for the language switcher
    pub alternates: Vec<NavLink>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub locale: String,
    pub heading: &'static str,
    pub back_label: &'static str,
    pub back_href: String,
}

fn slug_path(slug: &str) -> String {
    if slug.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", slug)
    }
}

fn navigation(locales: &LocaleSettings, locale: &str, current: &str) -> Vec<NavLink> {
    PAGE_SLUGS
        .iter()
        .map(|slug| NavLink {
            href: locales.localized_path(locale, &slug_path(slug)),
            label: nav_label(slug, locale),
            current: *slug == current,
        })
        .collect()
}

fn alternates(locales: &LocaleSettings, locale: &str, slug: &str) -> Vec<NavLink> {
    locales
        .locales
        .iter()
        .map(|other| NavLink {
            href: locales.localized_path(other, &slug_path(slug)),
            label: locale_label(other),
            current: other == locale,
        })
        .collect()
}

fn render_page(state: &AppState, locale: &str, slug: &str) -> Result<Response, AppError> {
    let locales = &state.settings.locales;
    let copy = match page_copy(slug, locale).filter(|_| locales.is_supported(locale)) {
        Some(copy) => copy,
        None => return render_not_found(locales, locale),
    };

    let template = PageTemplate {
        locale: locale.to_string(),
        copy,
        nav: navigation(locales, locale, slug),
        alternates: alternates(locales, locale, slug),
    };
    Ok(render(&template)?.into_response())
}

fn render_not_found(locales: &LocaleSettings, locale: &str) -> Result<Response, AppError> {
    let locale = if locales.is_supported(locale) {
        locale
    } else {
        locales.default_locale.as_str()
    };
    let (heading, back_label) = match locale {
        "fr" => ("Page introuvable", "Retour à l'accueil"),
        _ => ("Page not found", "Back to home"),
    };
    let template = NotFoundTemplate {
        locale: locale.to_string(),
        heading,
        back_label,
        back_href: locales.localized_path(locale, "/"),
    };
    Ok((StatusCode::NOT_FOUND, render(&template)?).into_response())
}

/// GET /{locale}
pub async fn public_home(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Response, AppError> {
    render_page(&state, &locale, "")
}

/// GET /{locale}/{*page}
pub async fn public_page(
    State(state): State<AppState>,
    Path((locale, page)): Path<(String, String)>,
) -> Result<Response, AppError> {
    render_page(&state, &locale, page.trim_end_matches('/'))
}

/// Fallback for everything no route claims, in the negotiated locale when there is one
pub async fn not_found(
    State(state): State<AppState>,
    locale: Option<Extension<Locale>>,
) -> Result<Response, AppError> {
    let locales = &state.settings.locales;
    let locale = match &locale {
        Some(Extension(Locale(locale))) => locale.as_str(),
        None => locales.default_locale.as_str(),
    };
    render_not_found(locales, locale)
}
