//! Askama template filters for asset management

// Include compile-time generated asset hashes
include!(concat!(env!("OUT_DIR"), "/asset_hashes.rs"));

/// Append cache-busting hash to static asset URLs.
///
/// Usage in templates:
/// ```html
/// <link rel="stylesheet" href="{{ "/static/css/site.css"|asset_url }}">
/// ```
#[askama::filter_fn]
pub fn asset_url(path: impl std::fmt::Display, _: &dyn askama::Values) -> askama::Result<String> {
    Ok(versioned(&path.to_string()))
}

fn versioned(path: &str) -> String {
    match path {
        "/static/css/site.css" => format!("{}?v={}", path, SITE_CSS_HASH),
        "/static/js/admin.js" => format!("{}?v={}", path, ADMIN_JS_HASH),
        "/static/js/site.js" => format!("{}?v={}", path, SITE_JS_HASH),
        _ => path.to_string(),
    }
}
