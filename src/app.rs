//! HTTP router.
//!
//! The edge middleware wraps the page router from the outside so that a locale
//! rewrite changes the URI before any route is matched.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::auth;
use crate::config::MUSIC_PUBLIC_PREFIX;
use crate::handlers;
use crate::routing::edge;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let pages = Router::new()
        .route(
            auth::SIGN_IN_PATH,
            get(auth::sign_in_page).post(auth::sign_in_submit),
        )
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/admin/music", get(handlers::music::list_music))
        .route(auth::ADMIN_HOME_PATH, get(handlers::admin::admin_home))
        .route("/admin/{*section}", get(handlers::admin::admin_section))
        .route("/{locale}", get(handlers::public_home))
        .route("/{locale}/{*page}", get(handlers::public_page))
        .nest_service(MUSIC_PUBLIC_PREFIX, ServeDir::new(&state.settings.music_dir))
        .nest_service("/static", ServeDir::new(&state.settings.static_dir))
        .fallback(handlers::not_found)
        .with_state(state.clone());

    Router::new()
        .fallback_service(pages)
        .layer(middleware::from_fn_with_state(state, edge))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SESSION_COOKIE_NAME;
    use crate::locale::LocalePrefix;
    use crate::testing::{TestEnv, ADMIN_PASSWORD, ADMIN_USERNAME};
    use axum::http::{header, HeaderName, HeaderValue, StatusCode};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Credentials<'a> {
        username: &'a str,
        password: &'a str,
    }

    fn server(env: &TestEnv) -> TestServer {
        TestServer::new(router(env.state())).unwrap()
    }

    fn location(response: &axum_test::TestResponse) -> String {
        response.header(header::LOCATION).to_str().unwrap().to_string()
    }

    fn session_cookie(token: &str) -> Cookie<'static> {
        Cookie::new(SESSION_COOKIE_NAME, token.to_string())
    }

    #[tokio::test]
    async fn test_root_redirects_to_default_locale() {
        let env = TestEnv::new();
        let response = server(&env).get("/").await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/fr");
        assert_eq!(response.cookie("ub_locale").value(), "fr");
    }

    #[tokio::test]
    async fn test_accept_language_picks_locale() {
        let env = TestEnv::new();
        let response = server(&env)
            .get("/about")
            .add_header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"))
            .await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/en/about");
    }

    #[tokio::test]
    async fn test_localized_public_page_is_served() {
        let env = TestEnv::new();
        let response = server(&env).get("/en/about").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("The studio"));
        assert!(html.contains(r#"href="/fr/about""#));
    }

    #[tokio::test]
    async fn test_localized_unknown_page_is_not_redirected() {
        let env = TestEnv::new();
        let response = server(&env).get("/fr/anything").await;

        response.assert_status_not_found();
        assert!(response.text().contains("Page introuvable"));
    }

    #[tokio::test]
    async fn test_as_needed_serves_default_locale_unprefixed() {
        let mut env = TestEnv::new();
        env.settings.locales.prefix = LocalePrefix::AsNeeded;
        let response = server(&env).get("/about").await;

        response.assert_status_ok();
        assert!(response.text().contains("Le studio"));
    }

    #[tokio::test]
    async fn test_admin_without_session_redirects_to_sign_in() {
        let env = TestEnv::new();
        let response = server(&env).get("/admin").await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/auth/sign-in");
    }

    #[tokio::test]
    async fn test_admin_subpaths_are_gated() {
        let env = TestEnv::new();
        let response = server(&env).get("/admin/settings?tab=music").await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        // The query survives the redirect
        assert_eq!(location(&response), "/auth/sign-in?tab=music");
    }

    #[tokio::test]
    async fn test_stale_cookie_is_cleared_on_redirect() {
        let env = TestEnv::new();
        let response = server(&env)
            .get("/admin")
            .add_cookie(session_cookie("not-a-session"))
            .await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.cookie(SESSION_COOKIE_NAME).value(), "");
    }

    #[tokio::test]
    async fn test_admin_with_session_is_served() {
        let env = TestEnv::new();
        let token = env.session_expiring_in(100);
        let response = server(&env)
            .get("/admin")
            .add_cookie(session_cookie(&token))
            .await;

        response.assert_status_ok();
        assert!(response.text().contains(ADMIN_USERNAME));
        assert!(response.maybe_cookie(SESSION_COOKIE_NAME).is_none());
    }

    #[tokio::test]
    async fn test_unknown_admin_section_is_not_found() {
        let env = TestEnv::new();
        let token = env.session_expiring_in(100);
        let response = server(&env)
            .get("/admin/billing")
            .add_cookie(session_cookie(&token))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_sign_in_with_session_redirects_to_admin() {
        let env = TestEnv::new();
        let token = env.session_expiring_in(100);
        let response = server(&env)
            .get("/auth/sign-in")
            .add_cookie(session_cookie(&token))
            .await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/admin");
    }

    #[tokio::test]
    async fn test_rotated_cookie_reaches_redirect_response() {
        let env = TestEnv::new();
        let token = env.session_expiring_in(1);
        let response = server(&env)
            .get("/auth/sign-in")
            .add_cookie(session_cookie(&token))
            .await;

        response.assert_status(StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/admin");
        let rotated = response.cookie(SESSION_COOKIE_NAME);
        assert!(!rotated.value().is_empty());
        assert_ne!(rotated.value(), token);
    }

    #[tokio::test]
    async fn test_sign_in_page_is_public() {
        let env = TestEnv::new();
        let response = server(&env).get("/auth/sign-in").await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains(r#"action="/auth/sign-in""#));
        // The base layout's versioned stylesheet link is rendered
        assert!(body.contains("/static/css/site.css?v="));
    }

    #[tokio::test]
    async fn test_sign_in_flow() {
        let env = TestEnv::new();
        let server = server(&env);

        let response = server
            .post("/auth/sign-in")
            .form(&Credentials {
                username: ADMIN_USERNAME,
                password: ADMIN_PASSWORD,
            })
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
        let cookie = response.cookie(SESSION_COOKIE_NAME);

        let response = server
            .get("/admin")
            .add_cookie(session_cookie(cookie.value()))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password() {
        let env = TestEnv::new();
        let response = server(&env)
            .post("/auth/sign-in")
            .form(&Credentials {
                username: ADMIN_USERNAME,
                password: "wrong",
            })
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(response.text().contains("Invalid username or password"));
        assert!(response.maybe_cookie(SESSION_COOKIE_NAME).is_none());
    }

    #[tokio::test]
    async fn test_sign_in_requires_both_fields() {
        let env = TestEnv::new();
        let response = server(&env)
            .post("/auth/sign-in")
            .form(&Credentials {
                username: " ",
                password: "",
            })
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_sign_out_redirects_to_origin_sign_in() {
        let env = TestEnv::new();
        let token = env.session_expiring_in(100);
        let server = server(&env);

        let response = server
            .post("/api/auth/sign-out")
            .add_cookie(session_cookie(&token))
            .add_header(header::HOST, HeaderValue::from_static("studio.example"))
            .add_header(
                HeaderName::from_static("x-forwarded-host"),
                HeaderValue::from_static("evil.example"),
            )
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        // Forwarding headers are ignored unless the proxy is trusted
        assert_eq!(location(&response), "http://studio.example/auth/sign-in");
        assert_eq!(response.cookie(SESSION_COOKIE_NAME).value(), "");

        // The session is gone server-side too
        let response = server
            .get("/admin")
            .add_cookie(session_cookie(&token))
            .await;
        assert_eq!(location(&response), "/auth/sign-in");
    }

    #[tokio::test]
    async fn test_music_listing() {
        let env = TestEnv::new();
        env.add_track("b.mp3");
        env.add_track("a.MP3");
        env.add_track("notes.txt");

        let response = server(&env).get("/api/admin/music").await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "tracks": ["/admin-music/a.MP3", "/admin-music/b.mp3"]
        }));
    }

    #[tokio::test]
    async fn test_music_listing_without_directory() {
        let mut env = TestEnv::new();
        env.settings.music_dir = env.path().join("missing");

        let response = server(&env).get("/api/admin/music").await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({ "tracks": [] }));
    }

    #[tokio::test]
    async fn test_music_listing_on_unreadable_directory() {
        let mut env = TestEnv::new();
        // A regular file where the directory should be
        let file = env.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();
        env.settings.music_dir = file;

        let response = server(&env).get("/api/admin/music").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&serde_json::json!({
            "error": "Unable to load admin music",
            "tracks": []
        }));
    }

    #[tokio::test]
    async fn test_music_files_bypass_the_edge() {
        let env = TestEnv::new();
        env.add_track("theme.mp3");

        let response = server(&env).get("/admin-music/theme.mp3").await;

        response.assert_status_ok();
    }
}
