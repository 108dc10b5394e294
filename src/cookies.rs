//! Cookie changes collected while handling a request and written to the response.

use axum_extra::extract::cookie::{Cookie, CookieJar};

#[derive(Debug, Clone, PartialEq)]
pub enum CookieChange {
    Set(Cookie<'static>),
    /// Expire the named cookie (path and domain must match the cookie being removed)
    Remove(Cookie<'static>),
}

/// Ordered list of cookie changes. Later changes to the same name win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieMutations(Vec<CookieChange>);

impl CookieMutations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, cookie: Cookie<'static>) {
        self.0.push(CookieChange::Set(cookie));
    }

    pub fn remove(&mut self, cookie: Cookie<'static>) {
        self.0.push(CookieChange::Remove(cookie));
    }

    pub fn extend(&mut self, other: CookieMutations) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn changes(&self) -> &[CookieChange] {
        &self.0
    }

    /// The value a `Set` change leaves for `name`, if any.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.0.iter().rev().find_map(|change| match change {
            CookieChange::Set(c) if c.name() == name => Some(c.value()),
            CookieChange::Remove(c) if c.name() == name => Some(""),
            _ => None,
        })
    }

    /// Apply onto a jar so the changes land in its delta.
    ///
    /// Removals are added as removal cookies rather than via `CookieJar::remove`,
    /// which only emits a delta for cookies the jar saw on the request.
    pub fn apply(self, jar: CookieJar) -> CookieJar {
        self.0.into_iter().fold(jar, |jar, change| match change {
            CookieChange::Set(cookie) => jar.add(cookie),
            CookieChange::Remove(mut cookie) => {
                cookie.make_removal();
                jar.add(cookie)
            }
        })
    }

    /// A fresh jar holding only these changes, ready to be returned as response parts.
    pub fn into_jar(self) -> CookieJar {
        self.apply(CookieJar::new())
    }
}
