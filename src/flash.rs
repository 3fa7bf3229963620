use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

const FLASH_COOKIE: &str = "flash";

/// Redirect carrying a one-shot notice for the next rendered page.
pub fn redirect_with(jar: CookieJar, to: &str, message: impl Into<String>) -> (CookieJar, Redirect) {
    let message: String = message.into();
    let cookie = Cookie::build((FLASH_COOKIE, message))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), Redirect::to(to))
}

/// Reads the pending notice, if any, and clears it.
pub fn take(jar: CookieJar) -> (CookieJar, Option<String>) {
    match jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) {
        Some(message) => (
            jar.remove(Cookie::build(FLASH_COOKIE).path("/")),
            Some(message),
        ),
        None => (jar, None),
    }
}
