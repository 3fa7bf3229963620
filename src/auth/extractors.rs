use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::session::{SessionKeys, SESSION_COOKIE};
use crate::{flash, state::AppState};

/// Authenticated caller, resolved from the session cookie.
///
/// Taking this as a handler argument is what makes a route protected: when no
/// valid session exists the request is redirected to `/login` before the
/// handler body runs. A session store outage also redirects, but carries the
/// failure notice so the login page can show it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session_id: Uuid,
    pub email: String,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (CookieJar, Redirect);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let login = || (jar.clone(), Redirect::to("/login"));

        let token = jar.get(SESSION_COOKIE).ok_or_else(|| {
            debug!(path = %parts.uri.path(), "no session cookie");
            login()
        })?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.verify(token.value()).map_err(|_| {
            warn!("invalid or expired session token");
            login()
        })?;

        let session = match state.sessions.find(claims.sid).await {
            Ok(Some(s)) if !s.is_expired(OffsetDateTime::now_utc()) => s,
            Ok(_) => {
                debug!(session_id = %claims.sid, "session no longer exists");
                return Err(login());
            }
            Err(e) => {
                e.log("session guard");
                return Err(flash::redirect_with(jar.clone(), "/login", e.notice()));
            }
        };

        if session.email != claims.sub {
            warn!(session_id = %session.id, "session token does not match session owner");
            return Err(login());
        }

        Ok(CurrentUser {
            session_id: session.id,
            email: session.email,
            username: session.username,
        })
    }
}
