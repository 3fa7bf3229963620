use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::SessionConfig, state::AppState};

pub const SESSION_COOKIE: &str = "session";

/// Payload of the signed session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sid: Uuid,   // server-side session id
    pub sub: String, // user email
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
}

/// Signs and verifies session cookies.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(&state.config.session)
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn expires_at(&self, now: OffsetDateTime) -> OffsetDateTime {
        now + TimeDuration::seconds(self.ttl.as_secs() as i64)
    }

    pub fn sign(&self, session_id: Uuid, email: &str, now: OffsetDateTime) -> anyhow::Result<String> {
        let claims = Claims {
            sid: session_id,
            sub: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: self.expires_at(now).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(session_id = %session_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(TimeDuration::seconds(self.ttl.as_secs() as i64))
            .build()
    }
}

/// Cookie value that expires the session cookie on the client.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str, issuer: &str, audience: &str) -> SessionKeys {
        SessionKeys::new(&SessionConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = keys("dev-secret", "iss", "aud");
        let sid = Uuid::new_v4();
        let token = keys
            .sign(sid, "a@x.com", OffsetDateTime::now_utc())
            .expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.iss, "iss");
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = keys("secret-a", "iss", "aud");
        let bad = keys("secret-b", "iss", "aud");
        let token = good
            .sign(Uuid::new_v4(), "a@x.com", OffsetDateTime::now_utc())
            .unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_audience() {
        let good = keys("same", "iss", "aud");
        let bad = keys("same", "iss", "other-aud");
        let token = good
            .sign(Uuid::new_v4(), "a@x.com", OffsetDateTime::now_utc())
            .unwrap();
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys.sign(Uuid::new_v4(), "a@x.com", issued).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn cookie_is_http_only_and_site_wide() {
        let cookie = keys("s", "i", "a").cookie("tok".into());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
