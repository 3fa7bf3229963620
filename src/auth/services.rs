use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::SignupForm,
        password::{hash_password, verify_password},
        repo_types::{Session, User},
        session::SessionKeys,
    },
    error::{AppError, Result},
    mail::WelcomeEmail,
    state::AppState,
};

/// Creates the user and queues the welcome email. Mail problems never fail
/// the registration.
pub async fn register(state: &AppState, form: &SignupForm) -> Result<()> {
    if form.password != form.cpassword {
        return Err(AppError::Validation("Passwords do not match.".into()));
    }

    let hash = hash_password(&form.password)?;
    state
        .users
        .create(&form.username, &form.email, &hash)
        .await?;
    info!(email = %form.email, "user registered");

    state.mail.enqueue(WelcomeEmail {
        to: form.email.clone(),
        username: form.username.clone(),
    });
    Ok(())
}

/// Unknown email and wrong password both end in `InvalidCredentials`.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User> {
    let Some(user) = state.users.find_by_email(email).await? else {
        warn!(email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

/// Stores a session for `user` and returns the signed cookie token. Sessions
/// left behind by expiry are pruned first.
pub async fn start_session(state: &AppState, user: &User) -> Result<(Session, String)> {
    let keys = SessionKeys::from_ref(state);
    let now = OffsetDateTime::now_utc();
    match state.sessions.delete_expired(now).await {
        Ok(0) => {}
        Ok(pruned) => info!(pruned, "expired sessions removed"),
        Err(e) => warn!(error = %e, "expired session cleanup failed"),
    }
    let session = Session {
        id: Uuid::new_v4(),
        email: user.email.clone(),
        username: user.username.clone(),
        created_at: now,
        expires_at: keys.expires_at(now),
    };
    state.sessions.insert(&session).await?;
    let token = keys.sign(session.id, &session.email, now)?;
    info!(email = %user.email, session_id = %session.id, "session started");
    Ok((session, token))
}

pub async fn end_session(state: &AppState, session_id: Uuid) -> Result<()> {
    state.sessions.delete(session_id).await?;
    info!(session_id = %session_id, "session ended");
    Ok(())
}
