use axum::{
    extract::{FromRef, State},
    response::{Html, Redirect},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        extractors::CurrentUser,
        services,
        session::{removal_cookie, SessionKeys},
    },
    flash,
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/signup") }))
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/welcome", get(welcome))
        .route("/logout", get(logout))
}

pub async fn signup_page(jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, notice) = flash::take(jar);
    (jar, views::signup(notice.as_deref()))
}

#[instrument(skip(state, jar, form), fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> (CookieJar, Redirect) {
    match services::register(&state, &form).await {
        Ok(()) => flash::redirect_with(jar, "/login", "Signup successful. Please log in."),
        Err(e) => {
            e.log("signup");
            flash::redirect_with(jar, "/signup", e.notice())
        }
    }
}

pub async fn login_page(jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, notice) = flash::take(jar);
    (jar, views::login(notice.as_deref()))
}

#[instrument(skip(state, jar, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> (CookieJar, Redirect) {
    let started = match services::authenticate(&state, &form.email, &form.password).await {
        Ok(user) => services::start_session(&state, &user).await,
        Err(e) => Err(e),
    };
    match started {
        Ok((_, token)) => {
            let keys = SessionKeys::from_ref(&state);
            (jar.add(keys.cookie(token)), Redirect::to("/welcome"))
        }
        Err(e) => {
            e.log("login");
            flash::redirect_with(jar, "/login", e.notice())
        }
    }
}

pub async fn welcome(user: CurrentUser, jar: CookieJar) -> (CookieJar, Html<String>) {
    let (jar, notice) = flash::take(jar);
    (jar, views::welcome(&user.username, notice.as_deref()))
}

#[instrument(skip(state, jar, user), fields(email = %user.email))]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Err(e) = services::end_session(&state, user.session_id).await {
        e.log("logout");
    }
    let jar = jar.remove(removal_cookie());
    flash::redirect_with(jar, "/login", "Logged out successfully.")
}
