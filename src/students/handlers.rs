use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    flash,
    state::AppState,
    students::{
        dto::{AddStudentForm, EditOutcome, EditStudentForm},
        services,
    },
    views,
};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/add_student", post(add_student))
        .route("/edit_student/:roll_no", post(edit_student))
        .route("/delete_student/:roll_no", get(delete_student))
}

#[instrument(skip(state, jar, user), fields(email = %user.email))]
pub async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Response {
    match services::list_students(&state).await {
        Ok(students) => {
            let (jar, notice) = flash::take(jar);
            let page: Html<String> = views::dashboard(&user.username, &students, notice.as_deref());
            (jar, page).into_response()
        }
        Err(e) => {
            e.log("dashboard");
            flash::redirect_with(jar, "/welcome", e.notice()).into_response()
        }
    }
}

#[instrument(skip(state, jar, user, form), fields(email = %user.email, roll_no = %form.roll_no))]
pub async fn add_student(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Form(form): Form<AddStudentForm>,
) -> (CookieJar, Redirect) {
    match services::add_student(&state, &user, &form.roll_no, &form.name, &form.student_class).await
    {
        Ok(()) => flash::redirect_with(jar, "/dashboard", "Student added successfully."),
        Err(e) => {
            e.log("add_student");
            flash::redirect_with(jar, "/dashboard", e.notice())
        }
    }
}

#[instrument(skip(state, jar, user, form), fields(email = %user.email))]
pub async fn edit_student(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Path(roll_no): Path<String>,
    Form(form): Form<EditStudentForm>,
) -> (CookieJar, Redirect) {
    match services::edit_student(&state, &user, &roll_no, &form.name, &form.student_class).await {
        Ok(EditOutcome::Updated) => {
            flash::redirect_with(jar, "/dashboard", "Student record updated.")
        }
        Ok(EditOutcome::Unchanged) => {
            flash::redirect_with(jar, "/dashboard", "No changes detected.")
        }
        Err(e) => {
            e.log("edit_student");
            flash::redirect_with(jar, "/dashboard", e.notice())
        }
    }
}

#[instrument(skip(state, jar, user), fields(email = %user.email))]
pub async fn delete_student(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Path(roll_no): Path<String>,
) -> (CookieJar, Redirect) {
    match services::delete_student(&state, &user, &roll_no).await {
        Ok(()) => flash::redirect_with(jar, "/dashboard", "Student deleted successfully."),
        Err(e) => {
            e.log("delete_student");
            flash::redirect_with(jar, "/dashboard", e.notice())
        }
    }
}
