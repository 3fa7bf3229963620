use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, Result},
    state::AppState,
    students::{
        dto::EditOutcome,
        repo_types::{NewStudent, Student},
    },
};

pub async fn list_students(state: &AppState) -> Result<Vec<Student>> {
    state.students.list_active().await
}

pub async fn add_student(
    state: &AppState,
    caller: &CurrentUser,
    roll_no: &str,
    name: &str,
    class: &str,
) -> Result<()> {
    let student = NewStudent {
        roll_no: roll_no.to_string(),
        name: name.to_string(),
        class: class.to_string(),
        created_by: caller.email.clone(),
        created_on: OffsetDateTime::now_utc(),
    };
    state.students.insert(&student).await?;
    info!(roll_no, created_by = %caller.email, "student added");
    Ok(())
}

/// Only the creator can edit, and only while the record is active. Anything
/// else is reported as `NotFound` without saying which check failed.
pub async fn edit_student(
    state: &AppState,
    caller: &CurrentUser,
    roll_no: &str,
    new_name: &str,
    new_class: &str,
) -> Result<EditOutcome> {
    let current = state
        .students
        .find_owned_active(roll_no, &caller.email)
        .await?
        .ok_or(AppError::NotFound)?;

    if current.name == new_name && current.class == new_class {
        debug!(roll_no, "edit without changes");
        return Ok(EditOutcome::Unchanged);
    }

    let changed = state
        .students
        .update_details(
            roll_no,
            &caller.email,
            new_name,
            new_class,
            OffsetDateTime::now_utc(),
        )
        .await?;
    if changed == 0 {
        // deleted between the lookup and the update
        return Err(AppError::NotFound);
    }
    info!(roll_no, updated_by = %caller.email, "student updated");
    Ok(EditOutcome::Updated)
}

/// Soft delete. A roll that is missing or not the caller's is a silent no-op.
pub async fn delete_student(state: &AppState, caller: &CurrentUser, roll_no: &str) -> Result<()> {
    let changed = state
        .students
        .deactivate(roll_no, &caller.email, OffsetDateTime::now_utc())
        .await?;
    debug!(roll_no, changed, "student deactivate");
    Ok(())
}
