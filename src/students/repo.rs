use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::db::retry_once;
use crate::error::{AppError, Result};
use crate::students::repo_types::{NewStudent, Student};

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// All active records, whoever created them.
    async fn list_active(&self) -> Result<Vec<Student>>;

    /// Insert an active record; a taken roll number yields `ConstraintViolation`.
    async fn insert(&self, student: &NewStudent) -> Result<()>;

    /// The record only if it is active and was created by `owner`.
    async fn find_owned_active(&self, roll_no: &str, owner: &str) -> Result<Option<Student>>;

    /// Returns the number of rows changed.
    async fn update_details(
        &self,
        roll_no: &str,
        owner: &str,
        name: &str,
        class: &str,
        at: OffsetDateTime,
    ) -> Result<u64>;

    /// Flip an owned active record to inactive. Returns the number of rows changed.
    async fn deactivate(&self, roll_no: &str, owner: &str, at: OffsetDateTime) -> Result<u64>;
}

#[derive(Clone)]
pub struct PgStudentStore {
    pub db: PgPool,
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn list_active(&self) -> Result<Vec<Student>> {
        let db = &self.db;
        let rows = retry_once("list students", move || {
            sqlx::query_as::<_, Student>(
                r#"
                SELECT roll_no, name, class, is_active, created_by, created_on,
                       updated_by, updated_on
                FROM students
                WHERE is_active = TRUE
                ORDER BY roll_no
                "#,
            )
            .fetch_all(db)
        })
        .await?;
        Ok(rows)
    }

    async fn insert(&self, student: &NewStudent) -> Result<()> {
        let db = &self.db;
        let res = retry_once("insert student", move || {
            sqlx::query(
                r#"
                INSERT INTO students (roll_no, name, class, created_by, created_on)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&student.roll_no)
            .bind(&student.name)
            .bind(&student.class)
            .bind(&student.created_by)
            .bind(student.created_on)
            .execute(db)
        })
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::ConstraintViolation(format!(
                    "Roll number {} already exists.",
                    student.roll_no
                )),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_owned_active(&self, roll_no: &str, owner: &str) -> Result<Option<Student>> {
        let db = &self.db;
        let row = retry_once("find student", move || {
            sqlx::query_as::<_, Student>(
                r#"
                SELECT roll_no, name, class, is_active, created_by, created_on,
                       updated_by, updated_on
                FROM students
                WHERE roll_no = $1 AND created_by = $2 AND is_active = TRUE
                "#,
            )
            .bind(roll_no)
            .bind(owner)
            .fetch_optional(db)
        })
        .await?;
        Ok(row)
    }

    async fn update_details(
        &self,
        roll_no: &str,
        owner: &str,
        name: &str,
        class: &str,
        at: OffsetDateTime,
    ) -> Result<u64> {
        let db = &self.db;
        let res = retry_once("update student", move || {
            sqlx::query(
                r#"
                UPDATE students
                SET name = $1, class = $2, updated_by = $3, updated_on = $4
                WHERE roll_no = $5 AND created_by = $3 AND is_active = TRUE
                "#,
            )
            .bind(name)
            .bind(class)
            .bind(owner)
            .bind(at)
            .bind(roll_no)
            .execute(db)
        })
        .await?;
        Ok(res.rows_affected())
    }

    async fn deactivate(&self, roll_no: &str, owner: &str, at: OffsetDateTime) -> Result<u64> {
        let db = &self.db;
        let res = retry_once("deactivate student", move || {
            sqlx::query(
                r#"
                UPDATE students
                SET is_active = FALSE, updated_by = $1, updated_on = $2
                WHERE roll_no = $3 AND created_by = $1 AND is_active = TRUE
                "#,
            )
            .bind(owner)
            .bind(at)
            .bind(roll_no)
            .execute(db)
        })
        .await?;
        Ok(res.rows_affected())
    }
}
