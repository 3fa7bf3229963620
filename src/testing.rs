//! In-memory stores and mailers backing `AppState::fake()`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    auth::{
        extractors::CurrentUser,
        repo::{SessionStore, UserStore},
        repo_types::{Session, User},
    },
    error::{AppError, Result},
    mail::{Mailer, WelcomeEmail},
    students::{
        repo::StudentStore,
        repo_types::{NewStudent, Student},
    },
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, User>>,
    sessions: Mutex<HashMap<Uuid, Session>>,
    students: Mutex<Vec<Student>>,
    sessions_down: AtomicBool,
    students_down: AtomicBool,
}

impl MemoryStore {
    /// Makes every session call fail as if the database were unreachable.
    pub fn set_sessions_unavailable(&self, down: bool) {
        self.sessions_down.store(down, Ordering::SeqCst);
    }

    /// Makes every student call fail as if the database were unreachable.
    pub fn set_students_unavailable(&self, down: bool) {
        self.students_down.store(down, Ordering::SeqCst);
    }

    /// Raw row lookup, inactive records included.
    pub fn student(&self, roll_no: &str) -> Option<Student> {
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.roll_no == roll_no)
            .cloned()
    }

    fn check(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, username: &str, email: &str, password_hash: &str) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(AppError::DuplicateIdentity);
        }
        users.insert(
            email.to_string(),
            User {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        Self::check(&self.sessions_down)?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Session>> {
        Self::check(&self.sessions_down)?;
        Ok(self.sessions.lock().unwrap().get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        Self::check(&self.sessions_down)?;
        self.sessions.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> Result<u64> {
        Self::check(&self.sessions_down)?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn list_active(&self) -> Result<Vec<Student>> {
        Self::check(&self.students_down)?;
        let mut rows: Vec<Student> = self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
        Ok(rows)
    }

    async fn insert(&self, student: &NewStudent) -> Result<()> {
        Self::check(&self.students_down)?;
        let mut rows = self.students.lock().unwrap();
        if rows.iter().any(|s| s.roll_no == student.roll_no) {
            return Err(AppError::ConstraintViolation(format!(
                "Roll number {} already exists.",
                student.roll_no
            )));
        }
        rows.push(Student {
            roll_no: student.roll_no.clone(),
            name: student.name.clone(),
            class: student.class.clone(),
            is_active: true,
            created_by: student.created_by.clone(),
            created_on: student.created_on,
            updated_by: None,
            updated_on: None,
        });
        Ok(())
    }

    async fn find_owned_active(&self, roll_no: &str, owner: &str) -> Result<Option<Student>> {
        Self::check(&self.students_down)?;
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.roll_no == roll_no && s.created_by == owner && s.is_active)
            .cloned())
    }

    async fn update_details(
        &self,
        roll_no: &str,
        owner: &str,
        name: &str,
        class: &str,
        at: OffsetDateTime,
    ) -> Result<u64> {
        Self::check(&self.students_down)?;
        let mut rows = self.students.lock().unwrap();
        let mut changed = 0;
        for s in rows
            .iter_mut()
            .filter(|s| s.roll_no == roll_no && s.created_by == owner && s.is_active)
        {
            s.name = name.to_string();
            s.class = class.to_string();
            s.updated_by = Some(owner.to_string());
            s.updated_on = Some(at);
            changed += 1;
        }
        Ok(changed)
    }

    async fn deactivate(&self, roll_no: &str, owner: &str, at: OffsetDateTime) -> Result<u64> {
        Self::check(&self.students_down)?;
        let mut rows = self.students.lock().unwrap();
        let mut changed = 0;
        for s in rows
            .iter_mut()
            .filter(|s| s.roll_no == roll_no && s.created_by == owner && s.is_active)
        {
            s.is_active = false;
            s.updated_by = Some(owner.to_string());
            s.updated_on = Some(at);
            changed += 1;
        }
        Ok(changed)
    }
}

/// Forwards every delivered email to the returned receiver.
pub struct RecordingMailer {
    tx: mpsc::UnboundedSender<WelcomeEmail>,
}

impl RecordingMailer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WelcomeEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> anyhow::Result<()> {
        let _ = self.tx.send(mail.clone());
        Ok(())
    }
}

/// Reports each attempt, then fails it.
pub struct FailingMailer {
    tx: mpsc::UnboundedSender<WelcomeEmail>,
}

impl FailingMailer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WelcomeEmail>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> anyhow::Result<()> {
        let _ = self.tx.send(mail.clone());
        anyhow::bail!("smtp connection refused")
    }
}

pub fn caller(username: &str, email: &str) -> CurrentUser {
    CurrentUser {
        session_id: Uuid::new_v4(),
        email: email.to_string(),
        username: username.to_string(),
    }
}
