//! In-memory account store for tests

use async_trait::async_trait;
use chrono::Utc;
use common::{StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::AccountStore;
use crate::models::{Account, NewStudent, ProfileChanges, StudentProfile};

#[derive(Debug, Clone)]
pub struct StoredStudent {
    pub profile: StudentProfile,
    pub srn: String,
    pub password: String,
}

/// Account store that counts every access and can simulate outages
#[derive(Default)]
pub struct MemoryAccountStore {
    students: Mutex<Vec<StoredStudent>>,
    accesses: AtomicUsize,
    writes_fail: AtomicBool,
    unavailable: AtomicBool,
}

fn outage() -> StoreError {
    StoreError::Connection(sqlx::Error::PoolTimedOut)
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row as-is, with `password` stored verbatim
    pub async fn insert(&self, name: &str, email: &str, password: &str) -> i64 {
        let mut students = self.students.lock().await;
        let id = students.len() as i64 + 1;
        students.push(StoredStudent {
            profile: StudentProfile {
                student_id: id,
                name: name.to_string(),
                email: email.to_string(),
                phone: "0000000000".to_string(),
                major: "Undeclared".to_string(),
                year: 1,
                gpa: 0.0,
                learning_style: "Mixed".to_string(),
                personality_type: "INTJ".to_string(),
                needs_help: false,
                can_teach: false,
                created_date: Utc::now(),
                last_active: None,
            },
            srn: format!("SRN{id}"),
            password: password.to_string(),
        });
        id
    }

    /// Raw password column of an account
    pub async fn password_of(&self, account_id: i64) -> Option<String> {
        self.students
            .lock()
            .await
            .iter()
            .find(|s| s.profile.student_id == account_id)
            .map(|s| s.password.clone())
    }

    pub async fn student(&self, account_id: i64) -> Option<StoredStudent> {
        self.students
            .lock()
            .await
            .iter()
            .find(|s| s.profile.student_id == account_id)
            .cloned()
    }

    /// Delete an account out from under any session that refers to it
    pub async fn remove(&self, account_id: i64) {
        self.students
            .lock()
            .await
            .retain(|s| s.profile.student_id != account_id);
    }

    /// Number of store calls made so far
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn enter(&self) -> StoreResult<()> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }

    fn enter_write(&self) -> StoreResult<()> {
        self.enter()?;
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.enter()?;
        Ok(self
            .students
            .lock()
            .await
            .iter()
            .find(|s| s.profile.email == email)
            .map(|s| {
                Account::from_stored(
                    s.profile.student_id,
                    s.profile.name.clone(),
                    s.profile.email.clone(),
                    s.password.clone(),
                )
            }))
    }

    async fn replace_legacy_credential(
        &self,
        account_id: i64,
        legacy: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        self.enter_write()?;
        let mut students = self.students.lock().await;
        match students
            .iter_mut()
            .find(|s| s.profile.student_id == account_id && s.password == legacy)
        {
            Some(student) => {
                student.password = replacement.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn email_or_srn_exists(&self, email: &str, srn: &str) -> StoreResult<bool> {
        self.enter()?;
        Ok(self
            .students
            .lock()
            .await
            .iter()
            .any(|s| s.profile.email == email || s.srn == srn))
    }

    async fn create(&self, student: &NewStudent, password_hash: &str) -> StoreResult<Option<i64>> {
        self.enter_write()?;
        let id = self.insert(&student.name, &student.email, password_hash).await;
        let mut students = self.students.lock().await;
        if let Some(stored) = students.iter_mut().find(|s| s.profile.student_id == id) {
            stored.srn = student.srn.clone();
            stored.profile.phone = student.phone.clone();
            stored.profile.major = student.major.clone();
            stored.profile.year = student.year;
            stored.profile.gpa = student.gpa;
            stored.profile.learning_style = student.learning_style.to_string();
            stored.profile.personality_type = student.personality_type.to_string();
        }
        Ok(Some(id))
    }

    async fn find_profile(&self, account_id: i64) -> StoreResult<Option<StudentProfile>> {
        self.enter()?;
        Ok(self.student(account_id).await.map(|s| s.profile))
    }

    async fn update_profile(&self, account_id: i64, changes: &ProfileChanges) -> StoreResult<bool> {
        if changes.is_empty() {
            return Ok(false);
        }
        self.enter_write()?;

        let mut students = self.students.lock().await;
        let Some(student) = students
            .iter_mut()
            .find(|s| s.profile.student_id == account_id)
        else {
            return Ok(false);
        };

        let profile = &mut student.profile;
        if let Some(name) = &changes.name {
            profile.name = name.clone();
        }
        if let Some(phone) = &changes.phone {
            profile.phone = phone.clone();
        }
        if let Some(major) = &changes.major {
            profile.major = major.clone();
        }
        if let Some(year) = changes.year {
            profile.year = year;
        }
        if let Some(gpa) = changes.gpa {
            profile.gpa = gpa;
        }
        if let Some(style) = changes.learning_style {
            profile.learning_style = style.to_string();
        }
        if let Some(kind) = changes.personality_type {
            profile.personality_type = kind.to_string();
        }
        if let Some(needs_help) = changes.needs_help {
            profile.needs_help = needs_help;
        }
        if let Some(can_teach) = changes.can_teach {
            profile.can_teach = can_teach;
        }
        Ok(true)
    }

    async fn ping(&self) -> StoreResult<bool> {
        Ok(!self.unavailable.load(Ordering::SeqCst))
    }
}
