//! PostgreSQL account repository

use async_trait::async_trait;
use common::StoreResult;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use super::AccountStore;
use crate::models::{Account, NewStudent, ProfileChanges, StudentProfile};

/// Account repository backed by the `students` table
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Build the UPDATE statement for a partial profile update
///
/// One bound `SET` clause per present field; `None` when nothing changes.
pub(crate) fn profile_update_query(
    account_id: i64,
    changes: &ProfileChanges,
) -> Option<QueryBuilder<'_, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::new("UPDATE students SET ");
    {
        let mut set = builder.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.as_str());
        }
        if let Some(phone) = &changes.phone {
            set.push("phone = ").push_bind_unseparated(phone.as_str());
        }
        if let Some(major) = &changes.major {
            set.push("major = ").push_bind_unseparated(major.as_str());
        }
        if let Some(year) = changes.year {
            set.push("year = ").push_bind_unseparated(year);
        }
        if let Some(gpa) = changes.gpa {
            set.push("gpa = ").push_bind_unseparated(gpa);
        }
        if let Some(style) = changes.learning_style {
            set.push("learning_style = ")
                .push_bind_unseparated(style.as_str());
        }
        if let Some(kind) = changes.personality_type {
            set.push("personality_type = ")
                .push_bind_unseparated(kind.as_str());
        }
        if let Some(needs_help) = changes.needs_help {
            set.push("needs_help = ").push_bind_unseparated(needs_help);
        }
        if let Some(can_teach) = changes.can_teach {
            set.push("can_teach = ").push_bind_unseparated(can_teach);
        }
    }
    builder.push(" WHERE student_id = ");
    builder.push_bind(account_id);

    Some(builder)
}

#[async_trait]
impl AccountStore for PgAccountRepository {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        debug!("Finding account by email: {}", email);

        let row = sqlx::query(
            r#"
            SELECT student_id, name, email, password
            FROM students
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            Account::from_stored(
                row.get("student_id"),
                row.get("name"),
                row.get("email"),
                row.get("password"),
            )
        }))
    }

    async fn replace_legacy_credential(
        &self,
        account_id: i64,
        legacy: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        // Conditioned on the value we verified, so a concurrent change wins.
        let result = sqlx::query(
            r#"
            UPDATE students
            SET password = $1
            WHERE student_id = $2 AND password = $3
            "#,
        )
        .bind(replacement)
        .bind(account_id)
        .bind(legacy)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn email_or_srn_exists(&self, email: &str, srn: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM students WHERE email = $1 OR enrollment_id = $2
            )
            "#,
        )
        .bind(email)
        .bind(srn)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, student: &NewStudent, password_hash: &str) -> StoreResult<Option<i64>> {
        info!("Creating student account: {}", student.email);

        let result = sqlx::query(
            r#"
            INSERT INTO students (name, email, enrollment_id, phone, password, major, year, gpa,
                                  learning_style, personality_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING student_id
            "#,
        )
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.srn)
        .bind(&student.phone)
        .bind(password_hash)
        .bind(&student.major)
        .bind(student.year)
        .bind(student.gpa)
        .bind(student.learning_style.as_str())
        .bind(student.personality_type.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(Some(row.get("student_id"))),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_profile(&self, account_id: i64) -> StoreResult<Option<StudentProfile>> {
        let profile = sqlx::query_as::<_, StudentProfile>(
            r#"
            SELECT student_id, name, email, phone, major, year, gpa, learning_style,
                   personality_type, needs_help, can_teach, created_date, last_active
            FROM students
            WHERE student_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_profile(&self, account_id: i64, changes: &ProfileChanges) -> StoreResult<bool> {
        let Some(mut query) = profile_update_query(account_id, changes) else {
            return Ok(false);
        };

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<bool> {
        common::database::health_check(&self.pool).await
    }
}
