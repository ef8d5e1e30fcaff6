//! Database repository for email verification codes.
//!
//! Each email holds at most one code. Issuing a new code overwrites the old one, and a code is
//! consumed by deleting it once registration succeeds.

use chrono::Utc;
use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    auth::password,
    db::{errors::Result, models::verification_codes::VerificationCode},
};

const CODE_COLUMNS: &str = "id, email, code, expiry_date";

pub struct VerificationCodes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> VerificationCodes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Generate a fresh code for an email, valid for `ttl`
    #[instrument(skip(self, email), err)]
    pub async fn issue_for_email(&mut self, email: &str, ttl: std::time::Duration) -> Result<VerificationCode> {
        let expiry_date = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::minutes(10));

        let code = sqlx::query_as::<_, VerificationCode>(&format!(
            r#"
            INSERT INTO verification_codes (email, code, expiry_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET code = EXCLUDED.code, expiry_date = EXCLUDED.expiry_date
            RETURNING {CODE_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password::generate_verification_code())
        .bind(expiry_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(code)
    }

    /// Look up the stored code for an email, expired or not
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<VerificationCode>> {
        let code = sqlx::query_as::<_, VerificationCode>(&format!("SELECT {CODE_COLUMNS} FROM verification_codes WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(code)
    }

    /// True when the email has an unexpired code equal to `code`
    #[instrument(skip(self, email, code), err)]
    pub async fn verify(&mut self, email: &str, code: &str) -> Result<bool> {
        Ok(self
            .get_by_email(email)
            .await?
            .is_some_and(|stored| stored.code == code.trim() && !stored.is_expired()))
    }

    #[instrument(skip(self, email), err)]
    pub async fn delete_for_email(&mut self, email: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(email)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
