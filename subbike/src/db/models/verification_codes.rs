//! Database models for email verification codes.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::VerificationCodeId;

/// Database entity model
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: VerificationCodeId,
    pub email: String,
    pub code: String,
    pub expiry_date: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expiry_date
    }
}
