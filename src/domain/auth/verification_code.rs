use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

pub const CODE_LENGTH: usize = 6;
/// Wrong guesses after which a code is burned.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub failed_attempts: i32,
}

impl VerificationCode {
    /// A code stays valid while its age does not exceed `ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.created_at) > ttl
    }

    pub fn is_exhausted(&self) -> bool {
        self.failed_attempts >= MAX_FAILED_ATTEMPTS
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.consumed_at.is_none() && !self.is_exhausted() && self.code == candidate.trim()
    }
}

pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:0width$}", width = CODE_LENGTH)
}
