use async_trait::async_trait;

use crate::application::ports::code_notifier::CodeNotifier;
use crate::domain::users::user::User;

/// Writes issued verification codes to the log. Stands in until a mail transport is wired up.
#[derive(Debug, Default, Clone)]
pub struct LogCodeNotifier;

#[async_trait]
impl CodeNotifier for LogCodeNotifier {
    async fn send_code(&self, user: &User, code: &str) -> anyhow::Result<()> {
        tracing::info!(
            user_id = %user.id,
            email = %user.email,
            code,
            "verification_code_issued"
        );
        Ok(())
    }
}
