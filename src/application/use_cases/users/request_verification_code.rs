use uuid::Uuid;

use crate::application::ports::code_notifier::CodeNotifier;
use crate::application::ports::user_repository::UserRepository;
use crate::application::ports::verification_code_repository::VerificationCodeRepository;
use crate::domain::auth::verification_code::{VerificationCode, generate_code};

pub struct RequestVerificationCode<'a, U, C, N>
where
    U: UserRepository + ?Sized,
    C: VerificationCodeRepository + ?Sized,
    N: CodeNotifier + ?Sized,
{
    pub users: &'a U,
    pub codes: &'a C,
    pub notifier: &'a N,
}

impl<'a, U, C, N> RequestVerificationCode<'a, U, C, N>
where
    U: UserRepository + ?Sized,
    C: VerificationCodeRepository + ?Sized,
    N: CodeNotifier + ?Sized,
{
    pub async fn execute(&self, user_id: Uuid) -> anyhow::Result<Option<VerificationCode>> {
        let Some(row) = self.users.find_by_id(user_id).await? else {
            return Ok(None);
        };
        let code = self.codes.create_code(user_id, &generate_code()).await?;
        self.notifier.send_code(&row.user, &code.code).await?;
        Ok(Some(code))
    }
}
