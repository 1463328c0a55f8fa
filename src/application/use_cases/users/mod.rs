pub mod change_password;
pub mod get_user;
pub mod request_verification_code;
pub mod update_profile;
