pub mod role;
pub mod token;
pub mod verification_code;
