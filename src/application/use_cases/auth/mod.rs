pub mod authenticate;
pub mod logout;
pub mod refresh_token;
pub mod register;
pub mod tokens;
pub mod verify_access;
