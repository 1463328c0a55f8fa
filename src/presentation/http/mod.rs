pub mod auth;
pub mod error;
pub mod forms;
pub mod health;
pub mod images;
pub mod users;
