pub mod jwt;
pub mod passwords;
pub mod uploads;
