pub mod auth;
pub mod images;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
