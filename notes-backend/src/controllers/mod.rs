pub mod auth;
pub mod health;
pub mod notes;

#[cfg(test)]
pub(crate) mod test_support;
