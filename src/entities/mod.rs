pub mod prelude;

pub mod auth_tokens;
pub mod ratings;
pub mod stores;
pub mod users;
