pub mod rating;
pub mod store;
pub mod token;
pub mod user;
