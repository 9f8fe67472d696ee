mod admin;
mod stats;
mod users;

pub use admin::cmd_create_admin;
pub use stats::cmd_stats;
pub use users::cmd_list_users;
