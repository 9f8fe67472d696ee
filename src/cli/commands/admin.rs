use crate::config::Config;
use crate::domain::Role;
use crate::services::{NewAccount, UserError};
use crate::state::SharedState;

pub async fn cmd_create_admin(
    config: Config,
    email: String,
    name: String,
    password: String,
    address: String,
) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    let account = NewAccount {
        name,
        email,
        password,
        address,
        role: Role::Administrator,
    };

    match shared.user_service.create_user(account).await {
        Ok(user) => {
            println!("Created administrator {} (ID: {})", user.email, user.id);
            Ok(())
        }
        Err(UserError::Validation(msg) | UserError::Conflict(msg)) => {
            println!("Could not create administrator: {msg}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
