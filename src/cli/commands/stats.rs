use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_stats(config: Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;
    let stats = shared.user_service.dashboard_stats().await?;

    println!("Rateboard");
    println!("{:-<30}", "");
    println!("{:<16} {}", "Users:", stats.total_users);
    println!("{:<16} {}", "Stores:", stats.total_stores);
    println!("{:<16} {}", "Ratings:", stats.total_ratings);

    Ok(())
}
