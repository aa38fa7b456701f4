use anyhow::Result;

use lodgesync_cli::db::{Pool, SqliteStore};
use lodgesync_cli::render::Render;

pub async fn run(pool: Pool, unread_only: bool) -> Result<()> {
    let store = SqliteStore::new(pool);
    let alerts = store.alerts(unread_only).await?;

    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(());
    }

    for alert in alerts {
        println!("{}", alert.render());
    }

    Ok(())
}
