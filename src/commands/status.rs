use anyhow::Result;

use lodgesync_cli::db::{Pool, SqliteStore};
use lodgesync_cli::render::Render;

pub async fn run(pool: Pool, limit: i64) -> Result<()> {
    let store = SqliteStore::new(pool);
    let entries = store.recent_log(limit).await?;

    if entries.is_empty() {
        println!("No syncs recorded yet. Run: lodgesync sync");
        return Ok(());
    }

    for entry in entries {
        println!("{}", entry.render());
    }

    Ok(())
}
