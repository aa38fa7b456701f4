use anyhow::Result;

use lodgesync_cli::db::{Pool, SqliteStore};
use lodgesync_cli::render::Render;

pub async fn run(pool: Pool, apartment: Option<i64>) -> Result<()> {
    let store = SqliteStore::new(pool);
    let reservations = store.pending_reservations(apartment).await?;

    if reservations.is_empty() {
        println!("Nothing awaiting review.");
        return Ok(());
    }

    for reservation in reservations {
        println!("{}", reservation.render());
    }

    Ok(())
}
