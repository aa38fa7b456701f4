use anyhow::Result;
use owo_colors::OwoColorize;

use lodgesync_cli::config::Config;
use lodgesync_cli::db::{Pool, SqliteStore};
use lodgesync_cli::fetch::HttpFeedSource;
use lodgesync_cli::render::Render;
use lodgesync_core::sync::{sync_all, ApartmentFeed};

pub async fn run(pool: Pool, cfg: &Config, only: Option<i64>) -> Result<()> {
    let selected: Vec<_> = cfg
        .apartments
        .iter()
        .filter(|a| only.is_none() || only == Some(a.id))
        .collect();

    if selected.is_empty() {
        let available: Vec<String> = cfg.apartments.iter().map(|a| a.id.to_string()).collect();
        anyhow::bail!(
            "Apartment '{}' not found. Available: {}",
            only.unwrap_or_default(),
            available.join(", ")
        );
    }

    let store = SqliteStore::new(pool);
    let source = HttpFeedSource::new(cfg.fetch.timeout_secs);
    let feeds: Vec<ApartmentFeed> = selected
        .iter()
        .map(|a| ApartmentFeed {
            apartment_id: a.id,
            feed_url: a.feed_url.clone(),
        })
        .collect();

    let outcomes = sync_all(&store, &source, &feeds).await;

    for (i, outcome) in outcomes.iter().enumerate() {
        println!("🏠 {}", selected[i].name);
        println!("   {}", outcome.render());
        if i < outcomes.len() - 1 {
            println!();
        }
    }

    let mut added = 0;
    let mut removed = 0;
    let mut modified = 0;
    for outcome in &outcomes {
        if let Some(delta) = &outcome.delta {
            let (a, r, m) = delta.counts();
            added += a;
            removed += r;
            modified += m;
        }
    }
    if added > 0 || removed > 0 || modified > 0 {
        println!(
            "\nSynced: {} added, {} modified, {} removed",
            added, modified, removed
        );
    }

    let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failures > 0 {
        println!("{}", format!("{} apartment(s) failed to sync", failures).red());
    }

    Ok(())
}
