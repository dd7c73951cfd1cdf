use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fieldcare_core::constants::{FORWARD_REFERENCE_DEPTH_ENV, MAX_AGE_YEARS_ENV};
use fieldcare_core::store::{EntityStore, InMemoryStore};
use fieldcare_core::{CoreConfig, CoreError, apply_page};
use fieldcare_types::EntityType;
use fieldcare_wire::ResourcePage;

#[derive(Parser)]
#[command(name = "fieldcare-replay")]
#[command(about = "Replay recorded sync pages into an in-memory store")]
struct Cli {
    /// Bundle of pages: a JSON list of {"entityType": ..., "page": ...} in sync order
    bundle: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleEntry {
    entity_type: String,
    page: serde_json::Value,
}

/// Entry point for the replay tool
///
/// Applies each page of the bundle in order and logs how many records each entity type ended
/// up with. Stops at the first failing page.
///
/// # Environment Variables
/// - `FIELDCARE_MAX_AGE_YEARS`: oldest plausible age for registration checks (default: 120)
/// - `FIELDCARE_FORWARD_REFERENCE_DEPTH`: longest in-page reference chain followed (default: 16)
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fieldcare=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = CoreConfig::from_env_values(
        std::env::var(MAX_AGE_YEARS_ENV).ok(),
        std::env::var(FORWARD_REFERENCE_DEPTH_ENV).ok(),
    )?;

    let text = std::fs::read_to_string(&cli.bundle)
        .with_context(|| format!("failed to read bundle {}", cli.bundle.display()))?;
    let bundle: Vec<BundleEntry> =
        serde_json::from_str(&text).context("bundle is not a list of pages")?;

    tracing::info!("++ Replaying {} pages from {}", bundle.len(), cli.bundle.display());

    let mut store = InMemoryStore::new();
    let mut applied: BTreeMap<String, usize> = BTreeMap::new();
    for (index, entry) in bundle.into_iter().enumerate() {
        let entity_type: EntityType = entry
            .entity_type
            .parse()
            .with_context(|| format!("page {index}"))?;
        let page = ResourcePage::from_value(entry.page)
            .with_context(|| format!("page {index} ({entity_type})"))?;

        match apply_page(&mut store, entity_type, &page, &config) {
            Ok(summary) => {
                *applied.entry(entity_type.to_string()).or_default() += summary.applied;
            }
            Err(CoreError::Association(err)) => {
                tracing::error!(code = %err.code(), page = index, "{err}");
                return Err(err).with_context(|| format!("page {index} ({entity_type})"));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("page {index} ({entity_type})"));
            }
        }
    }

    for entity_type in EntityType::ALL {
        let held = store.count(entity_type);
        if held == 0 {
            continue;
        }
        let received = applied.get(entity_type.schema_name()).copied().unwrap_or(0);
        tracing::info!(
            entity_type = %entity_type,
            received,
            held,
            "replay summary"
        );
    }

    Ok(())
}
