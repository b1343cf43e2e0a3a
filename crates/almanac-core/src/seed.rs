//! Read-only seed files: a TOML list of `[[events]]` loaded into a fresh
//! in-memory store at startup. Nothing is ever written back.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::event::SeedEvent;

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    events: Vec<SeedEvent>,
}

#[tracing::instrument]
pub fn load_seed(path: &Path) -> anyhow::Result<Vec<SeedEvent>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let events = parse_seed(&text).with_context(|| format!("invalid seed file {}", path.display()))?;
    info!(count = events.len(), "loaded seed events");
    Ok(events)
}

pub fn parse_seed(text: &str) -> anyhow::Result<Vec<SeedEvent>> {
    let seed: SeedFile = toml::from_str(text)?;
    Ok(seed.events)
}
