pub mod bucket;
pub mod cli;
pub mod commands;
pub mod config;
pub mod draft;
pub mod error;
pub mod event;
pub mod format;
pub mod grid;
pub mod layout;
pub mod observer;
pub mod render;
pub mod seed;
pub mod sort;
pub mod store;
pub mod view;
pub mod viewport;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );

  let cfg = config::CalendarConfig::load(
    cli.config.as_deref()
  )
  .context("failed to load config")?;
  debug!(?cfg, "resolved config");

  let mut store =
    store::EventStore::new();
  if let Some(path) =
    cli.events.as_deref()
  {
    let seed = seed::load_seed(path)
      .with_context(|| {
        format!(
          "failed to load events from \
           {}",
          path.display()
        )
      })?;
    let added = store
      .extend(seed)
      .with_context(|| {
        format!(
          "failed to seed events from \
           {}",
          path.display()
        )
      })?;
    debug!(added, "seeded event store");
  }

  let renderer =
    render::TextRenderer::new(&cfg);
  let today = cli.today.unwrap_or_else(
    || Local::now().date_naive()
  );

  let session = commands::Session {
    cfg: &cfg,
    renderer: &renderer,
    today,
    columns: cli.width.or_else(
      commands::terminal_columns
    )
  };

  commands::dispatch(
    &mut store,
    &session,
    cli.command.unwrap_or_default()
  )?;

  info!("done");
  Ok(())
}
