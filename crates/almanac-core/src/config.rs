use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono::Weekday;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::error::CalendarError;
use crate::grid::parse_week_start;

const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
const CONFIG_DIR_NAME: &str = "almanac";
const CONFIG_FILE_NAME: &str =
  "config.toml";

pub const MIN_CELL_WIDTH: u16 = 6;
pub const MIN_CELL_HEIGHT: u16 = 2;

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct CalendarConfig {
  #[serde(
    default = "default_week_start"
  )]
  pub week_start:   String,
  #[serde(default = "default_true")]
  pub color:        bool,
  #[serde(
    default = "default_marker_label"
  )]
  pub marker_label: String,
  #[serde(default)]
  pub cell:         CellConfig,
  #[serde(skip)]
  pub loaded_from:  Option<PathBuf>
}

/// Size of one day cell in terminal columns and rows. The first row holds
/// the day number; the rest hold events and the overflow marker.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct CellConfig {
  #[serde(
    default = "default_cell_width"
  )]
  pub width:  u16,
  #[serde(
    default = "default_cell_height"
  )]
  pub height: u16
}

fn default_true() -> bool {
  true
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_marker_label() -> String {
  "+{n} More".to_string()
}

fn default_cell_width() -> u16 {
  14
}

fn default_cell_height() -> u16 {
  5
}

impl Default for CellConfig {
  fn default() -> Self {
    Self {
      width:  default_cell_width(),
      height: default_cell_height()
    }
  }
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      week_start:   default_week_start(),
      color:        true,
      marker_label:
        default_marker_label(),
      cell:         CellConfig::default(),
      loaded_from:  None
    }
  }
}

impl CalendarConfig {
  /// Loads the first config found: `override_path`, then
  /// `$ALMANAC_CONFIG`, then `<config dir>/almanac/config.toml`. Falls
  /// back to defaults when none exists.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(override_path)
    else {
      debug!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg = Self::from_toml_str(
      &text
    )
    .with_context(|| {
      format!(
        "invalid config {}",
        path.display()
      )
    })?;
    cfg.loaded_from = Some(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    text: &str
  ) -> Result<Self, CalendarError> {
    let mut cfg =
      toml::from_str::<Self>(text)
        .map_err(|e| {
          CalendarError::Config(
            e.to_string()
          )
        })?;
    cfg.sanitize();
    Ok(cfg)
  }

  /// Replaces unusable values with defaults or minimums, with a warning.
  pub fn sanitize(&mut self) {
    if parse_week_start(
      &self.week_start
    )
    .is_none()
    {
      warn!(week_start = %self.week_start, "unknown week_start; using default");
      self.week_start =
        default_week_start();
    }

    if !self
      .marker_label
      .contains("{n}")
    {
      warn!(marker_label = %self.marker_label, "marker_label lacks {{n}}; using default");
      self.marker_label =
        default_marker_label();
    }

    if self.cell.width < MIN_CELL_WIDTH
    {
      self.cell.width = MIN_CELL_WIDTH;
    }
    if self.cell.height
      < MIN_CELL_HEIGHT
    {
      self.cell.height =
        MIN_CELL_HEIGHT;
    }
  }

  pub fn week_start_day(
    &self
  ) -> Weekday {
    parse_week_start(&self.week_start)
      .unwrap_or(Weekday::Sun)
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed == "/dev/null" {
      return None;
    }
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Some(candidate);
  }

  None
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use chrono::Weekday;

  use super::{
    CalendarConfig,
    MIN_CELL_HEIGHT,
    MIN_CELL_WIDTH
  };

  #[test]
  fn empty_file_gives_defaults() {
    let cfg =
      CalendarConfig::from_toml_str("")
        .expect("parse empty");
    assert_eq!(
      cfg,
      CalendarConfig::default()
    );
    assert_eq!(
      cfg.week_start_day(),
      Weekday::Sun
    );
  }

  #[test]
  fn sanitize_fixes_unusable_values() {
    let cfg =
      CalendarConfig::from_toml_str(
        r#"
        week_start = "someday"
        marker_label = "more"
        [cell]
        width = 1
        height = 0
        "#
      )
      .expect("parse");
    assert_eq!(cfg.week_start, "sunday");
    assert_eq!(
      cfg.marker_label,
      "+{n} More"
    );
    assert_eq!(
      cfg.cell.width,
      MIN_CELL_WIDTH
    );
    assert_eq!(
      cfg.cell.height,
      MIN_CELL_HEIGHT
    );
  }

  #[test]
  fn load_reads_explicit_path() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("tempfile");
    writeln!(
      file,
      "week_start = \"monday\"\ncolor = \
       false\n[cell]\nwidth = 20"
    )
    .expect("write config");

    let cfg = CalendarConfig::load(
      Some(file.path())
    )
    .expect("load");
    assert_eq!(
      cfg.week_start_day(),
      Weekday::Mon
    );
    assert!(!cfg.color);
    assert_eq!(cfg.cell.width, 20);
    assert_eq!(cfg.cell.height, 5);
    assert_eq!(
      cfg.loaded_from.as_deref(),
      Some(file.path())
    );
  }

  #[test]
  fn invalid_toml_is_a_config_error() {
    assert!(
      CalendarConfig::from_toml_str(
        "cell = 3"
      )
      .is_err()
    );
  }
}
