use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::event::{EventColor, EventId, WallTime};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: month-view calendar for the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file (defaults to $ALMANAC_CONFIG, then the user config dir).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// TOML file of `[[events]]` to seed the session with.
    #[arg(long = "events", global = true)]
    pub events: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD).
    #[arg(long = "today", global = true)]
    pub today: Option<NaiveDate>,

    /// Fit the grid into this many columns (defaults to the terminal width).
    #[arg(long = "width", global = true)]
    pub width: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Draw the month grid.
    Month(MonthArgs),
    /// List every event of one day in display order.
    Day(DayArgs),
    /// Validate and add an event to the session, then show its day.
    Add(AddArgs),
    /// Change fields of an existing event, then show its day.
    Edit(EditArgs),
    /// Remove an event, then show the day it was on.
    Delete(DeleteArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Month(MonthArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct MonthArgs {
    /// Any date inside the month to show.
    #[arg(long = "date")]
    pub date: Option<NaiveDate>,

    /// Months to step from that date; negative goes back.
    #[arg(long = "offset", default_value_t = 0, allow_hyphen_values = true)]
    pub offset: i32,

    /// Print the laid-out month as JSON instead of a grid.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DayArgs {
    pub date: NaiveDate,

    /// Print each event's id next to it.
    #[arg(long = "ids")]
    pub ids: bool,
}

/// Which event a command acts on: its id, or its position in a day's list.
#[derive(Args, Debug, Clone, Default)]
pub struct EventLocator {
    #[arg(
        long = "id",
        conflicts_with_all = ["on", "index"],
        required_unless_present = "on"
    )]
    pub id: Option<EventId>,

    /// Day holding the event; pair with --index.
    #[arg(long = "on", requires = "index")]
    pub on: Option<NaiveDate>,

    /// 1-based position in that day's list, as `day` prints it.
    #[arg(long = "index", requires = "on")]
    pub index: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long = "date")]
    pub date: NaiveDate,

    #[arg(long = "name")]
    pub name: String,

    #[arg(long = "all-day", conflicts_with_all = ["start", "end"])]
    pub all_day: bool,

    #[arg(long = "start")]
    pub start: Option<WallTime>,

    #[arg(long = "end")]
    pub end: Option<WallTime>,

    #[arg(long = "color", value_enum, default_value_t = EventColor::Red)]
    pub color: EventColor,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: EventLocator,

    #[arg(long = "name")]
    pub name: Option<String>,

    /// Move the event to this day.
    #[arg(long = "date")]
    pub date: Option<NaiveDate>,

    /// Make the event all-day, dropping its times.
    #[arg(long = "all-day", conflicts_with_all = ["start", "end"])]
    pub all_day: bool,

    /// New start time; an all-day event becomes timed and needs --end too.
    #[arg(long = "start")]
    pub start: Option<WallTime>,

    #[arg(long = "end")]
    pub end: Option<WallTime>,

    #[arg(long = "color", value_enum)]
    pub color: Option<EventColor>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub target: EventLocator,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Command, GlobalCli};
    use crate::event::EventColor;

    #[test]
    fn no_subcommand_means_month() {
        let cli = GlobalCli::parse_from(["almanac", "--today", "2026-10-19"]);
        assert!(cli.command.is_none());
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Command::Month(args) if args.date.is_none() && !args.json
        ));
    }

    #[test]
    fn month_offset_accepts_negative_values() {
        let cli = GlobalCli::parse_from(["almanac", "month", "--offset", "-2"]);
        let Some(Command::Month(args)) = cli.command else {
            panic!("expected month command");
        };
        assert_eq!(args.offset, -2);
    }

    #[test]
    fn edit_addresses_event_by_day_and_index() {
        let cli = GlobalCli::parse_from([
            "almanac", "edit", "--on", "2026-10-05", "--index", "2", "--name", "Retro",
            "--date", "2026-10-06",
        ]);
        let Some(Command::Edit(args)) = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(args.target.index, Some(2));
        assert!(args.target.id.is_none());
        assert_eq!(args.name.as_deref(), Some("Retro"));
        assert_eq!(args.date.map(|d| d.to_string()).as_deref(), Some("2026-10-06"));
        assert!(args.color.is_none());
    }

    #[test]
    fn delete_takes_an_id() {
        let cli = GlobalCli::parse_from([
            "almanac", "delete", "--id", "7d0f2c1e-5b7a-4c1e-9a63-2f1c0d9e8b11",
        ]);
        let Some(Command::Delete(args)) = cli.command else {
            panic!("expected delete command");
        };
        assert_eq!(
            args.target.id.map(|id| id.to_string()).as_deref(),
            Some("7d0f2c1e-5b7a-4c1e-9a63-2f1c0d9e8b11")
        );
    }

    #[test]
    fn locator_needs_id_or_day_with_index() {
        assert!(GlobalCli::try_parse_from(["almanac", "delete"]).is_err());
        assert!(GlobalCli::try_parse_from(["almanac", "delete", "--on", "2026-10-05"]).is_err());
        assert!(
            GlobalCli::try_parse_from([
                "almanac", "delete", "--id", "7d0f2c1e-5b7a-4c1e-9a63-2f1c0d9e8b11", "--on",
                "2026-10-05", "--index", "1",
            ])
            .is_err()
        );
        assert!(GlobalCli::try_parse_from(["almanac", "delete", "--id", "nope"]).is_err());
    }

    #[test]
    fn parses_timed_add() {
        let cli = GlobalCli::parse_from([
            "almanac", "add", "--date", "2026-10-05", "--name", "Standup", "--start", "09:00",
            "--end", "09:15", "--color", "blue", "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Some(Command::Add(args)) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(args.color, EventColor::Blue);
        assert_eq!(args.start.map(|t| t.to_string()).as_deref(), Some("09:00"));
        assert!(!args.all_day);
    }

    #[test]
    fn all_day_conflicts_with_times() {
        let result = GlobalCli::try_parse_from([
            "almanac", "add", "--date", "2026-10-05", "--name", "x", "--all-day", "--start",
            "09:00",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_time() {
        let result = GlobalCli::try_parse_from([
            "almanac", "add", "--date", "2026-10-05", "--name", "x", "--start", "9am", "--end",
            "10:00",
        ]);
        assert!(result.is_err());
    }
}
