use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::bucket::bucket;
use crate::cli::{AddArgs, Command, DayArgs, DeleteArgs, EditArgs, EventLocator, MonthArgs};
use crate::config::CalendarConfig;
use crate::draft::EventDraft;
use crate::error::CalendarError;
use crate::event::{Event, EventId};
use crate::grid::add_months;
use crate::render::{TextRenderer, grid_extent};
use crate::sort::sorted;
use crate::store::EventStore;
use crate::view::MonthView;
use crate::viewport::{Extent, Viewport};

/// What every command needs besides the store.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    pub cfg: &'a CalendarConfig,
    pub renderer: &'a TextRenderer,
    pub today: NaiveDate,
    /// Columns the grid has to fit in, if known.
    pub columns: Option<u16>,
}

#[tracing::instrument(skip(store, session))]
pub fn dispatch(store: &mut EventStore, session: &Session<'_>, command: Command) -> anyhow::Result<()> {
    let output = execute(store, session, command)?;

    let mut out = io::stdout().lock();
    out.write_all(output.as_bytes())
        .context("failed to write to stdout")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

/// Runs `command` against `store` and returns what it prints.
pub fn execute(
    store: &mut EventStore,
    session: &Session<'_>,
    command: Command,
) -> anyhow::Result<String> {
    match command {
        Command::Month(args) => cmd_month(store, session, &args),
        Command::Day(args) => Ok(cmd_day(store, session, &args)),
        Command::Add(args) => cmd_add(store, session, args),
        Command::Edit(args) => cmd_edit(store, session, args),
        Command::Delete(args) => cmd_delete(store, session, &args),
    }
}

/// Terminal width when stdout is a terminal.
pub fn terminal_columns() -> Option<u16> {
    if !io::stdout().is_terminal() {
        return None;
    }
    crossterm::terminal::size().ok().map(|(cols, _)| cols)
}

/// A laid-out month whose cells observe one viewport. Cell width is
/// derived from the viewport, so resizing it re-lays out every cell.
#[derive(Debug)]
pub struct MonthScreen {
    pub view: MonthView,
    pub viewport: Viewport,
    preferred: TextRenderer,
    renderer: TextRenderer,
}

impl MonthScreen {
    pub fn open(
        events: &[Event],
        cfg: &CalendarConfig,
        renderer: &TextRenderer,
        reference: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        let mut view = MonthView::build(events, reference, today, cfg.week_start_day());
        let viewport = Viewport::new(grid_extent(renderer.cell()));
        view.mount(&viewport);
        let mut screen = Self {
            view,
            viewport,
            preferred: renderer.clone(),
            renderer: renderer.clone(),
        };
        screen.layout();
        screen
    }

    /// Shrinks the viewport to `columns` when the grid is wider.
    pub fn fit_width(&mut self, columns: u16) {
        let current = self.viewport.extent();
        if f64::from(columns) >= current.width {
            return;
        }
        debug!(columns, "narrowing month grid to fit");
        self.viewport
            .resize(Extent::new(f64::from(columns), current.height));
        self.layout();
    }

    pub fn refresh_days(&mut self, events: &[Event], dates: &[NaiveDate]) {
        self.view.refresh_days(events, dates);
        self.layout();
    }

    pub fn renderer(&self) -> &TextRenderer {
        &self.renderer
    }

    pub fn render(&self) -> String {
        self.renderer.render_month(&self.view)
    }

    pub fn close(mut self) {
        self.view.unmount();
    }

    fn layout(&mut self) {
        self.renderer = self.preferred.fitted_to(self.viewport.extent());
        let renderer = &self.renderer;
        self.view
            .layout(|day_events| renderer.measurer_for(day_events));
    }
}

fn open_screen(store: &EventStore, session: &Session<'_>, reference: NaiveDate) -> MonthScreen {
    let mut screen = MonthScreen::open(
        store.events(),
        session.cfg,
        session.renderer,
        reference,
        session.today,
    );
    if let Some(columns) = session.columns {
        screen.fit_width(columns);
    }
    screen
}

/// Every event of `date`, in display order.
pub fn day_events(store: &EventStore, date: NaiveDate) -> Vec<Event> {
    let buckets = bucket(&[date], store.events());
    sorted(buckets.into_values().flatten().collect::<Vec<&Event>>())
        .into_iter()
        .cloned()
        .collect()
}

fn locate(store: &EventStore, target: &EventLocator) -> anyhow::Result<EventId> {
    match (target.id, target.on, target.index) {
        (Some(id), _, _) => Ok(id),
        (None, Some(date), Some(index)) => {
            let listed = day_events(store, date);
            index
                .checked_sub(1)
                .and_then(|idx| listed.get(idx))
                .map(|event| event.id)
                .ok_or_else(|| {
                    anyhow!("no event #{index} on {date} ({} listed)", listed.len())
                })
        }
        _ => Err(anyhow!("an event is picked by --id, or by --on with --index")),
    }
}

#[tracing::instrument(skip(store, session))]
fn cmd_month(store: &EventStore, session: &Session<'_>, args: &MonthArgs) -> anyhow::Result<String> {
    let reference = add_months(args.date.unwrap_or(session.today), args.offset);
    let screen = open_screen(store, session, reference);

    let hidden: usize = screen
        .view
        .cells()
        .iter()
        .map(|cell| cell.overflow_count())
        .sum();
    info!(month = %screen.view.title(), events = store.len(), hidden, "rendering month");

    let output = if args.json {
        let mut json = serde_json::to_string_pretty(&screen.view.report())
            .context("failed to serialize month view")?;
        json.push('\n');
        json
    } else {
        screen.render()
    };
    screen.close();
    Ok(output)
}

#[tracing::instrument(skip(store, session))]
fn cmd_day(store: &EventStore, session: &Session<'_>, args: &DayArgs) -> String {
    session
        .renderer
        .render_day(args.date, &day_events(store, args.date), args.ids)
}

#[tracing::instrument(skip(store, session, args), fields(date = %args.date, name = %args.name))]
fn cmd_add(store: &mut EventStore, session: &Session<'_>, args: AddArgs) -> anyhow::Result<String> {
    let draft = EventDraft {
        name: args.name,
        date: args.date,
        color: args.color,
        all_day: args.all_day,
        start_time: args.start.map(|t| t.to_string()),
        end_time: args.end.map(|t| t.to_string()),
    };
    let new_event = draft.validate().context("event rejected")?;
    let date = new_event.date;

    show_change(store, session, date, |store| Ok(store.add(new_event).date))
}

#[tracing::instrument(skip(store, session, args))]
fn cmd_edit(store: &mut EventStore, session: &Session<'_>, args: EditArgs) -> anyhow::Result<String> {
    let id = locate(store, &args.target)?;
    let current = store
        .get(id)
        .ok_or(CalendarError::EventNotFound(id))
        .context("cannot edit event")?;

    let mut draft = EventDraft::from_new_event(&current.to_new_event());
    apply_edits(&mut draft, args);
    let edited = draft.validate().context("edit rejected")?;
    let date = edited.date;

    show_change(store, session, date, |store| {
        store.update(id, edited).context("cannot edit event")?;
        Ok(date)
    })
}

fn apply_edits(draft: &mut EventDraft, args: EditArgs) {
    if let Some(name) = args.name {
        draft.name = name;
    }
    if let Some(date) = args.date {
        draft.date = date;
    }
    if let Some(color) = args.color {
        draft.color = color;
    }
    if args.all_day {
        draft.all_day = true;
        draft.start_time = None;
        draft.end_time = None;
    }
    if args.start.is_some() || args.end.is_some() {
        draft.all_day = false;
    }
    if let Some(start) = args.start {
        draft.start_time = Some(start.to_string());
    }
    if let Some(end) = args.end {
        draft.end_time = Some(end.to_string());
    }
}

#[tracing::instrument(skip(store, session))]
fn cmd_delete(
    store: &mut EventStore,
    session: &Session<'_>,
    args: &DeleteArgs,
) -> anyhow::Result<String> {
    let id = locate(store, &args.target)?;
    let Some(date) = store.get(id).map(|event| event.date) else {
        warn!(%id, "no such event; nothing deleted");
        return Ok(format!("no event {id}; nothing deleted\n"));
    };

    show_change(store, session, date, |store| {
        Ok(store.delete(id).map_or(date, |removed| removed.date))
    })
}

/// Lays out the month around `focus`, applies `mutate`, re-lays out only
/// the days the store reports as changed, then prints the month and the
/// day `mutate` returns.
fn show_change<F>(
    store: &mut EventStore,
    session: &Session<'_>,
    focus: NaiveDate,
    mutate: F,
) -> anyhow::Result<String>
where
    F: FnOnce(&mut EventStore) -> anyhow::Result<NaiveDate>,
{
    let mut screen = open_screen(store, session, focus);

    let touched: Rc<RefCell<Vec<NaiveDate>>> = Rc::new(RefCell::new(Vec::new()));
    let subscription = {
        let touched = touched.clone();
        store.subscribe(move |change| touched.borrow_mut().extend(change.affected_dates()))
    };
    let shown = mutate(store);
    drop(subscription);
    let shown = shown?;

    let touched = touched.take();
    screen.refresh_days(store.events(), &touched);

    match screen.view.cell(shown) {
        Some(cell) if cell.overflow_count() > 0 => {
            info!(
                hidden = cell.overflow_count(),
                "changed day overflows its cell"
            );
        }
        Some(_) => {}
        None => debug!(%shown, "changed day is outside the displayed month"),
    }

    let mut output = screen.render();
    output.push('\n');
    output.push_str(
        &session
            .renderer
            .render_day(shown, &day_events(store, shown), false),
    );
    screen.close();
    Ok(output)
}
