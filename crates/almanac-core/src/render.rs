use std::fmt::Write as _;
use std::io::{self, IsTerminal};
use std::mem;

use chrono::NaiveDate;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::{CalendarConfig, CellConfig, MIN_CELL_WIDTH};
use crate::event::Event;
use crate::format;
use crate::layout::{MarkerState, Measurer};
use crate::view::{DayCell, MonthView};
use crate::viewport::Extent;

/// Terminal columns and rows the bordered month grid takes at `cell` size,
/// assuming six week rows.
pub fn grid_extent(cell: CellConfig) -> Extent {
    Extent::new(
        f64::from(cell.width) * 7.0 + 8.0,
        f64::from(cell.height) * 6.0 + 7.0,
    )
}

/// Word-wraps `text` to `width` terminal columns. Words wider than a line
/// are broken between characters. Always returns at least one line.
pub fn wrap_label(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        if current_width > 0 && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if current_width > 0 {
            lines.push(mem::take(&mut current));
            current_width = 0;
        }
        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }
        for ch in word.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width > 0 && current_width + ch_width > width {
                lines.push(mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += ch_width;
        }
    }

    if current_width > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Measures a day cell by wrapping each event label to the cell width and
/// counting the rows it takes. The day-number row is not available to
/// events.
#[derive(Debug, Clone)]
pub struct TextMeasurer {
    width: usize,
    rows: usize,
    item_rows: Vec<usize>,
    marker_template: String,
}

impl TextMeasurer {
    pub fn new(events: &[Event], cell: CellConfig, marker_template: &str) -> Self {
        let width = usize::from(cell.width);
        let item_rows = events
            .iter()
            .map(|event| wrap_label(&format::event_label(event), width).len())
            .collect();
        Self {
            width,
            rows: usize::from(cell.height).saturating_sub(1),
            item_rows,
            marker_template: marker_template.to_string(),
        }
    }

    fn marker_rows(&self, hidden: usize) -> usize {
        wrap_label(&format::marker_label(&self.marker_template, hidden), self.width).len()
    }
}

impl Measurer for TextMeasurer {
    fn available(&self) -> f64 {
        self.rows as f64
    }

    fn measure(&mut self, shown: usize, marker: Option<usize>) -> f64 {
        let items: usize = self.item_rows.iter().take(shown).sum();
        let marker = marker.map(|hidden| self.marker_rows(hidden)).unwrap_or(0);
        (items + marker) as f64
    }
}

#[derive(Debug, Clone)]
pub struct TextRenderer {
    color: bool,
    cell: CellConfig,
    marker_template: String,
}

impl TextRenderer {
    pub fn new(cfg: &CalendarConfig) -> Self {
        Self {
            color: cfg.color && io::stdout().is_terminal(),
            cell: cfg.cell,
            marker_template: cfg.marker_label.clone(),
        }
    }

    /// Renderer that never emits ANSI escapes.
    pub fn plain(cfg: &CalendarConfig) -> Self {
        Self {
            color: false,
            ..Self::new(cfg)
        }
    }

    /// Copy whose cells narrow until the grid fits `extent.width` columns.
    /// Cells never grow past the configured width or shrink below the
    /// minimum.
    pub fn fitted_to(&self, extent: Extent) -> Self {
        let fit = ((extent.width - 8.0) / 7.0).floor();
        let width = if fit < f64::from(self.cell.width) {
            fit.max(f64::from(MIN_CELL_WIDTH)) as u16
        } else {
            self.cell.width
        };
        Self {
            cell: CellConfig {
                width,
                ..self.cell
            },
            ..self.clone()
        }
    }

    pub fn cell(&self) -> CellConfig {
        self.cell
    }

    pub fn measurer_for(&self, events: &[Event]) -> TextMeasurer {
        TextMeasurer::new(events, self.cell, &self.marker_template)
    }

    /// Draws a laid-out month as a text grid.
    pub fn render_month(&self, view: &MonthView) -> String {
        let width = usize::from(self.cell.width);
        let rows = usize::from(self.cell.height).saturating_sub(1);
        let rule = self.rule();
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.paint(&view.title(), "1"));
        let header = view
            .weekday_labels()
            .into_iter()
            .map(|label| pad(label, width))
            .collect::<Vec<_>>()
            .join("|");
        let _ = writeln!(out, "|{header}|");
        let _ = writeln!(out, "{rule}");

        for week in view.weeks() {
            let numbers = week
                .iter()
                .map(|cell| self.day_number(cell, width))
                .collect::<Vec<_>>()
                .join("|");
            let _ = writeln!(out, "|{numbers}|");

            let bodies: Vec<Vec<String>> =
                week.iter().map(|cell| self.cell_lines(cell, rows)).collect();
            for row in 0..rows {
                let line = bodies
                    .iter()
                    .map(|lines| lines[row].as_str())
                    .collect::<Vec<_>>()
                    .join("|");
                let _ = writeln!(out, "|{line}|");
            }
            let _ = writeln!(out, "{rule}");
        }

        out
    }

    /// The "view more" list: every event of one day, in display order,
    /// numbered from 1 the way `--on DATE --index N` addresses them.
    pub fn render_day(&self, date: NaiveDate, events: &[Event], show_ids: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {}",
            self.paint(format::weekday(date), "1"),
            format::short_date(date)
        );
        if events.is_empty() {
            let _ = writeln!(out, "  (no events)");
            return out;
        }
        for (idx, event) in events.iter().enumerate() {
            let when = match (event.start_time(), event.end_time()) {
                (Some(start), Some(end)) => {
                    format!("{} - {}", format::short_time(start), format::short_time(end))
                }
                _ => "all day".to_string(),
            };
            let bullet = self.paint("●", event.color.ansi_code());
            let _ = write!(out, "  {:>2}. {bullet} {when:<19} {}", idx + 1, event.name);
            if show_ids {
                let _ = write!(out, "  [{}]", event.id);
            }
            out.push('\n');
        }
        out
    }

    fn rule(&self) -> String {
        let width = usize::from(self.cell.width);
        let mut rule = String::from("+");
        for _ in 0..7 {
            rule.push_str(&"-".repeat(width));
            rule.push('+');
        }
        rule
    }

    fn day_number(&self, cell: &DayCell, width: usize) -> String {
        let padded = pad(&format::day_number(cell.date), width);
        if cell.is_today {
            self.paint(&padded, "7")
        } else if !cell.in_month {
            self.paint(&padded, "2")
        } else {
            padded
        }
    }

    /// Exactly `rows` padded lines: visible events, then the marker.
    fn cell_lines(&self, cell: &DayCell, rows: usize) -> Vec<String> {
        let width = usize::from(self.cell.width);
        let mut lines = Vec::with_capacity(rows);

        for event in cell.visible_events() {
            for line in wrap_label(&format::event_label(event), width) {
                lines.push(self.paint(&pad(&line, width), event.color.ansi_code()));
            }
        }
        if cell.marker() == MarkerState::Shown {
            let label = format::marker_label(&self.marker_template, cell.overflow_count());
            for line in wrap_label(&label, width) {
                lines.push(self.paint(&pad(&line, width), "4"));
            }
        }

        lines.truncate(rows);
        while lines.len() < rows {
            lines.push(" ".repeat(width));
        }
        lines
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn pad(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{TextMeasurer, TextRenderer, grid_extent, wrap_label};
    use crate::config::{CalendarConfig, CellConfig};
    use crate::event::{Event, EventColor, EventId, NewEvent};
    use crate::layout::{Measurer, compute_split};
    use crate::viewport::Extent;

    fn event(name: &str) -> Event {
        Event::from_parts(
            EventId::random(),
            NewEvent::all_day(
                name,
                NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"),
                EventColor::Red,
            ),
        )
    }

    #[test]
    fn wraps_on_words_and_breaks_long_words() {
        assert_eq!(wrap_label("Team lunch", 10), vec!["Team lunch"]);
        assert_eq!(wrap_label("Quarterly review", 10), vec!["Quarterly", "review"]);
        assert_eq!(wrap_label("abcdefghijkl", 5), vec!["abcde", "fghij", "kl"]);
        assert_eq!(wrap_label("", 5), vec![""]);
    }

    #[test]
    fn wrapping_counts_wide_characters() {
        let lines = wrap_label("会議会議会議", 6);
        assert_eq!(lines, vec!["会議会", "議会議"]);
    }

    #[test]
    fn measurer_accounts_for_wrapped_labels() {
        let events = vec![
            event("Short"),
            event("A considerably longer event name"),
            event("Tiny"),
        ];
        let cell = CellConfig {
            width: 10,
            height: 5,
        };
        let mut measurer = TextMeasurer::new(&events, cell, "+{n} More");
        assert_eq!(measurer.available(), 4.0);
        assert_eq!(measurer.measure(1, None), 1.0);
        // "A considerably longer event name" wraps to four rows at width 10.
        assert_eq!(measurer.measure(2, None), 5.0);

        let split = compute_split(events.len(), &mut measurer);
        assert_eq!(split.visible, 1);
        assert_eq!(split.overflow, 2);
    }

    #[test]
    fn fitting_narrows_cells_but_never_widens_them() {
        let renderer = TextRenderer::plain(&CalendarConfig::default());
        let preferred = renderer.cell();
        assert_eq!(preferred.width, 14);

        let same = renderer.fitted_to(grid_extent(preferred));
        assert_eq!(same.cell(), preferred);

        let wide = renderer.fitted_to(Extent::new(400.0, 40.0));
        assert_eq!(wide.cell().width, 14);

        // 50 columns leave (50 - 8) / 7 = 6 per cell.
        let narrow = renderer.fitted_to(Extent::new(50.0, 40.0));
        assert_eq!(narrow.cell().width, 6);
        assert_eq!(narrow.cell().height, preferred.height);

        let tiny = renderer.fitted_to(Extent::new(10.0, 40.0));
        assert_eq!(tiny.cell().width, 6);
    }
}
