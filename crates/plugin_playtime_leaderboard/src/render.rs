//! Leaderboard rendering.
//!
//! Hour bands and podium ranks are plain data tables. The renderer lays out
//! one line per entry so the hour column starts at the same offset on every
//! row, and sizes the gold border from the widest line.

use crate::aggregator::LeaderboardEntry;
use crate::chat::{ChatLine, ChatSpan};
use playtime_core::{ChatColor, DisplaySettings};

/// Shown instead of the board when no entries remain
pub const EMPTY_MESSAGE: &str = "No playtime data available";
/// Header printed under the top border
pub const HEADER: &str = "Playtime:";
/// Minimum width of the name column, rank slot included
pub const BASE_PADDING: usize = 16;
/// Width of the `"N. "` rank slot
pub const RANK_LENGTH: usize = 3;
/// Extra border characters past the widest line
pub const BORDER_EXTRA: usize = 3;
pub const BORDER_CHAR: char = '=';
/// Hours from which the integer form and the star glyph are used
pub const STAR_THRESHOLD_HOURS: f64 = 1000.0;
/// Hours from which the day-equivalent suffix is shown
pub const DAY_SUFFIX_THRESHOLD_HOURS: f64 = 100.0;

const GOLD_DIGITS: &[ChatColor] = &[
    ChatColor::Gold,
    ChatColor::Yellow,
    ChatColor::Green,
    ChatColor::Aqua,
];
const SILVER_DIGITS: &[ChatColor] = &[
    ChatColor::Gray,
    ChatColor::White,
    ChatColor::White,
    ChatColor::Gray,
];

/// Style of one contiguous range of lifetime hours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourBand {
    pub min_hours: f64,
    pub max_hours: f64,
    /// One color for uniform digits, several to color each digit in turn
    pub digit_colors: &'static [ChatColor],
    /// Color of the trailing `h`
    pub unit_color: ChatColor,
    pub star: Option<Star>,
}

/// Glyph prepended to the hours of high bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Star {
    pub glyph: &'static str,
    pub color: ChatColor,
}

const fn plain_band(min_hours: f64, max_hours: f64, color: &'static [ChatColor]) -> HourBand {
    HourBand {
        min_hours,
        max_hours,
        digit_colors: color,
        unit_color: color[0],
        star: None,
    }
}

const fn star_band(
    min_hours: f64,
    max_hours: f64,
    digit_colors: &'static [ChatColor],
    unit_color: ChatColor,
    glyph: &'static str,
    star_color: ChatColor,
) -> HourBand {
    HourBand {
        min_hours,
        max_hours,
        digit_colors,
        unit_color,
        star: Some(Star {
            glyph,
            color: star_color,
        }),
    }
}

/// Bands in ascending order. The last band also covers everything above it.
pub const HOUR_BANDS: [HourBand; 21] = [
    plain_band(0.0, 100.0, &[ChatColor::Gray]),
    plain_band(100.0, 200.0, &[ChatColor::White]),
    plain_band(200.0, 300.0, &[ChatColor::Gold]),
    plain_band(300.0, 400.0, &[ChatColor::Aqua]),
    plain_band(400.0, 500.0, &[ChatColor::DarkGreen]),
    plain_band(500.0, 600.0, &[ChatColor::DarkAqua]),
    plain_band(600.0, 700.0, &[ChatColor::DarkRed]),
    plain_band(700.0, 800.0, &[ChatColor::LightPurple]),
    plain_band(800.0, 900.0, &[ChatColor::Blue]),
    plain_band(900.0, 1000.0, &[ChatColor::DarkPurple]),
    star_band(1000.0, 1100.0, GOLD_DIGITS, ChatColor::LightPurple, "✫", ChatColor::Red),
    star_band(1100.0, 1200.0, &[ChatColor::White], ChatColor::Gray, "✪", ChatColor::Gray),
    star_band(1200.0, 1300.0, &[ChatColor::Yellow], ChatColor::Gray, "✪", ChatColor::Gold),
    star_band(1300.0, 1400.0, &[ChatColor::Aqua], ChatColor::Gray, "✪", ChatColor::DarkAqua),
    star_band(1400.0, 1500.0, &[ChatColor::Green], ChatColor::Gray, "✪", ChatColor::DarkGreen),
    star_band(1500.0, 1600.0, &[ChatColor::DarkAqua], ChatColor::Gray, "✪", ChatColor::Blue),
    star_band(1600.0, 1700.0, &[ChatColor::Red], ChatColor::Gray, "✪", ChatColor::DarkRed),
    star_band(1700.0, 1800.0, &[ChatColor::LightPurple], ChatColor::Gray, "✪", ChatColor::DarkPurple),
    star_band(1800.0, 1900.0, &[ChatColor::Blue], ChatColor::Gray, "✪", ChatColor::DarkBlue),
    star_band(1900.0, 2000.0, &[ChatColor::DarkPurple], ChatColor::Gray, "✪", ChatColor::DarkGray),
    star_band(2000.0, 2100.0, SILVER_DIGITS, ChatColor::DarkGray, "✪", ChatColor::Gray),
];

/// The band for `hours`: the first with `min <= hours < max`.
///
/// Hours past the last band use the last band; negative hours use the first.
pub fn band_for(hours: f64) -> &'static HourBand {
    HOUR_BANDS
        .iter()
        .find(|band| hours >= band.min_hours && hours < band.max_hours)
        .unwrap_or_else(|| {
            if hours < HOUR_BANDS[0].min_hours {
                &HOUR_BANDS[0]
            } else {
                &HOUR_BANDS[HOUR_BANDS.len() - 1]
            }
        })
}

/// Color of the podium prefix for ranks 1 to 3
pub fn podium_color(rank: usize) -> Option<ChatColor> {
    match rank {
        1 => Some(ChatColor::Gold),
        2 => Some(ChatColor::White),
        3 => Some(ChatColor::DarkPurple),
        _ => None,
    }
}

/// Hours as shown on the board: integer at 1000h and above, two decimals below
pub fn format_hours(hours: f64) -> String {
    if hours >= STAR_THRESHOLD_HOURS {
        format!("{}", hours.trunc() as u64)
    } else {
        format!("{:.2}", hours)
    }
}

/// Daily time as shown in the hover text, e.g. `"2h 30min 15sec today"`
pub fn format_daily_playtime(daily_hours: f64) -> String {
    let total = (daily_hours.max(0.0) * 3600.0).round() as u64;
    format!(
        "{}h {}min {}sec today",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Spans for the hours column: optional star, digits, then `h`
pub fn hour_spans(hours: f64) -> Vec<ChatSpan> {
    let band = band_for(hours);
    let text = format_hours(hours);
    let mut spans = Vec::new();

    if let Some(star) = band.star {
        spans.push(ChatSpan::colored(format!("{} ", star.glyph), star.color));
    }

    match band.digit_colors {
        [color] => spans.push(ChatSpan::colored(text, *color)),
        palette => {
            for (i, digit) in text.chars().enumerate() {
                let color = palette[i % palette.len()];
                spans.push(ChatSpan::colored(digit.to_string(), color));
            }
        }
    }

    spans.push(ChatSpan::colored("h", band.unit_color));
    spans
}

/// Column widths shared by every row of one render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Name column width, rank slot included
    pub total_padding: usize,
}

impl Layout {
    pub fn for_entries(entries: &[LeaderboardEntry]) -> Self {
        let max_username = entries
            .iter()
            .map(|entry| entry.name.chars().count() + 1)
            .max()
            .unwrap_or(0);
        Self {
            total_padding: BASE_PADDING.max(max_username + RANK_LENGTH),
        }
    }

    /// Width the `"name:"` field is padded to on a row of the given rank
    pub fn name_width(&self, rank: usize) -> usize {
        if podium_color(rank).is_some() {
            self.total_padding - RANK_LENGTH
        } else {
            self.total_padding
        }
    }
}

/// Renders ranked entries into chat lines
#[derive(Debug, Clone, Default)]
pub struct LeaderboardRenderer {
    display: DisplaySettings,
}

impl LeaderboardRenderer {
    pub fn new(display: DisplaySettings) -> Self {
        Self { display }
    }

    /// Renders the full board, borders included.
    ///
    /// Entries whose name is blacklisted are skipped before ranks are assigned.
    pub fn render(&self, entries: &[LeaderboardEntry]) -> Vec<ChatLine> {
        let visible: Vec<LeaderboardEntry> = entries
            .iter()
            .filter(|entry| !self.display.is_blacklisted(&entry.name))
            .cloned()
            .collect();

        if visible.is_empty() {
            return vec![ChatLine::colored(EMPTY_MESSAGE, ChatColor::Yellow)];
        }

        let layout = Layout::for_entries(&visible);

        let rows: Vec<ChatLine> = visible
            .iter()
            .enumerate()
            .map(|(i, entry)| self.render_entry(entry, i + 1, &layout))
            .collect();

        let max_width = rows
            .iter()
            .map(ChatLine::width)
            .max()
            .unwrap_or(0)
            .max(HEADER.chars().count());
        let border = ChatLine::new(vec![ChatSpan::colored(
            BORDER_CHAR.to_string().repeat(max_width + BORDER_EXTRA),
            ChatColor::Gold,
        )
        .bold(true)]);

        let mut lines = Vec::with_capacity(rows.len() + 4);
        lines.push(border.clone());
        lines.push(ChatLine::colored(HEADER, ChatColor::DarkGreen));
        let row_count = rows.len();
        for (i, row) in rows.into_iter().enumerate() {
            lines.push(row);
            if i == 2 && row_count > 3 {
                lines.push(ChatLine::empty());
            }
        }
        lines.push(border);
        lines
    }

    /// Renders one row for `entry` at 1-based `rank`.
    pub fn render_entry(&self, entry: &LeaderboardEntry, rank: usize, layout: &Layout) -> ChatLine {
        let mut line = ChatLine::empty();
        let podium = podium_color(rank);

        if let Some(color) = podium {
            line.push(ChatSpan::colored(format!("{rank}."), color).bold(true));
            line.push(ChatSpan::plain(" "));
        }

        let username = format!("{}:", entry.name);
        let padded = format!("{:<width$}", username, width = layout.name_width(rank));
        line.push(ChatSpan::colored(padded, self.display.color_for(&entry.name)));

        let hover = format_daily_playtime(entry.daily_hours);
        for span in hour_spans(entry.lifetime_hours) {
            line.push(span.with_hover(hover.clone()));
        }

        if entry.lifetime_hours >= DAY_SUFFIX_THRESHOLD_HOURS {
            let days = entry.lifetime_hours / 24.0;
            line.push(
                ChatSpan::colored(
                    format!("    ({:.2}d)", days),
                    podium.unwrap_or(ChatColor::White),
                )
                .bold(true),
            );
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playtime_core::PlayerId;

    fn entry(name: &str, lifetime_hours: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            id: PlayerId::new(),
            name: name.to_string(),
            lifetime_hours,
            daily_hours: 0.0,
        }
    }

    #[test]
    fn test_band_lookup() {
        assert_eq!(band_for(0.0).digit_colors, &[ChatColor::Gray]);
        assert_eq!(band_for(99.99).digit_colors, &[ChatColor::Gray]);
        assert_eq!(band_for(100.0).digit_colors, &[ChatColor::White]);
        assert_eq!(band_for(999.0).unit_color, ChatColor::DarkPurple);
        assert_eq!(band_for(1050.0).star.unwrap().glyph, "✫");
        assert_eq!(band_for(1200.5).star.unwrap().color, ChatColor::Gold);
        assert_eq!(band_for(5000.0).min_hours, 2000.0);
        assert_eq!(band_for(-1.0).min_hours, 0.0);
    }

    #[test]
    fn test_bands_are_contiguous() {
        for pair in HOUR_BANDS.windows(2) {
            assert_eq!(pair[0].max_hours, pair[1].min_hours);
        }
    }

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(50.0), "50.00");
        assert_eq!(format_hours(999.999), "1000.00");
        assert_eq!(format_hours(1200.5), "1200");
        assert_eq!(format_hours(1999.99), "1999");
    }

    #[test]
    fn test_format_daily_playtime() {
        assert_eq!(format_daily_playtime(0.0), "0h 0min 0sec today");
        assert_eq!(format_daily_playtime(2.5 + 15.0 / 3600.0), "2h 30min 15sec today");
    }

    #[test]
    fn test_per_digit_palette_cycles() {
        let spans = hour_spans(1050.0);
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["✫ ", "1", "0", "5", "0", "h"]);
        assert_eq!(spans[0].color, Some(ChatColor::Red));
        assert_eq!(spans[1].color, Some(ChatColor::Gold));
        assert_eq!(spans[4].color, Some(ChatColor::Aqua));
        assert_eq!(spans[5].color, Some(ChatColor::LightPurple));

        // Five digits wrap back to the start of the palette.
        let spans = hour_spans(10_000.0);
        assert_eq!(spans[5].color, Some(ChatColor::Gray));
    }

    #[test]
    fn test_low_hours_have_no_star_or_suffix() {
        let renderer = LeaderboardRenderer::default();
        let layout = Layout::for_entries(&[entry("Alex", 50.0)]);
        let line = renderer.render_entry(&entry("Alex", 50.0), 4, &layout);
        assert_eq!(line.plain_text(), format!("{:<16}50.00h", "Alex:"));
    }

    #[test]
    fn test_hour_column_aligns_across_ranks() {
        let entries = vec![
            entry("Alexandra_The_Great", 1500.0),
            entry("Bo", 300.0),
            entry("Cy", 200.0),
            entry("Di", 100.0),
            entry("Ed", 50.0),
        ];
        let lines = LeaderboardRenderer::default().render(&entries);
        let texts: Vec<String> = lines.iter().map(ChatLine::plain_text).collect();

        // Name "Alexandra_The_Great:" is 20 wide, so the column is 23.
        assert!(texts[2].starts_with("1. Alexandra_The_Great:"));
        assert_eq!(texts[2].chars().position(|c| c == '✪'), Some(23));
        assert_eq!(&texts[3][23..], "300.00h    (12.50d)");
        assert_eq!(texts[5], "");
        assert_eq!(&texts[6][23..], "100.00h    (4.17d)");
        assert_eq!(&texts[7][23..], "50.00h");
    }

    #[test]
    fn test_border_and_header() {
        let lines = LeaderboardRenderer::default().render(&[entry("Alex", 50.0)]);
        assert_eq!(lines.len(), 4);
        // "1. " + "Alex:" padded to 13 + "50.00h" = 22 wide.
        assert_eq!(lines[0].plain_text(), "=".repeat(25));
        assert!(lines[0].spans[0].bold);
        assert_eq!(lines[0].spans[0].color, Some(ChatColor::Gold));
        assert_eq!(lines[1], ChatLine::colored(HEADER, ChatColor::DarkGreen));
        assert_eq!(lines[3], lines[0]);
    }

    #[test]
    fn test_empty_board() {
        let lines = LeaderboardRenderer::default().render(&[]);
        assert_eq!(lines, vec![ChatLine::colored(EMPTY_MESSAGE, ChatColor::Yellow)]);
    }

    #[test]
    fn test_username_color_and_blacklist() {
        let mut display = DisplaySettings::default();
        display
            .username_colors
            .insert("alex".to_string(), ChatColor::Aqua);
        display.blacklisted_players.insert("bot".to_string());
        let renderer = LeaderboardRenderer::new(display);

        let lines = renderer.render(&[entry("BOT", 900.0), entry("Alex", 10.0)]);
        assert_eq!(lines.len(), 4);
        let row = &lines[2];
        assert!(row.plain_text().starts_with("1. Alex:"));
        assert_eq!(row.spans[2].color, Some(ChatColor::Aqua));
        assert!(!row.spans[2].bold);
    }

    #[test]
    fn test_hover_shows_daily_time() {
        let mut e = entry("Alex", 150.0);
        e.daily_hours = 1.0 + 1.0 / 60.0;
        let layout = Layout::for_entries(std::slice::from_ref(&e));
        let line = LeaderboardRenderer::default().render_entry(&e, 5, &layout);

        let hours_span = line.spans.iter().find(|s| s.text == "150.00").unwrap();
        assert_eq!(hours_span.hover.as_deref(), Some("1h 1min 0sec today"));
        let suffix = line.spans.last().unwrap();
        assert_eq!(suffix.text, "    (6.25d)");
        assert_eq!(suffix.color, Some(ChatColor::White));
        assert!(suffix.bold);
    }
}
