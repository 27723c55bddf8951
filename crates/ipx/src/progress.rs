//! 📊 progress.rs: "Are we there yet?" Every pipeline, every time, forever.
//!
//! 🚀 This module answers the age-old question: "how many of those ten thousand issues are done?"
//! With cold hard numbers, a progress bar, and a table so comfy it has lumbar support.
//!
//! ⚠️  Warning: Watching this progress bar will not make it go faster.
//! Neither will refreshing it. We've tried. Science says no.
//!
//! 🦆 The duck has nothing to do with this module. It's just vibing.

use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

/// 🔢 Formats a number with commas for the 3 people in the audience who like readability.
/// "1000000 rows" → "1,000,000 rows". You're welcome, eyes.
pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ Formats a Duration into MM:SS or HH:MM:SS.
/// If it shows HH:MM:SS, you should probably call your mom. It's been a while.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 🍽️ A borderless two-column table of `label  value` lines. Run summaries use it,
/// and so does the progress message. Same furniture, different rooms.
pub(crate) fn two_column_table(rows: &[(String, String)]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label).set_alignment(CellAlignment::Right),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// 📊 Counts finished items (records projected, updates attempted) against a known total.
///
/// # Ancient Proverb
/// "He who projects ten thousand issues without a progress bar, projects alone and in darkness."
pub(crate) struct ProgressMetrics {
    /// 🏷️ what are we even counting? shows up in the message.
    label: String,
    /// 📏 how many items there are in total. 0 = no idea.
    total_items: u64,
    /// 📄 items finished so far, each one a tiny victory
    done_items: u64,
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("label", &self.label)
            .field("total_items", &self.total_items)
            .field("done_items", &self.done_items)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 Spin up a new bar. Cyan because it's classy, blue because it's calm.
    pub(crate) fn new(label: impl Into<String>, total_items: u64) -> Self {
        let progress_bar = ProgressBar::new(total_items);
        // -- 🐛 the template is hardcoded; if indicatif ever rejects it, a plain bar will do
        let style = ProgressStyle::default_bar()
            .template("{msg}\n| [{bar:40.cyan/blue}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        progress_bar.set_style(style);

        Self {
            label: label.into(),
            total_items,
            done_items: 0,
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// 🔄 Jump to `done_items` finished. Re-renders the table and moves the bar.
    pub(crate) fn update(&mut self, done_items: u64) {
        self.done_items = done_items;
        self.render();
        self.progress_bar.set_position(self.done_items);
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// ✅ Mark the progress bar done. Ring the bell. We made it.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    fn percent(&self) -> f64 {
        if self.total_items > 0 {
            (self.done_items as f64 / self.total_items as f64) * 100.0
        } else {
            // ⚠️ unknown total, percent meaningless
            0.0
        }
    }

    /// 🎨 Render the progress display as a comfy-table message on the progress bar.
    ///
    /// ```text
    /// <label>
    /// | [=====>----------]
    ///   <items/s>     <done / total>
    ///   <elapsed>     <remaining>
    /// ```
    fn render(&self) {
        let elapsed = self.elapsed();
        let percent = self.percent();
        let per_sec = if elapsed.as_secs_f64() > 0.0 {
            self.done_items as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let remaining = if percent > 0.0 {
            // 🔮 linear extrapolation: assumes the future looks like the past
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            let remaining_secs = total_estimated - elapsed.as_secs_f64();
            if remaining_secs > 0.0 {
                format_duration(Duration::from_secs_f64(remaining_secs))
            } else {
                "--:--".to_string()
            }
        } else {
            "--:--".to_string()
        };

        let table = two_column_table(&[
            (
                format!("{}/s", format_number(per_sec as u64)),
                format!(
                    "{} / {} ({:.2}%)",
                    format_number(self.done_items),
                    format_number(self.total_items),
                    percent
                ),
            ),
            (
                format!("{} elapsed", format_duration(elapsed)),
                format!("{} remaining", remaining),
            ),
        ]);

        self.progress_bar
            .set_message(format!("{}\n{}", self.label, table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_big_numbers_get_their_commas() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn the_one_where_an_hour_earns_its_own_column() {
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
    }

    #[test]
    fn the_one_where_the_bar_keeps_count() {
        let mut progress = ProgressMetrics::new("🧪 rows", 4);
        progress.update(3);
        assert_eq!(progress.done_items, 3);
        assert!((progress.percent() - 75.0).abs() < f64::EPSILON);
        progress.finish();

        let clueless = ProgressMetrics::new("🧪 rows", 0);
        assert_eq!(clueless.percent(), 0.0);
    }
}
