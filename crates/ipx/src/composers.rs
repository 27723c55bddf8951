//! 🎬 *[the rows are assembled. the sink hungers.]*
//! *[somewhere in the heap, a comma hides inside a pull request title.]*
//! *["Quote me," whispers the cell. "Or they will split me in two."]*
//!
//! 🎼 The Composers module: ordered rows in, one delimited payload out.
//!
//! 🧠 Knowledge graph:
//! - **Delimited** (`DelimitedComposer`): header row first, one record per row, `\r\n` after
//!   every record, quote character `"`, minimal quoting. Spreadsheet tools and the `csv`
//!   crate both read it back without complaint.
//! - A `Cell::Files` cell is comma-joined. Holding more than one file name, it is ALWAYS
//!   quoted, even if the delimiter is a tab and the commas would technically survive.
//!   Downstream readers learned to expect the quotes. We do not break their hearts.
//! - Resolution: from `SinkConfig`, same pattern as backends. The payload format is decided
//!   by where the rows are going, not where the issues came from.
//!
//! ```text
//! projection.rows ─▶ composer.compose(header, rows) ─▶ sink.send(payload) ─▶ sink.close()
//! ```
//!
//! 🦆 (the duck has no comment. the duck is properly quoted.)

use anyhow::{Result, bail};

use crate::app_config::SinkConfig;
use crate::projection::Cell;

const QUOTE: char = '"';
const RECORD_TERMINATOR: &str = "\r\n";
const FILE_NAME_JOINER: &str = ",";

// ===== Trait =====

/// 🎼 Renders a header plus ordered rows into one wire-format payload.
///
/// 🧠 Knowledge graph: mirrors the `Source`/`Sink` pattern:
/// trait → concrete impl → resolver from config.
pub(crate) trait Composer: std::fmt::Debug {
    /// 🎼 Header first, then every row in order. Returns the whole payload.
    fn compose(&self, header: &[&str], rows: &[Vec<Cell>]) -> String;
}

// ===== Delimited Composer =====

/// ✂️ Delimiter-separated values. CSV when the delimiter is a comma, which it usually is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DelimitedComposer {
    delimiter: char,
}

impl DelimitedComposer {
    /// 🔧 A delimiter that is also the quote character (or a line break) would make
    /// every row ambiguous, so it is refused here, before a single byte is written.
    pub(crate) fn new(delimiter: char) -> Result<Self> {
        if delimiter == QUOTE || delimiter == '\r' || delimiter == '\n' {
            bail!(
                "💀 The delimiter {delimiter:?} is already spoken for: it is the quote character or a \
                line break. Pick something else. A comma is a classic. A tab is a lifestyle."
            );
        }
        Ok(Self { delimiter })
    }

    /// 🔧 Resolve the composer from the sink config. Every sink speaks delimited text.
    pub(crate) fn from_sink_config(sink: &SinkConfig) -> Result<Self> {
        Self::new(sink.common_config().delimiter)
    }

    pub(crate) fn delimiter(&self) -> char {
        self.delimiter
    }

    fn needs_quotes(&self, field: &str) -> bool {
        field
            .chars()
            .any(|c| c == self.delimiter || c == QUOTE || c == '\r' || c == '\n')
    }

    fn push_field(&self, payload: &mut String, field: &str, force_quotes: bool) {
        if force_quotes || self.needs_quotes(field) {
            payload.push(QUOTE);
            // -- 🔁 embedded quotes are doubled, the one escape rule everyone agrees on
            payload.push_str(&field.replace(QUOTE, "\"\""));
            payload.push(QUOTE);
        } else {
            payload.push_str(field);
        }
    }

    fn push_cell(&self, payload: &mut String, cell: &Cell) {
        match cell {
            Cell::Text(text) => self.push_field(payload, text, false),
            Cell::Files(files) => {
                self.push_field(payload, &files.join(FILE_NAME_JOINER), files.len() > 1)
            }
        }
    }

    fn push_record<'a, T: 'a>(
        &self,
        payload: &mut String,
        fields: impl IntoIterator<Item = &'a T>,
        mut push: impl FnMut(&mut String, &'a T),
    ) {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                payload.push(self.delimiter);
            }
            push(payload, field);
        }
        payload.push_str(RECORD_TERMINATOR);
    }
}

impl Composer for DelimitedComposer {
    fn compose(&self, header: &[&str], rows: &[Vec<Cell>]) -> String {
        // 🧮 Vibes-based pre-allocation: a header's worth of bytes per row, give or take a patch.
        let header_len: usize = header.iter().map(|name| name.len() + 1).sum();
        let mut payload = String::with_capacity(header_len * (rows.len() + 1));

        self.push_record(&mut payload, header, |payload, name| {
            self.push_field(payload, name, false)
        });
        for row in rows {
            self.push_record(&mut payload, row, |payload, cell| self.push_cell(payload, cell));
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::CommonSinkConfig;
    use crate::backends::file::FileSinkConfig;

    fn read_back(payload: &str, delimiter: u8) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_reader(payload.as_bytes())
            .records()
            .map(|record| {
                record
                    .expect("💀 composed output should be readable CSV")
                    .iter()
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    #[test]
    fn the_one_where_plain_cells_stay_plain() -> Result<()> {
        let composer = DelimitedComposer::new(',')?;
        let payload = composer.compose(
            &["Issue_Num", "Status"],
            &[vec![Cell::from("101"), Cell::blank()], vec![Cell::from("102"), Cell::from("closed")]],
        );
        assert_eq!(payload, "Issue_Num,Status\r\n101,\r\n102,closed\r\n");
        Ok(())
    }

    #[test]
    fn the_one_where_commas_quotes_and_newlines_get_wrapped() -> Result<()> {
        let composer = DelimitedComposer::new(',')?;
        let payload = composer.compose(
            &["Issue_Title", "Issue_Body"],
            &[vec![Cell::from("Fix, then ship"), Cell::from("said \"hi\"\nbye")]],
        );
        assert_eq!(
            payload,
            "Issue_Title,Issue_Body\r\n\"Fix, then ship\",\"said \"\"hi\"\"\nbye\"\r\n"
        );

        let rows = read_back(&payload, b',');
        assert_eq!(rows[1], vec!["Fix, then ship", "said \"hi\"\nbye"]);
        Ok(())
    }

    #[test]
    fn the_one_where_many_files_are_always_quoted() -> Result<()> {
        // 🧪 tab delimiter: the commas alone would not force quoting. the file list still does.
        let composer = DelimitedComposer::new('\t')?;
        let payload = composer.compose(
            &["File_Names", "Other"],
            &[
                vec![Cell::Files(vec!["a.rs".into(), "b.rs".into()]), Cell::from("x")],
                vec![Cell::Files(vec!["solo.rs".into()]), Cell::from("y")],
                vec![Cell::Files(vec![]), Cell::from("z")],
            ],
        );
        assert_eq!(
            payload,
            "File_Names\tOther\r\n\"a.rs,b.rs\"\tx\r\nsolo.rs\ty\r\n\tz\r\n"
        );

        let rows = read_back(&payload, b'\t');
        assert_eq!(rows[1][0], "a.rs,b.rs");
        assert_eq!(rows[3][0], "");
        Ok(())
    }

    #[test]
    fn the_one_where_no_rows_still_means_a_header() -> Result<()> {
        let composer = DelimitedComposer::new(';')?;
        assert_eq!(composer.compose(&["SHA", "Changes"], &[]), "SHA;Changes\r\n");
        Ok(())
    }

    #[test]
    fn the_one_where_the_quote_cannot_moonlight_as_a_delimiter() {
        assert!(DelimitedComposer::new('"').is_err());
        assert!(DelimitedComposer::new('\n').is_err());
        assert!(DelimitedComposer::new('|').is_ok());
    }

    #[test]
    fn the_one_where_the_sink_config_picks_the_delimiter() -> Result<()> {
        let file = SinkConfig::File(FileSinkConfig {
            file_name: "out.csv".into(),
            common_config: CommonSinkConfig { delimiter: ';' },
        });
        assert_eq!(DelimitedComposer::from_sink_config(&file)?.delimiter(), ';');

        let in_mem = SinkConfig::InMemory(CommonSinkConfig::default());
        assert_eq!(DelimitedComposer::from_sink_config(&in_mem)?.delimiter(), ',');
        Ok(())
    }
}
