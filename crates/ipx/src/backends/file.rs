//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The disk was quiet. Too quiet. Someone had exported every issue and pull request
//! of a repository into one JSON file, and asked us to turn it into a spreadsheet.
//! Just a file, they said. Simple, they said.
//!
//! The file didn't exist. The output directory didn't exist either. And somewhere in
//! the depths of a BufWriter, the last hundred rows were waiting for a flush that
//! almost never came.
//!
//! This module handles file-based I/O for the projector. It reads the source document
//! in one gulp (it has to be parsed as a whole anyway, there is no partial JSON object),
//! and writes the rendered table through a BufWriter.
//!
//! 🚰 File → String → serde_json → projector → composer → FileSink → BufWriter
//! 💀 Disk full → your problem now
//! 🦆 (mandatory, no notes)

mod file_sink;
mod file_source;

pub(crate) use file_sink::{FileSink, FileSinkConfig};
pub(crate) use file_source::{FileSource, FileSourceConfig};
