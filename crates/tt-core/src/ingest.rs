//! Time-tag file loading.
//!
//! Two text layouts are understood:
//!
//! - the acquisition software's export, `timestamp;channel` per line after a
//!   fixed number of header lines;
//! - single-channel CSV, `timestamp,...` per line after one header line, with
//!   the channel supplied by the caller.
//!
//! A directory is read file by file in name order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tt_common::{ChannelId, Error, Result};

use crate::event_log::{EventLog, EventRecord};

/// Layout of the input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `timestamp<delimiter>channel`.
    TimeTag { header_lines: usize, delimiter: char },
    /// First CSV column is the timestamp; every event belongs to `channel`.
    SingleChannelCsv { channel: ChannelId, header_lines: usize },
}

impl InputFormat {
    pub fn time_tag(header_lines: usize, delimiter: char) -> Self {
        InputFormat::TimeTag {
            header_lines,
            delimiter,
        }
    }

    pub fn csv(channel: impl Into<ChannelId>) -> Self {
        InputFormat::SingleChannelCsv {
            channel: channel.into(),
            header_lines: 1,
        }
    }

    fn header_lines(&self) -> usize {
        match self {
            InputFormat::TimeTag { header_lines, .. }
            | InputFormat::SingleChannelCsv { header_lines, .. } => *header_lines,
        }
    }

    /// Parse one data line. Blank lines give `Ok(None)`.
    pub fn parse_line(&self, line: &str) -> std::result::Result<Option<EventRecord>, String> {
        match self {
            InputFormat::TimeTag { delimiter, .. } => parse_time_tag_line(line, *delimiter),
            InputFormat::SingleChannelCsv { channel, .. } => parse_csv_line(line, *channel),
        }
    }
}

/// Parse `timestamp<delimiter>channel`.
pub fn parse_time_tag_line(
    line: &str,
    delimiter: char,
) -> std::result::Result<Option<EventRecord>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (ts, ch) = line
        .split_once(delimiter)
        .ok_or_else(|| format!("expected 'timestamp{delimiter}channel'"))?;
    if ch.contains(delimiter) {
        return Err(format!("more than two '{delimiter}'-separated fields"));
    }
    let timestamp = parse_timestamp(ts)?;
    let channel = ch.parse::<ChannelId>()?;
    Ok(Some(EventRecord::new(channel, timestamp)))
}

/// Parse the timestamp column of a single-channel CSV line.
pub fn parse_csv_line(
    line: &str,
    channel: ChannelId,
) -> std::result::Result<Option<EventRecord>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let ts = line.split(',').next().unwrap_or(line);
    Ok(Some(EventRecord::new(channel, parse_timestamp(ts)?)))
}

fn parse_timestamp(field: &str) -> std::result::Result<i64, String> {
    let field = field.trim();
    field
        .parse::<i64>()
        .map_err(|e| format!("invalid timestamp '{field}': {e}"))
}

/// Read records from `reader`; `path` is only used in error messages.
pub fn read_records(
    reader: impl BufRead,
    path: &Path,
    format: &InputFormat,
) -> Result<Vec<EventRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate().skip(format.header_lines()) {
        let line = line?;
        let parsed = format.parse_line(&line).map_err(|message| Error::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        })?;
        records.extend(parsed);
    }
    Ok(records)
}

/// Read every record of one file.
pub fn load_file(path: &Path, format: &InputFormat) -> Result<Vec<EventRecord>> {
    let file = File::open(path)?;
    let records = read_records(BufReader::new(file), path, format)?;
    tracing::debug!(path = %path.display(), events = records.len(), "read time-tag file");
    Ok(records)
}

/// Expand `paths` into files: directories contribute their regular files in
/// name order, files are kept as given.
pub fn input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)?
                .map(|e| e.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.retain(|p| p.is_file());
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Load files and directories into one event log.
pub fn load_paths(paths: &[PathBuf], format: &InputFormat) -> Result<EventLog> {
    let files = input_files(paths)?;
    if files.is_empty() {
        return Err(Error::insufficient("no input files"));
    }
    let mut records = Vec::new();
    for file in &files {
        records.extend(load_file(file, format)?);
    }
    Ok(EventLog::from_records(records))
}

/// Load each file into its own event log, in [`input_files`] order.
pub fn load_each(paths: &[PathBuf], format: &InputFormat) -> Result<Vec<(PathBuf, EventLog)>> {
    let files = input_files(paths)?;
    if files.is_empty() {
        return Err(Error::insufficient("no input files"));
    }
    files
        .into_iter()
        .map(|file| {
            let log = EventLog::from_records(load_file(&file, format)?);
            Ok((file, log))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(text: &str, format: InputFormat) -> Result<Vec<EventRecord>> {
        read_records(Cursor::new(text), Path::new("mem.txt"), &format)
    }

    #[test]
    fn parses_time_tag_export() {
        let text = "h1\nh2\n100;3\n\n 101 ; 1 \n99;2\n";
        let recs = read(text, InputFormat::time_tag(2, ';')).unwrap();
        assert_eq!(
            recs,
            vec![
                EventRecord::new(3u32, 100),
                EventRecord::new(1u32, 101),
                EventRecord::new(2u32, 99),
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_record() {
        let text = "header\n100;3\n10x;1\n";
        let err = read(text, InputFormat::time_tag(1, ';')).unwrap_err();
        match err {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("10x"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_delimiter_is_a_parse_error() {
        assert!(parse_time_tag_line("100 3", ';').is_err());
        assert!(parse_time_tag_line("100;3;4", ';').is_err());
        assert!(parse_time_tag_line("100;-3", ';').is_err());
        assert_eq!(parse_time_tag_line("  ", ';'), Ok(None));
    }

    #[test]
    fn csv_takes_first_column() {
        let text = "timestamp,extra\n500,a\n -20 ,b\n";
        let recs = read(text, InputFormat::csv(7u32)).unwrap();
        assert_eq!(
            recs,
            vec![EventRecord::new(7u32, 500), EventRecord::new(7u32, -20)]
        );
    }

    #[test]
    fn directory_is_read_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "200;1\n").unwrap();
        std::fs::write(dir.path().join("a.txt"), "100;1\n300;2\n").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let files = input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let log = load_paths(&[dir.path().to_path_buf()], &InputFormat::time_tag(0, ';')).unwrap();
        assert_eq!(log.channel(ChannelId(1)).unwrap().timestamps(), &[100, 200]);
        assert_eq!(log.total_events(), 3);
    }

    #[test]
    fn each_file_keeps_its_own_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run1.csv"), "t\n10\n20\n").unwrap();
        std::fs::write(dir.path().join("run2.csv"), "t\n5\n").unwrap();

        let logs = load_each(&[dir.path().to_path_buf()], &InputFormat::csv(4u32)).unwrap();
        let sizes: Vec<usize> = logs.iter().map(|(_, log)| log.total_events()).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert!(logs[0].0.ends_with("run1.csv"));
        assert_eq!(logs[1].1.channel(ChannelId(4)).unwrap().timestamps(), &[5]);
    }

    #[test]
    fn empty_directory_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_paths(&[dir.path().to_path_buf()], &InputFormat::time_tag(0, ';')),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_file(Path::new("/nonexistent/tt.txt"), &InputFormat::time_tag(0, ';'))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
