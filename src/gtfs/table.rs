use std::{collections::HashMap, io::Read};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, warn};

use crate::gtfs;

/// Column name to position, built from a table's first row.
#[derive(Debug, Default)]
pub(crate) struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    fn from_record(record: &StringRecord) -> Self {
        let columns = record
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();
        Self { columns }
    }

    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }
}

/// One data row viewed through its table header.
pub(crate) struct Row<'a> {
    header: &'a Header,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    pub(crate) fn new(header: &'a Header, record: &'a StringRecord) -> Self {
        Self { header, record }
    }

    /// Missing columns, short rows and blank cells all read as `None`.
    pub(crate) fn get(&self, column: &str) -> Option<&'a str> {
        let index = *self.header.columns.get(column)?;
        let value = self.record.get(index)?.trim();
        if value.is_empty() { None } else { Some(value) }
    }

    pub(crate) fn string(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    pub(crate) fn int(&self, column: &str) -> Option<i32> {
        self.get(column).and_then(|value| value.parse().ok())
    }

    pub(crate) fn float(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }

    pub(crate) fn flag(&self, column: &str) -> bool {
        self.int(column).is_some_and(|value| value != 0)
    }
}

/// Outcome of decoding one table file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub file_name: String,
    /// Rows turned into records.
    pub rows: usize,
    /// Rows dropped because they could not be read or were missing a required field.
    pub skipped: usize,
}

/// Decodes a delimited table, handing each record to `emit` as it is built.
///
/// Rows that fail to decode, or for which `build` returns `None`, are counted
/// and skipped. Only I/O failures of the underlying stream and errors returned
/// by `emit` abort the table.
pub(crate) fn read_table<R, T, B, E>(
    reader: R,
    file_name: &str,
    build: B,
    mut emit: E,
) -> Result<TableSummary, gtfs::Error>
where
    R: Read,
    B: Fn(&Row) -> Option<T>,
    E: FnMut(T) -> Result<(), gtfs::Error>,
{
    let mut summary = TableSummary {
        file_name: file_name.to_string(),
        ..Default::default()
    };
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header = match rdr.headers() {
        Ok(record) => Header::from_record(record),
        Err(err) if err.is_io_error() => return Err(err.into()),
        Err(err) => {
            warn!("Unreadable header in {file_name}: {err}");
            return Ok(summary);
        }
    };
    debug!("{file_name} has {} columns", header.len());

    let mut record = StringRecord::new();
    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(_) => {
                summary.skipped += 1;
                continue;
            }
        }
        match build(&Row::new(&header, &record)) {
            Some(value) => {
                emit(value)?;
                summary.rows += 1;
            }
            None => summary.skipped += 1,
        }
    }

    if summary.skipped > 0 {
        warn!(
            skipped = summary.skipped,
            "Skipped unusable rows in {file_name}"
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> (Vec<(Option<String>, Option<i32>)>, TableSummary) {
        let mut out = Vec::new();
        let summary = read_table(
            input.as_bytes(),
            "test.txt",
            |row| Some((row.string("name"), row.int("count"))),
            |value| {
                out.push(value);
                Ok(())
            },
        )
        .unwrap();
        (out, summary)
    }

    #[test]
    fn header_names_are_trimmed() {
        let (rows, _) = collect(" name , count \nfoo,1\n");
        assert_eq!(rows, vec![(Some("foo".into()), Some(1))]);
    }

    #[test]
    fn blank_cells_are_absent() {
        let (rows, _) = collect("name,count\n   ,\n");
        assert_eq!(rows, vec![(None, None)]);
    }

    #[test]
    fn missing_column_is_absent() {
        let (rows, _) = collect("name\nfoo\n");
        assert_eq!(rows, vec![(Some("foo".into()), None)]);
    }

    #[test]
    fn short_rows_are_tolerated() {
        let (rows, summary) = collect("count,name\n7\n8,bar\n");
        assert_eq!(rows, vec![(None, Some(7)), (Some("bar".into()), Some(8))]);
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn non_numeric_becomes_absent() {
        let (rows, _) = collect("name,count\nfoo,many\n");
        assert_eq!(rows, vec![(Some("foo".into()), None)]);
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let (rows, _) = collect("\u{feff}name,count\nfoo,2\n");
        assert_eq!(rows, vec![(Some("foo".into()), Some(2))]);
    }

    #[test]
    fn invalid_utf8_row_is_skipped() {
        let mut input = b"name,count\nfoo,1\n".to_vec();
        input.extend_from_slice(b"\xff\xfe,2\nbar,3\n");
        let mut names = Vec::new();
        let summary = read_table(
            input.as_slice(),
            "test.txt",
            |row| row.string("name"),
            |name| {
                names.push(name);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(names, vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn empty_file_yields_nothing() {
        let (rows, summary) = collect("");
        assert!(rows.is_empty());
        assert_eq!(summary.rows, 0);
    }
}
