use crate::error::{Error, Result};
use crate::{Variant, COL_CHANNEL};
use log::debug;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// The export as read: header names and raw string cells, in file order.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 1-based line number of each row in the source, for error messages
    pub lines: Vec<u64>,
}

impl RawTable {
    /// Reads comma separated text with a header row.
    /// Cells are trimmed but otherwise kept as strings;
    /// rows with a different number of fields than the header are rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<RawTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
        let mut table = RawTable {
            headers,
            rows: Vec::new(),
            lines: Vec::new(),
        };
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            table.rows.push(record.iter().map(String::from).collect());
            table.lines.push(line);
        }
        debug!("read {} rows with columns {:?}", table.rows.len(), table.headers);
        Ok(table)
    }

    /// index of the column with exactly this header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Same as `column`, but a missing column is malformed input.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| Error::MalformedInput(format!("missing required column `{}`", name)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A `Channel` column means one line per channel.
    pub fn variant(&self) -> Variant {
        match self.column(COL_CHANNEL) {
            Some(_) => Variant::PerChannel,
            None => Variant::Single,
        }
    }
}

/// Loads the CSV export at `path`.
/// A path that is missing, not a regular file or not readable is `InputNotFound`.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let not_found = || Error::InputNotFound {
        path: path.to_path_buf(),
    };
    let to_load_err = |e: std::io::Error| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => not_found(),
        _ => Error::Io(e),
    };
    if !path.metadata().map_err(to_load_err)?.is_file() {
        return Err(not_found());
    }
    let file = File::open(path).map_err(to_load_err)?;
    RawTable::from_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_rows_in_order_as_strings() {
        let input = "Date, Channel, Views\n2024-01-02, A, 5\n2024-01-01, B, 0\n";
        let table = RawTable::from_reader(input.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Date", "Channel", "Views"]);
        assert_eq!(table.rows[0], vec!["2024-01-02", "A", "5"]);
        assert_eq!(table.rows[1], vec!["2024-01-01", "B", "0"]);
        assert_eq!(table.lines, vec![2, 3]);
        assert_eq!(table.variant(), Variant::PerChannel);
    }

    #[test]
    fn columns_are_found_by_name_not_position() {
        let table = RawTable::from_reader("Views,Extra,Date\n1,x,2024-01-01\n".as_bytes()).unwrap();
        assert_eq!(table.column("Date"), Some(2));
        assert_eq!(table.column("Views"), Some(0));
        assert_eq!(table.column("views"), None);
        assert_eq!(table.variant(), Variant::Single);
        assert!(matches!(
            table.require_column("Channel"),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let res = RawTable::from_reader("Date,Views\n2024-01-01,1,9\n".as_bytes());
        assert!(matches!(res, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn header_only_is_an_empty_table() {
        let table = RawTable::from_reader("Date,Views\n".as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "read failed"))
        }
    }

    #[test]
    fn read_failures_are_io_errors() {
        assert!(matches!(
            RawTable::from_reader(FailingReader),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let res = RawTable::from_reader(&b"Date,Views\n2024-01-01,\xff\n"[..]);
        assert!(matches!(res, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn directory_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        match load_csv(dir.path()) {
            Err(Error::InputNotFound { path }) => assert_eq!(path, dir.path()),
            other => panic!("unexpected {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let res = load_csv("does/not/exist.csv");
        match res {
            Err(Error::InputNotFound { path }) => assert_eq!(path, Path::new("does/not/exist.csv")),
            other => panic!("unexpected {:?}", other.map(|t| t.len())),
        }
    }
}
