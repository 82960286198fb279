use crate::error::{FdError, Result};
use crate::frame::{Cell, Frame};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::Regex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Character encoding of a source file. Agencies are inconsistent here;
/// EPA's UCMR files are Latin-1 while everything else is UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

impl SourceEncoding {
    fn encoding(&self) -> &'static Encoding {
        match self {
            SourceEncoding::Utf8 => UTF_8,
            SourceEncoding::Latin1 => WINDOWS_1252,
        }
    }
}

/// How column names are obtained for a source file.
#[derive(Debug, Clone, Copy)]
pub enum Headers {
    /// First row holds the column names.
    FirstRow,
    /// File has no header row; use these names.
    Named(&'static [&'static str]),
    /// File has a header row, but it is discarded in favor of these
    /// names (positional rename, as with `ce.seasonal`).
    Replace(&'static [&'static str]),
}

/// Where a table's bytes live, relative to the dataset directory.
#[derive(Debug, Clone)]
pub enum Location {
    /// A plain delimited file.
    File(&'static str),
    /// A named member inside one zip archive.
    ZipMember {
        archive: &'static str,
        member: &'static str,
    },
    /// Every member matching a pattern, across every `*.zip` in the
    /// directory, in sorted archive order.
    ZipScan { member_pattern: &'static str },
}

/// Declarative description of one physical source table.
#[derive(Debug, Clone)]
pub struct TableSource {
    pub location: Location,
    pub delimiter: u8,
    pub encoding: SourceEncoding,
    pub headers: Headers,
}

impl TableSource {
    pub fn file(name: &'static str) -> Self {
        Self {
            location: Location::File(name),
            delimiter: b',',
            encoding: SourceEncoding::Utf8,
            headers: Headers::FirstRow,
        }
    }

    pub fn zip_member(archive: &'static str, member: &'static str) -> Self {
        Self {
            location: Location::ZipMember { archive, member },
            ..Self::file("")
        }
    }

    pub fn zip_scan(member_pattern: &'static str) -> Self {
        Self {
            location: Location::ZipScan { member_pattern },
            ..Self::file("")
        }
    }

    /// Tab-delimited (the BLS time-series flat files).
    pub fn tab(mut self) -> Self {
        self.delimiter = b'\t';
        self
    }

    pub fn latin1(mut self) -> Self {
        self.encoding = SourceEncoding::Latin1;
        self
    }

    /// Marks the file headerless, supplying column names positionally.
    pub fn columns(mut self, names: &'static [&'static str]) -> Self {
        self.headers = Headers::Named(names);
        self
    }

    /// Keeps the file's header row out of the data but replaces its
    /// names positionally.
    pub fn replace_header(mut self, names: &'static [&'static str]) -> Self {
        self.headers = Headers::Replace(names);
        self
    }

    fn label(&self) -> String {
        match &self.location {
            Location::File(name) => name.to_string(),
            Location::ZipMember { archive, member } => format!("{}:{}", archive, member),
            Location::ZipScan { member_pattern } => format!("*.zip:{}", member_pattern),
        }
    }
}

/// Fully materializes a source table. Used for reference tables, which
/// are small by construction.
pub fn load_table(source: &TableSource, dir: &Path) -> Result<Frame> {
    let mut out: Option<Frame> = None;
    for_each_segment(source, dir, &mut |reader| {
        read_chunks(reader, source, usize::MAX, true, &mut |frame| {
            match &mut out {
                None => out = Some(frame),
                Some(acc) => acc.extend(frame)?,
            }
            Ok(())
        })
    })?;
    out.ok_or_else(|| FdError::SourceRead(format!("{}: no data found", source.label())))
}

/// Streams a source table as bounded fragments, invoking `f` for each.
/// Fragments arrive in file order, forward-only; each is fully
/// processed before the next is read, so peak memory is one fragment.
pub fn stream_chunks<F>(source: &TableSource, dir: &Path, chunk_size: usize, mut f: F) -> Result<()>
where
    F: FnMut(Frame) -> Result<()>,
{
    for_each_segment(source, dir, &mut |reader| {
        read_chunks(reader, source, chunk_size, false, &mut f)
    })
}

/// Resolves a source's location to one or more byte streams and hands
/// each to `f`. Internal iteration keeps zip member reads (which
/// borrow the open archive) free of self-referential lifetimes.
fn for_each_segment(
    source: &TableSource,
    dir: &Path,
    f: &mut dyn FnMut(&mut dyn Read) -> Result<()>,
) -> Result<()> {
    match &source.location {
        Location::File(name) => {
            let path = dir.join(name);
            let mut file = open_source(&path)?;
            f(&mut file)
        }
        Location::ZipMember { archive, member } => {
            let path = dir.join(archive);
            let mut archive = open_archive(&path)?;
            let mut entry = archive.by_name(member).map_err(|e| {
                FdError::SourceRead(format!("{} in {}: {}", member, path.display(), e))
            })?;
            f(&mut entry)
        }
        Location::ZipScan { member_pattern } => {
            let pattern = Regex::new(member_pattern)?;
            let mut archives: Vec<PathBuf> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("zip"))
                .collect();
            archives.sort();
            if archives.is_empty() {
                return Err(FdError::SourceRead(format!(
                    "no zip archives found in {}",
                    dir.display()
                )));
            }
            for path in archives {
                let mut archive = open_archive(&path)?;
                let members: Vec<String> = archive
                    .file_names()
                    .filter(|name| pattern.is_match(name))
                    .map(String::from)
                    .collect();
                for member in members {
                    debug!(archive = %path.display(), member = %member, "reading archive member");
                    let mut entry = archive.by_name(&member).map_err(|e| {
                        FdError::SourceRead(format!("{} in {}: {}", member, path.display(), e))
                    })?;
                    f(&mut entry)?;
                }
            }
            Ok(())
        }
    }
}

fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| FdError::SourceRead(format!("{}: {}", path.display(), e)))
}

fn open_archive(path: &Path) -> Result<zip::ZipArchive<File>> {
    let file = open_source(path)?;
    zip::ZipArchive::new(file)
        .map_err(|e| FdError::SourceRead(format!("{}: {}", path.display(), e)))
}

fn read_chunks(
    input: &mut dyn Read,
    source: &TableSource,
    chunk_size: usize,
    emit_empty: bool,
    f: &mut dyn FnMut(Frame) -> Result<()>,
) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(source.delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let encoding = source.encoding.encoding();
    let label = source.label();
    let mut record = csv::ByteRecord::new();

    let columns: Vec<String> = match source.headers {
        Headers::Named(names) => names.iter().map(|s| s.to_string()).collect(),
        Headers::FirstRow | Headers::Replace(_) => {
            if !next_record(&mut reader, &mut record, &label)? {
                return Err(FdError::SourceRead(format!(
                    "{}: missing header row",
                    source.label()
                )));
            }
            match source.headers {
                Headers::Replace(names) => names.iter().map(|s| s.to_string()).collect(),
                _ => dedupe_headers(record.iter().map(|field| decode(field, encoding))),
            }
        }
    };

    let mut frame = Frame::new(columns.clone());
    let mut emitted = false;
    while next_record(&mut reader, &mut record, &label)? {
        let row: Vec<Cell> = (0..columns.len())
            .map(|i| {
                let field = record.get(i).unwrap_or(b"");
                let text = decode(field, encoding);
                if text.is_empty() {
                    Cell::Null
                } else {
                    Cell::Text(text)
                }
            })
            .collect();
        frame.push_row(row);
        if frame.len() >= chunk_size {
            f(std::mem::replace(&mut frame, Frame::new(columns.clone())))?;
            emitted = true;
        }
    }
    if !frame.is_empty() || (emit_empty && !emitted) {
        f(frame)?;
    }
    Ok(())
}

fn next_record<R: Read>(
    reader: &mut csv::Reader<R>,
    record: &mut csv::ByteRecord,
    label: &str,
) -> Result<bool> {
    reader
        .read_byte_record(record)
        .map_err(|e| FdError::SourceRead(format!("{}: {}", label, e)))
}

/// Disambiguates repeated header names with a numeric suffix
/// (`footnote_codes`, `footnote_codes.1`, ...), so a declared rename
/// can target the duplicate.
fn dedupe_headers<I: Iterator<Item = String>>(names: I) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let out = if *count == 0 {
                name.clone()
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            out
        })
        .collect()
}

fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).expect("write test file");
    }

    #[test]
    fn loads_comma_delimited_table() {
        let dir = tempdir().expect("tempdir");
        write_file(dir.path(), "lookup.csv", "code,name\nA,Alpha\nB,Beta\n");

        let source = TableSource::file("lookup.csv");
        let frame = load_table(&source, dir.path()).expect("load");
        assert_eq!(frame.columns(), ["code", "name"]);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn loads_tab_delimited_with_padded_fields() {
        let dir = tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "series.txt",
            "series_id\tyear \nCES001\t2016   \n",
        );

        let source = TableSource::file("series.txt").tab();
        let frame = load_table(&source, dir.path()).expect("load");
        assert_eq!(frame.columns(), ["series_id", "year"]);
        assert_eq!(frame.rows()[0][1], Cell::Text("2016".to_string()));
    }

    #[test]
    fn named_columns_treat_first_row_as_data() {
        let dir = tempdir().expect("tempdir");
        write_file(dir.path(), "period.txt", "M01\tJAN\tJanuary\nM02\tFEB\tFebruary\n");

        let source = TableSource::file("period.txt")
            .tab()
            .columns(&["period", "period_abbr", "period_name"]);
        let frame = load_table(&source, dir.path()).expect("load");
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.rows()[0][0], Cell::Text("M01".to_string()));
    }

    #[test]
    fn replace_header_renames_positionally() {
        let dir = tempdir().expect("tempdir");
        write_file(dir.path(), "seasonal.txt", "seasonal_code\tseasonal_text\nS\tSeasonally Adjusted\n");

        let source = TableSource::file("seasonal.txt")
            .tab()
            .replace_header(&["seasonal", "season_text"]);
        let frame = load_table(&source, dir.path()).expect("load");
        assert_eq!(frame.columns(), ["seasonal", "season_text"]);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn empty_fields_become_null() {
        let dir = tempdir().expect("tempdir");
        write_file(dir.path(), "data.csv", "a,b\n1,\n,2\n");

        let frame = load_table(&TableSource::file("data.csv"), dir.path()).expect("load");
        assert_eq!(frame.rows()[0][1], Cell::Null);
        assert_eq!(frame.rows()[1][0], Cell::Null);
    }

    #[test]
    fn streams_in_fragment_order() {
        let dir = tempdir().expect("tempdir");
        let mut content = String::from("id,value\n");
        for i in 0..23 {
            content.push_str(&format!("{},{}\n", i, i * 10));
        }
        write_file(dir.path(), "facts.csv", &content);

        let mut sizes = Vec::new();
        let mut first_ids = Vec::new();
        stream_chunks(&TableSource::file("facts.csv"), dir.path(), 10, |frame| {
            sizes.push(frame.len());
            first_ids.push(frame.rows()[0][0].clone());
            Ok(())
        })
        .expect("stream");
        assert_eq!(sizes, vec![10, 10, 3]);
        assert_eq!(
            first_ids,
            vec![
                Cell::Text("0".to_string()),
                Cell::Text("10".to_string()),
                Cell::Text("20".to_string())
            ]
        );
    }

    #[test]
    fn reads_named_zip_member() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("archive.zip");
        let file = File::create(&path).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("inner.csv", options).expect("start");
        writer.write_all(b"code,name\nA,Alpha\n").expect("member");
        writer.finish().expect("finish");

        let source = TableSource::zip_member("archive.zip", "inner.csv");
        let frame = load_table(&source, dir.path()).expect("load");
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.rows()[0][1], Cell::Text("Alpha".to_string()));
    }

    #[test]
    fn zip_scan_visits_matching_members_across_archives() {
        let dir = tempdir().expect("tempdir");
        for (archive, id) in [("2016.zip", "2016"), ("2017.zip", "2017")] {
            let file = File::create(dir.path().join(archive)).expect("create zip");
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::SimpleFileOptions::default();
            writer
                .start_file(format!("{} all industries.csv", id), options)
                .expect("start");
            writer
                .write_all(format!("year,count\n{},1\n", id).as_bytes())
                .expect("member");
            writer.start_file("readme.txt", options).expect("start");
            writer.write_all(b"ignored").expect("member");
            writer.finish().expect("finish");
        }

        let source = TableSource::zip_scan(r"all industries\.csv");
        let mut years = Vec::new();
        stream_chunks(&source, dir.path(), 1000, |frame| {
            years.push(frame.rows()[0][0].clone());
            Ok(())
        })
        .expect("stream");
        assert_eq!(
            years,
            vec![Cell::Text("2016".to_string()), Cell::Text("2017".to_string())]
        );
    }

    #[test]
    fn duplicate_headers_get_numeric_suffixes() {
        let dir = tempdir().expect("tempdir");
        write_file(dir.path(), "dup.csv", "chg,pct,chg\n1,2,3\n");

        let frame = load_table(&TableSource::file("dup.csv"), dir.path()).expect("load");
        assert_eq!(frame.columns(), ["chg", "pct", "chg.1"]);
    }

    #[test]
    fn missing_file_is_source_read_error() {
        let dir = tempdir().expect("tempdir");
        let err = load_table(&TableSource::file("absent.csv"), dir.path()).unwrap_err();
        assert!(matches!(err, FdError::SourceRead(_)));
    }

    #[test]
    fn missing_zip_member_is_source_read_error() {
        let dir = tempdir().expect("tempdir");
        let file = File::create(dir.path().join("a.zip")).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("present.csv", options).expect("start");
        writer.write_all(b"a\n1\n").expect("member");
        writer.finish().expect("finish");

        let source = TableSource::zip_member("a.zip", "absent.csv");
        assert!(matches!(
            load_table(&source, dir.path()),
            Err(FdError::SourceRead(_))
        ));
    }

    #[test]
    fn latin1_content_decodes() {
        let dir = tempdir().expect("tempdir");
        // "Montréal" with 0xE9 for é, as Latin-1 encodes it.
        let bytes = b"city\tcount\nMontr\xe9al\t1\n";
        fs::write(dir.path().join("cities.txt"), bytes).expect("write");

        let source = TableSource::file("cities.txt").tab().latin1();
        let frame = load_table(&source, dir.path()).expect("load");
        assert_eq!(frame.rows()[0][0], Cell::Text("Montréal".to_string()));
    }
}
