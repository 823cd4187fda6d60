//! Line-oriented flat file format.
//!
//! One record per line, `district:town:population:elevation:municipality`, with no escaping.
//! Files are always written in ascending key order because writers are fed an in-order traversal.

use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{CatalogError, ParseError, Result};
use crate::record::Town;

const FIELD_SEPARATOR: char = ':';

/// Records written to a fresh data file when none exists yet.
///
/// `No` is deliberately capitalised differently from `yes`; it is stored as-is.
pub const BOOTSTRAP: &str = "\
AlQuds:Hezma:5000:550:yes
Nablus:Asira:8000:350:yes
AlQuds:Qatanna:3000:300:No
Jenin:Yabad:12000:200:yes
";

pub fn parse_line(line: &str) -> std::result::Result<Town, ParseError> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let &[district, town, population, elevation, municipality] = fields.as_slice() else {
        return Err(ParseError::FieldCount(fields.len()));
    };

    let population = population
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::Population(population.to_owned()))?;
    let elevation = elevation
        .trim()
        .parse::<i32>()
        .map_err(|_| ParseError::Elevation(elevation.to_owned()))?;

    Ok(Town::new(district, town, population, elevation, municipality))
}

pub fn format_line(town: &Town) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        town.district, town.town, town.population, town.elevation, town.municipality
    )
}

/// Write `records` one per line. The sink is flushed before returning.
pub fn write_records<'a, I, W>(records: I, sink: W) -> io::Result<()>
where
    I: IntoIterator<Item = &'a Town>,
    W: Write,
{
    let mut sink = BufWriter::new(sink);
    for town in records {
        writeln!(sink, "{}", format_line(town))?;
    }
    sink.flush()
}

/// Records read from a data file, plus every line that was skipped.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<Town>,
    /// Lines that failed to parse, as [`CatalogError::MalformedRecord`].
    pub skipped: Vec<CatalogError>,
}

/// Parse every line of `source`.
///
/// Malformed lines are skipped, logged and reported; blank lines are ignored. Only I/O failures
/// abort the read.
pub fn read_records<R: BufRead>(source: R) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    for (idx, line) in source.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        match parse_line(line) {
            Ok(town) => report.records.push(town),
            Err(source) => {
                warn!("skipping line {line_no}: {source}");
                report.skipped.push(CatalogError::MalformedRecord {
                    line: line_no,
                    source,
                });
            }
        }
    }
    Ok(report)
}

pub fn load(path: &Path) -> Result<LoadReport> {
    let file = File::open(path)?;
    let report = read_records(io::BufReader::new(file))?;
    debug!(
        "read {} records from {} ({} skipped)",
        report.records.len(),
        path.display(),
        report.skipped.len()
    );
    Ok(report)
}

/// Replace `path` with `records`.
///
/// The records go to a sibling temporary file that is renamed over `path` once fully written, so
/// a failed save leaves the previous contents in place.
pub fn save<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Town>,
{
    let tmp = temp_path(path);
    let written = File::create(&tmp).and_then(|file| {
        write_records(records, &file)?;
        file.sync_all()
    });
    if let Err(err) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

/// Write the bootstrap records to `path`.
pub fn write_bootstrap(path: &Path) -> Result<()> {
    fs::write(path, BOOTSTRAP)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let t = parse_line("AlQuds:Qatanna:3000:300:No").unwrap();
        assert_eq!(t, Town::new("AlQuds", "Qatanna", 3000, 300, "No"));

        let t = parse_line("Jericho:Deir Qarantal:1500:-258:yes").unwrap();
        assert_eq!(t.elevation, -258);
        assert_eq!(t.town, "Deir Qarantal");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_line("AlQuds:Hezma:5000:550"),
            Err(ParseError::FieldCount(4))
        );
        assert_eq!(
            parse_line("a:b:1:2:yes:extra"),
            Err(ParseError::FieldCount(6))
        );
        assert_eq!(
            parse_line("a:b:many:2:yes"),
            Err(ParseError::Population("many".into()))
        );
        assert_eq!(
            parse_line("a:b:-1:2:yes"),
            Err(ParseError::Population("-1".into()))
        );
        assert_eq!(
            parse_line("a:b:1:high:yes"),
            Err(ParseError::Elevation("high".into()))
        );
    }

    #[test]
    fn test_write_records() {
        let towns = [
            Town::new("Nablus", "Asira", 8000, 350, "yes"),
            Town::new("AlQuds", "Hezma", 5000, 550, "yes"),
        ];
        let mut out = Vec::new();
        write_records(&towns, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Nablus:Asira:8000:350:yes\nAlQuds:Hezma:5000:550:yes\n"
        );
    }

    #[test]
    fn test_read_skips_malformed() {
        let input = "AlQuds:Hezma:5000:550:yes\r\n\nbroken line\nJenin:Yabad:x:200:yes\nNablus:Asira:8000:350:yes\n";
        let report = read_records(input.as_bytes()).unwrap();

        let names: Vec<_> = report.records.iter().map(|t| t.town.as_str()).collect();
        assert_eq!(names, ["Hezma", "Asira"]);
        assert_eq!(report.records[0].municipality, "yes");

        let lines: Vec<usize> = report
            .skipped
            .iter()
            .map(|e| match e {
                CatalogError::MalformedRecord { line, .. } => *line,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(lines, [3, 4]);
    }

    #[test]
    fn test_bootstrap_parses() {
        let report = read_records(BOOTSTRAP.as_bytes()).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(report.records.len(), 4);
        assert_eq!(report.records[2].municipality, "No");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("towns.txt");
        let towns = [
            Town::new("Nablus", "Asira", 8000, 350, "yes"),
            Town::new("Jenin", "Yabad", 12000, 200, "yes"),
        ];

        save(&path, &towns).unwrap();
        assert!(!temp_path(&path).exists());
        let report = load(&path).unwrap();
        assert_eq!(report.records, towns);

        // Overwrite with fewer records.
        save(&path, &towns[..1]).unwrap();
        assert_eq!(load(&path).unwrap().records, towns[..1]);
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("towns.txt");
        let err = save(&path, &[Town::new("d", "t", 1, 1, "no")]).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}
