//! Suite discovery and CSV row loading
//!
//! A suite directory holds one subdirectory per test class; every CSV file
//! inside belongs to that class and each of its data lines is one row.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

use super::registry::{resolve, TestClass};
use super::row::ParameterRow;

/// One CSV file bound to the class its directory names
#[derive(Debug, Clone)]
pub struct SuiteFile {
    pub path: PathBuf,
    /// Report key: the path relative to the suite root, `/`-separated
    pub name: String,
    pub class: TestClass,
}

impl SuiteFile {
    /// Read every row, overlaying `overrides` onto each
    pub fn load_rows(&self, overrides: &ParameterRow) -> Result<Vec<ParameterRow>> {
        let mut rows = read_rows(&self.path)?;
        for row in &mut rows {
            row.merge(overrides);
        }
        Ok(rows)
    }
}

/// Find every suite file below `root`, in sorted path order
///
/// `root` may also be a single CSV file.
pub fn discover(root: &Path) -> Result<Vec<SuiteFile>> {
    if !root.exists() {
        return Err(Error::SuiteRead {
            path: root.display().to_string(),
            error: "no such file or directory".to_string(),
        });
    }

    let mut found = Vec::new();
    if root.is_file() {
        let base = root.parent().and_then(Path::parent).unwrap_or(Path::new(""));
        push_suite(&mut found, base, root.to_path_buf());
    } else {
        walk(root, root, &mut found)?;
    }
    tracing::debug!(root = %root.display(), files = found.len(), "suite discovery done");
    Ok(found)
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<SuiteFile>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| Error::suite_read(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::suite_read(dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_dir() {
            if !hidden {
                walk(root, &path, found)?;
            }
        } else if is_csv(&path) {
            push_suite(found, root, path);
        }
    }
    Ok(())
}

fn push_suite(found: &mut Vec<SuiteFile>, root: &Path, path: PathBuf) {
    let dir_name = path
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(class) = resolve(&dir_name) else {
        tracing::warn!(
            path = %path.display(),
            directory = %dir_name,
            "directory does not name a test class, ignoring file"
        );
        return;
    };

    let relative = path.strip_prefix(root).unwrap_or(&path);
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    found.push(SuiteFile { path, name, class });
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Parse a CSV file with a header line into rows
pub fn read_rows(path: &Path) -> Result<Vec<ParameterRow>> {
    let reader = reader_builder()
        .from_path(path)
        .map_err(|e| Error::suite_read(path, e))?;
    collect_rows(reader).map_err(|e| Error::suite_read(path, e))
}

/// Parse CSV text, as [`read_rows`] does for files
pub fn parse_rows(text: &str) -> Result<Vec<ParameterRow>> {
    collect_rows(reader_builder().from_reader(text.as_bytes())).map_err(|e| Error::SuiteRead {
        path: "<inline>".to_string(),
        error: e.to_string(),
    })
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.flexible(true).trim(csv::Trim::Headers);
    builder
}

fn collect_rows<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> std::result::Result<Vec<ParameterRow>, csv::Error> {
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        // blank lines carry no scenario
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(ParameterRow::from_pairs(
            headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(i, header)| (header, record.get(i).unwrap_or(""))),
        ));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::row::ParamValue;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_parse_rows_with_lists_and_blanks() {
        let rows = parse_rows(
            "description,fromPlace,toPlace,mode,invalid_modes\n\
             campus,\"28.05,-82.40\",\"28.06,-82.41\",BICYCLE,\"['BUS', 'TRAM']\"\n\
             ,,,,\n\
             ,A,B,,\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].description(), Some("campus"));
        assert_eq!(rows[0].text("fromPlace"), Some("28.05,-82.40"));
        assert_eq!(
            rows[0].get("invalid_modes"),
            Some(&ParamValue::List(vec!["BUS".into(), "TRAM".into()]))
        );
        assert_eq!(rows[1].description(), None);
        assert!(!rows[1].has_value("mode"));
    }

    #[test]
    fn test_short_record_fills_empty() {
        let rows = parse_rows("a,b,c\n1,2\n").unwrap();
        assert_eq!(rows[0].text("b"), Some("2"));
        assert!(rows[0].contains_key("c"));
        assert!(!rows[0].has_value("c"));
    }

    #[test]
    fn test_discover_sorted_by_class_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "USFPlanner/b.csv", "fromPlace\nA\n");
        write(dir.path(), "USFPlanner/a.CSV", "fromPlace\nA\n");
        write(dir.path(), "OTPVersion/version.csv", "major,minor\n1,0\n");
        write(dir.path(), "USFGeocoder/geo.csv", "address\nx\n");
        write(dir.path(), ".git/USFPlanner/hidden.csv", "fromPlace\nA\n");
        write(dir.path(), "USFPlanner/notes.txt", "ignored");

        let files = discover(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["OTPVersion/version.csv", "USFPlanner/a.CSV", "USFPlanner/b.csv"]
        );
        assert_eq!(files[0].class, TestClass::OtpVersion);
        assert_eq!(files[1].class, TestClass::UsfPlanner);
    }

    #[test]
    fn test_nested_directories_use_parent_name() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tampa/usfbikerental/stations.csv", "description\nlib\n");

        let files = discover(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].class, TestClass::UsfBikeRental);
        assert_eq!(files[0].name, "tampa/usfbikerental/stations.csv");
    }

    #[test]
    fn test_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "OTPVersion/version.csv", "major,minor\n1,0\n");

        let files = discover(&dir.path().join("OTPVersion/version.csv")).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "OTPVersion/version.csv");
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover(&dir.path().join("nope")),
            Err(Error::SuiteRead { .. })
        ));
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "OTPVersion/version.csv",
            "otp_url,major\nhttp://old/,1\n",
        );
        let files = discover(dir.path()).unwrap();
        let overrides = ParameterRow::from_pairs([("otp_url", "http://new/")]);

        let rows = files[0].load_rows(&overrides).unwrap();
        assert_eq!(rows[0].text("otp_url"), Some("http://new/"));
        assert_eq!(rows[0].text("major"), Some("1"));
    }
}
