//! In-memory land-cover table and CSV ingestion.
//!
//! One table per session, loaded from a comma-separated file with an
//! identifier column (`filename`, or the first column) and N numeric
//! category columns. Bad rows are skipped with a warning; a file with
//! no numeric columns at all is rejected outright.

use std::fs;
use std::path::{Path, PathBuf};

use crate::coords;
use crate::error::{Error, Result};

/// One tile: identifier, coordinates extracted from it, and category
/// values aligned to [`CategoryTable::categories`].
#[derive(Debug, Clone, PartialEq)]
pub struct TileRow {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub values: Vec<f64>,
}

/// Ordered tile rows sharing one category-name set.
///
/// Category names keep the column order of the source file; that order
/// is what breaks ties when a dominant category is derived downstream.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    /// Header name of the identifier column.
    pub id_column: String,
    pub categories: Vec<String>,
    pub rows: Vec<TileRow>,
}

impl CategoryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of a table load: the table plus non-fatal row warnings.
#[derive(Debug)]
pub struct LoadReport {
    pub table: CategoryTable,
    pub warnings: Vec<String>,
    pub used_fallback_encoding: bool,
}

/// Load a land-cover CSV.
///
/// The file is decoded as UTF-8, falling back to Latin-1 when that
/// fails. Rows with the wrong field count, unparseable numerics, or an
/// identifier that does not encode coordinates are dropped and reported
/// in [`LoadReport::warnings`]; the load itself keeps going.
pub fn load_csv(path: &Path) -> Result<LoadReport> {
    let bytes = fs::read(path)?;
    let (text, used_fallback_encoding) = decode(&bytes);

    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    let (_, header_line) = lines
        .next()
        .ok_or_else(|| Error::EmptyCategorySet(path.display().to_string()))?;
    let header: Vec<String> = header_line.split(',').map(|c| c.trim().to_string()).collect();

    // Identifier column: `filename` if present, else the first column.
    let id_idx = header
        .iter()
        .position(|c| c.eq_ignore_ascii_case("filename"))
        .unwrap_or(0);

    let data: Vec<(usize, &str)> = lines.collect();

    // The first well-formed row decides which columns are numeric,
    // matching how the original tool selected its category columns.
    let category_idx = numeric_columns(&header, id_idx, &data)
        .unwrap_or_else(|| (0..header.len()).filter(|&i| i != id_idx).collect());
    if category_idx.is_empty() {
        return Err(Error::EmptyCategorySet(path.display().to_string()));
    }

    let mut warnings = Vec::new();
    let mut rows = Vec::new();

    for (line_no, line) in data {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != header.len() {
            warnings.push(format!(
                "line {}: {} fields, expected {} - skipped",
                line_no + 1,
                fields.len(),
                header.len()
            ));
            continue;
        }

        let id = fields[id_idx].to_string();
        let ll = match coords::extract(&id) {
            Ok(ll) => ll,
            Err(e) => {
                warnings.push(format!("line {}: {e} - skipped", line_no + 1));
                continue;
            }
        };

        let mut values = Vec::with_capacity(category_idx.len());
        let mut bad_column = None;
        for &i in &category_idx {
            match fields[i].parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => {
                    bad_column = Some(header[i].clone());
                    break;
                }
            }
        }
        if let Some(col) = bad_column {
            warnings.push(format!("line {}: non-numeric `{col}` value - skipped", line_no + 1));
            continue;
        }

        rows.push(TileRow { id, lat: ll.lat, lon: ll.lon, values });
    }

    let categories = category_idx.iter().map(|&i| header[i].clone()).collect();
    Ok(LoadReport {
        table: CategoryTable {
            id_column: header[id_idx].clone(),
            categories,
            rows,
        },
        warnings,
        used_fallback_encoding,
    })
}

/// Numeric-column indices taken from the first row whose identifier
/// parses and whose field count matches the header. None when no such
/// row exists (header-only files keep every non-id column).
fn numeric_columns(header: &[String], id_idx: usize, data: &[(usize, &str)]) -> Option<Vec<usize>> {
    for (_, line) in data {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != header.len() || coords::extract(fields[id_idx]).is_err() {
            continue;
        }
        return Some(
            (0..header.len())
                .filter(|&i| i != id_idx && fields[i].parse::<f64>().is_ok())
                .collect(),
        );
    }
    None
}

/// UTF-8 first, Latin-1 as the retry encoding.
fn decode(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), false),
        Err(_) => (bytes.iter().map(|&b| b as char).collect(), true),
    }
}

/// List candidate CSVs: `*.csv` directly under `dir`, then under
/// `dir/data` when that exists. Sorted for a stable pick order.
pub fn available_csvs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_csvs(dir, &mut found)?;
    let data = dir.join("data");
    if data.is_dir() {
        collect_csvs(&data, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn collect_csvs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_well_formed_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "tiles.csv",
            "filename,Built-up,Vegetation\n28.6583_76.2294.png,60,40\n29.0_77.0.png,5,95\n",
        );

        let report = load_csv(&path).unwrap();
        assert!(report.warnings.is_empty());
        assert!(!report.used_fallback_encoding);

        let table = report.table;
        assert_eq!(table.id_column, "filename");
        assert_eq!(table.categories, vec!["Built-up", "Vegetation"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].values, vec![60.0, 40.0]);
        assert!((table.rows[0].lat - 28.6583).abs() < 1e-12);
        assert!((table.rows[1].lon - 77.0).abs() < 1e-12);
    }

    #[test]
    fn skips_malformed_rows_with_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "tiles.csv",
            "filename,Built-up\n28.0_76.0.png,60\nnot_an_id.png,10\n29.0_77.0.png,oops\n30.0_78.0.png,20,extra\n31.0_79.0.png,30\n",
        );

        let report = load_csv(&path).unwrap();
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.warnings.len(), 3);
        assert_eq!(report.table.rows[1].id, "31.0_79.0.png");
    }

    #[test]
    fn no_numeric_columns_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "tiles.csv",
            "filename,notes\n28.0_76.0.png,hello\n",
        );
        assert!(matches!(load_csv(&path), Err(Error::EmptyCategorySet(_))));
    }

    #[test]
    fn non_numeric_column_is_excluded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "tiles.csv",
            "filename,region,Built-up\n28.0_76.0.png,haryana,60\n29.0_77.0.png,up,95\n",
        );

        let report = load_csv(&path).unwrap();
        assert_eq!(report.table.categories, vec!["Built-up"]);
        assert_eq!(report.table.len(), 2);
        assert_eq!(report.table.rows[1].values, vec![95.0]);
    }

    #[test]
    fn latin1_content_loads_via_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiles.csv");
        // 0xE9 is 'é' in Latin-1 but invalid standalone UTF-8.
        let bytes = b"filename,Barren-\xe9\n28.0_76.0.png,50\n".to_vec();
        fs::write(&path, &bytes).unwrap();

        let report = load_csv(&path).unwrap();
        assert!(report.used_fallback_encoding);
        assert_eq!(report.table.categories, vec!["Barren-\u{e9}"]);
        assert_eq!(report.table.len(), 1);
    }

    #[test]
    fn discovers_csvs_in_dir_and_data_subdir() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "b.csv", "x\n");
        write_csv(dir.path(), "a.csv", "x\n");
        fs::create_dir(dir.path().join("data")).unwrap();
        write_csv(&dir.path().join("data"), "c.csv", "x\n");
        write_csv(dir.path(), "notes.txt", "x\n");

        let found = available_csvs(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
    }
}
