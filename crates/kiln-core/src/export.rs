//! Export of labeled tiles to a flat CSV.
//!
//! Records are emitted in subset order with a derived 1-based sequence
//! number; only labeled rows appear. The output filename carries a
//! timestamp so repeated exports never collide.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::session::LabelSession;

/// One exported row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    /// 1-based position within the subset, derived at export time.
    pub image_number: usize,
    pub filename: String,
    pub lat: f64,
    pub lon: f64,
    /// 0 = no kiln, 1 = kiln.
    pub brick_kiln: u8,
    pub dominant_category: String,
    pub max_percentage: f64,
}

/// Join the label store against the subset.
///
/// Every label must match a subset row; subset and labels are replaced
/// together, so a dangling label means the lifecycle invariant broke
/// and the export refuses rather than emit a partial set.
pub fn records(session: &LabelSession) -> Result<Vec<ExportRecord>> {
    let mut out = Vec::with_capacity(session.labeled_count());
    for (i, row) in session.subset().rows.iter().enumerate() {
        if let Some(label) = session.label_of(&row.id) {
            out.push(ExportRecord {
                image_number: i + 1,
                filename: row.id.clone(),
                lat: row.lat,
                lon: row.lon,
                brick_kiln: label.as_u8(),
                dominant_category: row.max_category.clone(),
                max_percentage: row.max_percentage,
            });
        }
    }

    if out.len() != session.labeled_count() {
        let dangling = session
            .labels()
            .keys()
            .find(|id| !session.subset().rows.iter().any(|r| &r.id == *id))
            .cloned()
            .unwrap_or_default();
        return Err(Error::LabelJoin(dangling));
    }
    Ok(out)
}

const HEADER: &str = "image_number,filename,lat,lon,brick_kiln,dominant_category,max_percentage";

/// `brick_kiln_labels_<YYYYmmdd_HHMMSS>.csv`
pub fn timestamped_filename(now: DateTime<Local>) -> String {
    format!("brick_kiln_labels_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write records under `dir` with a timestamped name; returns the path.
pub fn write_csv(records: &[ExportRecord], dir: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    let path = dir.join(timestamped_filename(now));
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(HEADER);
    out.push('\n');
    for r in records {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.image_number,
            csv_escape(&r.filename),
            r.lat,
            r.lon,
            r.brick_kiln,
            csv_escape(&r.dominant_category),
            r.max_percentage
        ));
    }
    fs::write(&path, out)?;
    Ok(path)
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilteredRow, FilteredSubset};
    use crate::session::{Label, LabelPolicy, LabelSession};
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn one_row_session() -> LabelSession {
        let subset = FilteredSubset {
            rows: vec![FilteredRow {
                id: "28.6583_76.2294.png".to_string(),
                lat: 28.6583,
                lon: 76.2294,
                max_category: "Built-up".to_string(),
                max_percentage: 60.0,
            }],
        };
        LabelSession::new(subset, LabelPolicy::Explicit)
    }

    #[test]
    fn records_join_labels_against_subset() {
        let mut session = one_row_session();
        session.set_label(Label::Present);

        let recs = records(&session).unwrap();
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.image_number, 1);
        assert_eq!(r.filename, "28.6583_76.2294.png");
        assert_relative_eq!(r.lat, 28.6583);
        assert_relative_eq!(r.lon, 76.2294);
        assert_eq!(r.brick_kiln, 1);
        assert_eq!(r.dominant_category, "Built-up");
        assert_relative_eq!(r.max_percentage, 60.0);
    }

    #[test]
    fn unlabeled_rows_are_not_exported() {
        let session = one_row_session();
        assert!(records(&session).unwrap().is_empty());
    }

    #[test]
    fn records_follow_subset_order_not_labeling_order() {
        let subset = FilteredSubset {
            rows: (0..3)
                .map(|i| FilteredRow {
                    id: format!("2{i}.0_7{i}.0.png"),
                    lat: 20.0 + i as f64,
                    lon: 70.0 + i as f64,
                    max_category: "Built-up".to_string(),
                    max_percentage: 90.0,
                })
                .collect(),
        };
        let mut session = LabelSession::new(subset, LabelPolicy::Explicit);
        session.goto(2).unwrap();
        session.set_label(Label::Present);
        session.goto(0).unwrap();
        session.set_label(Label::Absent);

        let recs = records(&session).unwrap();
        let numbers: Vec<usize> = recs.iter().map(|r| r.image_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn timestamped_filename_avoids_collisions_across_runs() {
        let t1 = Local.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let t2 = Local.with_ymd_and_hms(2024, 3, 5, 9, 30, 1).unwrap();
        assert_eq!(timestamped_filename(t1), "brick_kiln_labels_20240305_093000.csv");
        assert_ne!(timestamped_filename(t1), timestamped_filename(t2));
    }

    #[test]
    fn write_csv_emits_header_and_rows() {
        let mut session = one_row_session();
        session.set_label(Label::Present);
        let recs = records(&session).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap();
        let path = write_csv(&recs, dir.path(), now).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(HEADER));
        assert_eq!(
            lines.next(),
            Some("1,28.6583_76.2294.png,28.6583,76.2294,1,Built-up,60")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_escape_quotes_awkward_fields() {
        assert_eq!(csv_escape("Built-up"), "Built-up");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
