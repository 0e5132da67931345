//! Filter policies reducing the category table to a working subset.
//!
//! All three policies derive a dominant category per retained row; the
//! threshold comparison is inclusive and row order follows the table.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::CategoryTable;

/// How the working subset is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterPolicy {
    /// Keep rows where one named category meets the threshold.
    SpecificCategory { name: String, threshold: f64 },
    /// Keep rows whose maximum over `consider` meets the threshold.
    /// An empty `consider` means every category.
    AnyCategoryMax { threshold: f64, consider: Vec<String> },
    /// Keep everything.
    AllLocations,
}

impl FilterPolicy {
    /// One-line description shown to the operator after applying.
    pub fn describe(&self) -> String {
        match self {
            FilterPolicy::SpecificCategory { name, threshold } => {
                format!("{name} >= {threshold}%")
            }
            FilterPolicy::AnyCategoryMax { threshold, consider } => {
                if consider.is_empty() {
                    format!("max % across all categories >= {threshold}%")
                } else {
                    format!("max % across {} categories >= {threshold}%", consider.len())
                }
            }
            FilterPolicy::AllLocations => "all locations (no filter)".to_string(),
        }
    }
}

/// A retained row with its derived dominant-category attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRow {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Name of the highest-valued considered category.
    pub max_category: String,
    pub max_percentage: f64,
}

/// The working subset, in table order. May be empty; labeling and
/// navigation treat an empty subset as a set of no-ops.
#[derive(Debug, Clone, Default)]
pub struct FilteredSubset {
    pub rows: Vec<FilteredRow>,
}

impl FilteredSubset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Apply a filter policy to the table.
///
/// Unknown category names are validation errors and leave no state
/// behind; an empty result is valid.
pub fn apply(table: &CategoryTable, policy: &FilterPolicy) -> Result<FilteredSubset> {
    if table.categories.is_empty() {
        return Err(Error::EmptyCategorySet("category table".to_string()));
    }

    let rows = match policy {
        FilterPolicy::SpecificCategory { name, threshold } => {
            let idx = category_index(table, name)?;
            table
                .rows
                .iter()
                .filter(|r| r.values[idx] >= *threshold)
                .map(|r| FilteredRow {
                    id: r.id.clone(),
                    lat: r.lat,
                    lon: r.lon,
                    max_category: name.clone(),
                    max_percentage: r.values[idx],
                })
                .collect()
        }
        FilterPolicy::AnyCategoryMax { threshold, consider } => {
            let indices = consider_indices(table, consider)?;
            table
                .rows
                .iter()
                .filter_map(|r| {
                    let (cat, max) = row_max(table, &r.values, &indices);
                    (max >= *threshold).then(|| FilteredRow {
                        id: r.id.clone(),
                        lat: r.lat,
                        lon: r.lon,
                        max_category: cat,
                        max_percentage: max,
                    })
                })
                .collect()
        }
        FilterPolicy::AllLocations => {
            let indices: Vec<usize> = (0..table.categories.len()).collect();
            table
                .rows
                .iter()
                .map(|r| {
                    let (cat, max) = row_max(table, &r.values, &indices);
                    FilteredRow {
                        id: r.id.clone(),
                        lat: r.lat,
                        lon: r.lon,
                        max_category: cat,
                        max_percentage: max,
                    }
                })
                .collect()
        }
    };

    Ok(FilteredSubset { rows })
}

fn category_index(table: &CategoryTable, name: &str) -> Result<usize> {
    table
        .categories
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| Error::UnknownCategory(name.to_string()))
}

/// Resolve the consider-set to column indices; empty means all.
fn consider_indices(table: &CategoryTable, consider: &[String]) -> Result<Vec<usize>> {
    if consider.is_empty() {
        return Ok((0..table.categories.len()).collect());
    }
    consider.iter().map(|n| category_index(table, n)).collect()
}

/// Argmax over the considered columns. Ties keep the first maximal
/// category in column order. `indices` is never empty here.
fn row_max(table: &CategoryTable, values: &[f64], indices: &[usize]) -> (String, f64) {
    let mut best = indices[0];
    for &i in &indices[1..] {
        if values[i] > values[best] {
            best = i;
        }
    }
    (table.categories[best].clone(), values[best])
}
