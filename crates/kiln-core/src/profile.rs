//! Per-variant configuration profile.
//!
//! The four observed labeling screens differ only in defaults: which
//! filter mode starts selected, the threshold, the labeling policy and
//! the basemap. A profile captures those choices so one state machine
//! serves all of them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::map::MapProvider;
use crate::session::LabelPolicy;

/// Filter mode preselected for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    SpecificCategory,
    AnyCategoryMax,
    AllLocations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub filter_mode: FilterMode,
    /// Threshold preloaded into the filter controls.
    pub default_threshold: f64,
    /// Category preselected for specific-category filtering.
    pub default_category: String,
    pub label_policy: LabelPolicy,
    pub map_provider: MapProvider,
    pub zoom: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::AnyCategoryMax,
            default_threshold: 99.90,
            default_category: "Built-up".to_string(),
            label_policy: LabelPolicy::Explicit,
            map_provider: MapProvider::EsriWorldImagery,
            zoom: 16,
        }
    }
}

impl Profile {
    /// Load a profile from a JSON file. Missing fields fall back to
    /// the defaults, so a profile only states what it changes.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
