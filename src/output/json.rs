//! JSON output formatter for scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "id": "5d41402a...",
//!       "kind": "exact",
//!       "similarity": 1.0,
//!       "total_size": 15,
//!       "wasted_space": 10,
//!       "files": [
//!         { "path": "/sdcard/a.txt", "size": 5, "modified_secs": 1700000000 }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "groups": 1,
//!     "total_duplicates": 2,
//!     "total_wasted_space": 10,
//!     "files_scanned": 4,
//!     "scan_duration_ms": 12
//!   }
//! }
//! ```

use std::io::Write;
use std::time::SystemTime;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, DuplicateKind, ScanResult};

/// One member in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Absolute path
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time as seconds since the Unix epoch
    pub modified_secs: u64,
}

/// One group in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Group id
    pub id: String,
    /// Exact or similar_image
    pub kind: DuplicateKind,
    /// 1.0 for exact groups
    pub similarity: f32,
    /// Combined size of all members
    pub total_size: u64,
    /// Reclaimable bytes
    pub wasted_space: u64,
    /// Members, oldest first
    pub files: Vec<JsonFile>,
}

impl From<&DuplicateGroup> for JsonGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            id: group.id.clone(),
            kind: group.kind,
            similarity: group.similarity,
            total_size: group.total_size,
            wasted_space: group.wasted_space,
            files: group
                .files
                .iter()
                .map(|f| JsonFile {
                    path: f.path.display().to_string(),
                    size: f.size,
                    modified_secs: f
                        .modified
                        .duration_since(SystemTime::UNIX_EPOCH)
                        .map_or(0, |d| d.as_secs()),
                })
                .collect(),
        }
    }
}

/// Totals in JSON form.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of groups
    pub groups: usize,
    /// Redundant copies across all groups
    pub total_duplicates: usize,
    /// Reclaimable bytes across all groups
    pub total_wasted_space: u64,
    /// Files hashed
    pub files_scanned: usize,
    /// Scan duration in milliseconds
    pub scan_duration_ms: u64,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Groups, largest waste first
    pub groups: Vec<JsonGroup>,
    /// Totals
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Convert a scan result.
    #[must_use]
    pub fn new(result: &ScanResult) -> Self {
        Self {
            groups: result.groups.iter().map(JsonGroup::from).collect(),
            summary: JsonSummary {
                groups: result.groups.len(),
                total_duplicates: result.total_duplicates,
                total_wasted_space: result.total_wasted_space,
                files_scanned: result.files_scanned,
                scan_duration_ms: u64::try_from(result.scan_duration.as_millis()).unwrap_or(u64::MAX),
            },
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)
    }
}
