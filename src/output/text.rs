//! Human-readable report of a scan result.

use std::io::Write;

use bytesize::ByteSize;

use crate::duplicates::{DuplicateKind, ScanResult};

/// Plain-text report writer.
pub struct TextOutput<'a> {
    result: &'a ScanResult,
}

impl<'a> TextOutput<'a> {
    /// Wrap a scan result.
    #[must_use]
    pub fn new(result: &'a ScanResult) -> Self {
        Self { result }
    }

    /// Write one block per group, then a summary line.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for group in &self.result.groups {
            let label = match group.kind {
                DuplicateKind::Exact => "Exact duplicates".to_string(),
                DuplicateKind::SimilarImage => {
                    format!("Similar images (>= {:.0}%)", group.similarity * 100.0)
                }
            };
            writeln!(
                writer,
                "{}: {} files, {} reclaimable [{}]",
                label,
                group.len(),
                ByteSize(group.wasted_space),
                group.id
            )?;
            for file in &group.files {
                writeln!(writer, "  {} ({})", file.path.display(), ByteSize(file.size))?;
            }
            writeln!(writer)?;
        }

        writeln!(writer, "{}", self.summary())
    }

    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.result.is_empty() {
            return format!(
                "No duplicates among {} file(s) (scanned in {:.2?})",
                self.result.files_scanned, self.result.scan_duration
            );
        }
        format!(
            "{} group(s), {} duplicate file(s), {} reclaimable among {} file(s) (scanned in {:.2?})",
            self.result.groups.len(),
            self.result.total_duplicates,
            ByteSize(self.result.total_wasted_space),
            self.result.files_scanned,
            self.result.scan_duration
        )
    }
}
