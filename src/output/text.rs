//! Plain-text rendering of run reports.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::dedupe::DedupeSummary;
use crate::rename::{RenameSummary, SidecarOutcome};

/// Write a human-readable remove-duplicates report.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_dedupe_summary<W: Write>(writer: &mut W, summary: &DedupeSummary) -> io::Result<()> {
    let verb = if summary.dry_run { "Would remove" } else { "Removed" };
    for removed in &summary.removed {
        writeln!(
            writer,
            "{verb} {} (kept {})",
            removed.path.display(),
            removed.kept.display()
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "Root:            {}", summary.root.display())?;
    writeln!(writer, "Files seen:      {}", summary.files_seen)?;
    writeln!(writer, "Newly indexed:   {}", summary.registered)?;
    writeln!(writer, "Already indexed: {}", summary.unchanged)?;
    if summary.repointed > 0 {
        writeln!(writer, "Re-pointed:      {}", summary.repointed)?;
    }
    if summary.skipped_empty > 0 {
        writeln!(writer, "Empty (skipped): {}", summary.skipped_empty)?;
    }
    writeln!(
        writer,
        "Duplicates:      {} ({})",
        summary.removed.len(),
        ByteSize::b(summary.bytes_freed())
    )?;
    if summary.has_failures() {
        writeln!(writer, "Failures:        {}", summary.failures.len())?;
    }
    if summary.dry_run {
        writeln!(writer, "Dry run: no files were removed and the index was not updated.")?;
    }
    Ok(())
}

/// Write a human-readable rename report.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_rename_summary<W: Write>(writer: &mut W, summary: &RenameSummary) -> io::Result<()> {
    for book in &summary.renamed {
        writeln!(writer, "{} -> {}", book.from.display(), book.to.display())?;
        if let Some(SidecarOutcome::Renamed { from, to }) = &book.sidecar {
            writeln!(writer, "{} -> {}", from.display(), to.display())?;
        }
    }
    for failure in &summary.failures {
        writeln!(
            writer,
            "{} failed for {}: {}",
            failure.action,
            failure.path.display(),
            failure.message
        )?;
    }
    writeln!(
        writer,
        "Renamed {} books, {} already named, {} skipped, {} failed",
        summary.renamed.len(),
        summary.unchanged,
        summary.skipped.len(),
        summary.failures.len()
    )
}
