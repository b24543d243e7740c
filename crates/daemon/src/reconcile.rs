//! Orphan reconciliation for side-car files.
//!
//! Recordings accumulate side-car files (detection results, logs, extracted
//! logos) that outlive their video when the recording is deleted externally.
//! Each cycle the reconciler walks a directory listing and removes side-cars
//! whose video no longer exists.

use crate::scan::{self, FileEntry};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// A side-car file name split at its matched deletable suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixMatch<'a> {
    /// File name with the suffix and its joining dot removed.
    pub base: &'a str,
    /// The configured suffix that matched.
    pub suffix: &'a str,
}

/// Counts from one directory's reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Orphaned side-cars identified in the listing.
    pub orphans: usize,
    /// Orphans actually deleted this pass.
    pub deleted: usize,
}

/// Splits `name` at the longest matching configured suffix.
///
/// Multi-segment suffixes win over their single-segment overlaps so that
/// `show.logo.txt` splits into base `show` against suffix `logo.txt`, never
/// into `show.logo` against `txt`. A file whose whole name is a suffix has
/// no base and is not a side-car.
pub fn match_deletable_suffix<'a>(
    name: &'a str,
    suffixes: &'a [String],
) -> Option<SuffixMatch<'a>> {
    let mut ordered: Vec<&'a String> = suffixes.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));

    for suffix in ordered {
        if let Some(stem) = name.strip_suffix(suffix.as_str()) {
            if let Some(base) = stem.strip_suffix('.') {
                if !base.is_empty() {
                    return Some(SuffixMatch { base, suffix });
                }
            }
        }
    }

    None
}

/// Identifies orphaned side-cars in one directory listing.
///
/// A side-car is an orphan iff no `<base>.<ext>` exists in the same listing
/// for any configured video extension. The check runs against the listing
/// itself, so a side-car and its video observed in the same cycle always
/// stay paired.
pub fn find_orphans(
    listing: &[FileEntry],
    extensions: &[String],
    suffixes: &[String],
) -> Vec<PathBuf> {
    // Base names of every video present in this listing, for sibling lookup.
    let video_bases: HashSet<&str> = listing
        .iter()
        .filter_map(|entry| scan::video_basename(&entry.file_name, extensions))
        .collect();

    listing
        .iter()
        .filter_map(|entry| {
            let matched = match_deletable_suffix(&entry.file_name, suffixes)?;
            if video_bases.contains(matched.base) {
                None
            } else {
                Some(entry.path.clone())
            }
        })
        .collect()
}

/// Deletes (or reports) orphaned side-cars in one directory listing.
///
/// Deletion only happens when `delete_orphans` is set and `preview` is not
/// (dry-run and debug modes both preview); otherwise the intended removal is
/// logged. Deletion failures are logged and skipped: cleanup is best-effort
/// and never stalls the scan cycle.
pub fn reconcile(
    listing: &[FileEntry],
    extensions: &[String],
    suffixes: &[String],
    delete_orphans: bool,
    preview: bool,
) -> ReconcileStats {
    let orphans = find_orphans(listing, extensions, suffixes);
    let mut stats = ReconcileStats {
        orphans: orphans.len(),
        deleted: 0,
    };

    for orphan in orphans {
        if !delete_orphans {
            debug!("Orphan side-car (deletion disabled): {}", orphan.display());
            continue;
        }

        if preview {
            info!("Would delete orphan side-car: {}", orphan.display());
            continue;
        }

        match fs::remove_file(&orphan) {
            Ok(()) => {
                info!("Deleted orphan side-car: {}", orphan.display());
                stats.deleted += 1;
            }
            Err(e) => {
                warn!(
                    "Failed to delete orphan side-car {}: {}",
                    orphan.display(),
                    e
                );
            }
        }
    }

    stats
}
