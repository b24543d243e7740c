//! Scanner module for reading recording-directory listings.
//!
//! Provides the per-cycle flat directory listing plus the helpers that decide
//! which entries are video files and whether a detection result already
//! exists for them.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension of the result file the external detector leaves next to a
/// video; its existence marks the video as already processed.
pub const RESULT_EXTENSION: &str = "edl";

/// A file observed in a scan-cycle directory listing.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name component.
    pub file_name: String,
    /// File size in bytes at listing time.
    pub size_bytes: u64,
    /// Last modified time of the file.
    pub modified: SystemTime,
}

/// Reads one flat listing of `dir`, in directory order.
///
/// Only regular files are returned; subdirectories are never descended into
/// and no sorting is applied. Entries whose metadata cannot be read are
/// skipped. Listings are taken fresh every cycle; nothing is cached.
pub fn read_listing(dir: &Path) -> Result<Vec<FileEntry>, std::io::Error> {
    use walkdir::WalkDir;

    let mut entries = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            // A failure on the directory itself (missing, unreadable) aborts
            // the listing; entries that vanish mid-scan are skipped.
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(_) => continue,
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();

        if let Ok(metadata) = entry.metadata() {
            let size_bytes = metadata.len();
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            entries.push(FileEntry {
                path: entry.into_path(),
                file_name,
                size_bytes,
                modified,
            });
        }
    }

    Ok(entries)
}

/// Returns the file name minus its recognized video extension (matched
/// case-insensitively against the configured list), or `None` when the
/// name carries no recognized extension.
pub fn video_basename<'a>(name: &'a str, extensions: &[String]) -> Option<&'a str> {
    let (base, ext) = name.rsplit_once('.')?;
    if base.is_empty() {
        return None;
    }
    extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        .then_some(base)
}

/// Checks if a file name has one of the recognized video extensions
/// (case-insensitive).
pub fn is_video_file(name: &str, extensions: &[String]) -> bool {
    video_basename(name, extensions).is_some()
}

/// Constructs the result-marker path for a given video file.
///
/// The marker replaces the video extension with `.edl`.
/// For example: `/media/show.mpg` -> `/media/show.edl`
pub fn result_marker_path(video_path: &Path) -> PathBuf {
    video_path.with_extension(RESULT_EXTENSION)
}

/// Checks if a result marker exists for the given video file.
pub fn has_result_marker(video_path: &Path) -> bool {
    result_marker_path(video_path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn extensions() -> Vec<String> {
        vec!["mpg".to_string(), "mpeg".to_string(), "ts".to_string()]
    }

    #[test]
    fn test_is_video_file() {
        let exts = extensions();
        assert!(is_video_file("show.mpg", &exts));
        assert!(is_video_file("show.MPG", &exts)); // case-insensitive
        assert!(is_video_file("show.Mpeg", &exts));
        assert!(is_video_file("show.2024.ts", &exts));
        assert!(!is_video_file("show.txt", &exts));
        assert!(!is_video_file("show.edl", &exts));
        assert!(!is_video_file("show", &exts)); // no extension
        assert!(!is_video_file(".mpg", &exts)); // empty base
    }

    #[test]
    fn test_video_basename() {
        let exts = extensions();
        assert_eq!(video_basename("show.mpg", &exts), Some("show"));
        assert_eq!(video_basename("show.2024.ts", &exts), Some("show.2024"));
        assert_eq!(video_basename("show.log", &exts), None);
    }

    #[test]
    fn test_result_marker_path() {
        let video = Path::new("/media/recordings/show.mpg");
        assert_eq!(
            result_marker_path(video),
            PathBuf::from("/media/recordings/show.edl")
        );
    }

    #[test]
    fn test_result_marker_path_with_dots_in_name() {
        let video = Path::new("/media/recordings/show.2024.mpg");
        assert_eq!(
            result_marker_path(video),
            PathBuf::from("/media/recordings/show.2024.edl")
        );
    }

    #[test]
    fn test_read_listing_is_flat() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        File::create(root.join("top.mpg")).unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        File::create(root.join("nested").join("below.mpg")).unwrap();

        let listing = read_listing(root).unwrap();

        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].file_name, "top.mpg");
    }

    #[test]
    fn test_read_listing_captures_size() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let mut file = File::create(root.join("show.mpg")).unwrap();
        file.write_all(b"0123456789").unwrap();
        File::create(root.join("empty.mpg")).unwrap();

        let mut listing = read_listing(root).unwrap();
        listing.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        assert_eq!(listing[0].file_name, "empty.mpg");
        assert_eq!(listing[0].size_bytes, 0);
        assert_eq!(listing[1].file_name, "show.mpg");
        assert_eq!(listing[1].size_bytes, 10);
    }

    #[test]
    fn test_read_listing_missing_dir_is_error() {
        let result = read_listing(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_err());
    }

    // *For any* file name, it is recognized as a video if and only if the
    // segment after the final dot matches a configured extension,
    // case-insensitively.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_video_extension_filtering(
            basename in "[a-zA-Z0-9_-]{1,20}",
            ext in prop_oneof![
                // Configured extensions (should pass)
                Just("mpg"), Just("MPG"), Just("Mpg"),
                Just("mpeg"), Just("MPEG"), Just("Mpeg"),
                Just("ts"), Just("TS"), Just("Ts"),
                // Unconfigured extensions (should fail)
                Just("txt"), Just("log"), Just("edl"), Just("mkv"),
                Just("srt"), Just("jpg"), Just("nfo"), Just("tmp"),
            ],
        ) {
            let exts = extensions();
            let name = format!("{}.{}", basename, ext);
            let is_video = is_video_file(&name, &exts);

            let expected = matches!(ext.to_lowercase().as_str(), "mpg" | "mpeg" | "ts");

            prop_assert_eq!(
                is_video, expected,
                "Extension '{}' recognition mismatch for '{}'", ext, name
            );

            if expected {
                prop_assert_eq!(video_basename(&name, &exts), Some(basename.as_str()));
            }
        }
    }
}
