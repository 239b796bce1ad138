//! File system utilities

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::models::AppResult;

/// Maximum length of a sanitized title.
const MAX_TITLE_LEN: usize = 50;

/// Suffixes that mark an in-flight download artifact.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl"];

/// Ensure directory exists
pub fn ensure_dir_exists(path: &Path) -> AppResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Sanitize a media title for use in a filename: strip characters that
/// are illegal in filenames, collapse whitespace runs to one space,
/// trim, and cap the length.
pub fn sanitize_filename(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TITLE_LEN).collect()
}

fn is_partial(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Locate the file produced by a finished download.
///
/// The extractor does not hand back an authoritative path, so this is a
/// heuristic: prefer any non-partial file whose name contains the
/// sanitized title, otherwise fall back to the most recently created
/// non-partial file in the directory.
pub fn find_downloaded_file(dir: &Path, title: &str) -> Option<PathBuf> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !is_partial(n))
        })
        .collect();

    if !title.is_empty() {
        if let Some(matched) = entries.iter().find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(title))
        }) {
            return Some(matched.clone());
        }
    }

    entries
        .into_iter()
        .max_by_key(|p| file_created(p).unwrap_or(SystemTime::UNIX_EPOCH))
}

fn file_created(path: &Path) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    // Creation time is not available on every filesystem; modification
    // time is an acceptable stand-in for "newest file".
    meta.created().or_else(|_| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(b"x").unwrap();
        path
    }

    #[test]
    fn test_sanitize_strips_illegal_characters() {
        assert_eq!(
            sanitize_filename("What? A <Great> Video: \"Part 1\" / 2"),
            "What A Great Video Part 1 2"
        );
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_filename("  too   many\t spaces  "), "too many spaces");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(120);
        assert_eq!(sanitize_filename(&long).len(), 50);
    }

    #[test]
    fn test_find_by_title_match() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Other Clip.mp4");
        let expected = touch(tmp.path(), "My Great Video.mp4");

        let found = find_downloaded_file(tmp.path(), "My Great Video").unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_partial_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "My Great Video.mp4.part");
        touch(tmp.path(), "My Great Video.mp4.ytdl");
        let expected = touch(tmp.path(), "My Great Video.mp4");

        let found = find_downloaded_file(tmp.path(), "My Great Video").unwrap();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_fallback_to_newest_when_title_missing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "older.mp4");
        std::thread::sleep(std::time::Duration::from_millis(20));
        let newest = touch(tmp.path(), "newest.webm");

        let found = find_downloaded_file(tmp.path(), "No Such Title").unwrap();
        assert_eq!(found, newest);
    }

    #[test]
    fn test_empty_directory_yields_none() {
        let tmp = TempDir::new().unwrap();
        assert!(find_downloaded_file(tmp.path(), "anything").is_none());
    }
}
