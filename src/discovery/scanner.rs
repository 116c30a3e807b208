//! Corpus file discovery and scanning

use crate::error::{ChordSuggestError, Result, SUPPORTED_CORPUS_FORMATS};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Discovered corpus file with basic metadata
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Whether a path has a corpus file extension (case-insensitive)
pub fn is_corpus_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            SUPPORTED_CORPUS_FORMATS
                .split(',')
                .any(|supported| supported.trim().eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Scan a path (file or directory) for corpus files
///
/// Directory results are sorted by path so training order is reproducible.
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    if !input.exists() {
        return Err(ChordSuggestError::FileNotFound(input.to_path_buf()));
    }

    let mut files = Vec::new();

    if input.is_file() {
        // Single file mode
        if let Some(file) = try_discover_file(input) {
            files.push(file);
        } else {
            return Err(ChordSuggestError::UnsupportedFormat {
                path: input.to_path_buf(),
                format: input
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
    } else if input.is_dir() {
        let walker = if recursive {
            WalkDir::new(input)
        } else {
            WalkDir::new(input).max_depth(1)
        };

        for entry in walker.sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path) {
                    debug!("Discovered: {}", file.path.display());
                    files.push(file);
                }
            }
        }
    }

    info!("Discovered {} corpus files", files.len());

    if files.is_empty() {
        warn!("No corpus files (.{}) found in {}", SUPPORTED_CORPUS_FORMATS, input.display());
    }

    Ok(files)
}

/// Try to create a DiscoveredFile if the path is a corpus file
fn try_discover_file(path: &Path) -> Option<DiscoveredFile> {
    if !is_corpus_file(path) {
        return None;
    }

    let metadata = std::fs::metadata(path).ok()?;

    Some(DiscoveredFile {
        path: path.to_path_buf(),
        size_bytes: metadata.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_corpus_extension_check() {
        assert!(is_corpus_file(Path::new("jazz/standards.txt")));
        assert!(is_corpus_file(Path::new("POP.TXT")));
        assert!(!is_corpus_file(Path::new("model.json")));
        assert!(!is_corpus_file(Path::new("README")));
    }

    #[test]
    fn test_scan_directory_respects_recursion() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "C G\n").unwrap();
        fs::write(dir.path().join("a.txt"), "Am F\n").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.txt"), "Dm G7\n").unwrap();

        let flat = scan(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let deep = scan(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert!(deep.iter().all(|f| f.size_bytes > 0));
    }

    #[test]
    fn test_scan_single_file_and_errors() {
        let dir = TempDir::new().unwrap();
        let corpus = dir.path().join("one.txt");
        fs::write(&corpus, "C F G C\n").unwrap();
        assert_eq!(scan(&corpus, false).unwrap().len(), 1);

        let other = dir.path().join("one.csv");
        fs::write(&other, "C,F").unwrap();
        assert!(matches!(
            scan(&other, false),
            Err(ChordSuggestError::UnsupportedFormat { .. })
        ));

        assert!(matches!(
            scan(&dir.path().join("missing"), true),
            Err(ChordSuggestError::FileNotFound(_))
        ));
    }
}
