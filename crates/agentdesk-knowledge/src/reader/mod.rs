//! Readers turning files and web pages into documents

pub mod json;
pub mod pdf;
pub mod text;
pub mod website;

pub use json::JsonReader;
pub use pdf::PdfReader;
pub use text::TextReader;
pub use website::{extract_text, SelectorRule, WebsiteReader};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{KnowledgeError, KnowledgeResult};

/// Files under `path` (or `path` itself) whose extension is in `extensions`, sorted
pub(crate) fn collect_files(path: &Path, extensions: &[String]) -> KnowledgeResult<Vec<PathBuf>> {
    if !path.exists() {
        return Err(KnowledgeError::read(path.display(), "path does not exist"));
    }

    let matches = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    };

    if path.is_file() {
        return Ok(if matches(path) { vec![path.to_path_buf()] } else { Vec::new() });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && matches(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Document name for a file: its stem with spaces replaced
pub(crate) fn document_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .replace(' ', "_")
}

/// Id of `file` read below `root`: its relative path with `/` separators, or
/// its file name when `file` is the root itself. Unlike the stem, this keeps
/// `a/notes.txt`, `b/notes.txt` and `notes.pdf` apart.
pub(crate) fn source_id(root: &Path, file: &Path) -> String {
    let relative = file
        .strip_prefix(root)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .or_else(|| file.file_name().map(Path::new))
        .unwrap_or(file);

    relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_id_relative_to_root() {
        let root = Path::new("/data/text");
        assert_eq!(source_id(root, Path::new("/data/text/a/notes.txt")), "a/notes.txt");
        assert_eq!(source_id(root, Path::new("/data/text/travel policy.md")), "travel_policy.md");
        let file = Path::new("/data/text/b/notes.txt");
        assert_eq!(source_id(file, file), "notes.txt");
    }
}
