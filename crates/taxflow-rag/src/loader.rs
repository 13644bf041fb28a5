use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taxflow_core::Metadata;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Extensions picked up when the caller does not name any.
pub const DEFAULT_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx"];

const MAX_FILENAME_LEN: usize = 255;

#[allow(clippy::expect_used)]
static TAX_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("tax year pattern is valid"));

#[allow(clippy::expect_used)]
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("filename pattern is valid"));

/// A document read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDocument {
    /// Full path.
    pub path: PathBuf,
    /// File name.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    /// Text content, or a placeholder for binary formats.
    pub content: String,
}

impl LoadedDocument {
    /// Metadata to attach when ingesting this document.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), self.path.display().to_string().into());
        metadata.insert("name".into(), self.name.clone().into());
        metadata.insert("extension".into(), self.extension.clone().into());
        metadata.insert("tax_year".into(), extract_tax_year(&self.content).into());
        metadata
    }
}

/// Recursively loads every file under `dir` whose extension is listed.
///
/// `.txt` and `.md` files are read as text. Other listed formats get a
/// `[Content from <name>]` placeholder. Unreadable files are skipped with a
/// warning; a missing directory yields an empty list.
pub fn load_documents_from_dir(dir: &Path, extensions: &[&str]) -> Vec<LoadedDocument> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Directory does not exist");
        return Vec::new();
    }

    let wanted: Vec<&str> = extensions.iter().map(|e| e.trim_start_matches('.')).collect();
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !wanted.contains(&extension) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();

        let content = match extension {
            "txt" | "md" => match std::fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load document");
                    continue;
                }
            },
            _ => format!("[Content from {name}]"),
        };

        documents.push(LoadedDocument {
            path: path.to_path_buf(),
            name,
            extension: extension.to_string(),
            content,
        });
    }

    info!(count = documents.len(), dir = %dir.display(), "Loaded documents");
    documents
}

/// Most recent `20xx` year mentioned in `text`, or the current year.
pub fn extract_tax_year(text: &str) -> i32 {
    TAX_YEAR
        .captures_iter(text)
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<i32>().ok()))
        .max()
        .unwrap_or_else(|| Utc::now().year())
}

/// Replaces characters unsafe in file names with `_` and caps the length
/// at 255 characters, keeping the extension.
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized = UNSAFE_FILENAME_CHARS.replace_all(filename, "_").into_owned();
    if sanitized.chars().count() <= MAX_FILENAME_LEN {
        return sanitized;
    }

    match sanitized.rsplit_once('.') {
        Some((stem, ext)) => {
            let available = MAX_FILENAME_LEN.saturating_sub(ext.chars().count() + 1);
            let stem: String = stem.chars().take(available).collect();
            format!("{stem}.{ext}")
        }
        None => sanitized.chars().take(MAX_FILENAME_LEN).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tax_year_picks_latest() {
        assert_eq!(extract_tax_year("Form 1040 for 2022, amended in 2023"), 2023);
        assert_eq!(extract_tax_year("W-2 wage statement 2024"), 2024);
    }

    #[test]
    fn test_extract_tax_year_ignores_embedded_digits() {
        // 1040 is not a year and 120245 has no word boundary around 2024.
        assert_eq!(extract_tax_year("Form 1040 ref 2021 id 120245"), 2021);
    }

    #[test]
    fn test_extract_tax_year_defaults_to_current() {
        assert_eq!(extract_tax_year("no year here"), Utc::now().year());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("w2:2024/final?.pdf"), "w2_2024_final_.pdf");
        assert_eq!(sanitize_filename("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_sanitize_filename_caps_length() {
        let long = format!("{}.pdf", "a".repeat(300));
        let out = sanitize_filename(&long);
        assert_eq!(out.chars().count(), 255);
        assert!(out.ends_with(".pdf"));

        let no_ext = "b".repeat(300);
        assert_eq!(sanitize_filename(&no_ext).chars().count(), 255);
    }

    #[test]
    fn test_load_documents_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rules.txt"), "Standard deduction 2024").unwrap();
        std::fs::create_dir(dir.path().join("forms")).unwrap();
        std::fs::write(dir.path().join("forms").join("w2.pdf"), [0u8, 1, 2]).unwrap();
        std::fs::write(dir.path().join("notes.csv"), "ignored").unwrap();

        let docs = load_documents_from_dir(dir.path(), DEFAULT_EXTENSIONS);
        assert_eq!(docs.len(), 2);

        let pdf = docs.iter().find(|d| d.extension == "pdf").unwrap();
        assert_eq!(pdf.content, "[Content from w2.pdf]");

        let txt = docs.iter().find(|d| d.name == "rules.txt").unwrap();
        assert_eq!(txt.content, "Standard deduction 2024");
        assert_eq!(txt.metadata()["tax_year"], 2024);
    }

    #[test]
    fn test_dotted_extensions_and_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# Filing").unwrap();
        assert_eq!(load_documents_from_dir(dir.path(), &[".md"]).len(), 1);
        assert!(load_documents_from_dir(&dir.path().join("missing"), DEFAULT_EXTENSIONS).is_empty());
    }
}
