use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "json", "xlsx"];

/// A file the user picked for the file-augmented chat.
///
/// Only the path is captured at selection time; the bytes are read when a
/// request is built so the upload always reflects the file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    path: PathBuf,
    name: String,
}

impl AttachedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(ToString::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|value| value.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Content type guessed from the extension, `application/octet-stream`
    /// when unknown.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.path)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// Outcome of picking a file at the selection boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub file: AttachedFile,
    pub notice: Option<String>,
}

/// Resolves user input (a typed path or a path dropped into the terminal) into
/// an attachment. The extension filter is advisory: unsupported types are
/// still selected but come back with a notice.
pub fn select_file(raw: &str) -> Result<FileSelection, String> {
    let cleaned = clean_dropped_path(raw);
    if cleaned.is_empty() {
        return Err("Usage: /attach <path>".to_string());
    }
    let path = PathBuf::from(&cleaned);
    if !path.is_file() {
        return Err(format!("No such file: {cleaned}"));
    }
    let file = AttachedFile::new(path);
    let notice = if file.has_accepted_extension() {
        None
    } else {
        Some(format!(
            "Selected {} (accepted formats: .csv, .json, .xlsx)",
            file.name()
        ))
    };
    Ok(FileSelection { file, notice })
}

/// Returns true when pasted text looks like a single dropped file path.
pub fn looks_like_dropped_file(raw: &str) -> bool {
    let cleaned = clean_dropped_path(raw);
    !cleaned.is_empty() && !cleaned.contains('\n') && Path::new(&cleaned).is_file()
}

fn clean_dropped_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|value| value.strip_suffix('\''))
        .or_else(|| {
            trimmed
                .strip_prefix('"')
                .and_then(|value| value.strip_suffix('"'))
        })
        .unwrap_or(trimmed);
    let unescaped = unquoted.replace("\\ ", " ");
    unescaped
        .strip_prefix("file://")
        .map(ToString::to_string)
        .unwrap_or(unescaped)
}
