//! Input resolution: check a user-supplied path before the engine sees it.
//!
//! pandoc's own "file not found" message is buried in its stderr and looks
//! like any other conversion failure. Checking up front lets callers
//! distinguish a typo in the path from a document pandoc cannot read.

use crate::error::Doc2MdError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists and is readable, returning it unchanged.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, Doc2MdError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(Doc2MdError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Doc2MdError::PermissionDenied { path });
        }
        Err(_) => return Err(Doc2MdError::FileNotFound { path }),
    }

    debug!("Resolved input: {}", path.display());
    Ok(path)
}

/// Read an HTML file as text.
///
/// Fails with [`Doc2MdError::NotText`] when the bytes are not UTF-8; the
/// preprocessor only ever works on text.
pub fn read_markup(path: &Path) -> Result<String, Doc2MdError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Doc2MdError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Doc2MdError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Doc2MdError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    String::from_utf8(bytes).map_err(|_| Doc2MdError::NotText {
        path: path.to_path_buf(),
    })
}

/// `input` with its extension replaced, e.g. `report.docx` → `report.md`.
pub fn sibling_with_extension(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}

/// Output path for `input` inside `dir`: `<dir>/<stem>.<extension>`.
pub fn output_in_dir(input: &Path, dir: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    dir.join(format!("{stem}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.docx").unwrap_err();
        assert!(matches!(err, Doc2MdError::FileNotFound { .. }));
    }

    #[test]
    fn directory_is_not_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(dir.path()).unwrap_err();
        assert!(matches!(err, Doc2MdError::FileNotFound { .. }));
    }

    #[test]
    fn existing_file_resolves() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(resolve_input(file.path()).unwrap(), file.path());
    }

    #[test]
    fn non_utf8_markup_is_not_text() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.html");
        std::fs::write(&p, [0xff, 0xfe, 0x3c, 0x00]).unwrap();
        assert!(matches!(
            read_markup(&p).unwrap_err(),
            Doc2MdError::NotText { .. }
        ));
    }

    #[test]
    fn output_naming() {
        assert_eq!(
            sibling_with_extension(Path::new("docs/report.docx"), "md"),
            PathBuf::from("docs/report.md")
        );
        assert_eq!(
            output_in_dir(Path::new("docs/report.v2.docx"), Path::new("out"), "md"),
            PathBuf::from("out/report.v2.md")
        );
    }
}
