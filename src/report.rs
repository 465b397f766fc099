//! Writes generated bulletins to disk

use std::path::{Path, PathBuf};

use tracing::info;

use crate::Result;

/// Write `content` verbatim to `path`, replacing any previous file.
///
/// Returns the absolute path when it can be resolved.
pub async fn write_report(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;

    let written = tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    info!("HTML page generated: {}", written.display());
    Ok(written)
}

/// Read the last written report
pub async fn read_report(path: &Path) -> Result<String> {
    Ok(tokio::fs::read_to_string(path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("bulletin.html");

        write_report(&path, "<p>first, longer content</p>").await.unwrap();
        let written = write_report(&path, "<p>second</p>").await.unwrap();

        assert!(written.is_absolute());
        assert_eq!(read_report(&path).await.unwrap(), "<p>second</p>");
    }

    #[tokio::test]
    async fn test_read_missing_report_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_report(&dir.path().join("none.html")).await.unwrap_err();
        assert!(matches!(err, crate::CityScienceError::Io { .. }));
    }
}
