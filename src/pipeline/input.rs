//! Input resolution: a file path, or standard input for `-` / no argument.
//!
//! Relative paths are joined onto the caller's base directory. A read that
//! fails with `WouldBlock` (stdin attached to a non-blocking pipe) is retried
//! once before it becomes an error.

use crate::error::Md2PdfError;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Where the Markdown comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `None` and `"-"` mean standard input; anything else is a path
    /// relative to `base`.
    pub fn from_arg(arg: Option<&str>, base: &Path) -> Self {
        match arg {
            None | Some("-") => InputSource::Stdin,
            Some(path) => InputSource::File(base.join(path)),
        }
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> String {
        match self {
            InputSource::Stdin => "standard input".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// Read the whole input as UTF-8 text.
pub async fn read_input(source: &InputSource) -> Result<String, Md2PdfError> {
    let text = match source {
        InputSource::Stdin => retry_once(read_stdin).await,
        InputSource::File(path) => retry_once(|| tokio::fs::read_to_string(path)).await,
    }
    .map_err(|e| Md2PdfError::ReadFailed {
        name: source.display_name(),
        source: e,
    })?;

    debug!("Read {} bytes from {}", text.len(), source.display_name());
    Ok(text)
}

async fn read_stdin() -> std::io::Result<String> {
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

/// Run `op`, running it a second time if the first attempt hit `WouldBlock`.
async fn retry_once<F, Fut, T>(mut op: F) -> std::io::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    match op().await {
        Err(e) if e.kind() == ErrorKind::WouldBlock => {
            warn!("Input not ready ({}), retrying once", e);
            op().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dash_and_missing_mean_stdin() {
        let base = Path::new("/docs");
        assert_eq!(InputSource::from_arg(None, base), InputSource::Stdin);
        assert_eq!(InputSource::from_arg(Some("-"), base), InputSource::Stdin);
        assert_eq!(
            InputSource::from_arg(Some("a.md"), base),
            InputSource::File(PathBuf::from("/docs/a.md"))
        );
        assert_eq!(
            InputSource::from_arg(Some("/abs/a.md"), base),
            InputSource::File(PathBuf::from("/abs/a.md"))
        );
    }

    #[tokio::test]
    async fn reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "# Hi\n").unwrap();
        let source = InputSource::from_arg(Some("doc.md"), dir.path());
        assert_eq!(read_input(&source).await.unwrap(), "# Hi\n");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = InputSource::from_arg(Some("nope.md"), dir.path());
        match read_input(&source).await {
            Err(Md2PdfError::ReadFailed { name, source }) => {
                assert!(name.ends_with("nope.md"));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("expected ReadFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn would_block_is_retried_once() {
        let attempts = AtomicUsize::new(0);
        let result = retry_once(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(std::io::Error::from(ErrorKind::WouldBlock))
                } else {
                    Ok("text")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "text");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_would_block_is_returned() {
        let attempts = AtomicUsize::new(0);
        let result: std::io::Result<()> = retry_once(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(std::io::Error::from(ErrorKind::WouldBlock)) }
        })
        .await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::WouldBlock);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: std::io::Result<()> = retry_once(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(std::io::Error::from(ErrorKind::InvalidData)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
