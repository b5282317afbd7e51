//! Atomic writes for profile and pointer files.
//!
//! Every write goes to a sibling `.tmp` file first, which is then renamed over
//! the target. Renames within one filesystem are atomic on POSIX, so a crash
//! leaves either the old file or the new one, never a torn write. A stray
//! `.tmp` file may be left behind; the store ignores those on load.
//!
//! Files are written owner-only (`0600`) on unix since they hold API tokens,
//! including when a leftover `.tmp` file with wider permissions is reused.

use crate::error::Result;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Atomically writes `value` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails, the temporary file cannot be
/// written, or the rename fails. On failure the target is left unchanged.
pub async fn write_json_atomic<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes_atomic(path.as_ref(), &bytes).await
}

/// Atomically writes a single line of text.
///
/// # Errors
///
/// See [`write_json_atomic`].
pub async fn write_text_atomic<P: AsRef<Path>>(path: P, text: &str) -> Result<()> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(b'\n');
    write_bytes_atomic(path.as_ref(), &bytes).await
}

async fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}

/// Appends `.tmp` to the file name: `acme.json` becomes `acme.json.tmp`.
pub(crate) fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(temp_path).await?;
    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
    }
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn make_temp_path_with_extension() {
        let temp = make_temp_path(Path::new("/home/accounts/acme.json"));
        assert_eq!(temp, Path::new("/home/accounts/acme.json.tmp"));
    }

    #[test]
    fn make_temp_path_without_extension() {
        let temp = make_temp_path(Path::new("/home/active"));
        assert_eq!(temp, Path::new("/home/active.tmp"));
    }

    #[tokio::test]
    async fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("acme.json");

        write_json_atomic(&target, &json!({"n": 1})).await.unwrap();
        write_json_atomic(&target, &json!({"n": 2})).await.unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["n"], 2);
        assert!(!make_temp_path(&target).exists());
    }

    #[tokio::test]
    async fn atomic_write_text_ends_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("active");

        write_text_atomic(&target, "acme").await.unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(contents, "acme\n");
    }

    #[tokio::test]
    async fn failed_write_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing-dir").join("acme.json");

        let result = write_text_atomic(&target, "acme").await;

        assert!(result.is_err());
        assert!(!target.exists());
        assert!(!make_temp_path(&target).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn atomic_write_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("acme.json");
        write_json_atomic(&target, &json!({})).await.unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn leftover_temp_file_does_not_widen_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("acme.json");
        let stale = make_temp_path(&target);
        std::fs::write(&stale, b"{}").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_json_atomic(&target, &json!({"api_token": "acme-token-0001"}))
            .await
            .unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!stale.exists());
    }
}
