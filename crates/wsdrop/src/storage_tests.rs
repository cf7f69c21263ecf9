// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use super::{sanitize_filename, stored_name, LocalStorage, PendingUpload, Storage};

#[yare::parameterized(
    plain            = { "a.txt", Some("a.txt") },
    traversal        = { "../../etc/passwd", Some("passwd") },
    absolute         = { "/etc/shadow", Some("shadow") },
    windows          = { "..\\..\\boot.ini", Some("boot.ini") },
    mixed            = { "dir\\sub/file.bin", Some("file.bin") },
    hidden           = { ".bashrc", Some(".bashrc") },
    null_byte        = { "a\0b", Some("a_b") },
    empty            = { "", None },
    dot              = { ".", None },
    dotdot           = { "..", None },
    trailing_dotdot  = { "foo/..", None },
    only_separators  = { "///", None },
    trailing_slash   = { "dir/", None },
)]
fn sanitize(raw: &str, expected: Option<&str>) {
    assert_eq!(sanitize_filename(raw).as_deref(), expected);
}

#[test]
fn sanitize_truncates_on_char_boundary() -> anyhow::Result<()> {
    let long = "é".repeat(300);
    let clean = sanitize_filename(&long).ok_or_else(|| anyhow::anyhow!("rejected"))?;
    assert!(clean.len() <= 216);
    assert!(clean.chars().all(|c| c == 'é'));
    Ok(())
}

#[test]
fn stored_names_are_unique_per_session() {
    let a = stored_name(&uuid::Uuid::new_v4(), "same.txt");
    let b = stored_name(&uuid::Uuid::new_v4(), "same.txt");
    assert_ne!(a, b);
    assert!(a.ends_with("_same.txt"));
}

#[tokio::test]
async fn commit_publishes_file() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let storage = Arc::new(LocalStorage::new(tmp.path()));

    let mut upload = PendingUpload::open(Arc::clone(&storage), "x_hello.txt".to_owned()).await?;
    upload.write(b"hel").await?;
    upload.write(b"lo").await?;
    // Not visible until committed.
    assert!(!storage.path_of("x_hello.txt").exists());

    let path = upload.commit().await?;
    assert_eq!(path, storage.path_of("x_hello.txt"));
    assert_eq!(std::fs::read_to_string(&path)?, "hello");
    assert_eq!(std::fs::read_dir(tmp.path())?.count(), 1);
    Ok(())
}

#[tokio::test]
async fn discard_removes_partial_file() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let storage = Arc::new(LocalStorage::new(tmp.path()));

    let mut upload = PendingUpload::open(Arc::clone(&storage), "x_part.bin".to_owned()).await?;
    upload.write(b"abc").await?;
    upload.discard().await?;

    assert_eq!(std::fs::read_dir(tmp.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn discard_of_missing_file_is_ok() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let storage = LocalStorage::new(tmp.path());
    storage.discard("never-created").await?;
    Ok(())
}

#[tokio::test]
async fn dropped_upload_is_discarded() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let storage = Arc::new(LocalStorage::new(tmp.path()));

    {
        let mut upload = PendingUpload::open(Arc::clone(&storage), "x_drop.bin".to_owned()).await?;
        upload.write(b"partial").await?;
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while std::fs::read_dir(tmp.path())?.count() > 0 {
        anyhow::ensure!(tokio::time::Instant::now() < deadline, "partial file survived drop");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}

#[tokio::test]
async fn create_fails_without_root() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let storage = Arc::new(LocalStorage::new(tmp.path().join("missing")));
    assert!(PendingUpload::open(storage, "x".to_owned()).await.is_err());
    Ok(())
}
