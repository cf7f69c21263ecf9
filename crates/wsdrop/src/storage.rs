// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage sink for uploaded files.
//!
//! Bytes are streamed into a hidden `.part` file and renamed into place only
//! on commit, so a stored name exists exactly when its upload completed.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Longest stored name such that its `.part` sibling still fits in 255 bytes.
const MAX_STORED_NAME: usize = 249;

/// Simple-format session UUID plus `_`.
const SESSION_PREFIX_LEN: usize = 33;

/// Backend that persists upload bytes under a server-chosen name.
pub trait Storage: Send + Sync + 'static {
    type Writer: AsyncWrite + Send + Sync + Unpin + 'static;

    /// Open a fresh, not yet visible, file for `name`.
    fn create(&self, name: &str) -> impl Future<Output = io::Result<Self::Writer>> + Send;

    /// Flush `writer` and publish the file under `name`.
    fn commit(
        &self,
        name: &str,
        writer: Self::Writer,
    ) -> impl Future<Output = io::Result<PathBuf>> + Send;

    /// Remove any unpublished bytes for `name`. Missing files are not an error.
    fn discard(&self, name: &str) -> impl Future<Output = io::Result<()>> + Send;
}

/// Local filesystem storage rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of a committed upload.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{name}.part"))
    }
}

impl Storage for LocalStorage {
    type Writer = BufWriter<File>;

    async fn create(&self, name: &str) -> io::Result<Self::Writer> {
        let file =
            OpenOptions::new().write(true).create_new(true).open(self.partial_path(name)).await?;
        Ok(BufWriter::new(file))
    }

    async fn commit(&self, name: &str, mut writer: Self::Writer) -> io::Result<PathBuf> {
        writer.flush().await?;
        let file = writer.into_inner();
        file.sync_all().await?;
        drop(file);

        let dest = self.path_of(name);
        tokio::fs::rename(self.partial_path(name), &dest).await?;
        Ok(dest)
    }

    async fn discard(&self, name: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.partial_path(name)).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// An open upload that is discarded unless explicitly committed.
///
/// Dropping without [`commit`](Self::commit) or [`discard`](Self::discard)
/// (e.g. when the session task is cancelled) schedules the discard on the
/// current runtime.
pub struct PendingUpload<S: Storage> {
    storage: Arc<S>,
    name: String,
    writer: Option<S::Writer>,
}

impl<S: Storage> PendingUpload<S> {
    pub async fn open(storage: Arc<S>, name: String) -> io::Result<Self> {
        let writer = storage.create(&name).await?;
        Ok(Self { storage, name, writer: Some(writer) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.write_all(chunk).await,
            None => Err(io::Error::other("upload already closed")),
        }
    }

    pub async fn commit(mut self) -> io::Result<PathBuf> {
        let writer = self.writer.take().ok_or_else(|| io::Error::other("upload already closed"))?;
        match self.storage.commit(&self.name, writer).await {
            Ok(path) => Ok(path),
            Err(e) => {
                if let Err(discard_err) = self.storage.discard(&self.name).await {
                    tracing::warn!(name = %self.name, err = %discard_err, "discard after failed commit");
                }
                Err(e)
            }
        }
    }

    pub async fn discard(mut self) -> io::Result<()> {
        drop(self.writer.take());
        self.storage.discard(&self.name).await
    }
}

impl<S: Storage> Drop for PendingUpload<S> {
    fn drop(&mut self) {
        let Some(writer) = self.writer.take() else {
            return;
        };
        drop(writer);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(name = %self.name, "no runtime to discard abandoned upload");
            return;
        };
        let storage = Arc::clone(&self.storage);
        let name = std::mem::take(&mut self.name);
        handle.spawn(async move {
            if let Err(e) = storage.discard(&name).await {
                tracing::warn!(name = %name, err = %e, "failed to discard abandoned upload");
            }
        });
    }
}

/// Reduce a client-provided filename to a safe basename.
///
/// Drops every directory component (either separator style), rejects `.`,
/// `..` and empty results, replaces null bytes, and truncates to fit the
/// filesystem limit once the session prefix is added.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." {
        return None;
    }

    let clean: String = name.chars().map(|c| if c == '\0' { '_' } else { c }).collect();

    Some(truncate_utf8(&clean, MAX_STORED_NAME - SESSION_PREFIX_LEN).to_owned())
}

/// Build the collision-free stored name for a session's upload.
pub fn stored_name(session_id: &uuid::Uuid, basename: &str) -> String {
    let name = format!("{}_{basename}", session_id.simple());
    truncate_utf8(&name, MAX_STORED_NAME).to_owned()
}

fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
