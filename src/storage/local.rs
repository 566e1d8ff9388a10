//! Directory-backed object store
//!
//! Every regular file below the root is an object; its name is the path
//! relative to the root with `/` separators, so names match what the same
//! tree would be called once uploaded to a bucket.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use jwalk::WalkDir;
use std::path::{Component, Path, PathBuf};
use tokio::sync::mpsc;

use super::errors::{StorageError, StorageResult};
use super::ObjectStore;

/// Names buffered between the blocking walker and the async consumer
const LIST_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an object name to a path, refusing anything outside the root
    fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Object name for `path` relative to `root`
fn object_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn list(&self) -> BoxStream<'static, StorageResult<String>> {
        let root = self.root.clone();
        let (tx, rx) = mpsc::channel(LIST_BUFFER);

        tokio::task::spawn_blocking(move || {
            if !root.is_dir() {
                let _ = tx.blocking_send(Err(StorageError::Walk {
                    root: root.clone(),
                    message: "not a directory".to_string(),
                }));
                return;
            }

            let walker = WalkDir::new(&root)
                .sort(true)
                .skip_hidden(false)
                .follow_links(false);

            for entry in walker {
                let item = match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        let path = entry.path();
                        match object_name(&root, &path) {
                            Some(name) => Ok(name),
                            None => Err(StorageError::Walk {
                                root: root.clone(),
                                message: format!("non UTF-8 path {path:?}"),
                            }),
                        }
                    }
                    Ok(_) => continue,
                    Err(e) => Err(StorageError::Walk {
                        root: root.clone(),
                        message: e.to_string(),
                    }),
                };

                let failed = item.is_err();
                // Consumer gone: stop walking
                if tx.blocking_send(item).is_err() || failed {
                    return;
                }
            }
        });

        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(name.to_string())
            } else {
                StorageError::Io { path, source }
            }
        })
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}
