use crate::infrastructure::storage::FileStore;
use crate::services::sniff;
use crate::services::staging;
use crate::utils::ident::{ID_LENGTH, IdGenerator};
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Total naming attempts (existence checks) before an upload is given up on.
pub const MAX_NAME_ATTEMPTS: usize = 10;

/// A published upload: identifier plus the sniffed extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub id: String,
    pub extension: String,
}

impl StoredFile {
    pub fn name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// The request carried no bytes at all.
    #[error("request body was empty")]
    EmptyBody,

    /// Streaming the body into the temp area failed; the partial temp file
    /// has already been removed.
    #[error("failed to stage upload: {0}")]
    Staging(#[source] io::Error),

    /// Every candidate name collided with an existing file.
    #[error("no free identifier after {MAX_NAME_ATTEMPTS} attempts")]
    IdentifiersExhausted,

    /// The final rename out of the temp area failed.
    #[error("failed to publish upload: {0}")]
    Publish(#[source] io::Error),
}

/// Orchestrates one upload end to end: stage the body stream into the temp
/// area, sniff the content type, allocate a collision-free name, and
/// publish via atomic rename.
pub struct UploadService {
    store: Arc<FileStore>,
    ids: Arc<dyn IdGenerator>,
}

impl UploadService {
    pub fn new(store: Arc<FileStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Consumes the request body exactly once. On any error the staged temp
    /// file is gone by the time this returns.
    pub async fn handle_upload<S, E>(
        &self,
        stream: S,
        client: &str,
    ) -> Result<StoredFile, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut id = self.ids.generate(ID_LENGTH);

        let temp_path = self.store.temp_path(&id);
        let staged = staging::stage(&temp_path, stream)
            .await
            .map_err(UploadError::Staging)?;

        if staged.size == 0 {
            self.store.discard(&staged.temp_path).await;
            return Err(UploadError::EmptyBody);
        }

        let detected = sniff::detect(&staged.probe).unwrap_or_default();

        // The namespace is shared with concurrent uploads; existence-check
        // then rename, regenerating on collision, bounded at
        // MAX_NAME_ATTEMPTS candidates.
        let mut free = None;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = format!("{}.{}", id, detected.extension);
            if !self.store.exists(&name).await {
                free = Some(name);
                break;
            }
            id = self.ids.generate(ID_LENGTH);
        }

        let Some(name) = free else {
            self.store.discard(&staged.temp_path).await;
            return Err(UploadError::IdentifiersExhausted);
        };

        let target = match self.store.publish(&staged.temp_path, &name).await {
            Ok(target) => target,
            Err(e) => {
                self.store.discard(&staged.temp_path).await;
                return Err(UploadError::Publish(e));
            }
        };

        info!(
            "📦 New file: {} ({})! Uploaded by: {}",
            name,
            target.display(),
            client
        );

        Ok(StoredFile {
            id,
            extension: detected.extension.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Deterministic generator that replays a fixed sequence of identifiers.
    struct SequenceIds(Mutex<VecDeque<&'static str>>);

    impl SequenceIds {
        fn new(ids: &[&'static str]) -> Arc<Self> {
            Arc::new(Self(Mutex::new(ids.iter().copied().collect())))
        }
    }

    impl IdGenerator for SequenceIds {
        fn generate(&self, _length: usize) -> String {
            let mut seq = self.0.lock().unwrap();
            let next = seq.pop_front().expect("sequence exhausted");
            if seq.is_empty() {
                seq.push_back(next);
            }
            next.to_string()
        }
    }

    fn body(bytes: &'static [u8]) -> impl Stream<Item = Result<Bytes, io::Error>> {
        stream::iter(vec![Ok(Bytes::from_static(bytes))])
    }

    async fn service(
        dir: &tempfile::TempDir,
        ids: Arc<dyn IdGenerator>,
    ) -> (UploadService, Arc<FileStore>) {
        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
        (UploadService::new(store.clone(), ids), store)
    }

    #[tokio::test]
    async fn test_unknown_content_defaults_to_txt() {
        let dir = tempfile::tempdir().unwrap();
        let (uploads, store) = service(&dir, SequenceIds::new(&["Qw3rT"])).await;

        let stored = uploads.handle_upload(body(b"no magic here"), "test").await.unwrap();

        assert_eq!(stored.name(), "Qw3rT.txt");
        assert_eq!(
            tokio::fs::read(store.final_path("Qw3rT.txt")).await.unwrap(),
            b"no magic here"
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let (uploads, store) = service(&dir, SequenceIds::new(&["aaaaa"])).await;

        let err = uploads
            .handle_upload(stream::iter(Vec::<Result<Bytes, io::Error>>::new()), "test")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::EmptyBody));
        assert!(!store.temp_path("aaaaa").exists());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collision_retries_until_free_name() {
        let dir = tempfile::tempdir().unwrap();
        let (uploads, store) = service(&dir, SequenceIds::new(&["AAAAA", "BBBBB", "CCCCC"])).await;

        tokio::fs::write(store.final_path("AAAAA.txt"), b"first").await.unwrap();
        tokio::fs::write(store.final_path("BBBBB.txt"), b"second").await.unwrap();

        let stored = uploads.handle_upload(body(b"third"), "test").await.unwrap();

        assert_eq!(stored.name(), "CCCCC.txt");
        assert_eq!(tokio::fs::read(store.final_path("AAAAA.txt")).await.unwrap(), b"first");
        assert_eq!(tokio::fs::read(store.final_path("CCCCC.txt")).await.unwrap(), b"third");
        // Only the winning rename ever touched the temp area.
        assert!(!store.temp_path("BBBBB").exists());
        assert!(!store.temp_path("CCCCC").exists());
        assert!(!store.temp_path("AAAAA").exists());
    }

    #[tokio::test]
    async fn test_exhaustion_fails_distinctly_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (uploads, store) = service(&dir, SequenceIds::new(&["ZZZZZ"])).await;

        tokio::fs::write(store.final_path("ZZZZZ.txt"), b"squatter").await.unwrap();

        let err = uploads.handle_upload(body(b"never lands"), "test").await.unwrap_err();

        assert!(matches!(err, UploadError::IdentifiersExhausted));
        assert!(!store.temp_path("ZZZZZ").exists());
        assert_eq!(store.list().await.unwrap(), vec!["ZZZZZ.txt".to_string()]);
        assert_eq!(tokio::fs::read(store.final_path("ZZZZZ.txt")).await.unwrap(), b"squatter");
    }

    #[tokio::test]
    async fn test_staging_failure_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let (uploads, store) = service(&dir, SequenceIds::new(&["fffff"])).await;

        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"some data")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection dropped")),
        ];

        let err = uploads
            .handle_upload(stream::iter(chunks), "test")
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Staging(_)));
        assert!(!store.temp_path("fffff").exists());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sniffed_extension_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let (uploads, _store) = service(&dir, SequenceIds::new(&["img01"])).await;

        let stored = uploads
            .handle_upload(
                body(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0]),
                "test",
            )
            .await
            .unwrap();

        assert_eq!(stored.name(), "img01.png");
    }
}
