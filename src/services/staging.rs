use crate::services::sniff::PROBE_CAP;
use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Result of streaming a request body into the temp area: the temp file
/// holding every received byte, plus an in-memory probe of at most
/// [`PROBE_CAP`] leading bytes for type sniffing.
#[derive(Debug)]
pub struct StagedUpload {
    pub temp_path: PathBuf,
    pub probe: Vec<u8>,
    pub size: u64,
}

/// Streams a request body chunk by chunk into a freshly created temp file
/// while capturing the sniff probe. The full file is never buffered in
/// memory; only the probe copy is capped.
///
/// Once the temp file has been created, any failure deletes it before the
/// error is returned, so a failed stage leaves nothing behind. A failure
/// to create the file in the first place removes nothing: the path may
/// hold another request's in-flight staging file.
pub async fn stage<S, E>(temp_path: &Path, stream: S) -> io::Result<StagedUpload>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // create_new: a temp token collision must fail loudly instead of
    // silently interleaving two uploads into one file.
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;

    match write_to_temp(&mut file, stream).await {
        Ok((probe, size)) => Ok(StagedUpload {
            temp_path: temp_path.to_path_buf(),
            probe,
            size,
        }),
        Err(e) => {
            drop(file);
            let _ = tokio::fs::remove_file(temp_path).await;
            Err(e)
        }
    }
}

async fn write_to_temp<S, E>(
    file: &mut tokio::fs::File,
    stream: S,
) -> io::Result<(Vec<u8>, u64)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut probe = Vec::new();
    let mut size: u64 = 0;

    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e.into()))?;

        if probe.len() < PROBE_CAP {
            probe.extend_from_slice(&chunk);
            probe.truncate(PROBE_CAP);
        }

        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }

    file.flush().await?;

    Ok((probe, size))
}
