//! Remote asset downloads.
//!
//! Downloads stream into a `.partial` file next to the destination and are
//! renamed into place once complete, so a failed transfer never leaves a
//! truncated asset under its final name.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Serialize;
use shop_seed_core::rules::RemoteAsset;
use shop_seed_core::{AssetKind, PathsConfig};
use tokio::task::JoinSet;

use crate::error::AssetError;

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `url` and store it at `destination`.
    async fn download(&self, url: &str, destination: &Path) -> Result<(), AssetError>;
}

pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    /// # Errors
    /// Returns [`AssetError::Network`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, AssetError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shop-seed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssetError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<(), AssetError> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssetError::Network(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        write_stream(response.bytes_stream(), destination).await
    }
}

/// Stream chunks into the `.partial` file, then rename it onto `destination`.
///
/// The partial file is removed when the stream or a write fails.
async fn write_stream<S, B, E>(stream: S, destination: &Path) -> Result<(), AssetError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let partial_path = partial_path(destination);
    let result = stream_into(stream, &partial_path).await;
    if result.is_err() {
        cleanup_partial(&partial_path);
        return result;
    }
    fs::rename(&partial_path, destination)?;
    Ok(())
}

async fn stream_into<S, B, E>(stream: S, partial_path: &Path) -> Result<(), AssetError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut stream = Box::pin(stream);
    let mut file = File::create(partial_path)?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AssetError::Network(e.to_string()))?;
        file.write_all(chunk.as_ref())?;
    }
    file.sync_all()?;
    Ok(())
}

fn cleanup_partial(partial_path: &Path) {
    match fs::remove_file(partial_path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %partial_path.display(), error = %err, "could not remove partial download");
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub joined: usize,
    pub failed: usize,
}

/// Resolves asset references and tracks background transfers.
pub struct AssetFetcher {
    downloader: Arc<dyn Downloader>,
    paths: PathsConfig,
    background: Mutex<JoinSet<(String, Result<(), AssetError>)>>,
}

impl AssetFetcher {
    #[must_use]
    pub fn new(downloader: Arc<dyn Downloader>, paths: PathsConfig) -> Self {
        Self { downloader, paths, background: Mutex::new(JoinSet::new()) }
    }

    fn destination(&self, asset: &RemoteAsset, kind: AssetKind) -> Result<PathBuf, AssetError> {
        kind.target_path(&self.paths, &asset.file_name)
            .ok_or_else(|| AssetError::UnsafeFileName(asset.file_name.clone()))
    }

    /// Download a remote asset and wait for it.
    ///
    /// # Errors
    /// Returns [`AssetError::UnsafeFileName`] when the URL does not end in a plain
    /// file name, or the downloader's error when the transfer fails.
    pub async fn fetch(&self, asset: &RemoteAsset, kind: AssetKind) -> Result<PathBuf, AssetError> {
        let destination = self.destination(asset, kind)?;
        self.downloader.download(&asset.url, &destination).await?;
        tracing::debug!(url = %asset.url, path = %destination.display(), "asset downloaded");
        Ok(destination)
    }

    /// Classify a reference, downloading it first when it is remote.
    ///
    /// Returns the local file name. A failed download is logged and the file
    /// name is still returned.
    pub async fn resolve(&self, reference: &str, kind: AssetKind) -> String {
        let (file_name, remote) = RemoteAsset::classify(reference);
        if let Some(remote) = remote {
            if let Err(err) = self.fetch(&remote, kind).await {
                tracing::error!(kind = kind.as_str(), url = %remote.url, error = %err, "could not download asset");
            }
        }
        file_name
    }

    /// Start a tracked download; [`AssetFetcher::join_background`] waits for it.
    ///
    /// A file name that would leave the asset directory is reported as a failed download.
    pub fn spawn_background(&self, asset: RemoteAsset, kind: AssetKind) {
        let downloader = Arc::clone(&self.downloader);
        let destination = self.destination(&asset, kind);
        let url = asset.url;
        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        background.spawn(async move {
            let result = match destination {
                Ok(destination) => downloader.download(&url, &destination).await,
                Err(err) => Err(err),
            };
            (url, result)
        });
    }

    /// Wait for every background download started so far.
    pub async fn join_background(&self) -> DownloadSummary {
        let mut pending = {
            let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *background)
        };

        let mut summary = DownloadSummary::default();
        while let Some(joined) = pending.join_next().await {
            summary.joined += 1;
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((url, Err(err))) => {
                    summary.failed += 1;
                    tracing::error!(url = %url, error = %err, "background download failed");
                }
                Err(join_err) => {
                    summary.failed += 1;
                    let err = AssetError::Task(join_err.to_string());
                    tracing::error!(error = %err, "background download failed");
                }
            }
        }
        summary
    }
}
