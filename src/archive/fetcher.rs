//! Session-scoped retrieval: cache, request coalescing, bounded-concurrency
//! batches, bundle extraction and retry.

use crate::archive::error::FetchError;
use crate::archive::naming::{self, NamingScheme};
use crate::archive::transport::{HttpTransport, Transport};
use crate::decode::archival::{parse_archival, DecodedFile};
use crate::types::raw_file::{FileOrigin, RawFile};
use futures_util::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell, SetError};
use tokio::task;

const DEFAULT_MAX_IN_FLIGHT: usize = 6;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// The result of one file within a batch fetch.
///
/// Batches report outcomes per item: one missing or malformed file never
/// aborts its siblings.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The archive path this outcome belongs to.
    pub path: String,
    pub result: Result<RawFile, FetchError>,
}

/// Retrieves, caches and de-duplicates archive files for one session.
///
/// The cache lives for the lifetime of the fetcher and is its only mutable
/// state. Every retrieval goes through a per-path coalescing cell, so
/// concurrent requests for the same path converge on a single underlying
/// retrieval; later requests are served from the cache.
pub struct ArchiveFetcher<T: Transport = HttpTransport> {
    transport: T,
    base_url: String,
    naming: NamingScheme,
    max_in_flight: usize,
    max_attempts: u32,
    retry_delay: Duration,
    files: Mutex<HashMap<String, Arc<OnceCell<RawFile>>>>,
    bundles: Mutex<HashMap<String, Arc<OnceCell<Vec<RawFile>>>>>,
    decoded: Mutex<HashMap<String, Arc<DecodedFile>>>,
}

impl ArchiveFetcher<HttpTransport> {
    /// A fetcher against the real archive with default settings.
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl Default for ArchiveFetcher<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ArchiveFetcher<T> {
    /// A fetcher with a caller-supplied transport and default settings.
    pub fn with_transport(transport: T) -> Self {
        ArchiveFetcher {
            transport,
            base_url: naming::DEFAULT_BASE_URL.to_string(),
            naming: NamingScheme::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            files: Mutex::new(HashMap::new()),
            bundles: Mutex::new(HashMap::new()),
            decoded: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn naming_scheme(mut self, naming: NamingScheme) -> Self {
        self.naming = naming;
        self
    }

    /// Upper bound on concurrently in-flight retrievals in batch mode.
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Total attempts (first try included) for transient failures.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Backoff before the first retry; doubles on each further attempt.
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// The filename convention this fetcher resolves against.
    pub fn naming(&self) -> &NamingScheme {
        &self.naming
    }

    /// Retrieves one archive file, or serves it from the session cache.
    ///
    /// Concurrent calls for the same path share a single retrieval: the
    /// second caller awaits the first's in-flight result instead of issuing
    /// its own request, and observes [`FileOrigin::Cache`]. An origin of
    /// `Download` or `Bundle` means this call did the network work.
    pub async fn fetch_file(&self, path: &str) -> Result<RawFile, FetchError> {
        let cell = self.file_cell(path).await;
        if let Some(cached) = cell.get() {
            debug!("cache hit for {}", path);
            return Ok(cached.clone().with_origin(FileOrigin::Cache));
        }
        let mut initiated = false;
        let fetched = cell
            .get_or_try_init(|| {
                initiated = true;
                self.download_file(path)
            })
            .await?;
        let raw = fetched.clone();
        if initiated {
            Ok(raw)
        } else {
            Ok(raw.with_origin(FileOrigin::Cache))
        }
    }

    /// Retrieves many archive files with bounded concurrency, reporting one
    /// outcome per input path, in input order.
    ///
    /// Completion order is unconstrained; results are handed back in the
    /// caller's order regardless. Already-cached paths cost no network work.
    pub async fn fetch_many<I>(&self, paths: I) -> Vec<FetchOutcome>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let requests = paths.into_iter().map(Into::into).map(|path| async move {
            let result = self.fetch_file(&path).await;
            FetchOutcome { path, result }
        });
        stream::iter(requests)
            .buffered(self.max_in_flight)
            .collect()
            .await
    }

    /// Fail-fast form of [`fetch_many`](Self::fetch_many): stops at the
    /// first error, cancelling not-yet-finished sub-fetches.
    pub async fn try_fetch_many<I>(&self, paths: I) -> Result<Vec<RawFile>, FetchError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let requests = paths
            .into_iter()
            .map(Into::into)
            .map(|path| async move { self.fetch_file(&path).await });
        let batch = stream::iter(requests).buffered(self.max_in_flight);
        futures_util::pin_mut!(batch);

        let mut files = Vec::new();
        while let Some(result) = batch.next().await {
            files.push(result?);
        }
        Ok(files)
    }

    /// Retrieves one compressed bundle (unless cached), extracts its
    /// members, and populates the per-file cache so a later
    /// [`fetch_file`](Self::fetch_file) for any member is a cache hit.
    pub async fn fetch_compressed(&self, path: &str) -> Result<Vec<RawFile>, FetchError> {
        let cell = {
            let mut bundles = self.bundles.lock().await;
            bundles.entry(path.to_string()).or_default().clone()
        };
        if let Some(members) = cell.get() {
            debug!("cache hit for bundle {}", path);
            return Ok(members
                .iter()
                .map(|member| member.clone().with_origin(FileOrigin::Cache))
                .collect());
        }
        let mut initiated = false;
        let members = cell
            .get_or_try_init(|| {
                initiated = true;
                self.download_bundle(path)
            })
            .await?;
        if initiated {
            Ok(members.clone())
        } else {
            Ok(members
                .iter()
                .map(|member| member.clone().with_origin(FileOrigin::Cache))
                .collect())
        }
    }

    /// Decodes a fetched file, memoizing the result for the session.
    pub async fn decoded(&self, raw: &RawFile) -> Result<Arc<DecodedFile>, FetchError> {
        {
            let decoded = self.decoded.lock().await;
            if let Some(existing) = decoded.get(&raw.path) {
                return Ok(Arc::clone(existing));
            }
        }

        let contents = raw.clone();
        let parsed = task::spawn_blocking(move || parse_archival(contents.text())).await??;
        let parsed = Arc::new(parsed);

        // A concurrent decode of the same path may have landed first; keep
        // whichever entry won.
        let mut decoded = self.decoded.lock().await;
        let entry = decoded
            .entry(raw.path.clone())
            .or_insert_with(|| Arc::clone(&parsed));
        Ok(Arc::clone(entry))
    }

    async fn file_cell(&self, path: &str) -> Arc<OnceCell<RawFile>> {
        let mut files = self.files.lock().await;
        files.entry(path.to_string()).or_default().clone()
    }

    async fn download_file(&self, path: &str) -> Result<RawFile, FetchError> {
        let url = self.make_url(path);
        info!("downloading {}", url);
        let bytes = self.get_with_retry(&url).await?;
        let text = String::from_utf8(bytes).map_err(|e| FetchError::NotText {
            path: path.to_string(),
            source: e,
        })?;

        let stem = naming::stem_of(path).to_string();
        let claim = self.naming.parse_stem(&stem);
        Ok(RawFile::new(stem, path, claim, FileOrigin::Download, text))
    }

    async fn download_bundle(&self, path: &str) -> Result<Vec<RawFile>, FetchError> {
        let url = self.make_url(path);
        info!("downloading bundle {}", url);
        let bytes = self.get_with_retry(&url).await?;

        let bundle_path = path.to_string();
        let extracted =
            task::spawn_blocking(move || extract_bundle(&bundle_path, bytes)).await??;
        info!("extracted {} members from {}", extracted.len(), path);

        let mut members = Vec::with_capacity(extracted.len());
        for (name, text) in extracted {
            let stem = naming::stem_of(&name).to_string();
            let member_path = naming::file_path(&stem);
            let claim = self.naming.parse_stem(&stem);
            let raw = RawFile::new(stem, &member_path, claim, FileOrigin::Bundle, text);
            self.populate_file(&member_path, raw.clone()).await?;
            members.push(raw);
        }
        Ok(members)
    }

    /// Inserts a bundle member into the per-file cache. Re-populating with
    /// identical contents is a no-op; differing contents violate the cache
    /// invariant.
    async fn populate_file(&self, path: &str, raw: RawFile) -> Result<(), FetchError> {
        let cell = self.file_cell(path).await;
        match cell.set(raw) {
            Ok(()) => Ok(()),
            Err(SetError::AlreadyInitializedError(rejected)) => match cell.get() {
                Some(existing) if existing.text() == rejected.text() => Ok(()),
                _ => Err(FetchError::CacheConflict(path.to_string())),
            },
            Err(SetError::InitializingError(_)) => {
                // A direct fetch of this member is in flight; it will fill
                // the cell with the same archive contents.
                debug!("skipping bundle populate for in-flight {}", path);
                Ok(())
            }
        }
    }

    async fn get_with_retry(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut attempt = 1;
        loop {
            match self.transport.get(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = self.retry_delay * 2u32.pow(attempt - 1);
                    warn!(
                        "transient failure for {} (attempt {}/{}), retrying in {:?}: {}",
                        url, attempt, self.max_attempts, delay, error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn make_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Walks a zip bundle and returns `(member name, text)` pairs. Runs on a
/// blocking thread; zip inflation is CPU work.
fn extract_bundle(path: &str, bytes: Vec<u8>) -> Result<Vec<(String, String)>, FetchError> {
    let reader = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| FetchError::BundleRead {
        path: path.to_string(),
        source: e,
    })?;

    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(|e| FetchError::BundleRead {
            path: path.to_string(),
            source: e,
        })?;
        if member.is_dir() {
            continue;
        }
        let name = member.name().to_string();
        let mut text = String::new();
        member
            .read_to_string(&mut text)
            .map_err(|e| FetchError::BundleMember {
                path: path.to_string(),
                member: name.clone(),
                source: e,
            })?;
        members.push((name, text));
    }
    Ok(members)
}
