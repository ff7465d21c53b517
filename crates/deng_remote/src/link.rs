//! Link to an idgames mirror
//!
//! The `ls-laR.gz` listing is downloaded and parsed on a background tokio
//! runtime. Results come back through a channel that the main thread drains
//! with [`IdgamesLink::poll`]; nothing crosses threads as a panic.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use regex::RegexBuilder;
use thiserror::Error;
use url::Url;

use crate::listing::{current_year, Listing, ListingError};
use crate::metadata::PackageMetadata;
use crate::package::PackageInfo;

/// Listing of the idgames archive on its main mirror
pub const DEFAULT_LISTING_URL: &str = "https://www.gamers.org/pub/idgames/ls-laR.gz";

/// Link errors
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Invalid listing URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server answered with status {0}")]
    Status(u16),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error("Failed to start the network runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Listing is already being loaded")]
    AlreadyLoading,

    #[error("Link is not ready")]
    NotReady,

    #[error("Bad package pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Link configuration
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub listing_url: String,
    /// Year given to entries dated with a time of day; `None` uses the
    /// current year
    pub reference_year: Option<i32>,
    pub timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            reference_year: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Loading,
    Ready,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Loading => f.write_str("loading"),
            Self::Ready => f.write_str("ready"),
        }
    }
}

/// Events reported by [`IdgamesLink::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    StatusChanged(LinkStatus),
    /// The listing was parsed; carries the number of packages found
    PackagesAvailable(usize),
    Failed(String),
}

/// Sent from the fetch task to the main thread, tagged with the generation
/// of the `connect` that spawned it
enum FetchResult {
    Listing(u64, Listing),
    Failed(u64, String),
}

/// State shared between the main thread and the fetch task
#[derive(Debug)]
struct SharedState {
    status: LinkStatus,
    last_error: Option<String>,
    bytes_received: u64,
}

/// Link to the idgames archive
pub struct IdgamesLink {
    config: LinkConfig,
    state: Arc<RwLock<SharedState>>,
    listing: Option<Listing>,
    packages: BTreeMap<String, PackageInfo>,
    runtime: Option<tokio::runtime::Runtime>,
    results_tx: Sender<FetchResult>,
    results_rx: Receiver<FetchResult>,
    /// Bumped by every connect, disconnect and failure; older results are stale
    generation: u64,
    pending_events: Vec<LinkEvent>,
}

impl IdgamesLink {
    pub fn new(config: LinkConfig) -> Self {
        let (results_tx, results_rx) = crossbeam_channel::unbounded();
        Self {
            config,
            state: Arc::new(RwLock::new(SharedState {
                status: LinkStatus::Disconnected,
                last_error: None,
                bytes_received: 0,
            })),
            listing: None,
            packages: BTreeMap::new(),
            runtime: None,
            results_tx,
            results_rx,
            generation: 0,
            pending_events: Vec::new(),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn status(&self) -> LinkStatus {
        self.state.read().status
    }

    pub fn is_ready(&self) -> bool {
        self.status() == LinkStatus::Ready
    }

    /// Message of the most recent failure
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Bytes downloaded by the current or last fetch
    pub fn bytes_received(&self) -> u64 {
        self.state.read().bytes_received
    }

    /// Start downloading the listing in the background
    pub fn connect(&mut self) -> Result<(), LinkError> {
        if self.status() == LinkStatus::Loading {
            return Err(LinkError::AlreadyLoading);
        }

        let url = match Url::parse(&self.config.listing_url) {
            Ok(url) => url,
            Err(err) => {
                let err = LinkError::from(err);
                self.handle_error(err.to_string());
                return Err(err);
            }
        };

        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("idgames-link")
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let err = LinkError::Runtime(err);
                self.handle_error(err.to_string());
                return Err(err);
            }
        };

        {
            let mut state = self.state.write();
            state.last_error = None;
            state.bytes_received = 0;
        }
        self.generation += 1;
        self.set_status(LinkStatus::Loading);

        let state = self.state.clone();
        let results = self.results_tx.clone();
        let timeout = self.config.timeout;
        let year = self.config.reference_year.unwrap_or_else(current_year);
        let generation = self.generation;

        log::info!("Loading idgames listing from {}", url);
        runtime.spawn(async move {
            let message = match fetch_listing(url, timeout, &state).await {
                Ok(bytes) => match Listing::from_gzip(&bytes, year) {
                    Ok(listing) => FetchResult::Listing(generation, listing),
                    Err(err) => FetchResult::Failed(generation, err.to_string()),
                },
                Err(err) => FetchResult::Failed(generation, err.to_string()),
            };
            // The receiver lives as long as the link
            let _ = results.send(message);
        });

        self.runtime = Some(runtime);
        Ok(())
    }

    /// Drain results of the background fetch. Call on the main thread.
    /// Results of a fetch that was disconnected or superseded are dropped.
    pub fn poll(&mut self) -> Vec<LinkEvent> {
        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                FetchResult::Listing(generation, listing) if generation == self.generation => {
                    self.install_listing(listing)
                }
                FetchResult::Failed(generation, message) if generation == self.generation => {
                    self.handle_error(message)
                }
                _ => log::debug!("Dropping result of a stale idgames fetch"),
            }
        }
        std::mem::take(&mut self.pending_events)
    }

    /// Parse an already downloaded (gzipped) listing
    pub fn load_listing(&mut self, gzipped: &[u8]) -> Result<usize, LinkError> {
        let year = self.config.reference_year.unwrap_or_else(current_year);
        match Listing::from_gzip(gzipped, year) {
            Ok(listing) => {
                self.install_listing(listing);
                Ok(self.packages.len())
            }
            Err(err) => {
                self.handle_error(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Record a failure and drop back to disconnected
    pub fn handle_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("idgames link: {}", message);
        self.state.write().last_error = Some(message.clone());
        self.abandon_fetch();
        self.listing = None;
        self.packages.clear();
        self.pending_events.push(LinkEvent::Failed(message));
        self.set_status(LinkStatus::Disconnected);
    }

    /// Stop any fetch and forget the listing
    pub fn disconnect(&mut self) {
        self.abandon_fetch();
        self.listing = None;
        self.packages.clear();
        if self.status() != LinkStatus::Disconnected {
            self.set_status(LinkStatus::Disconnected);
            log::info!("idgames link disconnected");
        }
    }

    pub fn listing(&self) -> Option<&Listing> {
        self.listing.as_ref()
    }

    /// Known packages in id order
    pub fn packages(&self) -> impl Iterator<Item = &PackageInfo> {
        self.packages.values()
    }

    pub fn package(&self, id: &str) -> Option<&PackageInfo> {
        self.packages.get(id)
    }

    /// Packages whose id matches `pattern`, a case-insensitive regular
    /// expression
    pub fn find_packages(&self, pattern: &str) -> Result<Vec<&PackageInfo>, LinkError> {
        if !self.is_ready() {
            return Err(LinkError::NotReady);
        }
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(self
            .packages
            .values()
            .filter(|package| regex.is_match(&package.id))
            .collect())
    }

    /// Synthesized `info.dei` metadata for a package
    pub fn metadata(&self, id: &str) -> Option<PackageMetadata> {
        self.package(id).map(PackageMetadata::for_package)
    }

    fn install_listing(&mut self, listing: Listing) {
        self.shutdown_runtime();
        self.packages = listing
            .files()
            .into_iter()
            .filter_map(PackageInfo::from_file)
            .map(|package| (package.id.clone(), package))
            .collect();
        log::info!(
            "idgames listing: {} files, {} packages",
            listing.len(),
            self.packages.len()
        );
        self.listing = Some(listing);
        self.pending_events.push(LinkEvent::PackagesAvailable(self.packages.len()));
        self.set_status(LinkStatus::Ready);
    }

    fn set_status(&mut self, status: LinkStatus) {
        let previous = std::mem::replace(&mut self.state.write().status, status);
        if previous != status {
            log::debug!("idgames link {} -> {}", previous, status);
            self.pending_events.push(LinkEvent::StatusChanged(status));
        }
    }

    /// Stop the fetch and make anything it already sent stale
    fn abandon_fetch(&mut self) {
        self.shutdown_runtime();
        self.generation += 1;
        while self.results_rx.try_recv().is_ok() {}
    }

    fn shutdown_runtime(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Drop for IdgamesLink {
    fn drop(&mut self) {
        self.shutdown_runtime();
    }
}

impl fmt::Debug for IdgamesLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdgamesLink")
            .field("url", &self.config.listing_url)
            .field("status", &self.status())
            .field("packages", &self.packages.len())
            .finish()
    }
}

async fn fetch_listing(
    url: Url,
    timeout: Duration,
    state: &RwLock<SharedState>,
) -> Result<Vec<u8>, LinkError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let mut response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(LinkError::Status(response.status().as_u16()));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        body.extend_from_slice(&chunk);
        state.write().bytes_received += chunk.len() as u64;
    }
    Ok(body)
}
