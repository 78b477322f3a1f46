use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::events::{EventKind, EventLog, PeerEvent};
use super::types::{Coordination, PeerStatus, QueryOutcome};
use crate::catalog::service::Catalog;
use crate::catalog::types::{CatalogSnapshot, FileMeta, FileSet};
use crate::clock::{Clock, SystemClock};
use crate::config::PeerConfig;
use crate::election::engine::ElectionEngine;
use crate::error::{PeerError, Result};
use crate::files::download::{DownloadReport, DownloadRequest, DownloadSource, Verification, verify};
use crate::files::store::{FileStore, validate_file_name};
use crate::files::transfer::fetch_file;
use crate::heartbeat::detector::LeaderWatch;
use crate::membership::directory::PeerDirectory;
use crate::membership::types::{PeerId, Role};
use crate::transport::message::Message;
use crate::transport::tcp::TcpServer;
use crate::transport::udp::UdpTransport;
use crate::transport::{Transport, detect_local_ip};

/// One member of the group: owns every piece of coordination state and
/// exposes the operations the console drives.
pub struct PeerNode {
    pub(crate) id: PeerId,
    pub(crate) config: PeerConfig,
    /// Address announced in DISCOVERY and COORDINATOR.
    pub(crate) advertised: SocketAddr,
    pub(crate) tcp_port: u16,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) udp: Option<Arc<UdpTransport>>,
    pub(crate) tcp: Mutex<Option<TcpServer>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) store: FileStore,
    pub(crate) directory: PeerDirectory,
    pub(crate) catalog: Catalog,
    pub(crate) state: Mutex<Coordination>,
    pub(crate) events: EventLog,
    /// Listing sent by the last explicit publish, replayed on leader change.
    pub(crate) last_published: Mutex<Option<BTreeMap<String, FileMeta>>>,
    /// Bumped whenever the catalog view changes.
    pub(crate) catalog_rev: watch::Sender<u64>,
    pub(crate) shutdown: Arc<AtomicBool>,
    pub(crate) tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PeerNode {
    /// Binds the UDP and TCP sockets. Bind failures are returned here and
    /// nowhere else.
    pub async fn bind(config: PeerConfig) -> Result<Arc<Self>> {
        let udp = Arc::new(UdpTransport::bind(&config).await?);
        let transport: Arc<dyn Transport> = udp.clone();
        Self::assemble(config, transport, Some(udp), Arc::new(SystemClock)).await
    }

    /// Builds a peer on top of an existing datagram transport. The TCP file
    /// server is still real.
    pub async fn with_transport(
        config: PeerConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>> {
        Self::assemble(config, transport, None, clock).await
    }

    async fn assemble(
        config: PeerConfig,
        transport: Arc<dyn Transport>,
        udp: Option<Arc<UdpTransport>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>> {
        let tcp = TcpServer::bind(config.tcp_port).await?;
        let tcp_port = tcp.local_addr().port();
        let store = FileStore::open(&config.shared_dir)?;

        let ip = config.advertise_ip.unwrap_or_else(detect_local_ip);
        let advertised = SocketAddr::new(ip, transport.local_addr().port());
        let id = PeerId::new();
        let (catalog_rev, _) = watch::channel(0);

        tracing::info!(
            "Peer {} ready: udp {} tcp {} shared dir {}",
            id,
            advertised,
            tcp_port,
            store.root().display()
        );

        Ok(Arc::new(Self {
            id,
            advertised,
            tcp_port,
            transport,
            udp,
            tcp: Mutex::new(Some(tcp)),
            store,
            directory: PeerDirectory::new(),
            catalog: Catalog::new(),
            state: Mutex::new(Coordination {
                role: Role::Follower,
                leader_id: None,
                election: ElectionEngine::new(&config.timings),
                leader_watch: LeaderWatch::default(),
                discovery_deadline: None,
                resume_leadership: false,
            }),
            events: EventLog::new(config.event_log_capacity),
            last_published: Mutex::new(None),
            catalog_rev,
            shutdown: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
            clock,
            config,
        }))
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.state.lock().role
    }

    pub fn leader_id(&self) -> Option<PeerId> {
        self.state.lock().leader_id.clone()
    }

    pub fn advertised_addr(&self) -> SocketAddr {
        self.advertised
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Election rounds this peer has opened so far.
    pub fn election_rounds(&self) -> u64 {
        self.state.lock().election.rounds_started()
    }

    pub fn status(&self) -> PeerStatus {
        let (role, leader_id) = {
            let state = self.state.lock();
            (state.role, state.leader_id.clone())
        };

        PeerStatus {
            peer_id: self.id.clone(),
            role,
            leader_id,
            udp_addr: self.advertised,
            tcp_port: self.tcp_port,
            peers: self.directory.len(),
            catalog_files: self.catalog.file_count(),
        }
    }

    pub fn events_since(&self, seq: u64) -> Vec<PeerEvent> {
        self.events.since(seq)
    }

    /// The catalog as this peer sees it: authoritative on the leader, the
    /// last FILE_LIST elsewhere.
    pub fn catalog_view(&self) -> CatalogSnapshot {
        self.catalog.snapshot()
    }

    // ============================================================
    // DISCOVERY & ELECTION
    // ============================================================

    /// Broadcasts DISCOVERY and arms the discovery deadline.
    pub fn discover(&self) {
        let deadline = self.clock.now() + self.config.timings.discovery_timeout;
        self.state.lock().discovery_deadline = Some(deadline);

        let message = Message::Discovery {
            sender_id: self.id.clone(),
            addr: self.advertised,
        };
        if let Err(e) = self.transport.broadcast(&message) {
            tracing::warn!("Failed to broadcast DISCOVERY: {}", e);
        }

        self.events.record(EventKind::DiscoveryStarted);
        tracing::info!("Looking for a leader");
    }

    /// Opens an election round. Returns `false` when one is already open.
    pub fn start_election(&self) -> bool {
        let now = self.clock.now();
        let round = {
            let mut state = self.state.lock();
            let was_leader = state.role == Role::Leader;
            if !state.election.start(now) {
                return false;
            }
            state.resume_leadership = was_leader;
            state.role = Role::Electing;
            state.leader_id = None;
            state.discovery_deadline = None;
            state.election.rounds_started()
        };

        let message = Message::Election {
            sender_id: self.id.clone(),
        };
        if let Err(e) = self.transport.broadcast(&message) {
            tracing::warn!("Failed to broadcast ELECTION: {}", e);
        }

        self.events.record(EventKind::ElectionStarted { round });
        tracing::info!("Started election round {}", round);
        true
    }

    // ============================================================
    // CATALOG OPERATIONS
    // ============================================================

    /// Copies `path` into the shared directory, then republishes when a
    /// leader is known.
    pub async fn share(&self, path: &Path) -> Result<String> {
        let filename = self.store.share_file(path).await?;
        self.events.record(EventKind::FileShared {
            filename: filename.clone(),
        });

        if self.leader_id().is_some()
            && let Err(e) = self.publish().await
        {
            tracing::warn!("Shared {} but could not publish: {}", filename, e);
        }

        Ok(filename)
    }

    /// Announces the shared directory to the leader. Returns the number of
    /// files announced; an empty directory sends nothing.
    pub async fn publish(&self) -> Result<usize> {
        if self.leader_id().is_none() {
            return Err(PeerError::NoLeader);
        }

        let files = self.store.list_files().await?;
        if files.is_empty() {
            tracing::warn!("No shared files to publish");
            return Ok(0);
        }

        *self.last_published.lock() = Some(files.clone());
        self.publish_listing(files)
    }

    /// Sends `files` to the leader, or applies them in place when this peer
    /// is the leader.
    pub(crate) fn publish_listing(&self, files: BTreeMap<String, FileMeta>) -> Result<usize> {
        let (role, leader_id) = {
            let state = self.state.lock();
            (state.role, state.leader_id.clone())
        };

        if role == Role::Leader {
            let host = self.advertised.ip().to_string();
            let count = self
                .catalog
                .publish(&self.id, &host, self.tcp_port, FileSet::Listing(files));
            self.bump_catalog();
            self.events.record(EventKind::FilesPublished {
                peer_id: self.id.clone(),
                count,
            });
            tracing::info!("Published {} file(s) to own catalog", count);
            return Ok(count);
        }

        let leader_id = leader_id.ok_or(PeerError::NoLeader)?;
        let leader_addr = self
            .directory
            .addr_of(&leader_id)
            .ok_or(PeerError::LeaderAddressUnknown)?;
        let count = files.len();
        let message = Message::Publish {
            sender_id: self.id.clone(),
            files: FileSet::Listing(files),
            tcp_port: self.tcp_port,
        };
        self.transport.send(&message, leader_addr)?;

        tracing::info!("Published {} file(s) to leader {}", count, leader_id);
        Ok(count)
    }

    /// Replays the last published listing, if any, to the current leader.
    pub(crate) fn republish(&self) {
        let Some(files) = self.last_published.lock().clone() else {
            return;
        };
        if let Err(e) = self.publish_listing(files) {
            tracing::warn!("Republish failed: {}", e);
        }
    }

    /// Reads the catalog on the leader, or asks the leader for it.
    pub fn query(&self) -> Result<QueryOutcome> {
        let (role, leader_id) = {
            let state = self.state.lock();
            (state.role, state.leader_id.clone())
        };

        if role == Role::Leader {
            return Ok(QueryOutcome::Local(self.catalog.snapshot()));
        }

        let leader_id = leader_id.ok_or(PeerError::NoLeader)?;
        let leader_addr = self
            .directory
            .addr_of(&leader_id)
            .ok_or(PeerError::LeaderAddressUnknown)?;
        let message = Message::QueryFiles {
            sender_id: self.id.clone(),
        };
        self.transport.send(&message, leader_addr)?;

        tracing::debug!("Sent QUERY_FILES to {}", leader_id);
        Ok(QueryOutcome::Requested)
    }

    /// Like [`query`](Self::query), but waits up to `timeout` for the
    /// FILE_LIST reply.
    pub async fn query_and_wait(&self, timeout: Duration) -> Result<CatalogSnapshot> {
        let mut changes = self.catalog_rev.subscribe();

        match self.query()? {
            QueryOutcome::Local(snapshot) => Ok(snapshot),
            QueryOutcome::Requested => match tokio::time::timeout(timeout, changes.changed()).await {
                Ok(Ok(())) => Ok(self.catalog.snapshot()),
                _ => Err(PeerError::QueryTimeout),
            },
        }
    }

    pub(crate) fn bump_catalog(&self) {
        self.catalog_rev.send_modify(|rev| *rev += 1);
    }

    // ============================================================
    // DOWNLOAD
    // ============================================================

    /// Fetches a file straight from a hosting peer and checks its hash.
    ///
    /// A hash mismatch is a warning: the report carries it and the file is
    /// kept. No other candidate is tried.
    pub async fn download(&self, request: DownloadRequest) -> Result<DownloadReport> {
        validate_file_name(&request.filename)?;

        let (host, port, catalog_hash) = match &request.source {
            DownloadSource::Direct { host, port } => (host.clone(), *port, None),
            DownloadSource::Catalog(policy) => {
                let candidates =
                    self.catalog
                        .lookup(&request.filename)
                        .ok_or_else(|| PeerError::CatalogMiss {
                            filename: request.filename.clone(),
                        })?;
                let chosen = policy
                    .select(&candidates)
                    .ok_or_else(|| PeerError::CatalogMiss {
                        filename: request.filename.clone(),
                    })?;
                (chosen.host.clone(), chosen.port, chosen.hash.clone())
            }
        };
        let expected = request.expected_hash.clone().or(catalog_hash);

        let save_dir = request
            .save_dir
            .clone()
            .unwrap_or_else(|| self.store.root().to_path_buf());
        tokio::fs::create_dir_all(&save_dir).await?;
        let dest = save_dir.join(&request.filename);

        tracing::info!("Downloading {} from {}:{}", request.filename, host, port);
        let fetched = fetch_file(
            &host,
            port,
            &request.filename,
            &dest,
            self.config.chunk_size,
            |received, total| tracing::debug!("{}: {}/{} bytes", request.filename, received, total),
        )
        .await;

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Download of {} failed: {}", request.filename, e);
                self.events.record(EventKind::DownloadFailed {
                    filename: request.filename.clone(),
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let verification = verify(&dest, expected.as_deref()).await?;
        if let Some(mismatch) = verification.integrity_error() {
            tracing::warn!("{}: {}", request.filename, mismatch);
            self.events.record(EventKind::IntegrityWarning {
                filename: request.filename.clone(),
                expected: mismatch.expected,
                actual: mismatch.actual,
            });
        }
        if verification == Verification::Skipped {
            tracing::debug!("{}: no expected hash, verification skipped", request.filename);
        }

        self.events.record(EventKind::DownloadCompleted {
            filename: request.filename.clone(),
            bytes,
        });
        tracing::info!("Downloaded {} ({} bytes) to {}", request.filename, bytes, dest.display());

        Ok(DownloadReport {
            filename: request.filename,
            path: dest,
            host,
            port,
            bytes,
            verification,
        })
    }

    // ============================================================
    // LIFECYCLE
    // ============================================================

    /// Signals every loop to stop. Each exits within one poll interval.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::Relaxed) {
            return;
        }
        tracing::info!("Peer {} shutting down", self.id);
    }

    /// Waits for the background loops to finish after [`shutdown`](Self::shutdown).
    pub async fn join(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
