use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::errors::RoomKitError;
use crate::events::{EventEmitter, NodesListener, SdkEvent};
use crate::nodes::{self, PeerTrackNode};

/// Holds the current tile list and applies SDK events to it.
///
/// Each applied event produces a new `Arc` snapshot that replaces the
/// previous one; snapshots already handed out are never modified.
/// The snapshot lock is released before listeners run, so a listener may
/// read the manager back; `writer` keeps mutations and notifications in
/// the same order.
#[derive(Clone)]
pub struct TileManager {
    nodes: Arc<RwLock<Arc<Vec<PeerTrackNode>>>>,
    writer: Arc<Mutex<()>>,
    emitter: EventEmitter,
    drop_auxiliary_tiles: Arc<AtomicBool>,
    /// Bumped by `clear`; queued events stamped with an older epoch are
    /// discarded.
    epoch: Arc<AtomicU64>,
}

/// Sending half of [`TileManager::event_channel`].
#[derive(Clone)]
pub struct EventSender {
    tx: UnboundedSender<(u64, SdkEvent)>,
    epoch: Arc<AtomicU64>,
}

impl EventSender {
    pub fn send(&self, event: SdkEvent) -> Result<(), RoomKitError> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        self.tx
            .send((epoch, event))
            .map_err(|_| RoomKitError::ChannelClosed)
    }
}

impl TileManager {
    pub fn new(drop_auxiliary_tiles: bool) -> Self {
        Self {
            nodes: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            writer: Arc::new(Mutex::new(())),
            emitter: EventEmitter::new(),
            drop_auxiliary_tiles: Arc::new(AtomicBool::new(drop_auxiliary_tiles)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a listener for snapshot changes.
    pub fn add_listener(&self, listener: Arc<dyn NodesListener>) {
        self.emitter.add_listener(listener);
    }

    pub fn set_drop_auxiliary_tiles(&self, enabled: bool) {
        self.drop_auxiliary_tiles.store(enabled, Ordering::Relaxed);
    }

    /// Current tile list.
    pub fn snapshot(&self) -> Arc<Vec<PeerTrackNode>> {
        self.nodes.read().unwrap().clone()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    /// Apply one event. Returns `true` if the tile list changed, in which
    /// case listeners have been notified with the new snapshot.
    pub async fn apply(&self, event: SdkEvent) -> bool {
        let _writer = self.writer.lock().await;
        self.apply_locked(&event)
    }

    fn apply_locked(&self, event: &SdkEvent) -> bool {
        let drop_aux = self.drop_auxiliary_tiles.load(Ordering::Relaxed);
        let current = self.snapshot();
        let next = reduce(&current, event, drop_aux);
        if next == *current {
            tracing::debug!("{} for peer {}: no change", event.name(), event.peer_id());
            return false;
        }
        tracing::debug!(
            "{} for peer {}: {} -> {} tiles",
            event.name(),
            event.peer_id(),
            current.len(),
            next.len()
        );
        let next = Arc::new(next);
        *self.nodes.write().unwrap() = next.clone();
        self.emitter.emit(next);
        true
    }

    /// Drop every tile, e.g. after leaving the room.
    ///
    /// Events queued through [`Self::event_channel`] before this call and
    /// not yet applied are discarded.
    pub async fn clear(&self) {
        let _writer = self.writer.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if self.snapshot().is_empty() {
            return;
        }
        let empty = Arc::new(Vec::new());
        *self.nodes.write().unwrap() = empty.clone();
        self.emitter.emit(empty);
    }

    /// Apply events from `events` in delivery order until the sender side
    /// is dropped. Must be called from within a tokio runtime.
    fn spawn_event_loop(&self, events: UnboundedReceiver<(u64, SdkEvent)>) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            manager.event_loop(events).await;
        })
    }

    /// Create a channel whose events are applied by a freshly spawned loop.
    /// Must be called from within a tokio runtime.
    pub fn event_channel(&self) -> (EventSender, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.spawn_event_loop(rx);
        let sender = EventSender {
            tx,
            epoch: self.epoch.clone(),
        };
        (sender, handle)
    }

    async fn event_loop(&self, mut events: UnboundedReceiver<(u64, SdkEvent)>) {
        tracing::info!("tile event loop started");
        while let Some((epoch, event)) = events.recv().await {
            let _writer = self.writer.lock().await;
            if epoch != self.epoch.load(Ordering::SeqCst) {
                tracing::debug!("{} for peer {}: discarded after clear", event.name(), event.peer_id());
                continue;
            }
            self.apply_locked(&event);
        }
        tracing::info!("tile event loop stopped: channel closed");
    }
}

/// Map one event onto the matching registry operation.
pub fn reduce(nodes: &[PeerTrackNode], event: &SdkEvent, drop_auxiliary_tiles: bool) -> Vec<PeerTrackNode> {
    match event {
        SdkEvent::PeerJoined { peer } => nodes::upsert_by_peer(nodes, peer, true),
        SdkEvent::PeerUpdated { peer } => nodes::upsert_by_peer(nodes, peer, false),
        SdkEvent::PeerLeft { peer_id } => nodes::remove_by_peer_id(nodes, peer_id),
        SdkEvent::TrackAdded { peer, track } => nodes::upsert(nodes, peer, Some(track), None, true),
        SdkEvent::TrackRemoved { peer, track } => {
            if drop_auxiliary_tiles && !track.source.is_regular() {
                nodes::remove_node(nodes, peer, Some(track))
            } else {
                nodes::remove_track(nodes, peer, track)
            }
        }
        SdkEvent::TrackUpdated { peer, track } => nodes::upsert(nodes, peer, Some(track), None, false),
        SdkEvent::TrackDegraded { peer, track } => nodes::upsert(nodes, peer, Some(track), Some(true), false),
        SdkEvent::TrackRestored { peer, track } => nodes::upsert(nodes, peer, Some(track), Some(false), false),
    }
}
