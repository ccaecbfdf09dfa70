//! UniFFI bindings for roomkit-core.
//!
//! Provides a RoomKitClient object that wraps TileManager and
//! SettingsStore into a single FFI-safe interface. Host shells forward
//! SDK callbacks as JSON payloads and render the resulting tile list.

use std::sync::Arc;

use roomkit_core::{
    self,
    events::{
        Peer as CorePeer, SdkEvent, Track as CoreTrack, TrackKind as CoreTrackKind,
    },
    layout,
    nodes::PeerTrackNode as CorePeerTrackNode,
    settings::Settings as CoreSettings,
    tiles::EventSender,
};

uniffi::include_scaffolding!("roomkit");

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before using RoomKitClient.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("roomkit_core=debug,roomkit_ffi=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .try_init();
    });
}

// ── FFI-safe type conversions ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum TrackKind {
    Audio,
    Video,
}

impl From<CoreTrackKind> for TrackKind {
    fn from(k: CoreTrackKind) -> Self {
        match k {
            CoreTrackKind::Audio => Self::Audio,
            CoreTrackKind::Video => Self::Video,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl From<Orientation> for layout::Orientation {
    fn from(o: Orientation) -> Self {
        match o {
            Orientation::Portrait => Self::Portrait,
            Orientation::Landscape => Self::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum GridLayout {
    Video,
    Audio,
}

impl From<GridLayout> for layout::GridLayout {
    fn from(l: GridLayout) -> Self {
        match l {
            GridLayout::Video => Self::Video,
            GridLayout::Audio => Self::Audio,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Peer {
    pub peer_id: String,
    pub name: String,
    pub is_local: bool,
    pub role: Option<String>,
    pub audio_muted: bool,
    pub video_muted: bool,
    pub metadata: Option<String>,
}

impl From<CorePeer> for Peer {
    fn from(p: CorePeer) -> Self {
        Self {
            peer_id: p.peer_id,
            name: p.name,
            is_local: p.is_local,
            role: p.role,
            audio_muted: p.audio_muted,
            video_muted: p.video_muted,
            metadata: p.metadata,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: String,
    pub kind: TrackKind,
    pub source: String,
    pub is_muted: bool,
}

impl From<CoreTrack> for Track {
    fn from(t: CoreTrack) -> Self {
        Self {
            track_id: t.track_id,
            kind: t.kind.into(),
            source: t.source.to_string(),
            is_muted: t.is_muted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeerTrackNode {
    pub id: String,
    pub peer: Peer,
    pub track: Option<Track>,
    pub is_degraded: bool,
}

impl From<CorePeerTrackNode> for PeerTrackNode {
    fn from(n: CorePeerTrackNode) -> Self {
        Self {
            id: n.id,
            peer: n.peer.into(),
            track: n.track.map(Track::from),
            is_degraded: n.is_degraded,
        }
    }
}

fn to_ffi_nodes(nodes: &[CorePeerTrackNode]) -> Vec<PeerTrackNode> {
    nodes.iter().cloned().map(PeerTrackNode::from).collect()
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub tiles_per_page_portrait_video: u32,
    pub tiles_per_page_portrait_audio: u32,
    pub tiles_per_page_landscape: u32,
    pub drop_auxiliary_tiles: bool,
}

impl From<CoreSettings> for Settings {
    fn from(s: CoreSettings) -> Self {
        Self {
            tiles_per_page_portrait_video: s.tiles_per_page_portrait_video,
            tiles_per_page_portrait_audio: s.tiles_per_page_portrait_audio,
            tiles_per_page_landscape: s.tiles_per_page_landscape,
            drop_auxiliary_tiles: s.drop_auxiliary_tiles,
        }
    }
}

// ── Error conversion ──────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RoomKitError {
    #[error("Decode error: {msg}")]
    Decode { msg: String },
    #[error("Invalid payload: {msg}")]
    InvalidPayload { msg: String },
    #[error("Channel closed: {msg}")]
    ChannelClosed { msg: String },
}

impl From<roomkit_core::RoomKitError> for RoomKitError {
    fn from(e: roomkit_core::RoomKitError) -> Self {
        tracing::error!("RoomKitError: {e}");
        let msg = e.to_string();
        match e {
            roomkit_core::RoomKitError::Decode(_) => Self::Decode { msg },
            roomkit_core::RoomKitError::InvalidPayload(_) => Self::InvalidPayload { msg },
            roomkit_core::RoomKitError::ChannelClosed => Self::ChannelClosed { msg },
        }
    }
}

// ── Callback interface ────────────────────────────────────────────────

pub trait NodesListener: Send + Sync {
    fn on_nodes_changed(&self, nodes: Vec<PeerTrackNode>);
}

// ── Bridge listener: FFI callback → core listener ─────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn NodesListener>,
}

impl roomkit_core::NodesListener for BridgeListener {
    fn on_nodes_changed(&self, nodes: Arc<Vec<CorePeerTrackNode>>) {
        self.ffi_listener.on_nodes_changed(to_ffi_nodes(&nodes));
    }
}

// ── RoomKitClient: main FFI object ────────────────────────────────────

pub struct RoomKitClient {
    tiles: roomkit_core::TileManager,
    settings: roomkit_core::SettingsStore,
    queue: EventSender,
    rt: tokio::runtime::Runtime,
}

impl RoomKitClient {
    pub fn new(data_dir: String) -> Self {
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        let settings = roomkit_core::SettingsStore::new(&data_dir);
        let tiles = roomkit_core::TileManager::new(settings.get().drop_auxiliary_tiles);

        // The loop lives as long as `queue`; dropping the client stops it.
        let queue = {
            let _guard = rt.enter();
            let (queue, _handle) = tiles.event_channel();
            queue
        };

        tracing::info!("RoomKitClient created (data_dir={data_dir})");
        Self {
            tiles,
            settings,
            queue,
            rt,
        }
    }

    /// Decode and apply an SDK event right away.
    ///
    /// Returns whether the tile list changed. Events enqueued through
    /// [`Self::enqueue_event_json`] that are still pending are not waited on.
    pub fn handle_event_json(&self, json: String) -> Result<bool, RoomKitError> {
        let event = SdkEvent::from_json(&json)?;
        Ok(self.rt.block_on(self.tiles.apply(event)))
    }

    /// Decode an SDK event and hand it to the background event loop.
    pub fn enqueue_event_json(&self, json: String) -> Result<(), RoomKitError> {
        let event = SdkEvent::from_json(&json)?;
        self.queue.send(event)?;
        Ok(())
    }

    pub fn nodes(&self) -> Vec<PeerTrackNode> {
        to_ffi_nodes(&self.tiles.snapshot())
    }

    pub fn pages(&self, orientation: Orientation, layout: GridLayout) -> Vec<Vec<PeerTrackNode>> {
        let nodes = self.tiles.snapshot();
        let per_page = layout::tiles_per_page(orientation.into(), layout.into(), &self.settings.get());
        layout::paginate(&nodes, per_page)
            .iter()
            .map(|page| to_ffi_nodes(page))
            .collect()
    }

    /// Drop every tile. Events enqueued before this call and not yet
    /// applied are discarded.
    pub fn clear(&self) {
        self.rt.block_on(self.tiles.clear());
    }

    pub fn add_listener(&self, listener: Box<dyn NodesListener>) {
        let bridge = Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        });
        self.tiles.add_listener(bridge);
    }

    pub fn get_settings(&self) -> Settings {
        self.settings.get().into()
    }

    pub fn set_tiles_per_page_portrait_video(&self, count: u32) {
        self.settings.set_tiles_per_page_portrait_video(count);
    }

    pub fn set_tiles_per_page_portrait_audio(&self, count: u32) {
        self.settings.set_tiles_per_page_portrait_audio(count);
    }

    pub fn set_tiles_per_page_landscape(&self, count: u32) {
        self.settings.set_tiles_per_page_landscape(count);
    }

    pub fn set_drop_auxiliary_tiles(&self, enabled: bool) {
        self.settings.set_drop_auxiliary_tiles(enabled);
        self.tiles.set_drop_auxiliary_tiles(enabled);
    }
}
