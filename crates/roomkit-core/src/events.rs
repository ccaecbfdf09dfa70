use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::errors::RoomKitError;
use crate::nodes::PeerTrackNode;

/// Source string the SDK uses for a peer's primary audio/video slot.
pub const REGULAR_SOURCE: &str = "regular";
const SCREEN_SOURCE: &str = "screen";
const PLUGIN_SOURCE: &str = "plugin";

/// Peer/track updates delivered by the conferencing SDK.
///
/// Host shells hand these over as JSON objects tagged with `type`;
/// see [`SdkEvent::from_json`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SdkEvent {
    PeerJoined { peer: Peer },
    PeerLeft { peer_id: String },
    PeerUpdated { peer: Peer },
    TrackAdded { peer: Peer, track: Track },
    TrackRemoved { peer: Peer, track: Track },
    TrackUpdated { peer: Peer, track: Track },
    TrackDegraded { peer: Peer, track: Track },
    TrackRestored { peer: Peer, track: Track },
}

impl SdkEvent {
    /// Decode a host payload into a typed event.
    ///
    /// Rejects events whose peer has an empty id, since such a peer would
    /// collapse onto a degenerate node id.
    pub fn from_json(json: &str) -> Result<Self, RoomKitError> {
        let event: SdkEvent = serde_json::from_str(json)?;
        if event.peer_id().is_empty() {
            tracing::warn!("rejecting {} event without peer id", event.name());
            return Err(RoomKitError::InvalidPayload(format!(
                "{} event has an empty peer_id",
                event.name()
            )));
        }
        Ok(event)
    }

    pub fn peer_id(&self) -> &str {
        match self {
            SdkEvent::PeerLeft { peer_id } => peer_id,
            SdkEvent::PeerJoined { peer }
            | SdkEvent::PeerUpdated { peer }
            | SdkEvent::TrackAdded { peer, .. }
            | SdkEvent::TrackRemoved { peer, .. }
            | SdkEvent::TrackUpdated { peer, .. }
            | SdkEvent::TrackDegraded { peer, .. }
            | SdkEvent::TrackRestored { peer, .. } => &peer.peer_id,
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            SdkEvent::PeerJoined { .. } => "peer_joined",
            SdkEvent::PeerLeft { .. } => "peer_left",
            SdkEvent::PeerUpdated { .. } => "peer_updated",
            SdkEvent::TrackAdded { .. } => "track_added",
            SdkEvent::TrackRemoved { .. } => "track_removed",
            SdkEvent::TrackUpdated { .. } => "track_updated",
            SdkEvent::TrackDegraded { .. } => "track_degraded",
            SdkEvent::TrackRestored { .. } => "track_restored",
        }
    }
}

/// Latest known snapshot of a participant, as reported by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Peer {
    pub peer_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_local: bool,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_muted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_muted: bool,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    pub track_id: String,
    pub kind: TrackKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: TrackSource,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_muted: bool,
}

/// Hosts bridging from JS pass `null` for unset fields; treat it like a
/// missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Track {
    pub fn is_video(&self) -> bool {
        self.kind == TrackKind::Video
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Slot a track occupies for its peer.
///
/// Unknown source strings are kept as-is so that two custom sources never
/// collapse onto the same node id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum TrackSource {
    #[default]
    Regular,
    Screen,
    Plugin,
    Custom(String),
}

impl TrackSource {
    pub fn as_str(&self) -> &str {
        match self {
            TrackSource::Regular => REGULAR_SOURCE,
            TrackSource::Screen => SCREEN_SOURCE,
            TrackSource::Plugin => PLUGIN_SOURCE,
            TrackSource::Custom(s) => s,
        }
    }

    pub fn is_regular(&self) -> bool {
        *self == TrackSource::Regular
    }
}

impl From<String> for TrackSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            REGULAR_SOURCE => TrackSource::Regular,
            SCREEN_SOURCE => TrackSource::Screen,
            PLUGIN_SOURCE => TrackSource::Plugin,
            _ => TrackSource::Custom(s),
        }
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for receiving tile list snapshots.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait NodesListener: Send + Sync {
    fn on_nodes_changed(&self, nodes: Arc<Vec<PeerTrackNode>>);
}

/// Dispatches published snapshots to registered listeners.
#[derive(Clone)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Vec<Arc<dyn NodesListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(std::sync::RwLock::new(Vec::new())),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn NodesListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    pub fn emit(&self, nodes: Arc<Vec<PeerTrackNode>>) {
        let listeners = self.listeners.read().unwrap();
        for listener in listeners.iter() {
            listener.on_nodes_changed(nodes.clone());
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: Arc<AtomicUsize>,
    }

    impl NodesListener for CountingListener {
        fn on_nodes_changed(&self, _nodes: Arc<Vec<PeerTrackNode>>) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn emitter_dispatches_to_multiple_listeners() {
        let emitter = EventEmitter::new();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        emitter.add_listener(Arc::new(CountingListener { count: count1.clone() }));
        emitter.add_listener(Arc::new(CountingListener { count: count2.clone() }));

        emitter.emit(Arc::new(Vec::new()));

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn decodes_peer_joined() {
        let event = SdkEvent::from_json(
            r#"{"type":"peer_joined","peer":{"peer_id":"p1","name":"Alice","is_local":true}}"#,
        )
        .unwrap();
        match event {
            SdkEvent::PeerJoined { peer } => {
                assert_eq!(peer.peer_id, "p1");
                assert_eq!(peer.name, "Alice");
                assert!(peer.is_local);
                assert!(!peer.audio_muted);
                assert_eq!(peer.role, None);
            }
            other => panic!("expected PeerJoined, got {other:?}"),
        }
    }

    #[test]
    fn decodes_track_with_default_source() {
        let event = SdkEvent::from_json(
            r#"{"type":"track_added","peer":{"peer_id":"p1"},"track":{"track_id":"t1","kind":"video"}}"#,
        )
        .unwrap();
        match event {
            SdkEvent::TrackAdded { track, .. } => {
                assert_eq!(track.source, TrackSource::Regular);
                assert!(track.is_video());
            }
            other => panic!("expected TrackAdded, got {other:?}"),
        }
    }

    #[test]
    fn decodes_custom_source_verbatim() {
        let event = SdkEvent::from_json(
            r#"{"type":"track_removed","peer":{"peer_id":"p1"},"track":{"track_id":"t1","kind":"video","source":"whiteboard"}}"#,
        )
        .unwrap();
        match event {
            SdkEvent::TrackRemoved { track, .. } => {
                assert_eq!(track.source, TrackSource::Custom("whiteboard".into()));
                assert_eq!(track.source.as_str(), "whiteboard");
            }
            other => panic!("expected TrackRemoved, got {other:?}"),
        }
    }

    #[test]
    fn known_source_strings_map_to_variants() {
        assert_eq!(TrackSource::from("screen".to_string()), TrackSource::Screen);
        assert_eq!(TrackSource::from("plugin".to_string()), TrackSource::Plugin);
        assert_eq!(TrackSource::from("regular".to_string()), TrackSource::Regular);
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let event = SdkEvent::from_json(
            r#"{"type":"track_added","peer":{"peer_id":"p1","name":null,"is_local":null,"role":null,"audio_muted":null},"track":{"track_id":"t1","kind":"video","source":null,"is_muted":null}}"#,
        )
        .unwrap();
        match event {
            SdkEvent::TrackAdded { peer, track } => {
                assert_eq!(peer.name, "");
                assert!(!peer.is_local);
                assert_eq!(peer.role, None);
                assert_eq!(track.source, TrackSource::Regular);
                assert!(!track.is_muted);
            }
            other => panic!("expected TrackAdded, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_peer_id() {
        let err = SdkEvent::from_json(r#"{"type":"peer_left","peer_id":""}"#).unwrap_err();
        assert!(matches!(err, RoomKitError::InvalidPayload(_)));
    }

    #[test]
    fn rejects_unknown_event_type() {
        let err = SdkEvent::from_json(r#"{"type":"room_exploded"}"#).unwrap_err();
        assert!(matches!(err, RoomKitError::Decode(_)));
    }
}
