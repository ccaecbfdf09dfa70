//! Room kit core: tile list reconciliation for conferencing UIs.
//!
//! Pure Rust crate with no platform dependencies.
//! Consumed by native UI shells via UniFFI bindings.

pub mod errors;
pub mod events;
pub mod layout;
pub mod nodes;
pub mod settings;
pub mod tiles;

pub use errors::RoomKitError;
pub use events::{NodesListener, Peer, SdkEvent, Track, TrackKind, TrackSource};
pub use layout::{GridLayout, Orientation};
pub use nodes::PeerTrackNode;
pub use settings::{Settings, SettingsStore};
pub use tiles::TileManager;
