//! Reconciliation of the ordered tile list.
//!
//! Every function takes the current list by reference and returns a new
//! list; the input is never touched, so a snapshot already handed to the
//! UI keeps its content. Events that target a node which does not exist
//! (late or out-of-order delivery) leave the list as it was.

use crate::events::{Peer, Track, REGULAR_SOURCE};

/// A display entry pairing a peer with one of its track slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerTrackNode {
    /// Stable key for list virtualization, see [`node_id`].
    pub id: String,
    pub peer: Peer,
    /// Present only while the slot carries a video track.
    pub track: Option<Track>,
    pub is_degraded: bool,
}

/// Identity key of the node for `peer`'s `track` slot.
///
/// The peer id followed by the track source; a missing track maps to the
/// regular slot.
pub fn node_id(peer: &Peer, track: Option<&Track>) -> String {
    let source = track.map_or(REGULAR_SOURCE, |t| t.source.as_str());
    format!("{}{}", peer.peer_id, source)
}

/// Build a fresh node. Audio tracks are not stored on the node.
pub fn create_node(peer: &Peer, track: Option<&Track>) -> PeerTrackNode {
    PeerTrackNode {
        id: node_id(peer, track),
        peer: peer.clone(),
        track: track.filter(|t| t.is_video()).cloned(),
        is_degraded: false,
    }
}

/// Drop every node belonging to `peer_id`, whatever its source.
pub fn remove_by_peer_id(nodes: &[PeerTrackNode], peer_id: &str) -> Vec<PeerTrackNode> {
    nodes
        .iter()
        .filter(|n| n.peer.peer_id != peer_id)
        .cloned()
        .collect()
}

/// Drop the single node for `peer`'s `track` slot.
pub fn remove_node(nodes: &[PeerTrackNode], peer: &Peer, track: Option<&Track>) -> Vec<PeerTrackNode> {
    let id = node_id(peer, track);
    nodes.iter().filter(|n| n.id != id).cloned().collect()
}

/// Refresh the peer snapshot held by the nodes of `peer`.
///
/// When the peer has no node yet and `create_if_missing` is set, a
/// track-less regular node is inserted: at the head for the local peer,
/// at the tail otherwise.
pub fn upsert_by_peer(nodes: &[PeerTrackNode], peer: &Peer, create_if_missing: bool) -> Vec<PeerTrackNode> {
    if nodes.iter().any(|n| n.peer.peer_id == peer.peer_id) {
        return nodes
            .iter()
            .map(|n| {
                if n.peer.peer_id == peer.peer_id {
                    PeerTrackNode { peer: peer.clone(), ..n.clone() }
                } else {
                    n.clone()
                }
            })
            .collect();
    }

    if !create_if_missing {
        return nodes.to_vec();
    }

    insert(nodes, create_node(peer, None))
}

/// Clear the track of `peer`'s `track` slot, keeping the node in place.
pub fn remove_track(nodes: &[PeerTrackNode], peer: &Peer, track: &Track) -> Vec<PeerTrackNode> {
    let id = node_id(peer, Some(track));
    nodes
        .iter()
        .map(|n| {
            if n.id == id {
                PeerTrackNode {
                    peer: peer.clone(),
                    track: None,
                    ..n.clone()
                }
            } else {
                n.clone()
            }
        })
        .collect()
}

/// Insert or update the node for `peer`'s `track` slot.
///
/// `is_degraded` of `None` keeps whatever the node already had. An audio
/// track refreshes the peer but leaves the node's video track alone.
pub fn upsert(
    nodes: &[PeerTrackNode],
    peer: &Peer,
    track: Option<&Track>,
    is_degraded: Option<bool>,
    create_if_missing: bool,
) -> Vec<PeerTrackNode> {
    let id = node_id(peer, track);

    if nodes.iter().any(|n| n.id == id) {
        return nodes
            .iter()
            .map(|n| {
                if n.id != id {
                    return n.clone();
                }
                let track = match track {
                    Some(t) if !t.is_video() => n.track.clone(),
                    other => other.cloned(),
                };
                PeerTrackNode {
                    id: n.id.clone(),
                    peer: peer.clone(),
                    track,
                    is_degraded: is_degraded.unwrap_or(n.is_degraded),
                }
            })
            .collect();
    }

    if !create_if_missing {
        return nodes.to_vec();
    }

    let mut node = create_node(peer, track);
    node.is_degraded = is_degraded.unwrap_or(false);
    insert(nodes, node)
}

fn insert(nodes: &[PeerTrackNode], node: PeerTrackNode) -> Vec<PeerTrackNode> {
    let mut out = Vec::with_capacity(nodes.len() + 1);
    if node.peer.is_local {
        out.push(node);
        out.extend_from_slice(nodes);
    } else {
        out.extend_from_slice(nodes);
        out.push(node);
    }
    out
}
