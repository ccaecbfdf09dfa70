use crate::nodes::PeerTrackNode;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// What the grid is showing; audio-only tiles are smaller so more fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    Video,
    Audio,
}

pub fn tiles_per_page(orientation: Orientation, layout: GridLayout, settings: &Settings) -> usize {
    let count = match (orientation, layout) {
        (Orientation::Portrait, GridLayout::Video) => settings.tiles_per_page_portrait_video,
        (Orientation::Portrait, GridLayout::Audio) => settings.tiles_per_page_portrait_audio,
        (Orientation::Landscape, _) => settings.tiles_per_page_landscape,
    };
    count.max(1) as usize
}

/// Split the tile list into consecutive pages, keeping list order.
pub fn paginate(nodes: &[PeerTrackNode], page_size: usize) -> Vec<Vec<PeerTrackNode>> {
    nodes.chunks(page_size.max(1)).map(<[_]>::to_vec).collect()
}
