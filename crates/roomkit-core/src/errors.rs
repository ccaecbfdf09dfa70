use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoomKitError {
    #[error("failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
    #[error("event channel closed")]
    ChannelClosed,
}
