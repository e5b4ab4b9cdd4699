use thiserror::Error;

use crate::playback::state::PlaybackState;

#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The media was fetched but could not be decoded.
    #[error("failed to decode {source_ref}: {reason}")]
    Decode { source_ref: String, reason: String },

    /// The media could not be fetched at all.
    #[error("failed to load {source_ref}: {reason}")]
    Transport { source_ref: String, reason: String },

    #[error("{operation} is not valid while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: PlaybackState,
    },
}
