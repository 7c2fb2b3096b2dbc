use glam::IVec2;

/// Misuse of the height-map editing API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeightMapError {
    #[error("A brush stroke is already in progress")]
    StrokeInProgress,

    #[error("No brush stroke in progress")]
    NoStroke,

    #[error("No key frame to file the brush stroke under")]
    NoKeyFrame,

    #[error("Key frame {index} does not exist ({len} recorded)")]
    KeyFrameOutOfRange { index: usize, len: usize },

    #[error("Key frame {key_frame} has only {len} strokes, {requested} requested")]
    StrokeOutOfRange {
        key_frame: usize,
        requested: usize,
        len: usize,
    },

    #[error("No patch at ({}, {})", .0.x, .0.y)]
    MissingPatch(IVec2),
}
