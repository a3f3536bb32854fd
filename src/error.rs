//! Error taxonomy for object registration, grid physics and level handling.
//!
//! Per-frame problems (a shader binding that went missing, a grid lookup outside
//! the map) are recoverable: callers log them and keep the frame loop running.
//! Structural problems (no graphics context, running out of levels with no policy)
//! are surfaced once and stop the caller.

use crate::data_structures::attribute::AttributeKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("object `{object}`: attribute `{attribute}` has no location in the shader")]
    ShaderBinding { object: String, attribute: String },
    #[error(
        "object `{object}`: attribute `{attribute}` is declared as {expected:?} but the shader expects {found:?}"
    )]
    ShaderTypeMismatch {
        object: String,
        attribute: String,
        expected: AttributeKind,
        found: AttributeKind,
    },
    #[error("object `{object}`: attribute `{attribute}` expects {expected} floats, got {found}")]
    AttributeSize {
        object: String,
        attribute: String,
        expected: usize,
        found: usize,
    },
    #[error("object `{object}` was loaded without instances")]
    EmptyInstanceList { object: String },
    #[error("object `{object}` has neither indices nor a per-vertex `position` attribute")]
    MissingVertexSource { object: String },
    #[error("grid cell ({row}, {col}) is outside the {rows}x{cols} map")]
    GridIndexOutOfRange {
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },
    #[error("level {level} does not exist, only {levels} levels are defined")]
    LevelOverflow { level: usize, levels: usize },
    #[error("graphics context unavailable: {0}")]
    GraphicsContextUnavailable(String),
    #[error("unknown object id {0}")]
    UnknownObject(u32),
    #[error("unknown or deleted instance")]
    UnknownInstance,
    #[error("invalid tile code {0}")]
    InvalidTile(u8),
    #[error("a game needs at least one level")]
    EmptyLevelSet,
}
