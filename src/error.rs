//! Error types for the editing core and project IO.
//!
//! Every variant is recoverable: the editor stays usable after any of them.

use thiserror::Error;

use crate::scene::InstanceId;
use crate::scene::catalog::Archetype;

pub type Result<T> = std::result::Result<T, EditorError>;

/// Failures of scene, selection and workflow operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Stale id reference (already deleted, or never existed).
    #[error("no instance with id {0}")]
    NotFound(InstanceId),

    #[error("invalid surface key: {0}")]
    InvalidSurface(String),

    /// Malformed selection request: unparseable id or unknown target kind.
    #[error("invalid selection target: {0}")]
    InvalidTarget(String),

    #[error("invalid room {field}: {value} (must be a positive number)")]
    InvalidDimension { field: &'static str, value: f32 },

    #[error("instance {0} is locked")]
    LockedInstance(InstanceId),

    /// The injected session context does not allow this archetype.
    #[error("{0} is not available on the current plan")]
    PlanRestricted(Archetype),

    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Scene operations are only accepted while the workflow is editing.
    #[error("the editor is not in the editing state")]
    NotEditing,
}

/// Failures of the save sink and the native project file format.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("you must be signed in to save a project")]
    NotAuthenticated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("not a Roomcraft project file (bad magic)")]
    BadMagic,

    #[error("file version {0} is newer than supported")]
    UnsupportedVersion(u32),

    #[error("file too small")]
    Truncated,

    #[error("invalid project: {0}")]
    InvalidDocument(#[from] EditorError),
}
