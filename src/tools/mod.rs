pub mod edit;
pub mod transform;

use serde::{Serialize, Deserialize};

/// Which transform gizmo is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl TransformMode {
    pub const ALL: [TransformMode; 3] = [TransformMode::Translate, TransformMode::Rotate, TransformMode::Scale];

    pub fn label(self) -> &'static str {
        match self {
            TransformMode::Translate => "Move",
            TransformMode::Rotate => "Rotate",
            TransformMode::Scale => "Scale",
        }
    }
}
