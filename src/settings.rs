use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Serialize, Deserialize};

use crate::context::{LocalSession, Plan};

/// All user-configurable settings, persisted to JSON.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraSettings,
    pub display: DisplaySettings,
    pub editor: EditorSettings,
    pub account: AccountSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub orbit_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_speed: f32,
    pub invert_orbit_y: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 200.0,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.01,
            zoom_speed: 1.0,
            invert_orbit_y: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    pub bg_color: [f32; 3],
    pub selection_color: [f32; 4],
    pub hover_color: [f32; 4],
    pub show_grid: bool,
    /// Show rotations in degrees in the property panel. Stored values are always radians.
    pub rotation_in_degrees: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            bg_color: [0.09, 0.1, 0.12],
            selection_color: [0.23, 0.51, 0.96, 1.0],
            hover_color: [0.5, 0.7, 1.0, 1.0],
            show_grid: true,
            rotation_in_degrees: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub construct_delay_ms: u64,
    /// Where saved projects go. Defaults to a directory under the config dir.
    pub projects_dir: Option<PathBuf>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            construct_delay_ms: 1500,
            projects_dir: None,
        }
    }
}

impl EditorSettings {
    pub fn construct_delay(&self) -> Duration {
        Duration::from_millis(self.construct_delay_ms)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.projects_dir.clone().unwrap_or_else(|| config_dir().join("projects"))
    }
}

/// Local stand-in for the signed-in user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AccountSettings {
    pub user: Option<String>,
    pub plan: Plan,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self { user: None, plan: Plan::Free }
    }
}

impl AccountSettings {
    pub fn session(&self) -> LocalSession {
        match &self.user {
            Some(name) if !name.trim().is_empty() => LocalSession::signed_in(name.trim(), self.plan),
            _ => LocalSession::anonymous(),
        }
    }
}

impl Settings {
    /// Load settings from config file. Falls back to defaults on error.
    pub fn load() -> Self {
        Self::load_from(&config_dir().join("settings.json"))
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<Settings>(&data) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to config file.
    pub fn save(&self) {
        let path = config_dir().join("settings.json");
        if let Err(e) = self.save_to(&path) {
            log::error!("could not save settings to {}: {e}", path.display());
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }
}

pub fn config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join("roomcraft3d")
}

/// Which tab is currently active in the settings dialog.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    Camera,
    Display,
    Editor,
    Account,
}
