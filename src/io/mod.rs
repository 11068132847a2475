use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec3;
use serde::{Serialize, Deserialize};

use crate::context::SessionContext;
use crate::error::{EditorError, SaveError};
use crate::scene::room::{FloorMaterial, RoomDimensions, RoomShell, SurfaceColors};
use crate::scene::{clamp_scale, FurnitureInstance, InstanceId, Scene};

/// Magic header bytes for the .room file format.
const MAGIC: &[u8; 4] = b"RMCR";
/// Current file format version.
const VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

pub const ROOM_TYPE: &str = "Custom Room";
pub const DESIGN_STYLE: &str = "Manual";
pub const ROOM_EXTENSION: &str = "room";
const MAX_RECENT: usize = 10;

/// Persistable snapshot of a design. Field names follow the project store's camelCase schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub room_type: String,
    pub design_style: String,
    pub dimensions: RoomDimensions,
    pub wall_config: SurfaceColors,
    pub floor_type: FloorMaterial,
    pub furniture_items: Vec<FurnitureInstance>,
    /// Path or URL of a rendered preview image.
    #[serde(default)]
    pub snapshot: Option<String>,
}

impl ProjectDocument {
    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }
}

/// Snapshot the scene for saving. Selection and gizmo state are not part of it.
pub fn serialize(scene: &Scene) -> ProjectDocument {
    ProjectDocument {
        room_type: ROOM_TYPE.to_string(),
        design_style: DESIGN_STYLE.to_string(),
        dimensions: scene.room.dimensions,
        wall_config: scene.room.wall_colors,
        floor_type: scene.room.floor_material,
        furniture_items: scene.instances.clone(),
        snapshot: None,
    }
}

impl Scene {
    /// Rebuild a scene from a document, repairing what can be repaired.
    ///
    /// Dimensions must be valid. Duplicate instance ids get fresh ids and
    /// out-of-range scales are clamped.
    pub fn from_document(doc: &ProjectDocument) -> Result<Scene, EditorError> {
        doc.dimensions.validate()?;
        let room = RoomShell {
            dimensions: doc.dimensions,
            wall_colors: doc.wall_config,
            floor_material: doc.floor_type,
        };
        let mut scene = Scene::new(room);
        let mut seen = HashSet::new();
        for item in &doc.furniture_items {
            let mut item = item.clone();
            if !seen.insert(item.id) {
                let fresh = InstanceId::new();
                log::warn!("duplicate instance id {} re-keyed as {fresh}", item.id);
                item.id = fresh;
                seen.insert(fresh);
            }
            sanitize_item(&mut item);
            scene.push(item);
        }
        Ok(scene)
    }
}

/// Replace vectors a hand-edited or corrupt file may carry with usable ones.
fn sanitize_item(item: &mut FurnitureInstance) {
    if !item.position.is_finite() {
        log::warn!("instance {} has a non-finite position, reset to origin", item.id);
        item.position = Vec3::ZERO;
    }
    if !item.rotation.is_finite() {
        log::warn!("instance {} has a non-finite rotation, reset", item.id);
        item.rotation = Vec3::ZERO;
    }
    if !item.dimensions.is_finite() || item.dimensions.min_element() <= 0.0 {
        log::warn!("instance {} has bad dimensions, using the catalog size", item.id);
        item.dimensions = item.archetype.info().default_dimensions;
    }
    item.scale = if item.scale.is_finite() { clamp_scale(item.scale) } else { Vec3::ONE };
}

/// Identifier returned by a [`ProjectSink`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(pub String);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where saved projects go.
pub trait ProjectSink {
    fn persist(&mut self, doc: &ProjectDocument) -> Result<ProjectId, SaveError>;
}

/// Stores each save as `local_project_<millis>.json` in a directory.
pub struct LocalProjectStore {
    dir: PathBuf,
}

impl LocalProjectStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self, id: &ProjectId) -> Result<ProjectDocument, SaveError> {
        let data = fs::read_to_string(self.dir.join(format!("{id}.json")))?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl ProjectSink for LocalProjectStore {
    fn persist(&mut self, doc: &ProjectDocument) -> Result<ProjectId, SaveError> {
        fs::create_dir_all(&self.dir)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        // Two saves within the same millisecond must not overwrite each other.
        let mut stamp = millis;
        let id = loop {
            let id = ProjectId(format!("local_project_{stamp}"));
            if !self.dir.join(format!("{id}.json")).exists() {
                break id;
            }
            stamp += 1;
        };
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(self.dir.join(format!("{id}.json")), json)?;
        Ok(id)
    }
}

/// Hand a document to the sink if the user is signed in.
pub fn save_project(
    context: &dyn SessionContext,
    sink: &mut dyn ProjectSink,
    doc: &ProjectDocument,
) -> Result<ProjectId, SaveError> {
    if !context.is_authenticated() {
        return Err(SaveError::NotAuthenticated);
    }
    let id = sink.persist(doc)?;
    log::info!("project saved as {id}");
    Ok(id)
}

/// Write a document as a .room file.
pub fn save_room_file(doc: &ProjectDocument, path: &Path) -> Result<(), SaveError> {
    let payload = bincode::serialize(doc)?;

    let mut data = Vec::with_capacity(HEADER_LEN + payload.len());
    data.extend_from_slice(MAGIC);
    data.extend_from_slice(&VERSION.to_le_bytes());
    data.extend_from_slice(&payload);

    fs::write(path, &data)?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Read a .room file.
pub fn load_room_file(path: &Path) -> Result<ProjectDocument, SaveError> {
    let data = fs::read(path)?;
    let doc = decode_room_bytes(&data)?;
    log::info!("read {} ({} items)", path.display(), doc.furniture_items.len());
    Ok(doc)
}

fn decode_room_bytes(data: &[u8]) -> Result<ProjectDocument, SaveError> {
    if data.len() < HEADER_LEN {
        return Err(SaveError::Truncated);
    }
    if &data[0..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version > VERSION {
        return Err(SaveError::UnsupportedVersion(version));
    }
    Ok(bincode::deserialize(&data[HEADER_LEN..])?)
}

fn recent_files_path() -> PathBuf {
    crate::settings::config_dir().join("recent.json")
}

/// Recently opened .room files that still exist, newest first.
pub fn load_recent_files() -> Vec<PathBuf> {
    let path = recent_files_path();
    let Ok(data) = fs::read_to_string(&path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<PathBuf>>(&data) {
        Ok(files) => files.into_iter().filter(|p| p.exists()).collect(),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Move `path` to the front of the list and persist it.
pub fn remember_recent_file(files: &mut Vec<PathBuf>, path: &Path) {
    files.retain(|p| p != path);
    files.insert(0, path.to_path_buf());
    files.truncate(MAX_RECENT);
    let target = recent_files_path();
    let result = target
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| {
            let json = serde_json::to_string_pretty(files).map_err(std::io::Error::other)?;
            fs::write(&target, json)
        });
    if let Err(e) = result {
        log::warn!("could not update recent files: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{LocalSession, Plan};
    use crate::scene::catalog::Archetype;
    use crate::scene::color::Color;
    use crate::scene::room::{SurfaceKey, Unit};
    use glam::Vec3;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new(RoomShell::with_dimensions(RoomDimensions::new(12.0, 10.0, 9.0, Unit::Feet)));
        scene.room.wall_colors.set(SurfaceKey::Left, Color::hex(0xbfdbfe));
        scene.room.floor_material = FloorMaterial::Marble;
        let mut sofa = FurnitureInstance::from_catalog(Archetype::Sofa.info());
        sofa.position = Vec3::new(1.0, 0.0, 2.0);
        scene.push(sofa);
        scene.push(FurnitureInstance::from_catalog(Archetype::Lamp.info()));
        scene
    }

    struct CountingSink(usize);

    impl ProjectSink for CountingSink {
        fn persist(&mut self, _doc: &ProjectDocument) -> Result<ProjectId, SaveError> {
            self.0 += 1;
            Ok(ProjectId(format!("p{}", self.0)))
        }
    }

    #[test]
    fn document_uses_camel_case_keys() {
        let doc = serialize(&sample_scene());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["roomType"], "Custom Room");
        assert_eq!(json["designStyle"], "Manual");
        assert_eq!(json["floorType"], "marble");
        assert_eq!(json["dimensions"]["unit"], "ft");
        assert_eq!(json["dimensions"]["length"], 10.0);
        assert_eq!(json["wallConfig"]["left"], "#bfdbfe");
        assert_eq!(json["wallConfig"]["ceiling"], "#ffffff");
        assert_eq!(json["furnitureItems"].as_array().unwrap().len(), 2);
        assert_eq!(json["furnitureItems"][0]["type"], "sofa");
        assert!(json["snapshot"].is_null());
    }

    #[test]
    fn serialize_is_idempotent() {
        let scene = sample_scene();
        assert_eq!(serialize(&scene), serialize(&scene));
    }

    #[test]
    fn from_document_restores_scene() {
        let scene = sample_scene();
        let restored = Scene::from_document(&serialize(&scene)).unwrap();
        assert_eq!(restored, scene);
    }

    #[test]
    fn from_document_repairs_ids_and_scales() {
        let mut doc = serialize(&sample_scene());
        doc.furniture_items[1].id = doc.furniture_items[0].id;
        doc.furniture_items[1].scale = Vec3::new(0.0, 1.0, 1.0);
        let scene = Scene::from_document(&doc).unwrap();
        assert_ne!(scene.instances[0].id, scene.instances[1].id);
        assert_eq!(scene.instances[1].scale.x, crate::scene::MIN_SCALE);
    }

    #[test]
    fn from_document_resets_non_finite_vectors() {
        let mut doc = serialize(&sample_scene());
        let item = &mut doc.furniture_items[0];
        item.position = Vec3::new(f32::NAN, 0.0, 1.0);
        item.rotation = Vec3::new(0.0, f32::INFINITY, 0.0);
        item.dimensions = Vec3::new(1.0, f32::NEG_INFINITY, 1.0);
        item.scale = Vec3::splat(f32::NAN);
        let scene = Scene::from_document(&doc).unwrap();
        let inst = &scene.instances[0];
        assert_eq!(inst.position, Vec3::ZERO);
        assert_eq!(inst.rotation, Vec3::ZERO);
        assert_eq!(inst.dimensions, inst.archetype.info().default_dimensions);
        assert_eq!(inst.scale, Vec3::ONE);
        assert_eq!(scene.instances[1], doc.furniture_items[1]);
    }

    #[test]
    fn from_document_rejects_bad_dimensions() {
        let mut doc = serialize(&sample_scene());
        doc.dimensions.height = -1.0;
        assert!(matches!(
            Scene::from_document(&doc),
            Err(EditorError::InvalidDimension { field: "height", .. })
        ));
    }

    #[test]
    fn legacy_json_without_floor_tint_or_snapshot() {
        let json = r##"{
            "roomType": "Custom Room",
            "designStyle": "Manual",
            "dimensions": {"width": 12, "height": 9, "length": 12, "unit": "ft"},
            "wallConfig": {"front": "#f3f4f6", "back": "#f3f4f6", "left": "#f3f4f6", "right": "#f3f4f6", "ceiling": "#ffffff"},
            "floorType": "wood",
            "furnitureItems": [{
                "id": "6f1c1f0e-7a43-4b7e-9a53-2f0f5d6d8c11",
                "type": "shelf",
                "name": "Cabinet",
                "position": [0, 0, 0],
                "rotation": [0, 0, 0],
                "scale": [1, 1, 1],
                "color": "#475569",
                "dimensions": [1, 1.8, 0.4]
            }]
        }"##;
        let doc: ProjectDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.wall_config.floor, Color::WHITE);
        assert_eq!(doc.snapshot, None);
        assert_eq!(doc.furniture_items[0].archetype, Archetype::Storage);
        assert!(!doc.furniture_items[0].locked);
    }

    #[test]
    fn unauthenticated_save_never_reaches_sink() {
        let doc = serialize(&sample_scene());
        let mut sink = CountingSink(0);
        let anon = LocalSession::anonymous();
        assert!(matches!(save_project(&anon, &mut sink, &doc), Err(SaveError::NotAuthenticated)));
        assert_eq!(sink.0, 0);

        let user = LocalSession::signed_in("ada", Plan::Free);
        assert_eq!(save_project(&user, &mut sink, &doc).unwrap(), ProjectId("p1".into()));
    }

    #[test]
    fn local_store_writes_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalProjectStore::new(dir.path().join("projects"));
        let doc = serialize(&sample_scene()).with_snapshot("shot.png");
        let a = store.persist(&doc).unwrap();
        let b = store.persist(&doc).unwrap();
        assert_ne!(a, b);
        assert!(a.0.starts_with("local_project_"));
        assert_eq!(store.load(&a).unwrap(), doc);
    }

    #[test]
    fn room_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.room");
        let doc = serialize(&sample_scene());
        save_room_file(&doc, &path).unwrap();
        assert_eq!(load_room_file(&path).unwrap(), doc);
    }

    #[test]
    fn room_file_header_checks() {
        assert!(matches!(decode_room_bytes(b"RMC"), Err(SaveError::Truncated)));
        assert!(matches!(decode_room_bytes(b"ROOM\x01\0\0\0"), Err(SaveError::BadMagic)));
        assert!(matches!(decode_room_bytes(b"RMCR\x09\0\0\0"), Err(SaveError::UnsupportedVersion(9))));
        assert!(matches!(decode_room_bytes(b"RMCR\x01\0\0\0\x05"), Err(SaveError::Encode(_))));
    }
}
