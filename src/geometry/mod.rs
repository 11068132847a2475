//! Procedural geometry: furniture shapes, room surfaces and the per-instance cache.

pub mod cache;
pub mod mesh;
pub mod primitives;
pub mod room;
pub mod shape;

pub use cache::{CachedShape, ShapeCache, SyncReport};
pub use mesh::Face;
pub use room::{build_room_surfaces, surface_faces_eye, RoomGeometry, RoomSurface, WALL_THICKNESS};
pub use shape::{build_furniture_shape, build_shape_for_type, PointLight, Shape};
