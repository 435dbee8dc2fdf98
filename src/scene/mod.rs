//! Host scene contract.
//!
//! The exporter never owns scene objects. It holds [`ObjectId`] handles and
//! re-resolves them through a [`SceneHost`] whenever it needs current data.
//! A handle can stop resolving at any time (object deleted, or replaced by a
//! node of another kind); callers detect that, they never assume it.
//!
//! - [`SceneHost`] - read/write access to the live scene
//! - [`MeshExporter`] - delegated mesh file writer
//! - [`MemoryScene`] / [`ObjExporter`] - in-memory host used by the CLI and tests

mod exporter;
mod memory;

pub use exporter::*;
pub use memory::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::{DVec3, Result};

/// Opaque handle to a scene object, issued by the host.
///
/// Stays the same when the object is renamed; the display name is looked up
/// separately and may change underneath a stored handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kind as far as packaging cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Transform-like node (may or may not carry a mesh shape).
    Transform,
    /// Anything else: shapes, cameras, sets.
    Other,
}

/// Resolved identity of a live object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub kind: ObjectKind,
}

/// Raw transform channels as stored on the node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawTransform {
    pub translate: DVec3,
    pub rotate_pivot: DVec3,
    pub rotate: DVec3,
    pub scale: DVec3,
}

impl RawTransform {
    /// Translation plus rotate-pivot offset: the effective pivot-space position.
    #[inline]
    pub fn pivot_translate(&self) -> DVec3 {
        self.translate + self.rotate_pivot
    }
}

/// How a selection call combines with the existing selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectMode {
    /// Selection becomes exactly the given objects.
    #[default]
    Replace,
    /// Given objects are added.
    Add,
    /// Selected ones become unselected and vice versa.
    Toggle,
    /// Given objects are removed from the selection.
    Deselect,
}

/// Read/write access to the host's live scene graph.
///
/// All calls happen on the host's event thread; implementations need no
/// interior synchronization.
pub trait SceneHost {
    /// Current name and kind of `id`, or `None` if it no longer exists.
    fn resolve(&self, id: ObjectId) -> Option<ObjectInfo>;

    /// Handle of the object currently called `name`.
    fn find_by_name(&self, name: &str) -> Option<ObjectId>;

    /// Raw transform channels of `id`.
    fn read_transform(&self, id: ObjectId) -> Result<RawTransform>;

    /// Selected transforms, expanded to every descendant transform carrying
    /// mesh data. Groups without mesh data are not included.
    fn selected_transforms(&self) -> Vec<ObjectId>;

    /// Every visible transform carrying mesh data, in scene order.
    fn mesh_transforms(&self) -> Vec<ObjectId>;

    /// Topology comparison: same per-face vertex structure and UV sets.
    fn are_similar(&self, a: ObjectId, b: ObjectId) -> bool;

    /// Duplicate `id` (with its mesh) and return the new object.
    fn duplicate(&mut self, id: ObjectId) -> Result<ObjectId>;

    /// Overwrite the translate/rotate/scale channels of `id`.
    fn set_transform(&mut self, id: ObjectId, translate: DVec3, rotate: DVec3, scale: DVec3) -> Result<()>;

    /// Change the scene selection.
    fn select(&mut self, ids: &[ObjectId], mode: SelectMode) -> Result<()>;

    /// Delete `id` from the scene.
    fn delete(&mut self, id: ObjectId) -> Result<()>;
}
