//! In-memory scene host.
//!
//! Holds a flat table of objects with parent links, a selection list and
//! optional mesh data per transform. Scenes can be built in code or loaded
//! from a JSON scene file:
//!
//! ```json
//! {
//!   "objects": [
//!     { "name": "rock1", "translate": [1, 0, 0], "mesh": { "faceCounts": [4], "faceIndices": [0, 1, 2, 3] } }
//!   ],
//!   "selection": ["rock1"]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::{DVec3, Error, Result};
use super::{
    MeshExporter, MeshProperties, MeshProperty, ObjectId, ObjectInfo, ObjectKind, RawTransform,
    SceneHost, SelectMode,
};

/// Polygon mesh attached to a transform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeshData {
    pub positions: Vec<DVec3>,
    /// Vertex count of each face.
    pub face_counts: Vec<u32>,
    /// Flattened vertex indices, `face_counts` consecutive runs.
    pub face_indices: Vec<u32>,
    pub uv_sets: Vec<String>,
}

impl MeshData {
    /// Same face structure and UV-set layout. Vertex positions are ignored.
    pub fn same_topology(&self, other: &MeshData) -> bool {
        self.face_counts == other.face_counts
            && self.face_indices == other.face_indices
            && self.uv_sets == other.uv_sets
    }
}

/// One node of a [`MemoryScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub parent: Option<ObjectId>,
    pub visible: bool,
    pub translate: DVec3,
    pub rotate_pivot: DVec3,
    pub rotate: DVec3,
    pub scale: DVec3,
    pub mesh: Option<MeshData>,
}

impl SceneObject {
    /// Visible transform at the origin with no mesh.
    pub fn transform(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ObjectKind::Transform,
            parent: None,
            visible: true,
            translate: DVec3::ZERO,
            rotate_pivot: DVec3::ZERO,
            rotate: DVec3::ZERO,
            scale: DVec3::ONE,
            mesh: None,
        }
    }

    pub fn with_translate(mut self, t: DVec3) -> Self {
        self.translate = t;
        self
    }

    pub fn with_rotate(mut self, r: DVec3) -> Self {
        self.rotate = r;
        self
    }

    pub fn with_scale(mut self, s: DVec3) -> Self {
        self.scale = s;
        self
    }

    pub fn with_pivot(mut self, p: DVec3) -> Self {
        self.rotate_pivot = p;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshData) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }
}

// On-disk form of a scene object; parents and selection refer to names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectRecord {
    name: String,
    #[serde(default = "default_kind")]
    kind: ObjectKind,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    translate: Option<DVec3>,
    #[serde(default)]
    rotate_pivot: Option<DVec3>,
    #[serde(default)]
    rotate: Option<DVec3>,
    #[serde(default)]
    scale: Option<DVec3>,
    #[serde(default)]
    mesh: Option<MeshData>,
}

fn default_kind() -> ObjectKind {
    ObjectKind::Transform
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    objects: Vec<ObjectRecord>,
    #[serde(default)]
    selection: Vec<String>,
}

/// Scene host backed by plain data.
#[derive(Clone, Debug, Default)]
pub struct MemoryScene {
    objects: BTreeMap<ObjectId, SceneObject>,
    selection: Vec<ObjectId>,
    next_id: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON scene file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse a JSON scene description.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: SceneFile = serde_json::from_str(text)?;
        let mut scene = Self::new();

        for rec in &file.objects {
            if scene.find_by_name(&rec.name).is_some() {
                return Err(Error::other(format!("duplicate object name '{}'", rec.name)));
            }
            let obj = SceneObject {
                name: rec.name.clone(),
                kind: rec.kind,
                parent: None,
                visible: rec.visible,
                translate: rec.translate.unwrap_or(DVec3::ZERO),
                rotate_pivot: rec.rotate_pivot.unwrap_or(DVec3::ZERO),
                rotate: rec.rotate.unwrap_or(DVec3::ZERO),
                scale: rec.scale.unwrap_or(DVec3::ONE),
                mesh: rec.mesh.clone(),
            };
            scene.insert(obj);
        }

        // Second pass so parents may be listed after their children
        for rec in &file.objects {
            let Some(parent_name) = &rec.parent else { continue };
            let parent = scene
                .find_by_name(parent_name)
                .ok_or_else(|| Error::NameNotFound(parent_name.clone()))?;
            let child = scene
                .find_by_name(&rec.name)
                .ok_or_else(|| Error::NameNotFound(rec.name.clone()))?;
            if let Some(obj) = scene.objects.get_mut(&child) {
                obj.parent = Some(parent);
            }
        }

        for name in &file.selection {
            let id = scene.find_by_name(name).ok_or_else(|| Error::NameNotFound(name.clone()))?;
            scene.selection.push(id);
        }

        debug!("loaded scene: {} objects, {} selected", scene.len(), scene.selection.len());
        Ok(scene)
    }

    /// Add an object and return its handle.
    pub fn insert(&mut self, obj: SceneObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, obj);
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    /// Rename an object. The handle stays valid.
    pub fn rename(&mut self, id: ObjectId, name: impl Into<String>) -> Result<()> {
        let obj = self.objects.get_mut(&id).ok_or(Error::ObjectNotFound(id))?;
        obj.name = name.into();
        Ok(())
    }

    /// Current selection, in selection order.
    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate objects in scene order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    fn is_mesh_transform(obj: &SceneObject) -> bool {
        obj.kind == ObjectKind::Transform && obj.mesh.is_some()
    }

    // Walks `id` and its ancestors; stops on missing links and on cycles.
    fn lineage(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        let mut cur = Some(id);
        let mut steps = 0usize;
        let limit = self.objects.len();
        std::iter::from_fn(move || {
            let here = cur?;
            if steps > limit {
                return None;
            }
            steps += 1;
            cur = self.objects.get(&here).and_then(|o| o.parent);
            Some(here)
        })
    }

    fn visible_in_hierarchy(&self, id: ObjectId) -> bool {
        self.lineage(id)
            .all(|i| self.objects.get(&i).map(|o| o.visible).unwrap_or(false))
    }

    fn unique_name(&self, base: &str) -> String {
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        (1u64..)
            .map(|n| format!("{stem}{n}"))
            .find(|candidate| self.find_by_name(candidate).is_none())
            .unwrap_or_else(|| format!("{stem}_copy"))
    }
}

impl SceneHost for MemoryScene {
    fn resolve(&self, id: ObjectId) -> Option<ObjectInfo> {
        self.objects.get(&id).map(|o| ObjectInfo { name: o.name.clone(), kind: o.kind })
    }

    fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().find(|(_, o)| o.name == name).map(|(id, _)| *id)
    }

    fn read_transform(&self, id: ObjectId) -> Result<RawTransform> {
        let obj = self.objects.get(&id).ok_or(Error::ObjectNotFound(id))?;
        if obj.kind != ObjectKind::Transform {
            return Err(Error::NotATransform(obj.name.clone()));
        }
        Ok(RawTransform {
            translate: obj.translate,
            rotate_pivot: obj.rotate_pivot,
            rotate: obj.rotate,
            scale: obj.scale,
        })
    }

    fn selected_transforms(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, o)| Self::is_mesh_transform(o))
            .filter(|(id, _)| self.lineage(**id).any(|i| self.selection.contains(&i)))
            .map(|(id, _)| *id)
            .collect()
    }

    fn mesh_transforms(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(id, o)| Self::is_mesh_transform(o) && self.visible_in_hierarchy(**id))
            .map(|(id, _)| *id)
            .collect()
    }

    fn are_similar(&self, a: ObjectId, b: ObjectId) -> bool {
        let mesh = |id: ObjectId| self.objects.get(&id).and_then(|o| o.mesh.as_ref());
        match (mesh(a), mesh(b)) {
            (Some(ma), Some(mb)) => ma.same_topology(mb),
            _ => false,
        }
    }

    fn duplicate(&mut self, id: ObjectId) -> Result<ObjectId> {
        let src = self.objects.get(&id).ok_or(Error::ObjectNotFound(id))?;
        let mut copy = src.clone();
        copy.name = self.unique_name(&src.name);
        let new_id = self.insert(copy);
        debug!("duplicated {} -> {}", id, new_id);
        Ok(new_id)
    }

    fn set_transform(&mut self, id: ObjectId, translate: DVec3, rotate: DVec3, scale: DVec3) -> Result<()> {
        let obj = self.objects.get_mut(&id).ok_or(Error::ObjectNotFound(id))?;
        obj.translate = translate;
        obj.rotate = rotate;
        obj.scale = scale;
        Ok(())
    }

    fn select(&mut self, ids: &[ObjectId], mode: SelectMode) -> Result<()> {
        if let Some(missing) = ids.iter().find(|id| !self.objects.contains_key(id)) {
            return Err(Error::ObjectNotFound(*missing));
        }
        match mode {
            SelectMode::Replace => {
                self.selection.clear();
                for id in ids {
                    if !self.selection.contains(id) {
                        self.selection.push(*id);
                    }
                }
            }
            SelectMode::Add => {
                for id in ids {
                    if !self.selection.contains(id) {
                        self.selection.push(*id);
                    }
                }
            }
            SelectMode::Toggle => {
                for id in ids {
                    if let Some(pos) = self.selection.iter().position(|s| s == id) {
                        self.selection.remove(pos);
                    } else {
                        self.selection.push(*id);
                    }
                }
            }
            SelectMode::Deselect => self.selection.retain(|s| !ids.contains(s)),
        }
        Ok(())
    }

    fn delete(&mut self, id: ObjectId) -> Result<()> {
        self.objects.remove(&id).ok_or(Error::ObjectNotFound(id))?;
        self.selection.retain(|s| *s != id);
        // Children are deleted with their parent
        let children: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, o)| o.parent == Some(id))
            .map(|(cid, _)| *cid)
            .collect();
        for child in children {
            self.delete(child)?;
        }
        Ok(())
    }
}

/// Wavefront OBJ writer for [`MemoryScene`] selections.
///
/// Vertices are written in object space. `Triangulate` fans every polygon;
/// the remaining properties are recorded but have no OBJ equivalent.
#[derive(Clone, Debug, Default)]
pub struct ObjExporter {
    properties: MeshProperties,
}

impl ObjExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties as last set by the export coordinator.
    pub fn properties(&self) -> &MeshProperties {
        &self.properties
    }

    fn write_mesh(&self, out: &mut impl Write, name: &str, mesh: &MeshData, base: u32) -> std::io::Result<()> {
        writeln!(out, "o {name}")?;
        for p in &mesh.positions {
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        let mut cursor = 0usize;
        for &count in &mesh.face_counts {
            let count = count as usize;
            let Some(face) = mesh.face_indices.get(cursor..cursor + count) else {
                break;
            };
            cursor += count;
            let idx: Vec<u32> = face.iter().map(|i| i + base + 1).collect();
            if self.properties.triangulate && idx.len() > 3 {
                for k in 1..idx.len() - 1 {
                    writeln!(out, "f {} {} {}", idx[0], idx[k], idx[k + 1])?;
                }
            } else {
                let line: Vec<String> = idx.iter().map(|i| i.to_string()).collect();
                writeln!(out, "f {}", line.join(" "))?;
            }
        }
        Ok(())
    }
}

impl MeshExporter<MemoryScene> for ObjExporter {
    fn extension(&self) -> &str {
        "obj"
    }

    fn set_property(&mut self, prop: MeshProperty, value: bool) -> Result<()> {
        self.properties.set(prop, value);
        Ok(())
    }

    fn export_selection(&mut self, scene: &MemoryScene, path: &Path) -> Result<()> {
        let meshes: Vec<&SceneObject> = scene
            .selection()
            .iter()
            .filter_map(|id| scene.object(*id))
            .filter(|o| o.mesh.is_some())
            .collect();
        if meshes.is_empty() {
            return Err(Error::host("nothing with mesh data is selected"));
        }

        let mut out = BufWriter::new(File::create(path)?);
        let mut base = 0u32;
        for obj in meshes {
            if let Some(mesh) = &obj.mesh {
                self.write_mesh(&mut out, &obj.name, mesh, base)?;
                base += mesh.positions.len() as u32;
            }
        }
        out.flush()?;
        Ok(())
    }
}
