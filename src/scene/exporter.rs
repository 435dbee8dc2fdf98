//! Delegated mesh exporter contract and its property toggles.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::Result;
use super::SceneHost;

/// Boolean export properties forwarded verbatim to the host exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshProperty {
    SmoothingGroups,
    SmoothMesh,
    SplitVertexNormals,
    Triangulate,
    TangentsAndBinormals,
    Skinning,
    Blendshapes,
}

impl MeshProperty {
    /// All properties, in the order they are sent to the host.
    pub const ALL: [MeshProperty; 7] = [
        MeshProperty::SmoothingGroups,
        MeshProperty::SmoothMesh,
        MeshProperty::SplitVertexNormals,
        MeshProperty::Triangulate,
        MeshProperty::TangentsAndBinormals,
        MeshProperty::Skinning,
        MeshProperty::Blendshapes,
    ];

    /// Host property path.
    pub fn host_path(self) -> &'static str {
        match self {
            Self::SmoothingGroups => "Export|IncludeGrp|Geometry|SmoothingGroups",
            Self::SmoothMesh => "Export|IncludeGrp|Geometry|SmoothMesh",
            Self::SplitVertexNormals => "Export|IncludeGrp|Geometry|expHardEdges",
            Self::Triangulate => "Export|IncludeGrp|Geometry|Triangulate",
            Self::TangentsAndBinormals => "Export|IncludeGrp|Geometry|TangentsandBinormals",
            Self::Skinning => "Export|IncludeGrp|Animation|Deformation|Skins",
            Self::Blendshapes => "Export|IncludeGrp|Animation|Deformation|Shape",
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::SmoothingGroups => "Smoothing Groups",
            Self::SmoothMesh => "Smooth Mesh",
            Self::SplitVertexNormals => "Split Vertex Normals",
            Self::Triangulate => "Triangulate",
            Self::TangentsAndBinormals => "Tangents & Binormals",
            Self::Skinning => "Skinning",
            Self::Blendshapes => "Blendshapes",
        }
    }
}

/// Configured value of every [`MeshProperty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshProperties {
    pub smoothing_groups: bool,
    pub smooth_mesh: bool,
    pub split_vertex_normals: bool,
    pub triangulate: bool,
    pub tangents_and_binormals: bool,
    pub skinning: bool,
    pub blendshapes: bool,
}

impl Default for MeshProperties {
    fn default() -> Self {
        Self {
            smoothing_groups: true,
            smooth_mesh: true,
            split_vertex_normals: false,
            triangulate: false,
            tangents_and_binormals: false,
            skinning: true,
            blendshapes: true,
        }
    }
}

impl MeshProperties {
    pub fn get(&self, prop: MeshProperty) -> bool {
        match prop {
            MeshProperty::SmoothingGroups => self.smoothing_groups,
            MeshProperty::SmoothMesh => self.smooth_mesh,
            MeshProperty::SplitVertexNormals => self.split_vertex_normals,
            MeshProperty::Triangulate => self.triangulate,
            MeshProperty::TangentsAndBinormals => self.tangents_and_binormals,
            MeshProperty::Skinning => self.skinning,
            MeshProperty::Blendshapes => self.blendshapes,
        }
    }

    pub fn set(&mut self, prop: MeshProperty, value: bool) {
        let slot = match prop {
            MeshProperty::SmoothingGroups => &mut self.smoothing_groups,
            MeshProperty::SmoothMesh => &mut self.smooth_mesh,
            MeshProperty::SplitVertexNormals => &mut self.split_vertex_normals,
            MeshProperty::Triangulate => &mut self.triangulate,
            MeshProperty::TangentsAndBinormals => &mut self.tangents_and_binormals,
            MeshProperty::Skinning => &mut self.skinning,
            MeshProperty::Blendshapes => &mut self.blendshapes,
        };
        *slot = value;
    }

    /// (property, value) pairs in send order.
    pub fn iter(&self) -> impl Iterator<Item = (MeshProperty, bool)> + '_ {
        MeshProperty::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// Host mesh writer. Exports whatever is selected in the scene.
///
/// Properties are process-global on the host side: a value set once stays
/// in effect for every following export call.
pub trait MeshExporter<S: SceneHost + ?Sized> {
    /// Native mesh file extension, without the dot.
    fn extension(&self) -> &str;

    /// Set one export property.
    fn set_property(&mut self, prop: MeshProperty, value: bool) -> Result<()>;

    /// Write the current selection of `scene` (selected objects only) to `path`.
    fn export_selection(&mut self, scene: &S, path: &Path) -> Result<()>;
}
