//! Scene description document.
//!
//! One JSON file per export: the root anchor plus, for every exported
//! package, its mesh file name, output directory and the placement of each
//! instance relative to the root. Field order is fixed so documents diff
//! cleanly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::package::{PackageRegistry, RootReference};
use crate::util::{Attributes, DVec3, Error, Result};

/// File extension of the scene description.
pub const DESCRIPTION_EXTENSION: &str = "json";

/// Placement of one object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub name: String,
    pub translate: DVec3,
    pub rotate: DVec3,
    pub scale: DVec3,
}

impl TransformRecord {
    pub fn new(name: &str, attrs: Attributes) -> Self {
        Self {
            name: name.to_string(),
            translate: attrs.translate,
            rotate: attrs.rotate,
            scale: attrs.scale,
        }
    }
}

/// One exported package.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub file_name: String,
    pub transforms: Vec<TransformRecord>,
    /// Absolute directory of the package's mesh file.
    pub path: String,
}

/// Root of the scene description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    /// `null` when exported without a root; placements are then absolute.
    pub root_transform: Option<TransformRecord>,
    pub packages: Vec<PackageRecord>,
}

impl SceneDocument {
    /// Assemble the document from the registry's current snapshots.
    ///
    /// Packages with no members or an empty file name are left out.
    pub fn build(registry: &PackageRegistry, root: Option<&RootReference>, output_dir: &Path) -> Result<Self> {
        let mut packages = Vec::new();

        for pack in registry.iter() {
            if pack.is_empty() {
                debug!("no items in '{}', left out of the scene description", pack.file_base_name());
                continue;
            }
            if pack.file_base_name().is_empty() {
                debug!("package {} has no file name, left out of the scene description", pack.id());
                continue;
            }

            let transforms = pack
                .members()
                .iter()
                .map(|m| match root {
                    Some(root) => m.relative_attributes(root.snapshot()),
                    None => Ok(m.to_record()),
                })
                .collect::<Result<Vec<_>>>()?;

            packages.push(PackageRecord {
                file_name: pack.file_base_name().to_string(),
                transforms,
                path: absolute_dir(pack.export_dir(output_dir)),
            });
        }

        Ok(Self {
            root_transform: root.map(|r| r.snapshot().to_record()),
            packages,
        })
    }

    /// Pretty-printed JSON, four-space indent.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write to `path` as UTF-8, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        std::fs::write(path, text).map_err(|source| Error::DescriptionWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a document back.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn absolute_dir(dir: &Path) -> String {
    std::path::absolute(dir)
        .unwrap_or_else(|_| PathBuf::from(dir))
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, SceneHost, SceneObject};

    fn rock_scene() -> (MemoryScene, PackageRegistry) {
        let mut scene = MemoryScene::new();
        for (i, x) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            scene.insert(SceneObject::transform(format!("rock{}", i + 1)).with_translate(DVec3::new(x, 0.0, 0.0)));
        }
        let ids: Vec<_> = ["rock1", "rock2", "rock3"]
            .iter()
            .filter_map(|n| scene.find_by_name(n))
            .collect();

        let mut reg = PackageRegistry::new();
        let pack = reg.current_mut();
        pack.set_display_name("Rock_A");
        pack.add_or_update_members(&scene, &ids);
        (scene, reg)
    }

    #[test]
    fn test_identity_root_keeps_values() {
        let (mut scene, reg) = rock_scene();
        let anchor = scene.insert(SceneObject::transform("origin"));
        let root = RootReference::capture(&scene, anchor).unwrap();

        let doc = SceneDocument::build(&reg, Some(&root), Path::new("/out")).unwrap();
        assert_eq!(doc.packages.len(), 1);
        let xs: Vec<f64> = doc.packages[0].transforms.iter().map(|t| t.translate.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        for t in &doc.packages[0].transforms {
            assert_eq!(t.rotate, DVec3::ZERO);
            assert_eq!(t.scale, DVec3::ONE);
        }
        assert_eq!(doc.root_transform.as_ref().map(|r| r.name.as_str()), Some("origin"));
    }

    #[test]
    fn test_offset_root() {
        let (mut scene, reg) = rock_scene();
        let anchor = scene.insert(SceneObject::transform("anchor").with_translate(DVec3::new(1.0, 5.0, 0.0)));
        let root = RootReference::capture(&scene, anchor).unwrap();

        let doc = SceneDocument::build(&reg, Some(&root), Path::new("/out")).unwrap();
        let first = &doc.packages[0].transforms[0];
        assert_eq!(first.translate, DVec3::new(0.0, -5.0, 0.0));
    }

    #[test]
    fn test_no_root_is_null() {
        let (_scene, reg) = rock_scene();
        let doc = SceneDocument::build(&reg, None, Path::new("/out")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert!(json["rootTransform"].is_null());
        assert_eq!(json["packages"][0]["fileName"], "Rock_A");
        assert_eq!(json["packages"][0]["transforms"][2]["translate"], serde_json::json!([3.0, 0.0, 0.0]));
    }

    #[test]
    fn test_skips_empty_and_unnamed() {
        let (scene, mut reg) = rock_scene();
        reg.add_package().set_display_name("Empty");
        let id = scene.find_by_name("rock1").unwrap();
        reg.add_package().add_or_update_member(&scene, id);

        let doc = SceneDocument::build(&reg, None, Path::new("/out")).unwrap();
        let names: Vec<&str> = doc.packages.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["Rock_A"]);
    }

    #[test]
    fn test_key_order_and_indent() {
        let (_scene, reg) = rock_scene();
        let text = SceneDocument::build(&reg, None, Path::new("/out")).unwrap().to_json().unwrap();
        let root_at = text.find("\"rootTransform\"").unwrap();
        let packages_at = text.find("\"packages\"").unwrap();
        assert!(root_at < packages_at);
        assert!(text.contains("\n    \"packages\""));

        let file_at = text.find("\"fileName\"").unwrap();
        let transforms_at = text.find("\"transforms\"").unwrap();
        let path_at = text.rfind("\"path\"").unwrap();
        assert!(file_at < transforms_at && transforms_at < path_at);
    }
}
