//! Delegated mesh export, one file per package.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::package::{Package, PackageRegistry};
use crate::scene::{MeshExporter, MeshProperties, ObjectId, SceneHost, SelectMode};
use crate::util::{DVec3, Error, Result};

/// A package whose mesh could not be written.
#[derive(Debug)]
pub struct MeshFailure {
    pub package: String,
    pub error: Error,
}

/// Outcome of [`export_meshes`].
#[derive(Debug, Default)]
pub struct MeshExportReport {
    /// Files written, in registry order.
    pub exported: Vec<PathBuf>,
    /// Packages skipped for having no members or no file name.
    pub skipped: Vec<String>,
    pub failed: Vec<MeshFailure>,
}

impl MeshExportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Scene duplicate that is deleted when dropped, whatever happened meanwhile.
struct Duplicate<'a, H: SceneHost + ?Sized> {
    host: &'a mut H,
    id: ObjectId,
}

impl<'a, H: SceneHost + ?Sized> Duplicate<'a, H> {
    fn of(host: &'a mut H, source: ObjectId) -> Result<Self> {
        let id = host.duplicate(source)?;
        Ok(Self { host, id })
    }
}

impl<H: SceneHost + ?Sized> Drop for Duplicate<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.host.delete(self.id) {
            warn!("failed to delete export duplicate {}: {}", self.id, e);
        }
    }
}

/// Push every configured property to the exporter.
pub fn apply_properties<H, E>(exporter: &mut E, props: &MeshProperties) -> Result<()>
where
    H: SceneHost + ?Sized,
    E: MeshExporter<H> + ?Sized,
{
    for (prop, value) in props.iter() {
        debug!("{} ({}) = {}", prop.label(), prop.host_path(), value);
        exporter.set_property(prop, value)?;
    }
    Ok(())
}

/// Target file of a package's mesh.
pub fn mesh_path(pack: &Package, output_dir: &Path, extension: &str) -> PathBuf {
    pack.export_dir(output_dir)
        .join(format!("{}.{}", pack.file_base_name(), extension))
}

/// Export one mesh per package.
///
/// Only the first member is exported: every member of a package is taken to
/// be an instance of the same mesh. It is duplicated, reset to the identity
/// transform so no instance placement is baked in, selected alone and handed
/// to the exporter. The duplicate is deleted afterwards even if the export
/// failed. A failing package is recorded and the loop moves on.
pub fn export_meshes<H, E>(
    host: &mut H,
    exporter: &mut E,
    registry: &PackageRegistry,
    output_dir: &Path,
    props: &MeshProperties,
) -> MeshExportReport
where
    H: SceneHost + ?Sized,
    E: MeshExporter<H> + ?Sized,
{
    let mut report = MeshExportReport::default();
    info!("Starting mesh export to {}", output_dir.display());

    for pack in registry.iter() {
        let name = pack.file_base_name();
        if pack.is_empty() {
            info!("No items in '{}' package, skipping", name);
            report.skipped.push(name.to_string());
            continue;
        }
        if name.is_empty() {
            info!("Skipped package {} due to empty file name", pack.id());
            report.skipped.push(String::new());
            continue;
        }

        let path = mesh_path(pack, output_dir, exporter.extension());
        info!("Exporting '{}' package to {}", name, path.display());
        match export_package(host, exporter, pack, &path, props) {
            Ok(()) => report.exported.push(path),
            Err(error) => {
                warn!("mesh export of '{}' failed: {}", name, error);
                report.failed.push(MeshFailure { package: name.to_string(), error });
            }
        }
    }

    info!(
        "Finished mesh export: {} written, {} skipped, {} failed",
        report.exported.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}

fn export_package<H, E>(host: &mut H, exporter: &mut E, pack: &Package, path: &Path, props: &MeshProperties) -> Result<()>
where
    H: SceneHost + ?Sized,
    E: MeshExporter<H> + ?Sized,
{
    let source = pack.members()[0].id();
    let mut dup = Duplicate::of(host, source)?;
    dup.host.set_transform(dup.id, DVec3::ZERO, DVec3::ZERO, DVec3::ONE)?;
    dup.host.select(&[dup.id], SelectMode::Replace)?;
    apply_properties::<H, E>(exporter, props)?;
    let result = exporter.export_selection(&*dup.host, path);
    drop(dup);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, MeshData, MeshProperty, ObjExporter, SceneObject};

    fn tri() -> MeshData {
        MeshData {
            positions: vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            face_counts: vec![3],
            face_indices: vec![0, 1, 2],
            uv_sets: vec![],
        }
    }

    /// Fails every export and records what was selected at that moment.
    #[derive(Default)]
    struct FailingExporter {
        seen_selection: Vec<Vec<ObjectId>>,
    }

    impl MeshExporter<MemoryScene> for FailingExporter {
        fn extension(&self) -> &str {
            "fbx"
        }

        fn set_property(&mut self, _prop: MeshProperty, _value: bool) -> Result<()> {
            Ok(())
        }

        fn export_selection(&mut self, scene: &MemoryScene, _path: &Path) -> Result<()> {
            self.seen_selection.push(scene.selection().to_vec());
            Err(Error::host("exporter crashed"))
        }
    }

    fn setup() -> (MemoryScene, PackageRegistry) {
        let mut scene = MemoryScene::new();
        let a = scene.insert(
            SceneObject::transform("crate1")
                .with_translate(DVec3::new(4.0, 0.0, 0.0))
                .with_rotate(DVec3::new(0.0, 45.0, 0.0))
                .with_mesh(tri()),
        );
        let b = scene.insert(SceneObject::transform("crate2").with_mesh(tri()));
        let c = scene.insert(SceneObject::transform("barrel1").with_mesh(tri()));

        let mut reg = PackageRegistry::new();
        let p = reg.current_mut();
        p.set_display_name("Crate");
        p.add_or_update_members(&scene, &[a, b]);
        let p = reg.add_package();
        p.set_display_name("Barrel");
        p.add_or_update_member(&scene, c);
        reg.add_package();
        (scene, reg)
    }

    #[test]
    fn test_exports_first_member_at_identity() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scene, reg) = setup();
        let before = scene.len();
        let mut exporter = ObjExporter::new();
        let mut props = MeshProperties::default();
        props.set(MeshProperty::Triangulate, true);

        let report = export_meshes(&mut scene, &mut exporter, &reg, dir.path(), &props);
        assert!(report.is_success());
        assert_eq!(report.exported, vec![dir.path().join("Crate.obj"), dir.path().join("Barrel.obj")]);
        assert_eq!(report.skipped, vec![String::new()]);
        assert!(exporter.properties().triangulate);

        // duplicates are gone, originals untouched
        assert_eq!(scene.len(), before);
        let crate1 = scene.object(reg.packages()[0].members()[0].id()).unwrap();
        assert_eq!(crate1.translate, DVec3::new(4.0, 0.0, 0.0));

        let text = std::fs::read_to_string(dir.path().join("Crate.obj")).unwrap();
        assert!(text.starts_with("o crate"));
    }

    #[test]
    fn test_failure_cleans_up_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scene, reg) = setup();
        let before = scene.len();
        let mut exporter = FailingExporter::default();

        let report = export_meshes(&mut scene, &mut exporter, &reg, dir.path(), &MeshProperties::default());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].package, "Crate");
        assert_eq!(report.failed[1].package, "Barrel");
        assert_eq!(scene.len(), before);

        // exactly one object, the duplicate, was selected for each call
        for sel in &exporter.seen_selection {
            assert_eq!(sel.len(), 1);
        }
        assert!(exporter.seen_selection.iter().all(|s| scene.object(s[0]).is_none()));
    }

    #[test]
    fn test_stale_first_member_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (mut scene, reg) = setup();
        let first = reg.packages()[0].members()[0].id();
        scene.delete(first).unwrap();

        let mut exporter = ObjExporter::new();
        let report = export_meshes(&mut scene, &mut exporter, &reg, dir.path(), &MeshProperties::default());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.is_stale_reference());
        assert_eq!(report.exported.len(), 1);
    }
}
