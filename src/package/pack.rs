//! A single package.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::scene::{ObjectId, SceneHost, SelectMode};
use crate::util::{sanitize_directory, sanitize_file_name, Result};
use super::TransformSnapshot;

/// Registry-issued package handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub u64);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "package#{}", self.0)
    }
}

/// Outcome counts of a batch member update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemberChanges {
    /// New snapshots appended.
    pub added: usize,
    /// Existing members refreshed in place.
    pub refreshed: usize,
    /// Existing members dropped because they went stale.
    pub dropped: usize,
    /// Objects that could not be captured.
    pub rejected: usize,
}

/// Named group of scene objects exported as one mesh with per-instance
/// placements.
///
/// Members keep insertion order and never contain the same object twice.
#[derive(Clone, Debug)]
pub struct Package {
    id: PackageId,
    display_name: String,
    members: Vec<TransformSnapshot>,
    export_path_override: Option<PathBuf>,
}

impl Package {
    pub(crate) fn new(id: PackageId) -> Self {
        Self {
            id,
            display_name: String::new(),
            members: Vec::new(),
            export_path_override: None,
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Set the label; forbidden file name characters are stripped.
    pub fn set_display_name(&mut self, name: &str) {
        self.display_name = sanitize_file_name(name);
    }

    /// Base name of the exported files. May be empty; export skips such packages.
    pub fn file_base_name(&self) -> &str {
        &self.display_name
    }

    pub fn members(&self) -> &[TransformSnapshot] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.members.iter().any(|m| *m == id)
    }

    /// Member names in order.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Refresh `id` if it is already a member (dropping it if stale), or
    /// capture and append it.
    pub fn add_or_update_member<H: SceneHost + ?Sized>(&mut self, host: &H, id: ObjectId) -> MemberChanges {
        let mut changes = MemberChanges::default();
        if let Some(pos) = self.members.iter().position(|m| *m == id) {
            if self.members[pos].refresh(host) {
                changes.refreshed += 1;
            } else {
                let gone = self.members.remove(pos);
                debug!("'{}': dropped stale member '{}'", self.display_name, gone.name());
                changes.dropped += 1;
            }
            return changes;
        }

        match TransformSnapshot::capture(host, id) {
            Ok(snap) => {
                self.members.push(snap);
                changes.added += 1;
            }
            Err(e) => {
                warn!("'{}': cannot add {}: {}", self.display_name, id, e);
                changes.rejected += 1;
            }
        }
        changes
    }

    /// Batch form of [`add_or_update_member`](Self::add_or_update_member),
    /// typically called with the current scene selection.
    pub fn add_or_update_members<H: SceneHost + ?Sized>(&mut self, host: &H, ids: &[ObjectId]) -> MemberChanges {
        ids.iter().fold(MemberChanges::default(), |acc, id| {
            let c = self.add_or_update_member(host, *id);
            MemberChanges {
                added: acc.added + c.added,
                refreshed: acc.refreshed + c.refreshed,
                dropped: acc.dropped + c.dropped,
                rejected: acc.rejected + c.rejected,
            }
        })
    }

    /// Remove members whose current name is in `names`. Absent names are ignored.
    /// Returns the number removed.
    pub fn remove_members<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        let before = self.members.len();
        self.members
            .retain(|m| !names.iter().any(|n| n.as_ref() == m.name()));
        before - self.members.len()
    }

    /// Remove members by handle. Returns the number removed.
    pub fn remove_ids(&mut self, ids: &[ObjectId]) -> usize {
        let before = self.members.len();
        self.members.retain(|m| !ids.contains(&m.id()));
        before - self.members.len()
    }

    /// Refresh every member, dropping the ones whose object is gone or
    /// changed kind. Returns the names of dropped members.
    pub fn refresh_all<H: SceneHost + ?Sized>(&mut self, host: &H) -> Vec<String> {
        let mut dropped = Vec::new();
        self.members.retain_mut(|m| {
            let live = m.refresh(host);
            if !live {
                dropped.push(m.name().to_string());
            }
            live
        });
        if !dropped.is_empty() {
            debug!("'{}': refresh dropped {:?}", self.display_name, dropped);
        }
        dropped
    }

    /// Drop members whose object is gone or no longer a transform, keeping
    /// the cached attributes of the rest. Returns the names of dropped members.
    pub fn drop_stale<H: SceneHost + ?Sized>(&mut self, host: &H) -> Vec<String> {
        let mut dropped = Vec::new();
        self.members.retain(|m| {
            let live = m.is_live(host);
            if !live {
                dropped.push(m.name().to_string());
            }
            live
        });
        dropped
    }

    pub fn export_path_override(&self) -> Option<&Path> {
        self.export_path_override.as_deref()
    }

    /// Enable (`Some`) or disable (`None`) a custom mesh output directory.
    pub fn set_export_path_override(&mut self, dir: Option<&str>) {
        self.export_path_override = dir.map(|d| PathBuf::from(sanitize_directory(d)));
    }

    /// Directory this package's mesh is written to.
    pub fn export_dir<'a>(&'a self, global: &'a Path) -> &'a Path {
        self.export_path_override.as_deref().unwrap_or(global)
    }

    /// Select this package's members in the scene.
    pub fn select_in_scene<H: SceneHost + ?Sized>(&self, host: &mut H, mode: SelectMode) -> Result<()> {
        let ids: Vec<ObjectId> = self.members.iter().map(|m| m.id()).collect();
        host.select(&ids, mode)
    }

    /// Whether an export would write anything for this package.
    pub fn is_exportable(&self) -> bool {
        !self.members.is_empty() && !self.display_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, SceneObject};
    use crate::util::DVec3;

    fn scene(names: &[&str]) -> (MemoryScene, Vec<ObjectId>) {
        let mut scene = MemoryScene::new();
        let ids = names.iter().map(|n| scene.insert(SceneObject::transform(*n))).collect();
        (scene, ids)
    }

    #[test]
    fn test_display_name_sanitized() {
        let mut p = Package::new(PackageId(0));
        p.set_display_name("Wall:A/*v2*");
        assert_eq!(p.display_name(), "WallAv2");
        assert_eq!(p.file_base_name(), "WallAv2");
    }

    #[test]
    fn test_add_twice_updates() {
        let (mut scene, ids) = scene(&["rock1"]);
        let mut p = Package::new(PackageId(0));

        let c = p.add_or_update_member(&scene, ids[0]);
        assert_eq!(c.added, 1);

        scene.object_mut(ids[0]).unwrap().translate = DVec3::new(7.0, 0.0, 0.0);
        let c = p.add_or_update_member(&scene, ids[0]);
        assert_eq!(c.refreshed, 1);
        assert_eq!(p.len(), 1);
        assert_eq!(p.members()[0].attributes().translate.x, 7.0);
    }

    #[test]
    fn test_batch_add_keeps_order() {
        let (scene, ids) = scene(&["c", "a", "b"]);
        let mut p = Package::new(PackageId(0));
        let c = p.add_or_update_members(&scene, &[ids[0], ids[1], ids[2], ids[1], ObjectId(42)]);
        assert_eq!(c, MemberChanges { added: 3, refreshed: 1, dropped: 0, rejected: 1 });
        assert_eq!(p.member_names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_readding_stale_member_drops_it() {
        let (mut scene, ids) = scene(&["a"]);
        let mut p = Package::new(PackageId(0));
        p.add_or_update_member(&scene, ids[0]);
        scene.delete(ids[0]).unwrap();
        let c = p.add_or_update_member(&scene, ids[0]);
        assert_eq!(c.dropped, 1);
        assert!(p.is_empty());
    }

    #[test]
    fn test_remove_members() {
        let (scene, ids) = scene(&["a", "b", "c"]);
        let mut p = Package::new(PackageId(0));
        p.add_or_update_members(&scene, &ids);
        assert_eq!(p.remove_members(&["b", "missing"]), 1);
        assert_eq!(p.member_names(), vec!["a", "c"]);
        assert_eq!(p.remove_ids(&[ids[0]]), 1);
        assert_eq!(p.member_names(), vec!["c"]);
    }

    #[test]
    fn test_refresh_all_prunes_exactly_stale() {
        let (mut scene, ids) = scene(&["a", "b", "c"]);
        let mut p = Package::new(PackageId(0));
        p.add_or_update_members(&scene, &ids);

        scene.delete(ids[1]).unwrap();
        let dropped = p.refresh_all(&scene);
        assert_eq!(dropped, vec!["b".to_string()]);
        assert_eq!(p.member_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_drop_stale_keeps_cached_values() {
        let (mut scene, ids) = scene(&["a", "b", "c"]);
        let mut p = Package::new(PackageId(0));
        p.add_or_update_members(&scene, &ids);

        scene.object_mut(ids[2]).unwrap().translate = DVec3::new(9.0, 0.0, 0.0);
        scene.delete(ids[0]).unwrap();
        assert_eq!(p.drop_stale(&scene), vec!["a".to_string()]);
        assert_eq!(p.member_names(), vec!["b", "c"]);
        // no refresh happened
        assert_eq!(p.members()[1].attributes().translate.x, 0.0);
        assert!(p.drop_stale(&scene).is_empty());
    }

    #[test]
    fn test_export_dir_override() {
        let mut p = Package::new(PackageId(0));
        let global = Path::new("/levels/out");
        assert_eq!(p.export_dir(global), global);
        p.set_export_path_override(Some("/levels/props?"));
        assert_eq!(p.export_dir(global), Path::new("/levels/props"));
        p.set_export_path_override(None);
        assert_eq!(p.export_path_override(), None);
    }

    #[test]
    fn test_select_in_scene() {
        let (mut scene, ids) = scene(&["a", "b"]);
        let mut p = Package::new(PackageId(0));
        p.add_or_update_members(&scene, &ids);
        p.select_in_scene(&mut scene, SelectMode::Replace).unwrap();
        assert_eq!(scene.selection(), ids.as_slice());
    }
}
