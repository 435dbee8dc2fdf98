//! Application state and the operations a UI shell calls.
//!
//! [`Session`] owns everything that used to be process-wide state: the
//! package registry, the root reference, export settings and the sync
//! selection flag. A shell keeps one session, forwards user intents to it
//! and redraws from the returned summaries.

use tracing::{info, warn};

use crate::export::{ExportCoordinator, ExportReport, ValidationWarning};
use crate::grouping::{auto_group, CancelToken, GroupProgress, GroupReport};
use crate::package::{CurrentChange, MemberChanges, Package, PackageId, PackageRegistry, RootReference};
use crate::scene::{MeshExporter, ObjectId, SceneHost, SelectMode};
use crate::settings::ExportSettings;
use crate::util::{Error, Result};

/// What a package row in the shell needs to draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageSummary {
    pub id: PackageId,
    pub name: String,
    pub member_count: usize,
    pub is_current: bool,
    pub has_custom_path: bool,
}

/// Editing and export state of one shell.
#[derive(Debug, Default)]
pub struct Session {
    pub registry: PackageRegistry,
    pub settings: ExportSettings,
    root: Option<RootReference>,
    sync_select: bool,
    coordinator: ExportCoordinator,
}

impl Session {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    /// Row data for every package, in registry order.
    pub fn summaries(&self) -> Vec<PackageSummary> {
        let current = self.registry.current_id();
        self.registry
            .iter()
            .map(|p| PackageSummary {
                id: p.id(),
                name: p.display_name().to_string(),
                member_count: p.len(),
                is_current: p.id() == current,
                has_custom_path: p.export_path_override().is_some(),
            })
            .collect()
    }

    pub fn add_package(&mut self) -> PackageId {
        self.registry.add_package().id()
    }

    pub fn remove_package(&mut self, id: PackageId) -> Result<Option<CurrentChange>> {
        self.registry.remove_package(id)
    }

    /// Rename a package; forbidden file name characters are stripped.
    pub fn rename_package(&mut self, id: PackageId, name: &str) -> Result<()> {
        self.package_mut(id)?.set_display_name(name);
        Ok(())
    }

    /// Enable (`Some`) or disable (`None`) a package's custom output directory.
    pub fn set_package_path(&mut self, id: PackageId, dir: Option<&str>) -> Result<()> {
        self.package_mut(id)?.set_export_path_override(dir);
        Ok(())
    }

    fn package_mut(&mut self, id: PackageId) -> Result<&mut Package> {
        self.registry.get_mut(id).ok_or(Error::PackageNotFound(id.0))
    }

    pub fn set_current_package(&mut self, id: PackageId) -> Result<Option<CurrentChange>> {
        self.registry.set_current(id)
    }

    /// Add the scene selection to the current package, refreshing members
    /// that are already in it.
    pub fn add_selection_as_members<H: SceneHost + ?Sized>(&mut self, host: &H) -> MemberChanges {
        let selection = host.selected_transforms();
        if selection.is_empty() {
            info!("No objects selected.");
            return MemberChanges::default();
        }
        self.registry.current_mut().add_or_update_members(host, &selection)
    }

    /// Remove members of the current package by name.
    pub fn remove_members<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        self.registry.current_mut().remove_members(names)
    }

    /// Refresh the current package, dropping stale members.
    pub fn refresh_all<H: SceneHost + ?Sized>(&mut self, host: &H) -> Vec<String> {
        self.registry.current_mut().refresh_all(host)
    }

    pub fn root(&self) -> Option<&RootReference> {
        self.root.as_ref()
    }

    /// Use the object named `name` as the root reference.
    pub fn set_root<H: SceneHost + ?Sized>(&mut self, host: &H, name: &str) -> Result<&RootReference> {
        let id = host
            .find_by_name(name)
            .ok_or_else(|| Error::NameNotFound(name.to_string()))?;
        self.set_root_id(host, id)
    }

    /// Use the single selected transform as the root reference.
    pub fn set_root_from_selection<H: SceneHost + ?Sized>(&mut self, host: &H) -> Result<&RootReference> {
        let selection = host.selected_transforms();
        let [id] = selection.as_slice() else {
            return Err(Error::InvalidSelection { expected: 1, actual: selection.len() });
        };
        self.set_root_id(host, *id)
    }

    fn set_root_id<H: SceneHost + ?Sized>(&mut self, host: &H, id: ObjectId) -> Result<&RootReference> {
        let root = RootReference::capture(host, id)?;
        info!("root transform set to '{}'", root.name());
        Ok(self.root.insert(root))
    }

    pub fn clear_root(&mut self) {
        self.root = None;
    }

    pub fn sync_select(&self) -> bool {
        self.sync_select
    }

    pub fn set_sync_select(&mut self, enabled: bool) {
        self.sync_select = enabled;
    }

    /// Names of current-package members that are selected in the scene.
    /// Read-only; used to mirror scene selection into the member list.
    pub fn members_selected_in_scene<H: SceneHost + ?Sized>(&self, host: &H) -> Vec<String> {
        let selection = host.selected_transforms();
        self.registry
            .current()
            .members()
            .iter()
            .filter(|m| selection.contains(&m.id()))
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Select current-package members by name in the scene.
    pub fn select_members<H: SceneHost + ?Sized, S: AsRef<str>>(
        &self,
        host: &mut H,
        names: &[S],
        mode: SelectMode,
    ) -> Result<()> {
        let ids: Vec<ObjectId> = self
            .registry
            .current()
            .members()
            .iter()
            .filter(|m| names.iter().any(|n| n.as_ref() == m.name()))
            .map(|m| m.id())
            .collect();
        host.select(&ids, mode)
    }

    /// Validate and export with the session's settings.
    ///
    /// Members and a root whose objects disappeared are dropped first, so the
    /// next live member becomes a package's mesh source and validation reports
    /// a missing root.
    pub fn run_export<H, E, F>(&mut self, host: &mut H, exporter: &mut E, confirm: F) -> Result<ExportReport>
    where
        H: SceneHost + ?Sized,
        E: MeshExporter<H> + ?Sized,
        F: FnOnce(&[ValidationWarning]) -> bool,
    {
        for pack in self.registry.iter_mut() {
            let dropped = pack.drop_stale(&*host);
            if !dropped.is_empty() {
                warn!("'{}': dropped stale member(s) {:?} before export", pack.display_name(), dropped);
            }
        }
        if let Some(root) = &self.root {
            if !root.is_live(host) {
                warn!("root transform '{}' no longer exists, dropped", root.name());
                self.root = None;
            }
        }
        self.coordinator
            .run(host, exporter, &self.registry, self.root.as_ref(), &self.settings, confirm)
    }

    /// Auto-generate packages from the scene. Turns sync selection off.
    pub fn run_auto_group<H, P>(&mut self, host: &H, cancel: &CancelToken, progress: P) -> GroupReport
    where
        H: SceneHost + ?Sized,
        P: FnMut(GroupProgress),
    {
        self.sync_select = false;
        auto_group(host, &mut self.registry, cancel, progress)
    }
}
