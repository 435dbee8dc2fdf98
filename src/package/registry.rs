//! Ordered package list with a current (edited) package.

use tracing::debug;

use crate::util::{Error, Result};
use super::{Package, PackageId};

/// Change of the current package, for the view to re-highlight and reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentChange {
    /// Previously current package, if it still exists.
    pub previous: Option<PackageId>,
    pub current: PackageId,
}

/// Owns every package.
///
/// Invariants: at least one package exists, and the current package is one
/// of them.
#[derive(Clone, Debug)]
pub struct PackageRegistry {
    packages: Vec<Package>,
    current: PackageId,
    next_id: u64,
}

impl Default for PackageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageRegistry {
    /// Registry holding one empty, current package.
    pub fn new() -> Self {
        let first = Package::new(PackageId(0));
        Self {
            current: first.id(),
            packages: vec![first],
            next_id: 1,
        }
    }

    /// Append a new empty package. The current package does not change.
    pub fn add_package(&mut self) -> &mut Package {
        let id = PackageId(self.next_id);
        self.next_id += 1;
        self.packages.push(Package::new(id));
        debug!("added {}", id);
        let last = self.packages.len() - 1;
        &mut self.packages[last]
    }

    /// Remove a package and drop it with its members.
    ///
    /// Removing the last package creates a fresh empty one and makes it
    /// current. Removing the current package makes the first remaining one
    /// current. Returns the current-package change, if any.
    pub fn remove_package(&mut self, id: PackageId) -> Result<Option<CurrentChange>> {
        let pos = self.position(id)?;
        let removed = self.packages.remove(pos);
        debug!("removed {} ('{}', {} members)", id, removed.display_name(), removed.len());
        drop(removed);

        if self.packages.is_empty() {
            let fresh = self.add_package().id();
            self.current = fresh;
            return Ok(Some(CurrentChange { previous: None, current: fresh }));
        }

        if self.current == id {
            self.current = self.packages[0].id();
            return Ok(Some(CurrentChange { previous: None, current: self.current }));
        }
        Ok(None)
    }

    /// Make `id` the current package. Returns `None` if it already is.
    pub fn set_current(&mut self, id: PackageId) -> Result<Option<CurrentChange>> {
        self.position(id)?;
        if self.current == id {
            return Ok(None);
        }
        let previous = self.current;
        self.current = id;
        Ok(Some(CurrentChange { previous: Some(previous), current: id }))
    }

    pub fn current_id(&self) -> PackageId {
        self.current
    }

    pub fn current(&self) -> &Package {
        let pos = self.position(self.current).unwrap_or(0);
        &self.packages[pos]
    }

    pub fn current_mut(&mut self) -> &mut Package {
        let pos = self.position(self.current).unwrap_or(0);
        &mut self.packages[pos]
    }

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: PackageId) -> Option<&mut Package> {
        self.packages.iter_mut().find(|p| p.id() == id)
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Package> {
        self.packages.iter_mut()
    }

    /// Number of packages; never zero.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn position(&self, id: PackageId) -> Result<usize> {
        self.packages
            .iter()
            .position(|p| p.id() == id)
            .ok_or(Error::PackageNotFound(id.0))
    }
}
