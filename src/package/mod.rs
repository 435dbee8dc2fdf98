//! Packages: named groups of scene transforms exported as one mesh.
//!
//! ## Key Concepts
//!
//! - **TransformSnapshot**: cached translate/rotate/scale of one scene object
//! - **Package**: ordered, duplicate-free list of snapshots plus export options
//! - **PackageRegistry**: all packages, never empty, one of them current
//! - **RootReference**: anchor whose position is the origin of exported placements
//!
//! ## Example
//!
//! ```ignore
//! use pkgexport::package::PackageRegistry;
//!
//! let mut registry = PackageRegistry::new();
//! let pack = registry.current_mut();
//! pack.set_display_name("Rock_A");
//! pack.add_or_update_members(&scene, &scene.selected_transforms());
//! ```

mod pack;
mod registry;
mod snapshot;

pub use pack::*;
pub use registry::*;
pub use snapshot::*;
