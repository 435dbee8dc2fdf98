//! # pkgexport
//!
//! Groups scene transforms into named packages and exports each package as
//! one mesh file, plus a JSON scene description that records where every
//! instance sits relative to a chosen root object. A game engine can then
//! rebuild the level by instancing one mesh per package at the recorded
//! placements.
//!
//! The host application (its scene graph, selection and native mesh writer)
//! is reached only through the [`scene::SceneHost`] and
//! [`scene::MeshExporter`] traits.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types, name sanitizers
//! - [`scene`] - Host scene contract and an in-memory host
//! - [`package`] - Snapshots, packages, registry, root reference
//! - [`export`] - Validation, mesh export, scene description
//! - [`grouping`] - Similarity-based automatic packaging
//! - [`session`] - Application state driven by a UI shell
//! - [`settings`] - Persistent export settings
//!
//! ## Example
//!
//! ```ignore
//! use pkgexport::prelude::*;
//!
//! let mut scene = MemoryScene::open("level.json")?;
//! let mut session = Session::new(ExportSettings::load());
//! session.run_auto_group(&scene, &CancelToken::new(), |_| {});
//! session.set_root(&scene, "origin")?;
//! let report = session.run_export(&mut scene, &mut ObjExporter::new(), |_| true)?;
//! ```

pub mod util;
pub mod scene;
pub mod package;
pub mod export;
pub mod grouping;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use util::{Attributes, Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Attributes, DVec3, Error, Result};
    pub use crate::scene::{MemoryScene, MeshExporter, ObjExporter, ObjectId, SceneHost, SelectMode};
    pub use crate::package::{Package, PackageId, PackageRegistry, RootReference, TransformSnapshot};
    pub use crate::export::{ExportCoordinator, ExportReport, SceneDocument, Validation};
    pub use crate::grouping::{CancelToken, GroupReport};
    pub use crate::session::Session;
    pub use crate::settings::ExportSettings;
}
