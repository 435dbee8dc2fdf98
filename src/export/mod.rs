//! Export of packages: mesh files plus one scene description.
//!
//! An export run goes through
//! `Idle -> Validating -> ExportingMeshes -> WritingDescription -> Idle`,
//! skipping the phases whose export type is disabled. Any blocking
//! validation error, or a declined warning prompt, ends the run before a
//! single file is written.
//!
//! The two write phases are independent: per-package mesh failures are
//! collected in [`MeshExportReport`], while a failure to write the
//! description is reported separately in [`ExportReport::description`].

mod document;
mod mesh;
mod validate;

pub use document::*;
pub use mesh::*;
pub use validate::*;

use std::path::PathBuf;

use tracing::{debug, info, info_span, warn};

use crate::package::{PackageRegistry, RootReference};
use crate::scene::{MeshExporter, SceneHost};
use crate::settings::ExportSettings;
use crate::util::{Error, Result};

/// Where an export run currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportPhase {
    #[default]
    Idle,
    Validating,
    ExportingMeshes,
    WritingDescription,
}

/// Result of a completed export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Warnings the user continued past.
    pub warnings: Vec<ValidationWarning>,
    /// `None` when mesh export was disabled.
    pub meshes: Option<MeshExportReport>,
    /// `None` when description export was disabled; otherwise the written
    /// path or the error that stopped that phase.
    pub description: Option<Result<PathBuf>>,
}

impl ExportReport {
    /// True if every enabled phase fully succeeded.
    pub fn is_success(&self) -> bool {
        self.meshes.as_ref().map_or(true, |m| m.is_success())
            && self.description.as_ref().map_or(true, |d| d.is_ok())
    }
}

/// Drives validation and both export phases.
#[derive(Debug, Default)]
pub struct ExportCoordinator {
    phase: ExportPhase,
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    fn enter(&mut self, phase: ExportPhase) {
        debug!("export phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Validate without exporting.
    pub fn validate(
        &mut self,
        registry: &PackageRegistry,
        root: Option<&RootReference>,
        settings: &ExportSettings,
    ) -> Validation {
        self.enter(ExportPhase::Validating);
        let verdict = validate(registry, root, settings);
        self.enter(ExportPhase::Idle);
        verdict
    }

    /// Validate, ask `confirm` about warnings, then export.
    ///
    /// `confirm` is only called when there are warnings; returning `false`
    /// cancels the run. Errors are returned only for a blocked or cancelled
    /// run; write-phase failures are inside the report.
    pub fn run<H, E, F>(
        &mut self,
        host: &mut H,
        exporter: &mut E,
        registry: &PackageRegistry,
        root: Option<&RootReference>,
        settings: &ExportSettings,
        confirm: F,
    ) -> Result<ExportReport>
    where
        H: SceneHost + ?Sized,
        E: MeshExporter<H> + ?Sized,
        F: FnOnce(&[ValidationWarning]) -> bool,
    {
        let _span = info_span!("export").entered();
        let result = self.run_phases(host, exporter, registry, root, settings, confirm);
        self.enter(ExportPhase::Idle);
        result
    }

    fn run_phases<H, E, F>(
        &mut self,
        host: &mut H,
        exporter: &mut E,
        registry: &PackageRegistry,
        root: Option<&RootReference>,
        settings: &ExportSettings,
        confirm: F,
    ) -> Result<ExportReport>
    where
        H: SceneHost + ?Sized,
        E: MeshExporter<H> + ?Sized,
        F: FnOnce(&[ValidationWarning]) -> bool,
    {
        self.enter(ExportPhase::Validating);
        let warnings = match validate(registry, root, settings) {
            Validation::Ready => Vec::new(),
            Validation::Blocked(errors) => {
                for e in &errors {
                    warn!("export blocked: {}", e);
                }
                return Err(Error::Blocked(errors));
            }
            Validation::Warnings(warnings) => {
                if !confirm(&warnings) {
                    info!("export cancelled at warning prompt");
                    return Err(Error::Cancelled);
                }
                warnings
            }
        };

        let mut report = ExportReport { warnings, ..ExportReport::default() };

        if settings.export_meshes {
            self.enter(ExportPhase::ExportingMeshes);
            report.meshes = Some(export_meshes(
                host,
                exporter,
                registry,
                &settings.output_dir,
                &settings.mesh_properties,
            ));
        }

        if settings.export_description {
            self.enter(ExportPhase::WritingDescription);
            report.description = Some(write_description(registry, root, settings));
        }

        Ok(report)
    }
}

/// Build and write the scene description to `output_dir/file_name.json`.
pub fn write_description(
    registry: &PackageRegistry,
    root: Option<&RootReference>,
    settings: &ExportSettings,
) -> Result<PathBuf> {
    let path = settings
        .output_dir
        .join(format!("{}.{}", settings.file_name, DESCRIPTION_EXTENSION));
    info!("Starting scene description export to {}", path.display());

    let doc = SceneDocument::build(registry, root, &settings.output_dir)?;
    doc.write(&path).inspect_err(|e| warn!("{}", e))?;

    info!("Finished scene description export: {} package(s)", doc.packages.len());
    Ok(path)
}
