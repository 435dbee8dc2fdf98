//! Pre-export validation.
//!
//! Everything is checked before any file is written, so a naming conflict
//! can never surface after some meshes were already exported.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::package::{PackageRegistry, RootReference};
use crate::settings::ExportSettings;

/// Problem that stops the export.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("neither mesh nor scene description export is enabled")]
    NoExportType,

    #[error("scene description file name is empty")]
    EmptyFileName,

    #[error("output directory \"{}\" is invalid or does not exist", .0.display())]
    InvalidOutputDir(PathBuf),

    #[error("path \"{}\" on package \"{package}\" is invalid or does not exist", .path.display())]
    InvalidPackageDir { package: String, path: PathBuf },

    #[error("more than one package is named \"{0}\"")]
    DuplicateFileName(String),
}

/// Problem the user may choose to continue past.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    #[error("{} package(s) have no items and will not be exported", .0.len())]
    EmptyPackages(Vec<String>),

    #[error("{0} package(s) have no file name and will not be exported")]
    EmptyFileNames(usize),

    #[error("the root transform has not been set; placements will be absolute")]
    NoRoot,
}

/// Verdict of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Nothing to report.
    Ready,
    /// Export may continue if the user agrees; affected packages are skipped.
    Warnings(Vec<ValidationWarning>),
    /// Export must not be attempted.
    Blocked(Vec<ValidationError>),
}

impl Validation {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        match self {
            Self::Warnings(w) => w,
            _ => &[],
        }
    }
}

fn is_valid_dir(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_dir()
}

/// Check registry, root and settings for an export run.
///
/// Blocking errors are all collected, not just the first. Duplicate file
/// names are exact, case-sensitive matches; empty names are reported as a
/// warning instead since those packages are skipped anyway.
pub fn validate(registry: &PackageRegistry, root: Option<&RootReference>, settings: &ExportSettings) -> Validation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !settings.export_meshes && !settings.export_description {
        return Validation::Blocked(vec![ValidationError::NoExportType]);
    }

    if settings.export_description && settings.file_name.is_empty() {
        errors.push(ValidationError::EmptyFileName);
    }

    if !is_valid_dir(&settings.output_dir) {
        errors.push(ValidationError::InvalidOutputDir(settings.output_dir.clone()));
    }

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    let mut empty_packages = Vec::new();
    let mut empty_names = 0usize;

    for pack in registry.iter() {
        let name = pack.file_base_name();

        if let Some(dir) = pack.export_path_override() {
            if !is_valid_dir(dir) {
                errors.push(ValidationError::InvalidPackageDir {
                    package: name.to_string(),
                    path: dir.to_path_buf(),
                });
            }
        }

        if name.is_empty() {
            empty_names += 1;
        } else {
            *name_counts.entry(name).or_default() += 1;
        }

        if pack.is_empty() {
            empty_packages.push(name.to_string());
        }
    }

    // report duplicates in registry order
    for pack in registry.iter() {
        let name = pack.file_base_name();
        if name_counts.get(name).copied().unwrap_or(0) > 1 {
            let dup = ValidationError::DuplicateFileName(name.to_string());
            if !errors.contains(&dup) {
                errors.push(dup);
            }
        }
    }

    if !errors.is_empty() {
        return Validation::Blocked(errors);
    }

    if !empty_packages.is_empty() {
        warnings.push(ValidationWarning::EmptyPackages(empty_packages));
    }
    if empty_names > 0 {
        warnings.push(ValidationWarning::EmptyFileNames(empty_names));
    }
    if settings.export_description && root.is_none() {
        warnings.push(ValidationWarning::NoRoot);
    }

    if warnings.is_empty() {
        Validation::Ready
    } else {
        Validation::Warnings(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, SceneObject};

    struct Fixture {
        _dir: tempfile::TempDir,
        scene: MemoryScene,
        settings: ExportSettings,
        root: RootReference,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = MemoryScene::new();
        let anchor = scene.insert(SceneObject::transform("origin"));
        scene.insert(SceneObject::transform("wall1"));
        scene.insert(SceneObject::transform("wall2"));
        let root = RootReference::capture(&scene, anchor).unwrap();
        let settings = ExportSettings {
            output_dir: dir.path().to_path_buf(),
            file_name: "level".into(),
            ..ExportSettings::default()
        };
        Fixture { _dir: dir, scene, settings, root }
    }

    fn named(reg: &mut PackageRegistry, scene: &MemoryScene, name: &str, member: &str) {
        use crate::scene::SceneHost;
        let id = scene.find_by_name(member).unwrap();
        let pack = reg.add_package();
        pack.set_display_name(name);
        pack.add_or_update_member(scene, id);
    }

    fn registry(f: &Fixture) -> PackageRegistry {
        let mut reg = PackageRegistry::new();
        let first = reg.current_id();
        named(&mut reg, &f.scene, "Wall", "wall1");
        reg.remove_package(first).unwrap();
        reg
    }

    #[test]
    fn test_ready() {
        let f = fixture();
        let reg = registry(&f);
        assert_eq!(validate(&reg, Some(&f.root), &f.settings), Validation::Ready);
    }

    #[test]
    fn test_no_export_type() {
        let f = fixture();
        let mut settings = f.settings.clone();
        settings.export_meshes = false;
        settings.export_description = false;
        assert_eq!(
            validate(&registry(&f), Some(&f.root), &settings),
            Validation::Blocked(vec![ValidationError::NoExportType])
        );
    }

    #[test]
    fn test_duplicate_names_block() {
        let f = fixture();
        let mut reg = registry(&f);
        named(&mut reg, &f.scene, "Wall", "wall2");
        let v = validate(&reg, Some(&f.root), &f.settings);
        assert_eq!(v, Validation::Blocked(vec![ValidationError::DuplicateFileName("Wall".into())]));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let f = fixture();
        let mut reg = registry(&f);
        named(&mut reg, &f.scene, "wall", "wall2");
        assert_eq!(validate(&reg, Some(&f.root), &f.settings), Validation::Ready);
    }

    #[test]
    fn test_bad_dirs_and_file_name() {
        let f = fixture();
        let mut reg = registry(&f);
        reg.current_mut().set_export_path_override(Some("/definitely/not/here"));
        let mut settings = f.settings.clone();
        settings.file_name.clear();
        settings.output_dir = PathBuf::new();

        let Validation::Blocked(errors) = validate(&reg, Some(&f.root), &settings) else {
            panic!("expected blocked");
        };
        assert!(errors.contains(&ValidationError::EmptyFileName));
        assert!(errors.contains(&ValidationError::InvalidOutputDir(PathBuf::new())));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPackageDir { package, .. } if package == "Wall")));
    }

    #[test]
    fn test_empty_file_name_ok_without_description() {
        let f = fixture();
        let mut settings = f.settings.clone();
        settings.file_name.clear();
        settings.export_description = false;
        assert_eq!(validate(&registry(&f), None, &settings), Validation::Ready);
    }

    #[test]
    fn test_warnings() {
        let f = fixture();
        let mut reg = registry(&f);
        reg.add_package().set_display_name("Hollow");
        let id = crate::scene::SceneHost::find_by_name(&f.scene, "wall2").unwrap();
        reg.add_package().add_or_update_member(&f.scene, id);

        let v = validate(&reg, None, &f.settings);
        assert_eq!(
            v,
            Validation::Warnings(vec![
                ValidationWarning::EmptyPackages(vec!["Hollow".into()]),
                ValidationWarning::EmptyFileNames(1),
                ValidationWarning::NoRoot,
            ])
        );
        assert!(!v.is_blocked());
        assert_eq!(v.warnings().len(), 3);
    }
}
