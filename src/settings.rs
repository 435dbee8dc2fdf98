//! Persistent export settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scene::MeshProperties;
use crate::util::{sanitize_directory, sanitize_file_name, Result};

/// Export settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    // Output
    pub output_dir: PathBuf,
    pub file_name: String,

    // Export types
    pub export_meshes: bool,
    pub export_description: bool,

    // Forwarded to the mesh exporter
    pub mesh_properties: MeshProperties,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            file_name: String::new(),
            export_meshes: true,
            export_description: true,
            mesh_properties: MeshProperties::default(),
        }
    }
}

impl ExportSettings {
    /// Get settings file path
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("pkgexport");
            std::fs::create_dir_all(&p).ok();
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the user config dir, defaults on any failure
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Save settings to the user config dir
    pub fn save(&self) -> Result<()> {
        match Self::path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut settings: Self = serde_json::from_str(&text)?;
        // files may have been edited by hand
        settings.file_name = sanitize_file_name(&settings.file_name);
        settings.output_dir = PathBuf::from(sanitize_directory(&settings.output_dir.to_string_lossy()));
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Set the scene description base name, stripping forbidden characters.
    pub fn set_file_name(&mut self, name: &str) {
        self.file_name = sanitize_file_name(name);
    }

    /// Set the global output directory, stripping wildcard characters.
    pub fn set_output_dir(&mut self, dir: &str) {
        self.output_dir = PathBuf::from(sanitize_directory(dir));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut s = ExportSettings::default();
        s.set_file_name("level:01");
        s.set_output_dir("/levels/out*");
        s.mesh_properties.triangulate = true;
        s.save_to(&path).unwrap();
        let loaded = ExportSettings::load_from(&path).unwrap();
        assert_eq!(loaded, s);
        assert_eq!(loaded.file_name, "level01");
        assert_eq!(loaded.output_dir, PathBuf::from("/levels/out"));

        // missing keys fall back to defaults
        std::fs::write(&path, r#"{ "export_meshes": false }"#).unwrap();
        let partial = ExportSettings::load_from(&path).unwrap();
        assert!(!partial.export_meshes);
        assert!(partial.export_description);
        assert!(partial.mesh_properties.smoothing_groups);
    }
}
