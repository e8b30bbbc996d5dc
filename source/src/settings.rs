//! Importer settings, stored in an ini file under `[HL2BSPImporter]`:
//!
//! ```ini
//! [HL2BSPImporter]
//! WorldScale=2.54
//! bFlipYZ=true
//! MaterialJsonPath=
//! bImportCollision=true
//! bImportPropsAsInstances=true
//! ImportProps=1
//! bSkipToolSurfaces=true
//! ```

use std::path::{Path, PathBuf};

use common::transform::SourceTransform;
use ini::Ini;
use serde::{Deserialize, Serialize};

use crate::error::{BspError, Result};

pub const SETTINGS_SECTION: &str = "HL2BSPImporter";

/// Material map used when no path is configured, relative to the plugin root.
pub const DEFAULT_MATERIAL_JSON: &str = "Resources/Materials.json";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropImportMode {
    Skip,
    /// Static props are only listed in the entity table.
    #[default]
    DataTable,
    /// Props are also placed as instances of their model.
    Instances,
}

impl PropImportMode {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Skip),
            1 => Some(Self::DataTable),
            2 => Some(Self::Instances),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Skip => 0,
            Self::DataTable => 1,
            Self::Instances => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterSettings {
    /// Host units per Source unit.
    pub world_scale: f32,
    /// Convert Source's Z up into Y up.
    pub flip_yz: bool,
    /// Empty to use the plugin's own material map.
    pub material_json_path: String,
    pub import_collision: bool,
    pub import_props_as_instances: bool,
    pub import_props: PropImportMode,
    pub skip_tool_surfaces: bool,
}

impl Default for ImporterSettings {
    fn default() -> Self {
        Self {
            world_scale: 2.54,
            flip_yz: true,
            material_json_path: String::new(),
            import_collision: true,
            import_props_as_instances: true,
            import_props: PropImportMode::DataTable,
            skip_tool_surfaces: true,
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(BspError::InvalidSetting {
            key,
            value: value.to_owned(),
        }),
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| BspError::InvalidSetting {
        key,
        value: value.to_owned(),
    })
}

impl ImporterSettings {
    /// Reads the importer section of `ini`. Missing keys keep their defaults.
    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut settings = Self::default();
        let Some(section) = ini.section(Some(SETTINGS_SECTION)) else {
            log::info!("No [{SETTINGS_SECTION}] section, using default settings");
            return Ok(settings);
        };

        if let Some(v) = section.get("WorldScale") {
            settings.world_scale = parse_value("WorldScale", v)?;
        }
        if let Some(v) = section.get("bFlipYZ") {
            settings.flip_yz = parse_bool("bFlipYZ", v)?;
        }
        if let Some(v) = section.get("MaterialJsonPath") {
            settings.material_json_path = v.trim().to_owned();
        }
        if let Some(v) = section.get("bImportCollision") {
            settings.import_collision = parse_bool("bImportCollision", v)?;
        }
        if let Some(v) = section.get("bImportPropsAsInstances") {
            settings.import_props_as_instances = parse_bool("bImportPropsAsInstances", v)?;
        }
        if let Some(v) = section.get("ImportProps") {
            settings.import_props = parse_value("ImportProps", v)
                .ok()
                .and_then(PropImportMode::from_level)
                .ok_or_else(|| BspError::InvalidSetting {
                    key: "ImportProps",
                    value: v.to_owned(),
                })?;
        }
        if let Some(v) = section.get("bSkipToolSurfaces") {
            settings.skip_tool_surfaces = parse_bool("bSkipToolSurfaces", v)?;
        }
        Ok(settings)
    }

    pub fn from_ini_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        Self::from_ini(&ini)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let ini = Ini::load_from_file(path.as_ref())?;
        log::info!("Loaded importer settings from {}", path.as_ref().display());
        Self::from_ini(&ini)
    }

    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some(SETTINGS_SECTION))
            .set("WorldScale", self.world_scale.to_string())
            .set("bFlipYZ", self.flip_yz.to_string())
            .set("MaterialJsonPath", self.material_json_path.as_str())
            .set("bImportCollision", self.import_collision.to_string())
            .set(
                "bImportPropsAsInstances",
                self.import_props_as_instances.to_string(),
            )
            .set("ImportProps", self.import_props.level().to_string())
            .set("bSkipToolSurfaces", self.skip_tool_surfaces.to_string());
        ini
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| BspError::Io {
                path: path.to_owned(),
                source,
            })
    }

    pub fn transform(&self) -> SourceTransform {
        SourceTransform::new(self.world_scale, self.flip_yz)
    }

    pub fn has_explicit_material_map(&self) -> bool {
        !self.material_json_path.is_empty()
    }

    /// The configured material map, or the plugin's default one under `plugin_root`.
    pub fn material_json_path(&self, plugin_root: Option<&Path>) -> Option<PathBuf> {
        if self.has_explicit_material_map() {
            Some(PathBuf::from(&self.material_json_path))
        } else {
            plugin_root.map(|root| root.join(DEFAULT_MATERIAL_JSON))
        }
    }

    /// Instances need both `ImportProps=2` and `bImportPropsAsInstances`.
    pub fn prop_mode(&self) -> PropImportMode {
        match self.import_props {
            PropImportMode::Instances if !self.import_props_as_instances => {
                PropImportMode::DataTable
            }
            mode => mode,
        }
    }
}
