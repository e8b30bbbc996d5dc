use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::{
    error::{BspError, Result},
    settings::ImporterSettings,
};

#[derive(Deserialize)]
struct MaterialMapEntry {
    #[serde(rename = "TextureName")]
    texture_name: String,
    #[serde(rename = "MaterialPath")]
    material_path: String,
}

/// Source texture names to host material paths, loaded from a json array of
/// `{ "TextureName": ..., "MaterialPath": ... }`.
#[derive(Clone, Debug, Default)]
pub struct MaterialMap {
    materials: AHashMap<String, String>,
}

/// Texture names compare case-insensitively with either kind of slash.
fn normalize(texture: &str) -> String {
    texture.replace('\\', "/").to_ascii_lowercase()
}

impl MaterialMap {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let entries: Vec<MaterialMapEntry> = serde_json::from_str(json)?;
        let mut map = Self::default();
        for entry in entries {
            map.insert(&entry.texture_name, entry.material_path);
        }
        Ok(map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BspError::MaterialMapRead {
            path: path.to_owned(),
            source,
        })?;
        let map = Self::from_json(&json).map_err(|source| BspError::MaterialMapJson {
            path: path.to_owned(),
            source,
        })?;
        log::info!(
            "Loaded material map {} with {} entries",
            path.display(),
            map.len()
        );
        Ok(map)
    }

    /// The material map `settings` ask for. A configured map has to exist, the plugin's
    /// default map is optional.
    pub fn load_for(settings: &ImporterSettings, plugin_root: Option<&Path>) -> Result<Self> {
        let Some(path) = settings.material_json_path(plugin_root) else {
            return Ok(Self::default());
        };
        if !settings.has_explicit_material_map() && !path.exists() {
            log::info!("No material map at {}, using none", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn insert(&mut self, texture: &str, material: impl Into<String>) {
        self.materials.insert(normalize(texture), material.into());
    }

    pub fn resolve(&self, texture: &str) -> Option<&str> {
        self.materials.get(&normalize(texture)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
