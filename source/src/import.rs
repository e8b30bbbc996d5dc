use std::path::{Path, PathBuf};

use glam::{Quat, Vec3};

use crate::{
    bsp::BspFile,
    entity_table::EntityTable,
    error::{BspError, Result},
    materials::MaterialMap,
    meshes::{build_static_mesh, StaticMesh},
    settings::{ImporterSettings, PropImportMode},
};

/// (extension, description) pairs of the files the importer reads.
pub const FORMATS: &[(&str, &str)] = &[("bsp", "HL2 Map")];

/// A studio model placed in the map, in host space.
#[derive(Clone, Debug, PartialEq)]
pub struct PropInstance {
    pub model: String,
    pub origin: Vec3,
    pub rotation: Quat,
    pub skin: i32,
}

#[derive(Clone, Debug)]
pub struct ImportedMap {
    pub name: String,
    pub mesh: StaticMesh,
    pub entities: EntityTable,
    pub props: Vec<PropInstance>,
}

/// Turns `.bsp` files into meshes, an entity table and prop instances.
#[derive(Clone, Debug, Default)]
pub struct BspImporter {
    settings: ImporterSettings,
    materials: MaterialMap,
}

impl BspImporter {
    /// Loads the material map the settings point at, see [`MaterialMap::load_for`].
    pub fn new(settings: ImporterSettings, plugin_root: Option<&Path>) -> Result<Self> {
        let materials = MaterialMap::load_for(&settings, plugin_root)?;
        Ok(Self::with_materials(settings, materials))
    }

    pub fn with_materials(settings: ImporterSettings, materials: MaterialMap) -> Self {
        Self {
            settings,
            materials,
        }
    }

    pub fn settings(&self) -> &ImporterSettings {
        &self.settings
    }

    pub fn materials(&self) -> &MaterialMap {
        &self.materials
    }

    pub fn can_import(path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FORMATS.iter().any(|(ext, _)| e.eq_ignore_ascii_case(ext)))
    }

    pub fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportedMap> {
        let path = path.as_ref();
        if !Self::can_import(path) {
            return Err(BspError::UnsupportedFile(PathBuf::from(path)));
        }
        log::info!("Importing {}", path.display());
        let bsp = BspFile::load_from_file(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.import_bsp(name, &bsp))
    }

    pub fn import_bytes(&self, name: impl Into<String>, data: &[u8]) -> Result<ImportedMap> {
        let bsp = BspFile::from_bytes(data)?;
        Ok(self.import_bsp(name, &bsp))
    }

    pub fn import_bsp(&self, name: impl Into<String>, bsp: &BspFile) -> ImportedMap {
        let name = name.into();
        let mesh = build_static_mesh(bsp, &self.settings, &self.materials);

        let mut entities = EntityTable::from_entities(bsp.entities());
        let mut props = Vec::new();
        let mode = self.settings.prop_mode();
        if mode != PropImportMode::Skip {
            entities.push_static_props(bsp.static_props());
        }
        if mode == PropImportMode::Instances {
            props = self.prop_instances(bsp);
        }

        log::info!(
            "Imported {name}: Sections={} Tris={} Entities={} Props={}",
            mesh.sections.len(),
            mesh.triangle_count(),
            entities.len(),
            props.len()
        );

        ImportedMap {
            name,
            mesh,
            entities,
            props,
        }
    }

    /// Static props plus every point entity with a studio model.
    fn prop_instances(&self, bsp: &BspFile) -> Vec<PropInstance> {
        let transform = self.settings.transform();

        let static_props = bsp.static_props().iter().map(|p| PropInstance {
            model: p.model.clone(),
            origin: transform.point(p.origin),
            rotation: transform.rotation(p.angles),
            skin: p.skin,
        });
        let entity_props = bsp
            .entities()
            .iter()
            .filter(|e| e.is_studio_model())
            .map(|e| PropInstance {
                model: e.model.clone(),
                origin: transform.point(e.origin),
                rotation: transform.rotation(e.rotation),
                skin: e
                    .properties
                    .get("skin")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(0),
            });

        static_props.chain(entity_props).collect()
    }
}
