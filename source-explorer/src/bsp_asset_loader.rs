use std::path::PathBuf;

use bevy::{
    asset::{io::Reader, AssetLoader, AsyncReadExt, LoadContext},
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        render_asset::RenderAssetUsages,
    },
};
use hl2bsp::{
    entity_table::EntityTable,
    error::BspError,
    import::{BspImporter, PropInstance},
    meshes::{CollisionMesh, MeshSection},
    settings::ImporterSettings,
};
use thiserror::Error;

/// Registers the `.bsp` loader.
pub struct Hl2BspImporterPlugin {
    /// Directory holding `Resources/Materials.json`.
    pub plugin_root: Option<PathBuf>,
}

impl Plugin for Hl2BspImporterPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<BspMap>()
            .register_asset_loader(BspAssetLoader {
                plugin_root: self.plugin_root.clone(),
            });
        log::info!("HL2BSPImporter module loaded");
    }
}

#[derive(Debug)]
pub struct BspMapSection {
    pub texture: String,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

#[derive(Asset, TypePath, Debug)]
pub struct BspMap {
    pub name: String,
    pub sections: Vec<BspMapSection>,
    /// Main world only, for physics.
    pub collision: Option<Handle<Mesh>>,
    pub bounds: Option<(Vec3, Vec3)>,
    pub entities: EntityTable,
    pub props: Vec<PropInstance>,
}

pub struct BspAssetLoader {
    plugin_root: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum BspLoaderError {
    #[error("could not read map: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Import(#[from] BspError),
}

impl AssetLoader for BspAssetLoader {
    type Asset = BspMap;
    type Settings = ImporterSettings;
    type Error = BspLoaderError;
    async fn load<'a>(
        &'a self,
        reader: &'a mut Reader<'_>,
        settings: &'a ImporterSettings,
        load_context: &'a mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let importer = BspImporter::new(settings.clone(), self.plugin_root.as_deref())?;
        let name = load_context
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let map = importer.import_bytes(name, &bytes)?;

        let mut sections = Vec::with_capacity(map.mesh.sections.len());
        for (i, section) in map.mesh.sections.iter().enumerate() {
            let mesh = load_context.add_labeled_asset(format!("Section{i}"), section_to_mesh(section));

            let [r, g, b] = section.reflectivity.to_array();
            let base_color_texture: Option<Handle<Image>> = section
                .material
                .as_ref()
                .map(|path| load_context.load(path.clone()));
            let material = load_context.add_labeled_asset(
                format!("Material{i}"),
                StandardMaterial {
                    base_color: if base_color_texture.is_some() {
                        Color::WHITE
                    } else {
                        Color::linear_rgb(r, g, b)
                    },
                    base_color_texture,
                    perceptual_roughness: 0.9,
                    ..default()
                },
            );

            sections.push(BspMapSection {
                texture: section.texture.clone(),
                mesh,
                material,
            });
        }

        let collision = map.mesh.collision.as_ref().map(|collision| {
            load_context.add_labeled_asset("Collision".to_string(), collision_to_mesh(collision))
        });

        Ok(BspMap {
            bounds: map.mesh.bounds(),
            name: map.name,
            sections,
            collision,
            entities: map.entities,
            props: map.props,
        })
    }

    fn extensions(&self) -> &[&str] {
        &["bsp"]
    }
}

pub fn section_to_mesh(section: &MeshSection) -> Mesh {
    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(
        Mesh::ATTRIBUTE_POSITION,
        section
            .vertices
            .iter()
            .map(|v| v.position.to_array())
            .collect::<Vec<_>>(),
    )
    .with_inserted_attribute(
        Mesh::ATTRIBUTE_NORMAL,
        section
            .vertices
            .iter()
            .map(|v| v.normal.to_array())
            .collect::<Vec<_>>(),
    )
    .with_inserted_attribute(
        Mesh::ATTRIBUTE_UV_0,
        section.uvs().map(|uv| uv.to_array()).collect::<Vec<_>>(),
    )
    .with_inserted_indices(Indices::U32(section.indices.clone()))
}

pub fn collision_to_mesh(collision: &CollisionMesh) -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::MAIN_WORLD)
        .with_inserted_attribute(
            Mesh::ATTRIBUTE_POSITION,
            collision
                .vertices
                .iter()
                .map(|v| v.position.to_array())
                .collect::<Vec<_>>(),
        )
        .with_inserted_indices(Indices::U32(collision.indices.clone()))
}

#[cfg(test)]
mod bsp_asset_loader_tests {
    use common::vertex::{PositionVertex, UVVertex};
    use glam::{vec2, vec3};

    use super::*;

    #[test]
    fn section_keeps_vertices_and_indices() {
        let section = MeshSection {
            texture: "concrete/floor01".into(),
            vertices: vec![
                UVVertex {
                    position: vec3(0.0, 0.0, 0.0),
                    normal: Vec3::Y,
                    uv: vec2(0.0, 0.0),
                    alpha: 1.0,
                };
                4
            ],
            indices: vec![0, 2, 1, 0, 3, 2],
            ..Default::default()
        };
        let mesh = section_to_mesh(&section);
        assert_eq!(mesh.count_vertices(), 4);
        assert_eq!(mesh.indices().unwrap().len(), 6);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    #[test]
    fn collision_has_positions_only() {
        let collision = CollisionMesh {
            vertices: vec![PositionVertex::default(); 3],
            indices: vec![0, 1, 2],
        };
        let mesh = collision_to_mesh(&collision);
        assert_eq!(mesh.count_vertices(), 3);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_none());
    }
}
