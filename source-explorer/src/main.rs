pub mod bsp_asset_loader;

use std::path::{Path, PathBuf};

use bevy::{color::palettes::css::WHITE, log::LogPlugin, prelude::*};
use bsp_asset_loader::{BspMap, Hl2BspImporterPlugin};
use hl2bsp::{error::BspError, settings::ImporterSettings};
use ini::Ini;
use thiserror::Error;

/// `config.ini`:
///
/// ```ini
/// [launch]
/// assets=D:/hl2/assets
/// map=maps/d1_trainstation_01.bsp
/// plugin_root=.
///
/// [HL2BSPImporter]
/// WorldScale=0.0254
/// ```
#[derive(Resource, Debug)]
struct ViewerConfig {
    assets: String,
    map: String,
    plugin_root: Option<PathBuf>,
    settings: ImporterSettings,
}

#[derive(Debug, Error)]
enum ConfigError {
    #[error("config: {0}")]
    Ini(#[from] ini::Error),
    #[error("config has no [launch] map")]
    NoMap,
    #[error(transparent)]
    Settings(#[from] BspError),
}

impl ViewerConfig {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        let launch = ini.section(Some("launch")).ok_or(ConfigError::NoMap)?;
        let map = launch.get("map").ok_or(ConfigError::NoMap)?.to_owned();
        Ok(Self {
            assets: launch.get("assets").unwrap_or("assets").to_owned(),
            map,
            plugin_root: launch.get("plugin_root").map(PathBuf::from),
            settings: ImporterSettings::from_ini(&ini)?,
        })
    }
}

#[derive(Resource)]
struct LoadedMap {
    handle: Handle<BspMap>,
    spawned: bool,
}

fn main() {
    env_logger::init();

    let config = match ViewerConfig::load(Path::new("config.ini")) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(AssetPlugin {
                    file_path: config.assets.clone(),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .add_plugins(Hl2BspImporterPlugin {
            plugin_root: config.plugin_root.clone(),
        })
        .insert_resource(config)
        .add_systems(Startup, load)
        .add_systems(Update, spawn_map)
        .run();
}

fn load(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<ViewerConfig>) {
    let settings = config.settings.clone();
    let handle: Handle<BspMap> =
        asset_server.load_with_settings(config.map.clone(), move |s: &mut ImporterSettings| {
            *s = settings.clone();
        });
    commands.insert_resource(LoadedMap {
        handle,
        spawned: false,
    });

    commands.insert_resource(AmbientLight {
        color: WHITE.into(),
        brightness: 100.0,
    });
    commands.spawn(DirectionalLightBundle {
        transform: Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -1.0, 0.4, 0.0)),
        ..default()
    });
    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(-2.5, 4.5, 9.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

fn spawn_map(
    mut commands: Commands,
    mut loaded: ResMut<LoadedMap>,
    maps: Res<Assets<BspMap>>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    if loaded.spawned {
        return;
    }
    let Some(map) = maps.get(&loaded.handle) else {
        return;
    };
    loaded.spawned = true;

    let scene = commands
        .spawn((Name::new(map.name.clone()), SpatialBundle::default()))
        .id();

    for section in &map.sections {
        let obj = commands
            .spawn((
                Name::new(section.texture.clone()),
                PbrBundle {
                    mesh: section.mesh.clone(),
                    material: section.material.clone(),
                    ..default()
                },
            ))
            .id();
        commands.entity(scene).push_children(&[obj]);
    }

    for prop in &map.props {
        let obj = commands
            .spawn((
                Name::new(prop.model.clone()),
                SpatialBundle {
                    transform: Transform::from_translation(prop.origin)
                        .with_rotation(prop.rotation),
                    ..default()
                },
            ))
            .id();
        commands.entity(scene).push_children(&[obj]);
    }

    if let Some((min, max)) = map.bounds {
        let center = (min + max) * 0.5;
        let eye = center + (max - min) * Vec3::new(0.0, 0.5, 0.75);
        for mut transform in &mut cameras {
            *transform = Transform::from_translation(eye).looking_at(center, Vec3::Y);
        }
    }

    log::info!(
        "Spawned {}: {} sections, {} props, {} entities",
        map.name,
        map.sections.len(),
        map.props.len(),
        map.entities.len()
    );
}
