use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use env_logger::Env;
use hl2bsp::prelude::*;

/// Reads a Half-Life 2 map and reports what an import of it produces.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The .bsp file to read.
    #[arg(value_name = "MAP")]
    map: PathBuf,

    /// Ini file with an [HL2BSPImporter] section.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding Resources/Materials.json.
    #[arg(long)]
    plugin_root: Option<PathBuf>,

    /// Host units per Source unit.
    #[arg(long, env = "HL2_SCALE")]
    scale: Option<f32>,

    /// 0 = skip, 1 = data table only, 2 = full instances.
    #[arg(long, env = "HL2_IMPORT_PROPS", value_parser = clap::value_parser!(u8).range(0..=2))]
    import_props: Option<u8>,

    /// Write the entity table to this json file.
    #[arg(short, long)]
    entities: Option<PathBuf>,

    /// List the lumps present in the file.
    #[arg(short, long)]
    lumps: bool,

    /// List the files embedded in the pak lump.
    #[arg(short, long)]
    pak: bool,
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => ImporterSettings::load(path)?,
        None => ImporterSettings::default(),
    };
    if let Some(scale) = cli.scale {
        settings.world_scale = scale;
    }
    if let Some(mode) = cli.import_props.and_then(PropImportMode::from_level) {
        settings.import_props = mode;
    }

    if !BspImporter::can_import(&cli.map) {
        return Err(BspError::UnsupportedFile(cli.map));
    }
    let importer = BspImporter::new(settings, cli.plugin_root.as_deref())?;
    let bsp = BspFile::load_from_file(&cli.map)?;
    let name = cli
        .map
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let map = importer.import_bsp(name, &bsp);

    let header = bsp.header();
    println!(
        "{}: VBSP version {} revision {}",
        map.name, header.version, header.map_revision
    );
    println!(
        "  {} faces, {} textures, {} displacements, {} models",
        bsp.polygons().len(),
        bsp.textures().len(),
        bsp.disp_infos().len(),
        bsp.models().len()
    );
    println!(
        "  {} entities ({} brush), {} static props, {} prop instances",
        bsp.entities().len(),
        bsp.entities().iter().filter(|e| e.is_brush()).count(),
        bsp.static_props().len(),
        map.props.len()
    );
    println!(
        "  scale {}, {} mapped materials, props {:?}",
        importer.settings().world_scale,
        importer.materials().len(),
        importer.settings().prop_mode()
    );
    println!(
        "  mesh: {} vertices, {} triangles",
        map.mesh.vertex_count(),
        map.mesh.triangle_count()
    );
    if let Some((min, max)) = map.mesh.bounds() {
        println!("  bounds: {min} .. {max}");
    }
    if let Some(collision) = &map.mesh.collision {
        println!("  collision: {} triangles", collision.indices.len() / 3);
    }
    for section in &map.mesh.sections {
        println!(
            "  section {:<40} {:>6} tris  {}",
            section.texture,
            section.indices.len() / 3,
            section.material.as_deref().unwrap_or("-")
        );
    }

    if cli.lumps {
        for (lump_type, lump) in header.present_lumps() {
            println!(
                "  lump {:<24} ofs {:>9} len {:>9} version {}",
                format!("{lump_type:?}"),
                lump.file_ofs,
                lump.file_len,
                lump.version
            );
        }
    }

    if cli.pak {
        for entry in &bsp.pak().entries {
            println!("  pak {} ({} bytes)", entry.filename, entry.size);
        }
        println!(
            "  pak: {} files, {} materials",
            bsp.pak().entries.len(),
            bsp.pak().materials().count()
        );
    }

    if let Some(path) = &cli.entities {
        map.entities.write_json(path)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
