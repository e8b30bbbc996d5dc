use std::io::{self, Cursor};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    binaries::{read_cstr, BinaryData},
    error::{BspError, Result},
};

use super::consts::TEXTURE_NAME_LENGTH;

/// `sprp` written as a little endian int
pub const STATIC_PROP_GAMELUMP_ID: [u8; 4] = *b"prps";

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPGameLump {
    pub id: [u8; 4],  // gamelump ID
    pub flags: u16,   // flags
    pub version: u16, // gamelump version
    pub fileofs: i32, // offset to this gamelump, from the start of the file
    pub filelen: i32, // length
}

/// Fields shared by static prop lump versions 4 through 7; later versions append to it.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StaticPropLumpV4 {
    pub origin: Vec3,
    pub angles: Vec3,
    pub prop_type: u16,
    pub first_leaf: u16,
    pub leaf_count: u16,
    pub solid: u8,
    pub flags: u8,
    pub skin: i32,
    pub fade_min_dist: f32,
    pub fade_max_dist: f32,
    pub lighting_origin: Vec3,
}

/// Model names in the dictionary are fixed 128 byte, nul padded strings.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PropDictEntry {
    name: [u8; TEXTURE_NAME_LENGTH],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticProp {
    pub model: String,
    pub origin: Vec3,
    /// (pitch, yaw, roll) in degrees
    pub angles: Vec3,
    pub skin: i32,
    pub solid: u8,
}

fn static_prop_stride(version: u16) -> Option<usize> {
    match version {
        4 => Some(56),
        5 => Some(60),
        6 => Some(64),
        7 => Some(68),
        _ => None,
    }
}

fn truncated(what: &'static str) -> impl Fn(io::Error) -> BspError {
    move |_| BspError::Truncated { what }
}

/// Reads the game lump directory.
pub fn load_gamelump(lump: &[u8]) -> Result<Vec<BSPGameLump>> {
    if lump.is_empty() {
        return Ok(Vec::new());
    }
    let mut buffer = Cursor::new(lump);
    let lump_count = i32::read(&mut buffer).map_err(truncated("game lump directory"))?;
    (0..lump_count.max(0))
        .map(|_| BSPGameLump::read(&mut buffer).map_err(truncated("game lump directory")))
        .collect()
}

/// Static props from the `sprp` game lump. `data` is the whole map file since game lump
/// offsets are absolute.
pub fn load_static_props(lump: &[u8], data: &[u8]) -> Result<Vec<StaticProp>> {
    let directory = load_gamelump(lump)?;
    let Some(sprp) = directory
        .iter()
        .find(|l| l.id == STATIC_PROP_GAMELUMP_ID)
    else {
        return Ok(Vec::new());
    };

    let Some(stride) = static_prop_stride(sprp.version) else {
        log::warn!(
            "Static prop lump version {} is not supported, skipping static props",
            sprp.version
        );
        return Ok(Vec::new());
    };

    let out_of_file = BspError::Truncated {
        what: "static props",
    };
    let (Ok(start), Ok(len)) = (usize::try_from(sprp.fileofs), usize::try_from(sprp.filelen))
    else {
        return Err(out_of_file);
    };
    let bytes = data
        .get(start..start.saturating_add(len))
        .ok_or(out_of_file)?;
    let mut buffer = Cursor::new(bytes);

    let dict_entries = i32::read(&mut buffer).map_err(truncated("static prop dictionary"))?;
    let names = (0..dict_entries.max(0))
        .map(|_| {
            PropDictEntry::read(&mut buffer)
                .map(|e| read_cstr(&e.name))
                .map_err(truncated("static prop dictionary"))
        })
        .collect::<Result<Vec<_>>>()?;

    let leafs = i32::read(&mut buffer).map_err(truncated("static prop leaves"))?;
    buffer.set_position(buffer.position() + 2 * leafs.max(0) as u64);

    let prop_count = i32::read(&mut buffer).map_err(truncated("static prop count"))?;
    let first_prop = buffer.position() as usize;

    let prop_count = prop_count.max(0) as usize;
    let room = bytes.len().saturating_sub(first_prop);
    if prop_count.checked_mul(stride).map_or(true, |needed| needed > room) {
        return Err(BspError::Truncated {
            what: "static props",
        });
    }

    let mut props = Vec::with_capacity(prop_count);
    for i in 0..prop_count {
        let at = first_prop + i * stride;
        let chunk = bytes.get(at..at + stride).ok_or(BspError::Truncated {
            what: "static props",
        })?;
        let prop: StaticPropLumpV4 =
            bytemuck::pod_read_unaligned(&chunk[..std::mem::size_of::<StaticPropLumpV4>()]);

        let Some(model) = names.get(prop.prop_type as usize) else {
            log::warn!(
                "Static prop {i} uses model {} but the dictionary has {} entries, skipping it",
                prop.prop_type,
                names.len()
            );
            continue;
        };
        props.push(StaticProp {
            model: model.clone(),
            origin: prop.origin,
            angles: prop.angles,
            skin: prop.skin,
            solid: prop.solid,
        });
    }

    Ok(props)
}
