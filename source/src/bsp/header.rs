use std::{fmt, mem};

use bytemuck::Zeroable;
use num_traits::FromPrimitive;

use crate::error::{BspError, Result};

use super::{
    consts::{LumpType, HEADER_LUMPS},
    lump::{BSPLump, Lump},
};

/// Little endian identifier, `PSBV` would be a big endian console map.
pub const VBSP_IDENT: [u8; 4] = *b"VBSP";

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPHeader {
    pub ident: [u8; 4],                 // BSP file identifier
    pub version: i32,                   // BSP file version
    pub lumps: [BSPLump; HEADER_LUMPS], // lump directory array
    pub map_revision: i32,              // the map's revision (iteration, version) number
}

impl Default for BSPHeader {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for BSPHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BSPHeader")
            .field("ident", &String::from_utf8_lossy(&self.ident))
            .field("version", &self.version)
            .field("map_revision", &self.map_revision)
            .finish()
    }
}

impl BSPHeader {
    pub const SIZE: usize = mem::size_of::<Self>();

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            log::error!("BSP too small for header (size={})", data.len());
            return Err(BspError::TooSmall {
                size: data.len(),
                needed: Self::SIZE,
            });
        }
        let header: Self = bytemuck::pod_read_unaligned(&data[..Self::SIZE]);
        header.validate()?;
        Ok(header)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ident != VBSP_IDENT {
            log::error!(
                "Wrong BSP magic. Expected 'VBSP' got 0x{:08x}",
                u32::from_le_bytes(self.ident)
            );
            return Err(BspError::BadMagic { found: self.ident });
        }
        if !(19..=20).contains(&self.version) {
            log::warn!(
                "VBSP version {} has not been tested, reading it with the version 20 layout",
                self.version
            );
        }
        log::info!(
            "VBSP header: Version={} MapRevision={}",
            self.version,
            self.map_revision
        );
        Ok(())
    }

    pub fn get_lump_header(&self, lump: LumpType) -> &BSPLump {
        &self.lumps[lump as usize]
    }

    pub fn lump_bytes<'a>(&self, lump: LumpType, data: &'a [u8]) -> Result<&'a [u8]> {
        self.get_lump_header(lump).bytes(lump, data)
    }

    pub fn get_lump<T: Lump>(&self, data: &[u8]) -> Result<Box<[T]>> {
        self.get_lump_header(T::lump_type())
            .decode(data)
            .inspect_err(|e| log::error!("Failed reading {e}"))
    }

    /// Like [`Self::get_lump`], but a broken lump is logged and read as empty.
    pub fn get_optional_lump<T: Lump>(&self, data: &[u8]) -> Box<[T]> {
        match self.get_lump_header(T::lump_type()).decode(data) {
            Ok(lump) => lump,
            Err(e) => {
                log::warn!("{e}, ignoring it");
                Default::default()
            }
        }
    }

    /// Every known lump that carries data, in directory order.
    pub fn present_lumps(&self) -> impl Iterator<Item = (LumpType, &BSPLump)> + '_ {
        self.lumps
            .iter()
            .enumerate()
            .filter(|(_, lump)| !lump.is_empty())
            .filter_map(|(i, lump)| Some((LumpType::from_usize(i)?, lump)))
    }
}
