use std::mem;

use crate::{
    binaries::read_records,
    error::{BspError, Result},
};

use super::consts::LumpType;

/// A fixed-size record stored as an array in one lump.
pub trait Lump
where
    Self: Sized + bytemuck::Pod,
{
    fn max() -> usize;
    fn lump_type() -> LumpType;
}

// https://developer.valvesoftware.com/wiki/BSP_(Source)
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPLump {
    pub file_ofs: i32,    // offset into file (bytes)
    pub file_len: i32,    // length of lump (bytes)
    pub version: i32,     // lump format version
    pub four_cc: [u8; 4], // lump ident code
}

impl BSPLump {
    pub fn is_empty(&self) -> bool {
        self.file_len == 0
    }

    /// The lump's bytes inside the whole file `data`.
    pub fn bytes<'a>(&self, lump: LumpType, data: &'a [u8]) -> Result<&'a [u8]> {
        let (offset, len) = (self.file_ofs, self.file_len);
        if len == 0 {
            return Ok(&[]);
        }
        let out_of_bounds = || BspError::LumpOutOfBounds {
            lump,
            offset,
            len,
            file_len: data.len(),
        };
        if offset < 0 || len < 0 {
            return Err(out_of_bounds());
        }
        let start = offset as usize;
        let end = start
            .checked_add(len as usize)
            .ok_or_else(out_of_bounds)?;
        data.get(start..end).ok_or_else(out_of_bounds)
    }

    pub fn decode<T: Lump>(&self, data: &[u8]) -> Result<Box<[T]>> {
        let bytes = self.bytes(T::lump_type(), data)?;
        let item_size = mem::size_of::<T>();

        if bytes.len() % item_size != 0 {
            log::warn!(
                "{:?} lump length {} is not a multiple of {}, ignoring the trailing {} bytes",
                T::lump_type(),
                bytes.len(),
                item_size,
                bytes.len() % item_size
            );
        }

        let table = read_records::<T>(bytes);

        if table.len() > T::max() {
            log::warn!(
                "{:?} lump has {} entries, more than the engine limit of {}",
                T::lump_type(),
                table.len(),
                T::max()
            );
        }

        Ok(table)
    }
}
