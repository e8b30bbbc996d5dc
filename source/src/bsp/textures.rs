use flagset::FlagSet;
use glam::{Vec3, Vec4};

use crate::binaries::read_cstr;

use super::{
    consts::{
        LumpType, SurfaceFlags, MAX_MAP_TEXDATA, MAX_MAP_TEXDATA_STRING_TABLE, MAX_MAP_TEXINFO,
    },
    Lump,
};

// Texinfo
//
// The texinfo lump (Lump 6) contains an array of texinfo_t structures. Each texinfo is 72 bytes long.
//
// The first array of floats is in essence two vectors that represent how the texture is orientated and scaled when rendered on the world geometry. The two vectors, s and t, are the mapping of the left-to-right and down-to-up directions in the texture pixel coordinate space, onto the world. Each vector has an x, y, and z component, plus an offset which is the "shift" of the texture in that direction relative to the world.
//
// u = tv0,0 * x + tv0,1 * y + tv0,2 * z + tv0,3
// v = tv1,0 * x + tv1,1 * y + tv1,2 * z + tv1,3
//
// Furthermore, after calculating (u, v), to convert them to texture coordinates which you would send to your graphics card, divide u and v by the width and height of the texture respectively.

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPTexInfo {
    /// [s/t][xyz offset]
    pub texture_vecs: [[f32; 4]; 2],
    /// [s/t][xyz offset] - length is in units of texels/area
    pub lightmap_vecs: [[f32; 4]; 2],
    pub flags: i32,    // miptex flags overrides
    pub tex_data: i32, // Pointer to texture name, size, etc.
}

impl BSPTexInfo {
    pub fn tex_s(&self) -> Vec4 {
        Vec4::from_array(self.texture_vecs[0])
    }

    pub fn tex_t(&self) -> Vec4 {
        Vec4::from_array(self.texture_vecs[1])
    }

    /// Unknown bits are dropped.
    pub fn surface_flags(&self) -> FlagSet<SurfaceFlags> {
        FlagSet::new_truncated(self.flags)
    }

    pub fn tex_data(&self) -> Option<usize> {
        (self.tex_data >= 0).then_some(self.tex_data as usize)
    }

    /// Texel coordinates of a world position, before dividing by the texture size.
    pub fn project(&self, position: Vec3) -> (f32, f32) {
        let p = Vec4::from((position, 1.0));
        (self.tex_s().dot(p), self.tex_t().dot(p))
    }
}

impl Lump for BSPTexInfo {
    fn max() -> usize {
        MAX_MAP_TEXINFO
    }
    fn lump_type() -> LumpType {
        LumpType::TexInfo
    }
}

///Texdata
///
///The index of a Texinfo (referenced from a face or brushside) may be given as -1; this indicates that no texture information is associated with this face. This occurs on compiling brush faces given the SKIP, CLIP, or INVISIBLE type textures in the editor.
///
/// The reflectivity vector corresponds to the RGB components of the reflectivity of the texture, as derived from the material's .vtf file. The nameStringTableID is an index into the TexdataStringTable array (below).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPTexData {
    pub reflectivity: Vec3,         // RGB reflectivity
    pub name_string_table_id: i32, // index into TexdataStringTable
    pub width: i32,
    pub height: i32, // source image
    pub view_width: i32,
    pub view_height: i32,
}

impl Lump for BSPTexData {
    fn max() -> usize {
        MAX_MAP_TEXDATA
    }
    fn lump_type() -> LumpType {
        LumpType::TexData
    }
}

/// The TexdataStringTable (Lump 44) is an array of integers which are offsets into the TexdataStringData (lump 43). The TexdataStringData lump consists of concatenated null-terminated strings giving the texture name.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPTexDataStringTable {
    pub index: i32,
}

impl BSPTexDataStringTable {
    pub fn get_filename(&self, tex_data_string_data: &[u8]) -> Option<String> {
        let start = usize::try_from(self.index).ok()?;
        let bytes = tex_data_string_data.get(start..)?;
        // an offset exactly at the end is as broken as one past it
        if bytes.is_empty() {
            return None;
        }
        Some(read_cstr(bytes))
    }
}

impl Lump for BSPTexDataStringTable {
    fn max() -> usize {
        MAX_MAP_TEXDATA_STRING_TABLE
    }
    fn lump_type() -> LumpType {
        LumpType::TexDataStringTable
    }
}
