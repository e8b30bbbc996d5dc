use glam::Vec3;

use super::{
    consts::{
        num_disp_power_verts, LumpType, MAX_MAP_DISPINFO, MAX_MAP_DISP_POWER, MAX_MAP_DISP_VERTS,
        MIN_MAP_DISP_POWER,
    },
    Lump,
};

// Max # of neighboring displacement touching a displacement's corner.
pub const MAX_DISP_CORNER_NEIGHBORS: usize = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPDispInfo {
    pub start_position: Vec3,      // start position used for orientation
    pub disp_vert_start: i32,      // Index into LUMP_DISP_VERTS.
    pub disp_tri_start: i32,       // Index into LUMP_DISP_TRIS.
    pub power: u32,                // power - indicates size of surface (2^power 1)
    pub min_tess: i32,             // minimum tesselation allowed
    pub smoothing_angle: f32,      // lighting smoothing angle
    pub contents: i32,             // surface contents
    pub map_face: u16,             // Which map face this displacement comes from.
    pub _pad: u16,
    pub lightmap_alpha_start: i32, // Index into ddisplightmapalpha.
    pub lightmap_sample_position_start: i32, // Index into LUMP_DISP_LIGHTMAP_SAMPLE_POSITIONS.
    pub edge_neighbours: [CDispNeighbour; 4], // Indexed by NEIGHBOREDGE_ defines.
    pub corner_neighbours: [CDispCornerNeighbours; 4], // Indexed by CORNER_ defines.
    pub allowed_verts: [u32; 10],  // active verticies
}

impl Default for BSPDispInfo {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

impl BSPDispInfo {
    /// Vertices along one edge of the grid, `None` if the power is out of range.
    pub fn side_len(&self) -> Option<usize> {
        (MIN_MAP_DISP_POWER..=MAX_MAP_DISP_POWER)
            .contains(&self.power)
            .then(|| (1 << self.power) + 1)
    }

    /// The slice of the disp vert lump belonging to this displacement.
    pub fn verts<'a>(&self, disp_verts: &'a [BSPDispVert]) -> Option<&'a [BSPDispVert]> {
        let start = usize::try_from(self.disp_vert_start).ok()?;
        self.side_len()?;
        disp_verts.get(start..start + num_disp_power_verts(self.power))
    }
}

impl Lump for BSPDispInfo {
    fn max() -> usize {
        MAX_MAP_DISPINFO
    }

    fn lump_type() -> LumpType {
        LumpType::DispInfo
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPDispVert {
    pub vec: Vec3,  // Vec3 field defining displacement volume.
    pub dist: f32,  // Displacement distances.
    pub alpha: f32, // "per vertex" alpha values.
}

impl BSPDispVert {
    pub fn offset(&self) -> Vec3 {
        self.vec * self.dist
    }
}

impl Lump for BSPDispVert {
    fn max() -> usize {
        MAX_MAP_DISP_VERTS
    }

    fn lump_type() -> LumpType {
        LumpType::DispVerts
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CDispNeighbour {
    // Note: if there is a neighbour that fills the whole side (CORNER_TO_CORNER),
    //       then it will always be in CDispNeighbour::Neighbours[0]
    pub sub_neighbours: [CDispSubNeighbour; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CDispSubNeighbour {
    pub i_neighbour: u16, // This indexes into ddispinfos.
    // 0xFFFF if there is no neighbour here.
    pub neighbour_orientation: u8, // (CCW) rotation of the neighbour wrt this displacement.

    pub span: u8, // Where the neighbour fits onto this side of our displacement.
    pub neighbour_span: u8, // Where we fit onto our neighbour.

    pub offset: u8,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CDispCornerNeighbours {
    pub neighbours: [u16; MAX_DISP_CORNER_NEIGHBORS], // indices of neighbours.
    pub n_neighbours: u8,
    pub _pad: u8,
}
