use glam::IVec2;

use super::{
    consts::{LumpType, MAX_MAP_FACES},
    edges::{BSPEdge, BSPSurfEdge},
    Lump,
};

///The face array is limited to 65536 (MAX_MAP_FACES) entries.
///
///The original face lump (Lump 27) has the same structure as the face lump, but contains the array of faces before the BSP splitting process is done.
///
///Both the face and original face arrays are culled; that is, many faces present before compilation of the map (primarily those that face towards the "void" outside the map) are removed from the array.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPFace {
    /// the plane number
    pub plane_num: u16,
    /// faces opposite to the node's plane direction
    pub side: i8,
    // 1 of on node, 0 if in leaf
    pub on_node: i8,
    /// Firstedge is an index into the Surfedge array; this and the following numedges entries in the surfedge array define the edges of the face.
    ///
    /// The vertices which make up the face are thus referenced in clockwise order; when looking towards the face,
    /// each edge is traced in a clockwise direction.
    pub first_edge: i32,
    /// number of surfedges
    pub num_edges: i16,
    ///Texinfo is an index into the Texinfo array, and represents the texture to be drawn on the face.
    pub tex_info: i16,
    /// Index into the Dispinfo array if the face is a displacement surface, otherwise -1.
    pub disp_info: i16,
    pub surface_fog_volume_id: i16,
    /// switchable lighting info
    pub styles: [i8; 4],
    /// offset into lightmap lump
    pub light_ofs: i32,
    /// face area in units^2
    pub area: f32,
    pub lightmap_texture_mins_in_luxels: IVec2,
    pub lightmap_texture_size_in_luxels: IVec2,
    ///OrigFace is the index of the original face which was split to produce this face.
    pub orig_face: i32,
    pub num_prims: u16,
    pub first_prim_id: u16,
    /// lightmap smoothing group
    pub smoothing_groups: u32,
}

impl BSPFace {
    /// Vertex indices of the face in clockwise order. Surfedges, edges or vertices that
    /// do not exist (`vert_count` is the vertex lump length) are skipped.
    pub fn get_verts(
        &self,
        edges: &[BSPEdge],
        surfedges: &[BSPSurfEdge],
        vert_count: usize,
    ) -> Vec<usize> {
        let first = self.first_edge;
        if first < 0 {
            return Vec::new();
        }
        (0..self.num_edges.max(0) as usize)
            .filter_map(|i| surfedges.get(first as usize + i)?.get_edge(edges))
            .map(|(v, _)| v as usize)
            .filter(|&v| v < vert_count)
            .collect()
    }

    pub fn disp_info(&self) -> Option<usize> {
        (self.disp_info >= 0).then_some(self.disp_info as usize)
    }

    pub fn tex_info(&self) -> Option<usize> {
        (self.tex_info >= 0).then_some(self.tex_info as usize)
    }
}

impl Lump for BSPFace {
    fn max() -> usize {
        MAX_MAP_FACES
    }
    fn lump_type() -> LumpType {
        LumpType::Faces
    }
}
