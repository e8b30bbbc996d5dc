use super::{
    consts::{LumpType, MAX_MAP_EDGES, MAX_MAP_SURFEDGES},
    Lump,
};

///Edge
///
///The edge lump (Lump 12) is an array of dedge_t structures:
///Each edge is simply a pair of vertex indices (which index into the vertex lump array). The edge is defined as the straight line between the two vertices. Usually, the edge array is referenced through the Surfedge array (see below).
///
///As for vertices, edges can be shared between adjacent faces. There is a limit of 256000 edges in a map (`MAX_MAP_EDGES`).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPEdge {
    pub v: [u16; 2], // vertex indices
}

impl Lump for BSPEdge {
    fn max() -> usize {
        MAX_MAP_EDGES
    }
    fn lump_type() -> LumpType {
        LumpType::Edges
    }
}

///Surfedge
///
///The Surfedge lump (Lump 13), presumable short for surface edge, is an array of (signed) integers. Surfedges are used to reference the edge array, in a somewhat complex way.
///The value in the surfedge array can be positive or negative. The absolute value of this number is an index into the edge array:
/// if positive, it means the edge is defined from the first to the second vertex; if negative, from the second to the first vertex.
///
///There is a limit of 512000 (MAX_MAP_SURFEDGES) surfedges per map. Note that the number of surfedges is not necessarily the same as the number of edges in the map.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BSPSurfEdge {
    pub index: i32,
}

impl Lump for BSPSurfEdge {
    fn max() -> usize {
        MAX_MAP_SURFEDGES
    }
    fn lump_type() -> LumpType {
        LumpType::SurfEdges
    }
}

impl BSPSurfEdge {
    /// The referenced edge traced in this surfedge's direction, `None` if the edge does not exist.
    pub fn get_edge(&self, edges: &[BSPEdge]) -> Option<(u16, u16)> {
        let edge = edges.get(self.index.unsigned_abs() as usize)?;
        if self.index >= 0 {
            Some((edge.v[0], edge.v[1]))
        } else {
            Some((edge.v[1], edge.v[0]))
        }
    }
}
