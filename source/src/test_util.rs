//! Builders for small synthetic maps.

use glam::Vec3;

use crate::bsp::{
    displacement::{BSPDispInfo, BSPDispVert},
    edges::{BSPEdge, BSPSurfEdge},
    face::BSPFace,
    gamelump::{StaticPropLumpV4, STATIC_PROP_GAMELUMP_ID},
    header::{BSPHeader, VBSP_IDENT},
    textures::{BSPTexData, BSPTexDataStringTable, BSPTexInfo},
    LumpType,
};

/// Lays lumps out one after another behind the header, in the order they are added.
pub struct BspWriter {
    header: BSPHeader,
    body: Vec<u8>,
}

impl BspWriter {
    pub fn new() -> Self {
        let mut header = BSPHeader::default();
        header.ident = VBSP_IDENT;
        header.version = 20;
        Self {
            header,
            body: Vec::new(),
        }
    }

    /// File offset the next lump will be written at.
    pub fn next_offset(&self) -> usize {
        BSPHeader::SIZE + self.body.len()
    }

    pub fn lump(mut self, lump: LumpType, bytes: Vec<u8>) -> Self {
        let offset = self.next_offset();
        let entry = &mut self.header.lumps[lump as usize];
        entry.file_ofs = offset as i32;
        entry.file_len = bytes.len() as i32;
        self.body.extend(bytes);
        self
    }

    pub fn records<T: bytemuck::Pod>(self, lump: LumpType, records: &[T]) -> Self {
        if records.is_empty() {
            return self;
        }
        self.lump(lump, bytemuck::cast_slice(records).to_vec())
    }

    pub fn finish(self) -> Vec<u8> {
        let mut data = bytemuck::bytes_of(&self.header).to_vec();
        data.extend(self.body);
        data
    }
}

/// A game lump directory holding one `sprp` lump, for a game lump placed at `base_offset`
/// in the file. Every prop sits at (1, 2, 3) rotated 90 degrees in yaw.
pub fn static_prop_gamelump(
    base_offset: usize,
    version: u16,
    names: &[&str],
    prop_types: &[u16],
) -> Vec<u8> {
    let stride = match version {
        5 => 60,
        6 => 64,
        7 => 68,
        _ => 56,
    };

    let mut payload = Vec::new();
    payload.extend((names.len() as i32).to_le_bytes());
    for name in names {
        let mut entry = [0u8; 128];
        entry[..name.len()].copy_from_slice(name.as_bytes());
        payload.extend(entry);
    }
    payload.extend(2i32.to_le_bytes());
    payload.extend([0u8, 0, 1, 0]);
    payload.extend((prop_types.len() as i32).to_le_bytes());
    for &prop_type in prop_types {
        let prop = StaticPropLumpV4 {
            origin: Vec3::new(1.0, 2.0, 3.0),
            angles: Vec3::new(0.0, 90.0, 0.0),
            prop_type,
            first_leaf: 0,
            leaf_count: 1,
            solid: 6,
            flags: 0,
            skin: 1,
            fade_min_dist: 0.0,
            fade_max_dist: 0.0,
            lighting_origin: Vec3::ZERO,
        };
        payload.extend(bytemuck::bytes_of(&prop));
        payload.extend(std::iter::repeat(0u8).take(stride - 56));
    }

    let mut lump = Vec::new();
    lump.extend(1i32.to_le_bytes());
    lump.extend(STATIC_PROP_GAMELUMP_ID);
    lump.extend(0u16.to_le_bytes());
    lump.extend(version.to_le_bytes());
    lump.extend(((base_offset + 20) as i32).to_le_bytes());
    lump.extend((payload.len() as i32).to_le_bytes());
    lump.extend(payload);
    lump
}

/// Map contents built face by face, written out with [`TestMap::build`].
pub struct TestMap {
    verts: Vec<Vec3>,
    edges: Vec<BSPEdge>,
    surfedges: Vec<BSPSurfEdge>,
    faces: Vec<BSPFace>,
    tex_infos: Vec<BSPTexInfo>,
    tex_datas: Vec<BSPTexData>,
    names: Vec<u8>,
    name_table: Vec<BSPTexDataStringTable>,
    disp_infos: Vec<BSPDispInfo>,
    disp_verts: Vec<BSPDispVert>,
    models: Vec<u8>,
    props: Option<(Vec<String>, Vec<u16>)>,
    pub entities: String,
}

impl TestMap {
    pub fn new() -> Self {
        Self {
            verts: Vec::new(),
            // edge 0 is never referenced since -0 has no direction
            edges: vec![BSPEdge::default()],
            surfedges: Vec::new(),
            faces: Vec::new(),
            tex_infos: Vec::new(),
            tex_datas: Vec::new(),
            names: Vec::new(),
            name_table: Vec::new(),
            disp_infos: Vec::new(),
            disp_verts: Vec::new(),
            models: Vec::new(),
            props: None,
            entities: String::new(),
        }
    }

    /// Adds a texture with its own texinfo, returning the texinfo index.
    pub fn texture(
        &mut self,
        name: &str,
        width: i32,
        height: i32,
        s: [f32; 4],
        t: [f32; 4],
        flags: i32,
    ) -> i16 {
        self.name_table.push(BSPTexDataStringTable {
            index: self.names.len() as i32,
        });
        self.names.extend(name.as_bytes());
        self.names.push(0);

        self.tex_datas.push(BSPTexData {
            reflectivity: Vec3::new(0.5, 0.25, 0.125),
            name_string_table_id: self.name_table.len() as i32 - 1,
            width,
            height,
            view_width: width,
            view_height: height,
        });
        self.tex_infos.push(BSPTexInfo {
            texture_vecs: [s, t],
            lightmap_vecs: [[0.0; 4]; 2],
            flags,
            tex_data: self.tex_datas.len() as i32 - 1,
        });
        self.tex_infos.len() as i16 - 1
    }

    /// Points the texture's name at a string table entry that does not exist.
    pub fn break_texture_name(&mut self, tex_data: usize) {
        self.tex_datas[tex_data].name_string_table_id = 99;
    }

    /// Adds a face through `points` in order. Odd edges are stored reversed and walked
    /// through a negative surfedge.
    pub fn face(&mut self, points: &[Vec3], tex_info: i16) -> usize {
        let first_vert = self.verts.len() as u16;
        self.verts.extend_from_slice(points);
        let first_edge = self.surfedges.len() as i32;
        for i in 0..points.len() {
            let a = first_vert + i as u16;
            let b = first_vert + ((i + 1) % points.len()) as u16;
            let edge = self.edges.len() as i32;
            if i % 2 == 0 {
                self.edges.push(BSPEdge { v: [a, b] });
                self.surfedges.push(BSPSurfEdge { index: edge });
            } else {
                self.edges.push(BSPEdge { v: [b, a] });
                self.surfedges.push(BSPSurfEdge { index: -edge });
            }
        }
        self.faces.push(BSPFace {
            first_edge,
            num_edges: points.len() as i16,
            tex_info,
            disp_info: -1,
            ..Default::default()
        });
        self.faces.len() - 1
    }

    /// Points the first `count` surfedges of `face` at edges that do not exist.
    pub fn corrupt_surfedges(&mut self, face: usize, count: usize) {
        let first = self.faces[face].first_edge as usize;
        for surfedge in &mut self.surfedges[first..first + count] {
            surfedge.index = 1_000_000;
        }
    }

    /// Turns `face` into a displacement of `power`. `offset(x, y)` gives the direction and
    /// distance of grid vertex (x, y).
    pub fn displacement(
        &mut self,
        face: usize,
        power: u32,
        start_position: Vec3,
        offset: impl Fn(usize, usize) -> (Vec3, f32),
    ) -> usize {
        let side = (1usize << power) + 1;
        let disp = self.disp_infos.len();
        self.disp_infos.push(BSPDispInfo {
            start_position,
            disp_vert_start: self.disp_verts.len() as i32,
            power,
            map_face: face as u16,
            ..Default::default()
        });
        for y in 0..side {
            for x in 0..side {
                let (vec, dist) = offset(x, y);
                self.disp_verts.push(BSPDispVert {
                    vec,
                    dist,
                    alpha: 0.0,
                });
            }
        }
        self.faces[face].disp_info = disp as i16;
        disp
    }

    /// Clears the face's `disp_info`, leaving only the displacement's `map_face` link.
    pub fn unlink_face_displacement(&mut self, face: usize) {
        self.faces[face].disp_info = -1;
    }

    pub fn model(&mut self, mins: Vec3, maxs: Vec3, first_face: i32, num_faces: i32) {
        for v in [mins, maxs, (mins + maxs) * 0.5] {
            self.models.extend(bytemuck::bytes_of(&v));
        }
        for i in [0, first_face, num_faces] {
            self.models.extend(i.to_le_bytes());
        }
    }

    pub fn static_props(&mut self, names: &[&str], prop_types: &[u16]) {
        self.props = Some((
            names.iter().map(|n| n.to_string()).collect(),
            prop_types.to_vec(),
        ));
    }

    pub fn build(&self) -> Vec<u8> {
        let mut writer = BspWriter::new()
            .lump(LumpType::Entities, self.entities.as_bytes().to_vec())
            .records(LumpType::TexData, &self.tex_datas)
            .records(LumpType::Vertexes, &self.verts)
            .records(LumpType::TexInfo, &self.tex_infos)
            .records(LumpType::Faces, &self.faces)
            .records(LumpType::Edges, &self.edges)
            .records(LumpType::SurfEdges, &self.surfedges)
            .lump(LumpType::Models, self.models.clone())
            .records(LumpType::DispInfo, &self.disp_infos)
            .records(LumpType::DispVerts, &self.disp_verts)
            .lump(LumpType::TexDataStringData, self.names.clone())
            .records(LumpType::TexDataStringTable, &self.name_table);

        if let Some((names, prop_types)) = &self.props {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let lump = static_prop_gamelump(writer.next_offset(), 6, &names, prop_types);
            writer = writer.lump(LumpType::GameLump, lump);
        }
        writer.finish()
    }
}
