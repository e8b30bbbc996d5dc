pub mod consts;
pub mod displacement;
pub mod edges;
pub mod entities;
pub mod face;
pub mod gamelump;
pub mod header;
pub mod lump;
pub mod model;
pub mod pak;
pub mod textures;

pub use consts::LumpType;
pub use lump::Lump;

// https://developer.valvesoftware.com/wiki/BSP_(Source)
//
// https://github.com/ValveSoftware/source-sdk-2013/blob/master/mp/src/public/bspfile.h
//
// The BSP file contains the vast majority of the information needed by the Source engine to render and play a map.
// This includes the geometry of all the polygons in the level; references to the names and orientation of the textures
// to be drawn on those polygons; the data used to simulate the physical behaviour of the player and other items during
// the game; the location and properties of all brush-based, model (prop) based, and non-visible (logical) entities in
// the map; and the BSP tree and visibility table used to locate the player location in the map geometry and to render
// the visible map as efficiently as possible. Optionally, the map file can also contain any custom textures and models
// used on the level, embedded inside the map's Pakfile lump.
//
// The data in the BSP file can be stored in little-endian for PC or in big-endian for consoles. Only the PC layout is read here.

use std::{ops::Range, path::Path};

use flagset::FlagSet;
use glam::{Vec2, Vec3};

use crate::error::{BspError, Result};

use self::{
    consts::{SurfaceFlags, MAX_MAP_VERTS},
    displacement::{BSPDispInfo, BSPDispVert},
    edges::{BSPEdge, BSPSurfEdge},
    entities::{parse_entities, Entity},
    face::BSPFace,
    gamelump::{load_static_props, StaticProp},
    header::BSPHeader,
    model::BSPModel,
    pak::BSPPak,
    textures::{BSPTexData, BSPTexDataStringTable, BSPTexInfo},
};

impl Lump for Vec3 {
    fn max() -> usize {
        MAX_MAP_VERTS
    }
    fn lump_type() -> LumpType {
        LumpType::Vertexes
    }
}

/// A face corner in raw Source units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FaceVertex {
    pub position: Vec3,
    /// Texture coordinate, already divided by the texture size.
    pub uv: Vec2,
}

/// One face of the map as a run of [`FaceVertex`]es in clockwise order.
#[derive(Clone, Debug, PartialEq)]
pub struct FacePolygon {
    pub first_vertex: usize,
    pub num_vertices: usize,
    /// Source texture name for material lookup, empty if the face has none.
    pub texture_name: String,
    pub tex_info: Option<usize>,
    pub tex_data: Option<usize>,
    pub flags: FlagSet<SurfaceFlags>,
    /// Set when the face is the base of a displacement.
    pub disp_info: Option<usize>,
    /// Index into the face lump.
    pub source_face: usize,
}

impl FacePolygon {
    pub fn vertex_range(&self) -> Range<usize> {
        self.first_vertex..self.first_vertex + self.num_vertices
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BspTexture {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub reflectivity: Vec3,
}

/// A parsed map, holding the geometry and metadata an importer needs.
#[derive(Debug, Default)]
pub struct BspFile {
    header: BSPHeader,
    vertices: Vec<FaceVertex>,
    polygons: Vec<FacePolygon>,
    textures: Vec<BspTexture>,
    tex_infos: Box<[BSPTexInfo]>,
    disp_infos: Box<[BSPDispInfo]>,
    disp_verts: Box<[BSPDispVert]>,
    models: Box<[BSPModel]>,
    entities: Vec<Entity>,
    static_props: Vec<StaticProp>,
    pak: BSPPak,
}

impl BspFile {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| {
            log::error!("BSP read failed: {}", path.display());
            BspError::Io {
                path: path.to_owned(),
                source,
            }
        })?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = BSPHeader::parse(data)?;

        let verts = header.get_lump::<Vec3>(data)?;
        let edges = header.get_lump::<BSPEdge>(data)?;
        let surfedges = header.get_lump::<BSPSurfEdge>(data)?;
        let faces = header.get_lump::<BSPFace>(data)?;
        let tex_infos = header.get_lump::<BSPTexInfo>(data)?;
        let tex_datas = header.get_lump::<BSPTexData>(data)?;
        let string_table = header.get_lump::<BSPTexDataStringTable>(data)?;
        let string_data = header
            .lump_bytes(LumpType::TexDataStringData, data)
            .inspect_err(|e| log::error!("Failed reading {e}"))?;

        log::info!(
            "VBSP lumps OK. Verts={} Edges={} SurfEdges={} Faces={} TexInfo={} TexData={} StrTab={}",
            verts.len(),
            edges.len(),
            surfedges.len(),
            faces.len(),
            tex_infos.len(),
            tex_datas.len(),
            string_table.len()
        );

        let textures = tex_datas
            .iter()
            .map(|data| BspTexture {
                name: usize::try_from(data.name_string_table_id)
                    .ok()
                    .and_then(|i| string_table.get(i))
                    .and_then(|s| s.get_filename(string_data))
                    .unwrap_or_default(),
                width: data.width,
                height: data.height,
                reflectivity: data.reflectivity,
            })
            .collect();

        let mut file = Self {
            header,
            textures,
            tex_infos,
            ..Default::default()
        };
        file.build_polygons(&faces, &verts, &edges, &surfedges);

        file.disp_infos = header.get_optional_lump(data);
        file.disp_verts = header.get_optional_lump(data);
        file.models = header.get_optional_lump(data);

        file.entities = match header.lump_bytes(LumpType::Entities, data) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                parse_entities(text.trim_end_matches('\0'))
            }
            Err(e) => {
                log::warn!("{e}, ignoring entities");
                Vec::new()
            }
        };

        file.static_props = header
            .lump_bytes(LumpType::GameLump, data)
            .and_then(|lump| load_static_props(lump, data))
            .unwrap_or_else(|e| {
                log::warn!("{e}, ignoring static props");
                Vec::new()
            });

        file.pak = match header.lump_bytes(LumpType::PakFile, data) {
            Ok(bytes) => BSPPak::read(bytes),
            Err(e) => {
                log::warn!("{e}, ignoring pak file");
                BSPPak::default()
            }
        };

        log::info!(
            "BSP parsed: OutVerts={} OutFaces={} DispInfos={} DispVerts={} Entities={} StaticProps={}",
            file.vertices.len(),
            file.polygons.len(),
            file.disp_infos.len(),
            file.disp_verts.len(),
            file.entities.len(),
            file.static_props.len()
        );

        Ok(file)
    }

    fn build_polygons(
        &mut self,
        faces: &[BSPFace],
        verts: &[Vec3],
        edges: &[BSPEdge],
        surfedges: &[BSPSurfEdge],
    ) {
        let mut dropped = 0;
        for (i_face, face) in faces.iter().enumerate() {
            if face.num_edges < 3 {
                continue;
            }
            let indices = face.get_verts(edges, surfedges, verts.len());
            if indices.len() < 3 {
                dropped += 1;
                continue;
            }

            let tex_info = face.tex_info();
            let first_vertex = self.vertices.len();
            for v in indices {
                let position = verts[v];
                let uv = self.texture_uv(position, tex_info);
                self.vertices.push(FaceVertex { position, uv });
            }

            let tex_info = tex_info.filter(|&t| t < self.tex_infos.len());
            let texture_name = self.texture_name(tex_info).to_owned();
            let info = tex_info.map(|t| self.tex_infos[t]);
            let tex_data = info
                .and_then(|i| i.tex_data())
                .filter(|&d| d < self.textures.len());

            self.polygons.push(FacePolygon {
                first_vertex,
                num_vertices: self.vertices.len() - first_vertex,
                texture_name,
                tex_info,
                tex_data,
                flags: info.map(|i| i.surface_flags()).unwrap_or_default(),
                disp_info: face.disp_info(),
                source_face: i_face,
            });
        }
        if dropped > 0 {
            log::warn!("Dropped {dropped} faces with fewer than 3 valid vertices");
        }
    }

    /// Texture coordinate of `position` on a face using `tex_info`, zero if the face has no texture.
    pub fn texture_uv(&self, position: Vec3, tex_info: Option<usize>) -> Vec2 {
        let Some(info) = tex_info.and_then(|t| self.tex_infos.get(t)) else {
            return Vec2::ZERO;
        };
        let (mut u, mut v) = info.project(position);
        if let Some(tex) = info.tex_data().and_then(|d| self.textures.get(d)) {
            u /= tex.width.max(1) as f32;
            v /= tex.height.max(1) as f32;
        }
        Vec2::new(u, v)
    }

    /// Name of the texture behind `tex_info`, empty if any link in the chain is broken.
    pub fn texture_name(&self, tex_info: Option<usize>) -> &str {
        tex_info
            .and_then(|t| self.tex_infos.get(t))
            .and_then(BSPTexInfo::tex_data)
            .and_then(|d| self.textures.get(d))
            .map_or("", |t| t.name.as_str())
    }

    pub fn polygon_vertices(&self, polygon: &FacePolygon) -> &[FaceVertex] {
        &self.vertices[polygon.vertex_range()]
    }

    /// Polygon built from face `source_face` of the face lump, if it survived.
    pub fn polygon_for_face(&self, source_face: usize) -> Option<&FacePolygon> {
        self.polygons
            .binary_search_by_key(&source_face, |p| p.source_face)
            .ok()
            .map(|i| &self.polygons[i])
    }

    pub fn header(&self) -> &BSPHeader {
        &self.header
    }

    pub fn vertices(&self) -> &[FaceVertex] {
        &self.vertices
    }

    pub fn polygons(&self) -> &[FacePolygon] {
        &self.polygons
    }

    pub fn textures(&self) -> &[BspTexture] {
        &self.textures
    }

    pub fn tex_infos(&self) -> &[BSPTexInfo] {
        &self.tex_infos
    }

    pub fn disp_infos(&self) -> &[BSPDispInfo] {
        &self.disp_infos
    }

    pub fn disp_verts(&self) -> &[BSPDispVert] {
        &self.disp_verts
    }

    pub fn models(&self) -> &[BSPModel] {
        &self.models
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn static_props(&self) -> &[StaticProp] {
        &self.static_props
    }

    pub fn pak(&self) -> &BSPPak {
        &self.pak
    }
}
