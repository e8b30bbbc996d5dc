use flagset::flags;
use num_derive::FromPrimitive;

pub const HEADER_LUMPS: usize = 64;

// upper design bounds
pub const MIN_MAP_DISP_POWER: u32 = 2; // Minimum and maximum power a displacement can be.
pub const MAX_MAP_DISP_POWER: u32 = 4;

pub const fn num_disp_power_verts(power: u32) -> usize {
    ((1 << power) + 1) * ((1 << power) + 1)
}
pub const fn num_disp_power_tris(power: u32) -> usize {
    (1 << power) * (1 << power) * 2
}

pub const MAX_MAP_MODELS: usize = 1024;
pub const MAX_MAP_TEXINFO: usize = 12288;
pub const MAX_MAP_TEXDATA: usize = 2048;
pub const MAX_MAP_DISPINFO: usize = 2048;
pub const MAX_MAP_DISP_VERTS: usize =
    MAX_MAP_DISPINFO * ((1 << MAX_MAP_DISP_POWER) + 1) * ((1 << MAX_MAP_DISP_POWER) + 1);
pub const MAX_MAP_VERTS: usize = 65536;
pub const MAX_MAP_FACES: usize = 65536;
pub const MAX_MAP_EDGES: usize = 256000;
pub const MAX_MAP_SURFEDGES: usize = 512000;
pub const MAX_MAP_TEXDATA_STRING_TABLE: usize = 65536;

pub const TEXTURE_NAME_LENGTH: usize = 128;

#[derive(Copy, Clone, FromPrimitive, Debug, PartialEq, Eq)]
pub enum LumpType {
    Entities = 0,
    Planes = 1,
    TexData = 2,
    Vertexes = 3,
    Visibility = 4,
    Nodes = 5,
    TexInfo = 6,
    Faces = 7,
    Lighting = 8,
    Leafs = 10,
    Edges = 12,
    SurfEdges = 13,
    Models = 14,
    WorldLights = 15,
    LeafFaces = 16,
    DispInfo = 26,
    OriginalFaces = 27,
    VertNormals = 30,
    VertNormalIndices = 31,
    DispVerts = 33,
    GameLump = 35,
    LeafWaterData = 36,
    Primitives = 37,
    PrimIndices = 39,
    PakFile = 40,
    Cubemaps = 42,
    TexDataStringData = 43,
    TexDataStringTable = 44,
    Overlays = 45,
    LeafAmbientIndexHdr = 51,
    LeafAmbientIndex = 52,
    LightingHdr = 53,
    WorldLightsHdr = 54,
    LeafAmbientLightingHdr = 55,
    LeafAmbientLighting = 56,
    FacesHdr = 58,
}

flags! {
    /// `texinfo_t::flags`, from bspflags.h
    pub enum SurfaceFlags: i32 {
        Light = 0x1,       // value will hold the light strength
        Sky2d = 0x2,       // don't draw, indicates we should skylight + draw 2d sky but not draw the 3D skybox
        Sky = 0x4,         // don't draw, but add to skybox
        Warp = 0x8,        // turbulent water warp
        Trans = 0x10,
        NoPortal = 0x20,
        Trigger = 0x40,
        NoDraw = 0x80,
        Hint = 0x100,      // make a primary bsp splitter
        Skip = 0x200,      // completely ignore, allowing non-closed brushes
        NoLight = 0x400,
        BumpLight = 0x800,
        NoShadows = 0x1000,
        NoDecals = 0x2000,
        NoChop = 0x4000,
        Hitbox = 0x8000,
    }
}
