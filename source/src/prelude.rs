pub use crate::bsp::{
    consts::{LumpType, SurfaceFlags},
    displacement::{BSPDispInfo, BSPDispVert},
    edges::{BSPEdge, BSPSurfEdge},
    entities::Entity,
    face::BSPFace,
    gamelump::StaticProp,
    header::BSPHeader,
    model::BSPModel,
    pak::{BSPPak, PakEntry},
    textures::{BSPTexData, BSPTexDataStringTable, BSPTexInfo},
    BspFile, BspTexture, FacePolygon, FaceVertex,
};
pub use crate::entity_table::{EntityTable, EntityTableRow};
pub use crate::error::{BspError, Result};
pub use crate::import::{BspImporter, ImportedMap, PropInstance};
pub use crate::materials::MaterialMap;
pub use crate::meshes::{CollisionMesh, MeshSection, StaticMesh};
pub use crate::settings::{ImporterSettings, PropImportMode};
