//! Errors raised while reading maps, settings and material maps.

use std::path::PathBuf;

use thiserror::Error;

use crate::bsp::consts::LumpType;

#[derive(Debug, Error)]
pub enum BspError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file cannot even hold a `dheader_t`.
    #[error("BSP too small for header: {size} bytes, need {needed}")]
    TooSmall { size: usize, needed: usize },

    #[error("wrong BSP magic, expected 'VBSP' got {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("{lump:?} lump out of bounds (ofs={offset} len={len}, file is {file_len} bytes)")]
    LumpOutOfBounds {
        lump: LumpType,
        offset: i32,
        len: i32,
        file_len: usize,
    },

    #[error("unexpected end of data while reading {what}")]
    Truncated { what: &'static str },

    #[error("{0:?} is not a .bsp file")]
    UnsupportedFile(PathBuf),

    #[error("could not read material map {path:?}: {source}")]
    MaterialMapRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed material map {path:?}: {source}")]
    MaterialMapJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings: {0}")]
    Settings(#[from] ini::Error),

    #[error("invalid value {value:?} for setting {key}")]
    InvalidSetting { key: &'static str, value: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BspError>;
