//! The entity lump (Lump 0) is plain text in the same keyvalue format as the source
//! `.vmf`, a sequence of `{ "key" "value" ... }` blocks:
//!
//! ```text
//! {
//! "origin" "-1084 -2632 64"
//! "targetname" "train_door"
//! "angles" "0 90 0"
//! "classname" "prop_dynamic"
//! "model" "models/props_trainstation/train_door.mdl"
//! }
//! ```

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// `targetname`
    pub name: String,
    /// `classname`
    pub class: String,
    pub origin: Vec3,
    /// `angles` as (pitch, yaw, roll) in degrees
    pub rotation: Vec3,
    pub model: String,
    /// Every other keyvalue of the block.
    pub properties: BTreeMap<String, String>,
}

impl Entity {
    fn from_keyvalues(mut kv: BTreeMap<String, String>) -> Self {
        let mut take = |key: &str| kv.remove(key).unwrap_or_default();
        let name = take("targetname");
        let class = take("classname");
        let origin = parse_vec3(&take("origin")).unwrap_or_default();
        let rotation = parse_vec3(&take("angles")).unwrap_or_default();
        let model = take("model");
        Self {
            name,
            class,
            origin,
            rotation,
            model,
            properties: kv,
        }
    }

    /// Brush entities reference an inline model of the map (`*1`, `*2`, ...).
    pub fn is_brush(&self) -> bool {
        self.model.starts_with('*')
    }

    pub fn is_studio_model(&self) -> bool {
        self.model.to_ascii_lowercase().ends_with(".mdl")
    }
}

/// Exactly three whitespace separated numbers; unparsable parts read as 0.
pub fn parse_vec3(text: &str) -> Option<Vec3> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }
    let n = |s: &str| s.parse::<f32>().unwrap_or(0.0);
    Some(Vec3::new(n(parts[0]), n(parts[1]), n(parts[2])))
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Reads a quoted string starting just after the opening quote, returning it and the
/// position after the closing quote (or the end of the text if it never closes).
fn read_quoted(text: &str, start: usize) -> (&str, usize) {
    let bytes = text.as_bytes();
    let end = bytes[start..]
        .iter()
        .position(|&b| b == b'"')
        .map_or(bytes.len(), |p| start + p);
    let next = if end < bytes.len() { end + 1 } else { end };
    (&text[start..end], next)
}

pub fn parse_entities(text: &str) -> Vec<Entity> {
    let bytes = text.as_bytes();
    let mut entities = Vec::new();
    let mut kv = BTreeMap::new();
    let mut in_entity = false;
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && is_space(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        if !in_entity {
            if bytes[i] == b'{' {
                in_entity = true;
                kv.clear();
            }
            i += 1;
            continue;
        }

        if bytes[i] == b'}' {
            if !kv.is_empty() {
                entities.push(Entity::from_keyvalues(std::mem::take(&mut kv)));
            }
            in_entity = false;
            i += 1;
            continue;
        }

        if bytes[i] != b'"' {
            i += 1;
            continue;
        }

        let (key, next) = read_quoted(text, i + 1);
        i = next;
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        // a key without a value on the same line is dropped
        if i >= bytes.len() || bytes[i] != b'"' {
            continue;
        }
        let (value, next) = read_quoted(text, i + 1);
        i = next;
        kv.insert(key.to_owned(), value.to_owned());
    }

    if in_entity {
        log::warn!("Entity lump ends inside an unterminated entity, dropping it");
    }

    entities
}
