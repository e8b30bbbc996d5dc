use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    bsp::{entities::Entity, gamelump::StaticProp},
    error::{BspError, Result},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityTableRow {
    /// Row index as text.
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Entity")]
    pub entity: Entity,
}

/// Every entity of a map as named rows, exported as json.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTable {
    rows: Vec<EntityTableRow>,
}

impl EntityTable {
    pub fn from_entities(entities: &[Entity]) -> Self {
        let mut table = Self::default();
        for entity in entities {
            table.push(entity.clone());
        }
        table
    }

    pub fn push(&mut self, entity: Entity) {
        self.rows.push(EntityTableRow {
            name: self.rows.len().to_string(),
            entity,
        });
    }

    /// Appends static props as `prop_static` rows.
    pub fn push_static_props(&mut self, props: &[StaticProp]) {
        for prop in props {
            let mut entity = Entity {
                class: "prop_static".into(),
                origin: prop.origin,
                rotation: prop.angles,
                model: prop.model.clone(),
                ..Default::default()
            };
            entity
                .properties
                .insert("skin".into(), prop.skin.to_string());
            entity
                .properties
                .insert("solid".into(), prop.solid.to_string());
            self.push(entity);
        }
    }

    pub fn rows(&self) -> &[EntityTableRow] {
        &self.rows
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.rows.iter().find(|r| r.name == name).map(|r| &r.entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.rows.iter().map(|r| &r.entity)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| BspError::Io {
            path: path.to_owned(),
            source,
        })?;
        log::info!("Wrote {} entities to {}", self.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod entity_table_tests {
    use glam::vec3;

    use crate::bsp::entities::parse_entities;

    use super::*;

    #[test]
    fn rows_are_named_by_index() {
        let entities =
            parse_entities("{ \"classname\" \"worldspawn\" } { \"classname\" \"light\" }");
        let table = EntityTable::from_entities(&entities);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].name, "1");
        assert_eq!(table.get("1").unwrap().class, "light");
        assert!(table.get("2").is_none());
    }

    #[test]
    fn static_props_become_rows() {
        let mut table = EntityTable::default();
        table.push_static_props(&[StaticProp {
            model: "models/props_c17/bench01a.mdl".into(),
            origin: vec3(1.0, 2.0, 3.0),
            angles: vec3(0.0, 90.0, 0.0),
            skin: 2,
            solid: 6,
        }]);
        let prop = table.get("0").unwrap();
        assert_eq!(prop.class, "prop_static");
        assert!(prop.is_studio_model());
        assert_eq!(prop.rotation, vec3(0.0, 90.0, 0.0));
        assert_eq!(prop.properties["skin"], "2");
    }

    #[test]
    fn exports_rows_as_json() {
        let entities = parse_entities("{ \"classname\" \"info_player_start\" \"origin\" \"0 0 64\" }");
        let table = EntityTable::from_entities(&entities);
        let json: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["Name"], "0");
        assert_eq!(json[0]["Entity"]["class"], "info_player_start");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.json");
        table.write_json(&path).unwrap();
        let back: EntityTable =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, table);
    }
}
