pub mod binaries;
pub mod bsp;
pub mod entity_table;
pub mod error;
pub mod import;
pub mod materials;
pub mod meshes;
pub mod prelude;
pub mod settings;

#[cfg(test)]
mod test_util;
