pub mod prelude;
pub mod transform;
pub mod vertex;
