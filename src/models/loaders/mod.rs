pub mod material_loader;

pub use material_loader::{load_material, load_materials, mime_from_extension};
