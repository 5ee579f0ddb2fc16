pub mod decoder;
pub mod files;
