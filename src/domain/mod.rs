pub mod detection;
pub mod errors;
pub mod heuristics;
pub mod model;
pub mod product;
