//! Traits

mod builder;
mod geometry_map;
mod grid;

pub use builder::Builder;
pub use geometry_map::GeometryMap;
pub use grid::Grid;
