pub mod geometry;
pub mod vector;
