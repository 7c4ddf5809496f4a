pub mod analyzer;
pub mod centroid;
pub mod edge;
pub mod file_group;
pub mod persistence;
pub mod radial;
pub mod skip;
pub mod spot;
