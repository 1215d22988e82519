pub mod geometry;
pub mod moments;
pub mod special;
pub mod stats;
