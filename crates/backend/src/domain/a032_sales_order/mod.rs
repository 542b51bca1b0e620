pub mod line_repository;
pub mod repository;
pub mod sequence;
