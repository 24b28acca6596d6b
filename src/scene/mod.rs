pub mod document;
pub mod error;
pub mod scene_model;
