//! PicSort data models

pub mod artifact;
pub mod settings;

pub use artifact::*;
pub use settings::*;
