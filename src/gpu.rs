pub mod context;
pub mod effects;
pub mod maker;
pub mod provider;
pub mod surface;
pub mod texture;
