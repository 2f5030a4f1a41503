pub mod camera;
pub mod grab;
pub mod settings;
