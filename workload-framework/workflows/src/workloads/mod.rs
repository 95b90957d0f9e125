pub mod driver;
pub mod presets;
