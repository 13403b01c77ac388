// Domain layer - Device data models and chart geometry
pub mod live;
pub mod log;
pub mod settings;
pub mod view;
