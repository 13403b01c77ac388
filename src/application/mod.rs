// Application layer - Use cases driving the device and the chart
pub mod chart_view;
pub mod device_api;
pub mod log_importer;
pub mod poller;
pub mod session;
pub mod settings_service;
pub mod snap_back;
#[cfg(test)]
pub mod testing;
pub mod view_controller;
