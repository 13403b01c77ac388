// Presentation layer - CLI, console output and the terminal chart
pub mod cli;
pub mod commands;
pub mod console;
pub mod terminal_chart;
