pub mod cli;
pub mod commands;
pub mod labels;
pub mod logging;
pub mod render;
