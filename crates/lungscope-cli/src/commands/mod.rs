pub mod config;
pub mod describe;
pub mod health;
pub mod predict;
pub mod time;
