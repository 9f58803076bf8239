pub mod commands;
pub mod polls;
pub mod system;
