pub mod command;
pub mod poll;
pub mod results;
