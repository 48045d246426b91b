pub mod commands;
pub mod gateway;
pub mod handler;
