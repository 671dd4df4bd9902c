pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod studio;
