pub mod activity;
pub mod app;
pub mod audio;
pub mod backend;
pub mod capture;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod global;
pub mod relay;
pub mod workspace;
