pub mod common;
pub mod config;
pub mod runtime;
pub mod web;
