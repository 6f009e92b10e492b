//! Duplex - side-by-side text and product comparison

pub mod browse;
pub mod catalog;
pub mod commands;
pub mod compare;
pub mod config;
pub mod editor;
pub mod models;
pub mod notify;
pub mod selection;
pub mod session;
pub mod shell;
