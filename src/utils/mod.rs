//! Utilities that don't belong to the HTTP surface.
pub mod cli;
