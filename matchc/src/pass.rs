//! Translation passes between intermediate languages.

pub mod surface_to_core;
