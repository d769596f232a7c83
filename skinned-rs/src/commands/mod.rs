//! Command implementations

pub mod skeleton;
