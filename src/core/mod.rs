//! Core engine modules

pub mod bombs;
pub mod cascade;
pub mod deadlock;
pub mod factory;
pub mod grid;
pub mod matches;
pub mod piece;
pub mod rng;
pub mod scoring;
pub mod shuffle;
