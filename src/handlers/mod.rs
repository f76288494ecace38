// src/handlers/mod.rs

pub mod documents;
pub mod leaderboard;
pub mod questions;
pub mod stats;
