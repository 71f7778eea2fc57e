//! API Routes

pub mod alerts;
pub mod silences;
