//! Session influence classification

mod tracker;
mod types;

pub use tracker::{InfluenceManager, InfluenceTracker};
pub use types::{Influence, InfluenceType};
