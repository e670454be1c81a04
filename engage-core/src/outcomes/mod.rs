//! Outcome events and their backend encodings

mod event;
mod params;

pub use event::{EncodingMode, OutcomeEvent};
pub use params::{OutcomeEventParams, OutcomeSource, OutcomeSourceBody};
