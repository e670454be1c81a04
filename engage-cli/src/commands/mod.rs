pub mod outcome;
pub mod replay;
