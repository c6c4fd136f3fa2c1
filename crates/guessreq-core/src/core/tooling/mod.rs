pub mod errors;
pub mod outcome;
