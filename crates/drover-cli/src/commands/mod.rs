//! CLI command implementations for the Drover broker.

pub mod credential;
pub mod serve;
pub mod token;
