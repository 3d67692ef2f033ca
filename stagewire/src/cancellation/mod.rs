//! Cooperative stop signal for the ingestion loop.

mod token;

pub use token::CancellationToken;
