pub mod athle;
pub mod config;
pub mod distance;
pub mod duration;
pub mod export;
pub mod klikego;
pub mod pipeline;
pub mod ranking;
pub mod transport;
pub mod types;
mod utils;

pub use config::{RankingConfig, RankingRequest};
pub use pipeline::{Pipeline, PipelineError, RankingOutcome};
pub use transport::{HttpClient, Transport, TransportError};
