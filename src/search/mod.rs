//! Query side: the wire request/response shape, the in-process executor, the
//! backends it can run against, and the engine/aggregator built on top.

pub mod backend;
pub mod engine;
pub(crate) mod executor;
pub mod filter;
pub mod remote;
pub mod request;
pub mod stats;

pub use backend::{EmbeddedBackend, SearchBackend};
pub use engine::{EngineSettings, QueryEngine};
pub use remote::HttpBackend;
pub use stats::Aggregator;
