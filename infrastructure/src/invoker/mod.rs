//! Agent invoker adapters
//!
//! Implementations of the [`AgentInvoker`](council_application::AgentInvoker) port:
//!
//! - [`ResponsesInvoker`] - OpenAI-compatible Responses API (feature `http`)
//! - [`DryRunInvoker`] - deterministic offline answers for demos and tests

mod dry_run;
pub mod protocol;
#[cfg(feature = "http")]
mod responses;

pub use dry_run::DryRunInvoker;
#[cfg(feature = "http")]
pub use responses::ResponsesInvoker;
