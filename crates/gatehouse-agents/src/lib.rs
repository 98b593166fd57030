//! # gatehouse-agents
//!
//! The pluggable agent-invocation strategy: one capability, two variants.
//!
//! - [`InlineInvoker`]: streams a backend's chunked response, forwarding
//!   trace events as they arrive and accumulating text chunks into the
//!   result.
//! - [`SupervisorInvoker`]: hands the whole job to a second service, which
//!   pushes frames to the client itself, and extracts the final text from
//!   its structured result.
//!
//! Both implement [`AgentInvoker`]; the dispatcher selects one per message.
//! Terminal-frame ownership is encoded in [`InvokeOutcome::client_notified`]
//! so exactly one component notifies the client per request.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod extract;
pub mod inline;
pub mod invoker;
pub mod supervisor;

pub use client::HttpBackendClient;
pub use errors::AgentError;
pub use extract::{ExtractionPath, extract_final_text};
pub use inline::{
    AgentEvent, AgentEventStream, BackendClient, BackendIdentifiers, BackendRequest,
    InlineInvoker,
};
pub use invoker::{AgentInvoker, InvokeOutcome, InvokeRequest};
pub use supervisor::SupervisorInvoker;
