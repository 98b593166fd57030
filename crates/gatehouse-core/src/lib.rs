//! # gatehouse-core
//!
//! Foundation types for the Gatehouse safety-check gateway:
//!
//! - Outbound frame envelope ([`Frame`], [`FrameMessage`]) and the
//!   [`AgentFramework`] selector
//! - Inbound message wire shape ([`InboundMessage`])
//! - The [`Notifier`] capability for best-effort frame delivery
//! - Pure HTML response normalization ([`html::clean_html`],
//!   [`html::extract_html`])
//! - `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod frames;
pub mod html;
pub mod logging;
pub mod message;
pub mod notify;

pub use frames::{AgentFramework, Frame, FrameMessage, RequestStatus};
pub use message::InboundMessage;
pub use notify::Notifier;
