//! Qanda LLM - generation clients
//!
//! [`GeminiClient`] talks to the Gemini generative language REST API.
//! [`ScriptedClient`] replays a fixed fragment sequence and is used by tests
//! and offline demos.

pub mod gemini;
pub mod scripted;
pub mod sse;
mod wire;

pub use gemini::GeminiClient;
pub use scripted::{ScriptStep, ScriptedClient};
pub use sse::SseDecoder;
