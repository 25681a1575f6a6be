//! These models represent the objects passed around by the agent
//!
//! The agent talks to two very different parties: the HTTP front end, which only ever
//! sends a prompt and receives a final answer, and the language model, which speaks the
//! OpenAI chat completions format. We keep a single internal representation of the
//! conversation and convert to the wire format at the provider boundary.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
pub mod transcript;
