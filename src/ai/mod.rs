pub mod client;
mod prompts;
mod stream;
mod types;

pub use client::CowpilotAI;
pub use types::{ResponseMode, ResponseSettings};
