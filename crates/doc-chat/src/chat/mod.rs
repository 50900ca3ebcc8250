//! Conversational layer: session history and the retrieval chat pipeline

mod pipeline;
mod session;

pub use pipeline::{ChatPipeline, ChatSettings};
pub use session::SessionStore;
