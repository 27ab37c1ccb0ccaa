//! Public types for the Heimdall API.

mod message;
mod request;
mod response;
mod validation;

pub use message::{Message, Role};
pub use request::ChatRequest;
pub use response::{CHAT_COMPLETION_OBJECT, ChatResponse, Choice, Usage};
pub use validation::MAX_TEMPERATURE;
