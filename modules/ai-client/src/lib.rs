pub mod claude;
pub mod error;
pub mod schema;
pub mod util;

pub use claude::{Claude, Thinking, DEFAULT_MAX_TOKENS, MIN_THINKING_BUDGET};
pub use error::{AiError, Result};
pub use schema::StructuredOutput;
