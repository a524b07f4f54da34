pub mod openai_compatible;
pub mod traits;

pub use openai_compatible::OpenAICompatiblePlanner;
pub use traits::{ChatMessage, Planner, PlannerReply, ProviderError, ToolCall};
