pub mod interrupt;
pub mod session;
pub mod types;
pub mod vocabulary;

pub use interrupt::Interrupt;
pub use session::{CommandRunner, Operator, SessionEngine, SessionError, TranscriptSink};
pub use types::*;
pub use vocabulary::{classify, tool_schemas, ClassifyError};
