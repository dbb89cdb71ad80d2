//! The advisor's conversation engine.
//!
//! A user turn runs as an **Ask → Look up → Answer** cycle:
//!
//! 1. **Receive** the user's message into the session's conversation
//! 2. **Ask** the model through the [`ChatGateway`], offering every tool
//! 3. **If a tool is requested**: run it, append the call and its result, ask again
//! 4. **If the model answers in text**: append the answer and return it
//!
//! The [`ToolLoop`] stops at the first text answer, on the first error, or
//! after `max_rounds` gateway calls. [`ChatSession`] serializes turns and
//! turns failures into apologies; [`Evaluator`] grades answers offline.

pub mod eval;
pub mod gateway;
pub mod loop_runner;
pub mod progress;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use eval::{EvalCase, EvalRecord, Evaluator, Judgement, Relevance};
pub use gateway::ChatGateway;
pub use loop_runner::{DEFAULT_MAX_ROUNDS, ToolLoop};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSender};
pub use session::{ChatSession, Reply};
