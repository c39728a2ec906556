pub mod context_state;
pub mod context_state_stack;

pub use context_state::*;
pub use context_state_stack::{ContextStateStack, DirtyCategories};
