//! Tool registry and the built-in knowledge-base tools.

mod registry;
mod stubs;

pub use registry::ToolRegistry;
pub use stubs::{FeesTool, SubjectsTool};

/// Registry with the knowledge-base tools the assistant is configured with.
pub fn knowledge_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FeesTool));
    registry.register(Box::new(SubjectsTool));
    registry
}
