pub mod args;
mod catalog;
mod output;
mod registry;
pub mod reviews;
mod schema;

#[cfg(test)]
mod tests;

pub use catalog::{ToolInvocation, ToolName};
pub use output::{ToolCallResult, ToolErrorCode, ToolOutput};
pub use registry::ToolRegistry;
pub use schema::{parameters_schema, validate};
