//! Tool execution engine.
//!
//! Dispatch is a lookup from tool name to a registered [`ToolHandler`]:
//! 1. Resolve the descriptor (unknown name → `ToolNotFound`)
//! 2. Validate and coerce arguments against its input schema
//! 3. Run the handler against the backing database
//!
//! Validation failures come back as `isError` results and never reach the
//! database. `ToolNotFound` and `ForbiddenOperation` are returned as errors
//! for the transport to report.

use crate::catalog::builtin_tools;
use crate::error::McpError;
use crate::handlers::ToolHandler;
use crate::tools::ToolRegistry;
use serde_json::{Map, Value};
use sqlbridge_core::arguments::ToolArguments;
use sqlbridge_core::database::Database;
use sqlbridge_core::protocol::{CallToolResult, ToolDescriptor};
use sqlbridge_core::validator::validate_arguments;
use std::collections::HashMap;
use std::sync::Arc;

/// The tool executor runs tools against the database.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: ToolRegistry,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    database: Arc<dyn Database>,
}

impl ToolExecutor {
    /// Create an executor with no tools.
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self {
            registry: ToolRegistry::new(),
            handlers: HashMap::new(),
            database,
        }
    }

    /// Create an executor with the built-in catalog registered.
    pub fn with_builtin_tools(database: Arc<dyn Database>) -> Self {
        let mut executor = Self::new(database);
        for (descriptor, handler) in builtin_tools() {
            executor.register(descriptor, handler);
        }
        executor
    }

    /// Register a tool and its handler.
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(descriptor.name.clone(), handler);
        self.registry.register(descriptor);
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Validate raw arguments and execute the named tool.
    pub async fn call(
        &self,
        name: &str,
        raw_arguments: &Map<String, Value>,
    ) -> Result<CallToolResult, McpError> {
        let descriptor = self.registry.get(name).ok_or_else(|| McpError::ToolNotFound {
            name: name.to_string(),
        })?;

        let args = match validate_arguments(descriptor, raw_arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::debug!(tool = %name, error = %e, "Argument validation failed");
                return Ok(CallToolResult::error(e.to_string()));
            }
        };

        self.execute(name, &args).await
    }

    /// Execute the named tool with already-validated arguments.
    pub async fn execute(
        &self,
        name: &str,
        args: &ToolArguments,
    ) -> Result<CallToolResult, McpError> {
        let handler = self.handlers.get(name).ok_or_else(|| McpError::ToolNotFound {
            name: name.to_string(),
        })?;

        tracing::info!(tool = %name, "Executing tool");
        let result = handler.call(args, self.database.as_ref()).await;

        match &result {
            Ok(r) if r.is_error => tracing::warn!(tool = %name, "Tool returned an error result"),
            Err(e) => tracing::warn!(tool = %name, error = %e, "Tool call rejected"),
            Ok(_) => {}
        }

        result
    }
}
