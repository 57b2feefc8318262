//! Tool trait — the abstraction over side-effecting capabilities.
//!
//! Tools are what a turn can reach for beyond plain generation: the
//! weather lookup and the structured user extraction. A tool returns its
//! typed payload or a `ToolError`; folding either into a
//! `ToolInvocationResult` is the orchestrator's job, so a tool never
//! decides how its failure is presented.

use crate::error::ToolError;
use crate::event::{ToolName, ToolPayload};
use crate::message::ToolDefinition;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which of the closed set of tools this is.
    fn name(&self) -> ToolName;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with model- or router-supplied arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolPayload, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().wire_name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The orchestrator uses this to:
/// 1. Get tool definitions to bind to a model request
/// 2. Look up and execute a tool when routed to it
pub struct ToolRegistry {
    tools: HashMap<ToolName, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: ToolName) -> Option<&dyn Tool> {
        self.tools.get(&name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for binding to a model request).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: ToolName,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolPayload, ToolError> {
        let tool = self
            .tools
            .get(&name)
            .ok_or_else(|| ToolError::NotFound(format!("tool not registered: {name}")))?;
        debug!(tool = %name, "Dispatching tool execution");
        tool.execute(arguments).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<ToolName> {
        self.tools.keys().copied().collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Address, ExtractedUser};

    /// A canned extraction tool for registry tests.
    struct CannedUserTool;

    #[async_trait]
    impl Tool for CannedUserTool {
        fn name(&self) -> ToolName {
            ToolName::ExtractUser
        }
        fn description(&self) -> &str {
            "Extract a person record from free-form text"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<ToolPayload, ToolError> {
            let _text = arguments["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
            Ok(ToolPayload::User(ExtractedUser {
                name: "李四".into(),
                age: Some(30),
                email: None,
                phone: None,
                address: Some(Address {
                    city: Some("上海".into()),
                    district: None,
                    street: None,
                }),
                occupation: None,
                hobbies: vec![],
            }))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CannedUserTool));
        assert!(registry.get(ToolName::ExtractUser).is_some());
        assert!(registry.get(ToolName::Weather).is_none());
    }

    #[test]
    fn registry_definitions_use_wire_names() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CannedUserTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "extractUser");
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(CannedUserTool));

        let payload = registry
            .execute(
                ToolName::ExtractUser,
                serde_json::json!({"text": "我叫李四"}),
            )
            .await
            .unwrap();
        match payload {
            ToolPayload::User(user) => assert_eq!(user.name, "李四"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute(ToolName::Weather, serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
