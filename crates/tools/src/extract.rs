//! Structured user-info extraction tool.
//!
//! Runs one nested model call with a fixed JSON-only instruction prompt,
//! carves the JSON span out of whatever the model wrapped it in (a code
//! fence, chatty prose), and validates it strictly into `ExtractedUser`.
//! A missing optional field is fine; a present-but-malformed field fails
//! the whole extraction — no partial object is ever surfaced.

use async_trait::async_trait;
use flowchat_core::client::{ChatClient, ChatRequest};
use flowchat_core::error::ToolError;
use flowchat_core::event::{ToolName, ToolPayload};
use flowchat_core::json_span;
use flowchat_core::message::Message;
use flowchat_core::record::ExtractedUser;
use flowchat_core::tool::Tool;
use std::sync::Arc;
use tracing::debug;

const EXTRACTION_PROMPT: &str = "\
You are a structured data extraction assistant. Extract the person's \
information from the text below and respond with ONLY a JSON object, no \
explanation and no markdown fence. Fields: name (string, required), age \
(number), email (string), phone (string), address (object with city, \
district, street), occupation (string), hobbies (array of strings). Omit \
any field you cannot find in the text. Do not guess or invent values.";

pub struct ExtractUserTool {
    client: Arc<dyn ChatClient>,
    model: String,
    temperature: f32,
}

impl ExtractUserTool {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: 0.0,
        }
    }

    /// Extract a person record from free-form text.
    pub async fn extract(&self, freeform_text: &str) -> Result<ExtractedUser, ToolError> {
        let messages = vec![
            Message::system(EXTRACTION_PROMPT),
            Message::user(freeform_text),
        ];
        let request =
            ChatRequest::new(&self.model, messages).with_temperature(self.temperature);

        let response = self
            .client
            .invoke(request)
            .await
            .map_err(|e| ToolError::Transient(format!("extraction call failed: {e}")))?;

        let content = response.message.content;
        debug!(bytes = content.len(), "Extraction response received");

        let span = json_span::extract(&content)
            .ok_or_else(|| ToolError::SchemaInvalid("no JSON object in response".into()))?;

        let user: ExtractedUser = serde_json::from_str(span)
            .map_err(|e| ToolError::SchemaInvalid(e.to_string()))?;
        Ok(user)
    }
}

#[async_trait]
impl Tool for ExtractUserTool {
    fn name(&self) -> ToolName {
        ToolName::ExtractUser
    }

    fn description(&self) -> &str {
        "Extract structured personal information (name, age, contact details, \
         address, occupation, hobbies) from free-form text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The free-form text to extract a person record from"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolPayload, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;

        let user = self.extract(text).await?;
        Ok(ToolPayload::User(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowchat_core::client::ChatResponse;
    use flowchat_core::error::ClientError;
    use std::sync::Mutex;

    /// A client that replays scripted responses in order.
    struct ScriptedClient {
        responses: Mutex<Vec<Result<String, ClientError>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, ClientError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn invoke(&self, _request: ChatRequest) -> Result<ChatResponse, ClientError> {
            let mut responses = self.responses.lock().unwrap();
            let next = responses.remove(0);
            next.map(|content| ChatResponse {
                message: Message::assistant(content),
                model: "scripted".into(),
            })
        }
    }

    fn tool_with(responses: Vec<Result<String, ClientError>>) -> ExtractUserTool {
        ExtractUserTool::new(Arc::new(ScriptedClient::new(responses)), "test-model")
    }

    #[tokio::test]
    async fn extracts_from_bare_json() {
        let tool = tool_with(vec![Ok(
            r#"{"name":"张三","age":25,"address":{"city":"北京"}}"#.into(),
        )]);
        let user = tool.extract("我叫张三，今年25岁，住在北京").await.unwrap();
        assert_eq!(user.name, "张三");
        assert_eq!(user.age, Some(25));
        assert_eq!(
            user.address.unwrap().city.as_deref(),
            Some("北京")
        );
    }

    #[tokio::test]
    async fn extracts_full_chinese_record() {
        let tool = tool_with(vec![Ok(r#"{
            "name": "张三",
            "age": 25,
            "email": "zhangsan@example.com",
            "phone": "13800138000",
            "address": {"city": "北京", "district": "朝阳区", "street": "建国路88号"}
        }"#
        .into())]);
        let user = tool
            .extract("我叫张三，今年25岁，住在北京市朝阳区建国路88号，邮箱zhangsan@example.com，手机13800138000")
            .await
            .unwrap();

        assert_eq!(user.name, "张三");
        assert_eq!(user.age, Some(25));
        assert_eq!(user.email.as_deref(), Some("zhangsan@example.com"));
        assert_eq!(user.phone.as_deref(), Some("13800138000"));
        let address = user.address.unwrap();
        assert_eq!(address.city.as_deref(), Some("北京"));
        assert_eq!(address.district.as_deref(), Some("朝阳区"));
        assert_eq!(address.street.as_deref(), Some("建国路88号"));
        // Not stated in the text, so not in the record.
        assert!(user.occupation.is_none());
        assert!(user.hobbies.is_empty());
    }

    #[tokio::test]
    async fn extracts_from_fenced_json() {
        let tool = tool_with(vec![Ok(
            "Here you go:\n```json\n{\"name\":\"李四\",\"hobbies\":[\"reading\",\"hiking\"]}\n```"
                .into(),
        )]);
        let user = tool.extract("my text").await.unwrap();
        assert_eq!(user.name, "李四");
        assert_eq!(user.hobbies, vec!["reading", "hiking"]);
    }

    #[tokio::test]
    async fn extracts_from_chatty_response() {
        let tool = tool_with(vec![Ok(
            r#"Sure! Based on the text: {"name":"王五","occupation":"engineer"} — anything else?"#
                .into(),
        )]);
        let user = tool.extract("text").await.unwrap();
        assert_eq!(user.occupation.as_deref(), Some("engineer"));
    }

    #[tokio::test]
    async fn no_json_span_is_schema_invalid() {
        let tool = tool_with(vec![Ok("I could not find any person here.".into())]);
        let err = tool.extract("text").await.unwrap_err();
        assert!(matches!(err, ToolError::SchemaInvalid(_)));
        assert!(err.to_string().starts_with("extraction failed"));
    }

    #[tokio::test]
    async fn malformed_present_field_is_schema_invalid() {
        let tool = tool_with(vec![Ok(r#"{"name":"张三","age":"twenty-five"}"#.into())]);
        let err = tool.extract("text").await.unwrap_err();
        assert!(matches!(err, ToolError::SchemaInvalid(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_transient() {
        let tool = tool_with(vec![Err(ClientError::Network("connection refused".into()))]);
        let err = tool.extract("text").await.unwrap_err();
        assert!(matches!(err, ToolError::Transient(_)));
    }

    #[tokio::test]
    async fn execute_wraps_into_payload() {
        let tool = tool_with(vec![Ok(r#"{"name":"张三"}"#.into())]);
        let payload = tool
            .execute(serde_json::json!({"text": "我叫张三"}))
            .await
            .unwrap();
        match payload {
            ToolPayload::User(user) => assert_eq!(user.name, "张三"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn tool_definition_uses_wire_name() {
        let tool = tool_with(vec![]);
        let def = tool.to_definition();
        assert_eq!(def.name, "extractUser");
        assert_eq!(def.parameters["required"], serde_json::json!(["text"]));
    }
}
