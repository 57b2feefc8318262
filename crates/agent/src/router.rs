//! Intent router — classifier-first tool selection.
//!
//! The router asks the model to classify the user's message against a
//! closed instruction set, then (for weather) runs a second call to pull
//! out a bare location string. It is deliberately infallible: any answer
//! outside the closed set, an empty location, or a transport failure all
//! collapse to `RoutingDecision::None` and the turn falls through to
//! plain generation.

use flowchat_core::client::{ChatClient, ChatRequest};
use flowchat_core::message::Message;
use flowchat_core::route::RoutingDecision;
use std::sync::Arc;
use tracing::debug;

const CLASSIFY_PROMPT: &str = "\
You are an intent classifier. Read the user's message and answer with \
exactly one word:\n\
- weather: the user is asking about current weather conditions somewhere\n\
- extract: the user is providing personal information about a person \
(name, age, contact details, address, occupation, hobbies) to be recorded\n\
- none: anything else\n\
Answer with only the single word, nothing else.";

const LOCATION_PROMPT: &str = "\
Extract the location the user is asking about the weather for. Answer \
with only the location name (e.g. a city), nothing else. If there is no \
location, answer with an empty string.";

pub struct IntentRouter {
    client: Arc<dyn ChatClient>,
    model: String,
    temperature: f32,
}

impl IntentRouter {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    /// Classify one user message. Never errors.
    pub async fn route(&self, user_text: &str) -> RoutingDecision {
        let answer = match self.ask(CLASSIFY_PROMPT, user_text).await {
            Ok(answer) => answer.trim().to_lowercase(),
            Err(e) => {
                debug!(error = %e, "Classification call failed, routing to none");
                return RoutingDecision::None;
            }
        };

        let decision = match answer.as_str() {
            "weather" => match self.ask(LOCATION_PROMPT, user_text).await {
                Ok(location) if !location.trim().is_empty() => RoutingDecision::Weather {
                    location: location.trim().to_string(),
                },
                Ok(_) => {
                    debug!("Classifier chose weather but no location was extracted");
                    RoutingDecision::None
                }
                Err(e) => {
                    debug!(error = %e, "Location extraction failed, routing to none");
                    RoutingDecision::None
                }
            },
            "extract" => RoutingDecision::ExtractUser {
                content: user_text.to_string(),
            },
            other => {
                if other != "none" {
                    debug!(answer = %other, "Classifier answered outside the closed set");
                }
                RoutingDecision::None
            }
        };

        debug!(decision = decision.kind(), "Routing decision");
        decision
    }

    async fn ask(
        &self,
        instruction: &str,
        user_text: &str,
    ) -> Result<String, flowchat_core::error::ClientError> {
        let messages = vec![Message::system(instruction), Message::user(user_text)];
        let request =
            ChatRequest::new(&self.model, messages).with_temperature(self.temperature);
        let response = self.client.invoke(request).await?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SequentialMockClient;
    use flowchat_core::error::ClientError;

    fn router_with(client: SequentialMockClient) -> IntentRouter {
        IntentRouter::new(Arc::new(client), "classifier-model", 0.0)
    }

    #[tokio::test]
    async fn weather_intent_extracts_location() {
        let client =
            SequentialMockClient::invokes(vec![Ok("weather".into()), Ok("北京".into())]);
        let decision = router_with(client).route("北京今天天气怎么样？").await;
        assert_eq!(
            decision,
            RoutingDecision::Weather {
                location: "北京".into()
            }
        );
    }

    #[tokio::test]
    async fn classifier_answer_is_trimmed_and_lowercased() {
        let client =
            SequentialMockClient::invokes(vec![Ok("  Weather\n".into()), Ok(" Shanghai ".into())]);
        let decision = router_with(client).route("weather in shanghai?").await;
        assert_eq!(
            decision,
            RoutingDecision::Weather {
                location: "Shanghai".into()
            }
        );
    }

    #[tokio::test]
    async fn extract_intent_carries_text_verbatim() {
        let text = "我叫张三，今年25岁，住在北京市朝阳区";
        let client = SequentialMockClient::invokes(vec![Ok("extract".into())]);
        let decision = router_with(client).route(text).await;
        assert_eq!(
            decision,
            RoutingDecision::ExtractUser {
                content: text.into()
            }
        );
    }

    #[tokio::test]
    async fn none_answer_routes_to_none() {
        let client = SequentialMockClient::invokes(vec![Ok("none".into())]);
        let decision = router_with(client).route("tell me a joke").await;
        assert_eq!(decision, RoutingDecision::None);
    }

    #[tokio::test]
    async fn answer_outside_closed_set_routes_to_none() {
        let client = SequentialMockClient::invokes(vec![Ok(
            "I think this is about the weather in Beijing".into(),
        )]);
        let decision = router_with(client).route("北京天气").await;
        assert_eq!(decision, RoutingDecision::None);
    }

    #[tokio::test]
    async fn empty_location_routes_to_none() {
        let client = SequentialMockClient::invokes(vec![Ok("weather".into()), Ok("  ".into())]);
        let decision = router_with(client).route("will it rain?").await;
        assert_eq!(decision, RoutingDecision::None);
    }

    #[tokio::test]
    async fn transport_failure_routes_to_none() {
        let client = SequentialMockClient::invokes(vec![Err(ClientError::Network(
            "connection refused".into(),
        ))]);
        let decision = router_with(client).route("北京天气").await;
        assert_eq!(decision, RoutingDecision::None);
    }

    #[tokio::test]
    async fn location_call_failure_routes_to_none() {
        let client = SequentialMockClient::invokes(vec![
            Ok("weather".into()),
            Err(ClientError::Timeout("deadline exceeded".into())),
        ]);
        let decision = router_with(client).route("北京天气").await;
        assert_eq!(decision, RoutingDecision::None);
    }
}
