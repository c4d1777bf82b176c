#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::super::error::*;
    use super::super::openai::*;
    use memchat_core::{CallPurpose, CompletionRequest, PromptMessage};
    use reqwest::StatusCode;

    #[test]
    fn test_request_from_completion_request() {
        let request = CompletionRequest {
            purpose: CallPurpose::ComputeMutations,
            model: "deepseek-v3".to_string(),
            messages: vec![PromptMessage::system("sys"), PromptMessage::user("prompt")],
            enable_thinking: false,
        };

        let body = ChatCompletionRequest::from(&request);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "deepseek-v3",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "prompt"}
                ],
                "stream": false,
                "enable_thinking": false
            })
        );
    }

    #[test]
    fn test_response_first_content() {
        let body = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "deepseek-v3",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "[1, 3]"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_content(), Some("[1, 3]"));
        assert_eq!(response.usage.unwrap().total_tokens, 14);
    }

    #[test]
    fn test_response_without_choices() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(response.first_content(), None);
    }

    #[test]
    fn test_status_error_uses_provider_message() {
        let body = r#"{"error": {"message": "Invalid API-key provided.", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        let err = GatewayError::from_status(StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err.to_string(),
            "Provider returned 401 Unauthorized: Invalid API-key provided."
        );
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let err = GatewayError::from_status(StatusCode::BAD_GATEWAY, "upstream down\n");
        assert!(err.to_string().ends_with("upstream down"));
    }
}
