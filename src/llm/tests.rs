use super::*;

#[test]
fn test_config_defaults() {
    let config = LlmConfig::default();
    assert_eq!(config.model, DEFAULT_LLM_MODEL);
    assert_eq!(config.temperature, 0.2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_rejects_bad_values() {
    assert!(LlmConfig::new("  ").validate().is_err());
    assert!(
        LlmConfig::default()
            .with_temperature(f64::NAN)
            .validate()
            .is_err()
    );
    assert!(LlmConfig::default().with_temperature(3.0).validate().is_err());
}

#[test]
fn test_genai_model_rejects_invalid_config() {
    let err = GenaiModel::new(LlmConfig::new("")).unwrap_err();
    assert!(matches!(err, LlmError::InvalidConfig { .. }));
}

#[test]
fn test_genai_model_id() {
    let model = GenaiModel::new(LlmConfig::new("gpt-4o-mini")).unwrap();
    assert_eq!(model.model_id(), "gpt-4o-mini");
}

#[test]
fn test_completion_request_json_flag() {
    let request = CompletionRequest::new("sys", "user");
    assert!(!request.json_mode);
    assert!(request.json().json_mode);
}

#[tokio::test]
async fn test_mock_serves_script_then_repeats() {
    let model = MockLanguageModel::new(["first", "second"]);

    assert_eq!(model.complete(CompletionRequest::new("s", "a")).await.unwrap(), "first");
    assert_eq!(model.complete(CompletionRequest::new("s", "b")).await.unwrap(), "second");
    assert_eq!(model.complete(CompletionRequest::new("s", "c")).await.unwrap(), "second");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[1].user, "b");
}

#[tokio::test]
async fn test_mock_failure_and_empty_script() {
    let model = MockLanguageModel::new(Vec::<String>::new());
    let err = model.complete(CompletionRequest::new("s", "u")).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse { .. }));

    let model = MockLanguageModel::new(["ok"]).with_model_id("scripted");
    model.fail_with("rate limited");
    let err = model.complete(CompletionRequest::new("s", "u")).await.unwrap_err();
    assert!(err.to_string().contains("rate limited"));
    assert!(err.to_string().contains("scripted"));
}
