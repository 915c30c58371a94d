use news_forecast::generation::{response_text, GeminiClient, GenerationApi, GenerationError, DEFAULT_MODEL};
use news_forecast::retry::{classify, ErrorClass};

#[test]
fn overload_requires_503_and_unavailable() {
    let overloaded = GenerationError::from_response(
        503,
        r#"{"error":{"code":503,"message":"The model is overloaded. Please try again later.","status":"UNAVAILABLE"}}"#,
    );
    assert!(overloaded.is_overload());
    assert_eq!(classify(&overloaded), ErrorClass::Overload);

    let quota = GenerationError::from_response(
        429,
        r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
    );
    assert!(!quota.is_overload());
    assert_eq!(classify(&quota), ErrorClass::Permanent);

    let bare = GenerationError::from_response(503, "Service Unavailable");
    assert!(matches!(bare, GenerationError::Rejected { status: 503, .. }));
    assert_eq!(classify(&GenerationError::Transport("reset".to_string())), ErrorClass::Permanent);
}

#[test]
fn response_text_joins_parts_of_first_candidate() {
    let body = r#"{"candidates":[
        {"content":{"parts":[{"text":"Recommendation: "},{"text":"BUY"}],"role":"model"}},
        {"content":{"parts":[{"text":"ignored"}]}}
    ]}"#;
    assert_eq!(response_text(body).unwrap(), "Recommendation: BUY");
}

#[test]
fn response_without_text_is_malformed() {
    assert!(matches!(
        response_text(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
        Err(GenerationError::MalformedResponse(_))
    ));
    assert!(matches!(response_text("not json"), Err(GenerationError::MalformedResponse(_))));
}

#[test]
fn client_reports_its_model() {
    let client = GeminiClient::new("key".to_string(), DEFAULT_MODEL)
        .unwrap()
        .with_base_url("http://localhost:9");
    assert_eq!(client.model_name(), "gemini-2.5-pro");
}
