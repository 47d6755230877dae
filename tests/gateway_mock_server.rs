use std::time::Duration;

use closet::error::{AppError, UpstreamFailure};
use closet::gateway::AiGateway;
use closet::models::{Category, ClothingItem};
use closet::types::ChatMessage;
use futures::StreamExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> AiGateway {
    AiGateway::new("test-key", server.uri(), "test-model", Duration::from_secs(5))
}

fn completion(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

fn closet() -> Vec<ClothingItem> {
    vec![
        ClothingItem {
            category: Category::Bottom,
            subcategory: "jeans".into(),
            color: "blue".into(),
            ..Default::default()
        },
        ClothingItem {
            category: Category::Top,
            subcategory: "t-shirt".into(),
            color: "white".into(),
            ..Default::default()
        },
    ]
}

#[tokio::test]
async fn analyze_sends_image_and_parses_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "test-model"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"description\":\"Slim blue jeans\",\"color\":\"blue\",\"subcategory\":\"jeans\",\"tags\":[\"denim\"],\"material\":\"denim\",\"season\":\"all-season\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let analysis = gateway(&server)
        .analyze_clothing("https://img.example/jeans.jpg", Category::Bottom)
        .await
        .unwrap();

    assert_eq!(analysis.description, "Slim blue jeans");
    assert_eq!(analysis.subcategory, "jeans");
    assert_eq!(analysis.season, vec!["all-season"]);
}

#[tokio::test]
async fn analyze_rate_limit_and_payment_are_distinct() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(402).set_body_string("no credits"))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let first = gateway
        .analyze_clothing("https://img.example/a.jpg", Category::Top)
        .await
        .unwrap_err();
    let second = gateway
        .analyze_clothing("https://img.example/a.jpg", Category::Top)
        .await
        .unwrap_err();

    assert!(matches!(
        first,
        AppError::Upstream(UpstreamFailure::RateLimited)
    ));
    assert!(matches!(
        second,
        AppError::Upstream(UpstreamFailure::PaymentRequired)
    ));
    assert_ne!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn analyze_non_json_envelope_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a red knitted sweater"))
        .mount(&server)
        .await;

    let analysis = gateway(&server)
        .analyze_clothing("https://img.example/s.jpg", Category::Top)
        .await
        .unwrap();

    assert_eq!(analysis.description, "a red knitted sweater");
    assert_eq!(analysis.color, "unknown");
    assert_eq!(analysis.subcategory, "top");
    assert_eq!(analysis.season, vec!["all-season"]);
}

#[tokio::test]
async fn recommend_parses_outfits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"Here are some ideas: {"outfits":[{"name":"Coffee Run","items":["blue jeans","white t-shirt"],"reasoning":"Easy and comfortable"}]}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway(&server)
        .recommend_outfits(None, &closet(), "coffee with friends", "mild")
        .await
        .unwrap();

    assert_eq!(response.outfits.len(), 1);
    assert_eq!(response.outfits[0].name, "Coffee Run");
}

#[tokio::test]
async fn recommend_unparseable_answer_uses_fallback_outfit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Wear something nice!")))
        .mount(&server)
        .await;

    let response = gateway(&server)
        .recommend_outfits(None, &closet(), "work", "cold")
        .await
        .unwrap();

    assert_eq!(response.outfits[0].name, "Casual Everyday Look");
    assert_eq!(response.outfits[0].items, vec!["blue jeans", "white t-shirt"]);
}

#[tokio::test]
async fn recommend_empty_closet_never_calls_gateway() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = gateway(&server)
        .recommend_outfits(None, &[], "party", "warm")
        .await
        .unwrap();

    assert!(response.outfits.is_empty());
    assert_eq!(response.message.as_deref(), Some("No clothes in closet"));
}

#[tokio::test]
async fn chat_stream_requests_streaming_and_relays_body() {
    let server = MockServer::start().await;
    let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Try\"}}]}\n\ndata: [DONE]\n\n";

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway(&server)
        .open_chat_stream("be stylish", &[ChatMessage::user("What should I wear?")])
        .await
        .unwrap();

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(String::from_utf8(body).unwrap(), sse);
}

#[tokio::test]
async fn chat_stream_upstream_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .open_chat_stream("be stylish", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upstream(UpstreamFailure::Status(500))));
}
