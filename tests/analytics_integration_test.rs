//! Integration tests for the HTTP analytics sink
//!
//! Delivery is fire-and-forget on a spawned task, so each test polls the
//! collector mock until it has been hit.

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Mock};
use serde_json::json;

use fusion_leads::analytics::{AnalyticsEvent, AnalyticsSink, HttpAnalyticsSink};
use fusion_leads::form::{FieldValues, Phase};
use fusion_leads::transport::{HttpTransport, LeadTransport};
use fusion_leads::Funnel;

async fn wait_until_matched(mock: &Mock) {
    for _ in 0..100 {
        if mock.matched_async().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_event_is_posted_as_json() {
    let mut server = mockito::Server::new_async().await;
    let collector = server
        .mock("POST", "/collect")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "category": "lead_generation",
            "action": "submit",
            "label": "trades"
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let sink = HttpAnalyticsSink::new(
        format!("{}/collect", server.url()),
        Duration::from_secs(2),
    )
    .unwrap();

    // Returns before the POST completes
    assert!(sink.track(AnalyticsEvent::lead_submitted("trades")).is_ok());

    wait_until_matched(&collector).await;
    collector.assert_async().await;
}

#[tokio::test]
async fn test_collector_error_does_not_affect_submission() {
    let mut server = mockito::Server::new_async().await;
    let leads = server
        .mock("POST", "/api/leads")
        .with_status(201)
        .expect(1)
        .create_async()
        .await;
    let collector = server
        .mock("POST", "/collect")
        .match_body(Matcher::PartialJson(json!({
            "action": "submit",
            "label": "healthcare"
        })))
        .with_status(500)
        .with_body("collector down")
        .expect(1)
        .create_async()
        .await;

    let transport: Arc<dyn LeadTransport> = Arc::new(
        HttpTransport::new(server.url(), Duration::from_secs(5), "fusion-leads-test").unwrap(),
    );
    let sink = Arc::new(
        HttpAnalyticsSink::new(format!("{}/collect", server.url()), Duration::from_secs(2))
            .unwrap(),
    );
    let controller = Funnel::Healthcare
        .definition()
        .unwrap()
        .controller(transport, sink, "website");

    let values: FieldValues = [
        ("name", "Dr. Jane Smith"),
        ("email", "jane@smithclinic.com"),
        ("practice_name", "Smith Family Clinic"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let outcome = controller.submit(values).await;

    assert!(outcome.is_success());
    assert_eq!(controller.phase(), Phase::Succeeded);
    assert!(controller.state().last_error.is_none());
    leads.assert_async().await;

    wait_until_matched(&collector).await;
    collector.assert_async().await;
    assert_eq!(controller.phase(), Phase::Succeeded);
}
