mod common;

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;

use common::{build_orchestrator, post_json, send, source, FakeApi};
use listener::build_router;
use orchestrator::Realm;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn line_with(&self, needle: &str) -> Option<String> {
        let bytes = self.0.lock().expect("buffer").clone();
        String::from_utf8(bytes)
            .expect("utf8")
            .lines()
            .find(|line| line.contains(needle))
            .map(str::to_string)
    }
}

// Current-thread runtime: the spawned poll task runs on this thread and so
// reports to the scoped subscriber.
#[tokio::test]
async fn detached_poll_events_carry_the_caller() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let api = Arc::new(FakeApi::new(vec![source("acme/api")]));
    let (orchestrator, _) = build_orchestrator(api, &[(Realm::Webhook, "N1", "key")]).await;
    let router = build_router(orchestrator, None);

    let (response, _) = send(
        &router,
        post_json("/webhook", r#"{"triggeredByUserId": "N1", "text": "go"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut notice = None;
    for _ in 0..100 {
        notice = captured.line_with("webhook task timed out");
        if notice.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let notice = notice.expect("timed out notice logged");
    assert!(notice.contains("webhook_poll"), "{notice}");
    assert!(notice.contains("user_id=N1"), "{notice}");
    assert!(notice.contains("realm=webhook"), "{notice}");
    assert!(notice.contains("session_id=s-42"), "{notice}");
}
