// tests/queue_dispatch.rs

//! Handler registry validation and the fake broker client.

use std::error::Error;
use std::sync::{Arc, Mutex};

use procherd::errors::ProcherdError;
use procherd::queue::{HandlerRegistry, JobHandler, JobStatus, Priority, QueueClient};
use procherd_test_utils::fake_broker::FakeBroker;
use procherd_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn echo_handler() -> JobHandler {
    Box::new(|payload: &[u8]| Ok(payload.to_vec()))
}

#[test]
fn registering_nothing_is_rejected() {
    init_tracing();
    let mut registry = HandlerRegistry::new();

    let err = registry.register_handlers(vec![]).unwrap_err();
    assert!(matches!(err, ProcherdError::InvalidArgument(_)));
}

#[test]
fn an_empty_job_server_list_is_rejected() {
    init_tracing();
    let mut registry = HandlerRegistry::new();

    let err = registry.set_job_servers(vec![]).unwrap_err();
    assert!(matches!(err, ProcherdError::InvalidArgument(_)));
}

#[test]
fn readiness_needs_handlers_and_servers() -> TestResult {
    init_tracing();
    let mut registry = HandlerRegistry::new();

    assert!(registry.ensure_ready().is_err());

    registry.register_handlers(vec![("resize".to_string(), echo_handler())])?;
    assert!(registry.ensure_ready().is_err());

    registry.set_job_servers(vec!["127.0.0.1:4730".to_string()])?;
    registry.ensure_ready()?;

    assert_eq!(registry.handler_names().collect::<Vec<_>>(), vec!["resize"]);
    assert_eq!(
        registry.job_servers(),
        vec!["127.0.0.1:4730".to_string()].as_slice()
    );
    Ok(())
}

#[test]
fn dispatch_routes_to_the_named_handler() -> TestResult {
    init_tracing();
    let mut registry = HandlerRegistry::new();
    registry.register_handlers(vec![
        ("upper".to_string(), Box::new(|payload: &[u8]| {
            Ok(payload.to_ascii_uppercase())
        }) as JobHandler),
        ("echo".to_string(), echo_handler()),
    ])?;

    assert_eq!(registry.dispatch("upper", b"hi")?, b"HI".to_vec());
    assert_eq!(registry.dispatch("echo", b"hi")?, b"hi".to_vec());

    let err = registry.dispatch("missing", b"hi").unwrap_err();
    assert!(matches!(err, ProcherdError::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn submissions_carry_their_priority() -> TestResult {
    init_tracing();
    let submitted = Arc::new(Mutex::new(Vec::new()));
    let mut broker = FakeBroker::new(Arc::clone(&submitted));

    broker.submit("resize", b"img-1", Priority::Normal).await?;
    broker.submit("resize", b"img-2", Priority::VeryHigh).await?;
    let handle = broker.submit_async("mail", b"msg", Priority::High).await?;
    assert!(handle.0.contains("mail"));

    let seen = submitted.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            ("resize".to_string(), Priority::Normal),
            ("resize".to_string(), Priority::VeryHigh),
            ("mail".to_string(), Priority::High),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn job_status_reports_through_the_narrow_interface() -> TestResult {
    init_tracing();
    let submitted = Arc::new(Mutex::new(Vec::new()));
    let mut broker = FakeBroker::new(Arc::clone(&submitted)).with_status(JobStatus {
        known: true,
        running: true,
        numerator: 1,
        denominator: 4,
    });

    let handle = broker.submit_async("resize", b"img", Priority::Normal).await?;
    let status = broker.job_status(&handle).await?;

    assert!(status.is_running());
    assert_eq!(status.numerator, 1);
    assert_eq!(status.denominator, 4);
    Ok(())
}
