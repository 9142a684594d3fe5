#![cfg(unix)]

use std::time::Duration;

use proxwatch_worker::shutdown::{ShutdownKind, ShutdownSignal};

#[tokio::test]
async fn sigterm_is_reported_as_terminate() {
    let signal = ShutdownSignal::install().unwrap();

    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let kind = tokio::time::timeout(Duration::from_secs(5), signal.recv())
        .await
        .expect("SIGTERM should be observed")
        .unwrap();
    assert_eq!(kind, ShutdownKind::Terminate);
}
