use super::*;
use crate::clock::SystemClock;
use crate::config::MingoConfig;
use crate::error::{exit_code, MingoError};
use crate::lifecycle::LifecycleState;
use crate::shutdown::{ManualSignals, ShutdownOutcome, ShutdownSignal};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn create_test_config() -> MingoConfig {
    let mut config = MingoConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.shutdown.drain_timeout_secs = 2;
    config
}

fn create_test_context() -> AppContext {
    AppContext::new("mingo", "tester", "testhost", SystemClock::shared())
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn wait_until_running(app: &MingoApp) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !app.lifecycle().is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("application should reach Running");
}

#[tokio::test]
async fn test_app_creation() {
    let app = MingoApp::new(create_test_config(), create_test_context()).unwrap();

    assert_eq!(app.lifecycle().state(), LifecycleState::Starting);
    assert_eq!(app.context().hostname, "testhost");
    assert_eq!(app.store().get_all(0, 10).len(), 0);
}

#[tokio::test]
async fn test_run_serves_until_signalled() {
    let app = Arc::new(MingoApp::new(create_test_config(), create_test_context()).unwrap());
    let (signals, trigger) = ManualSignals::new();

    let runner = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.run_with_signals(signals).await })
    };

    let addr = app
        .server_handle()
        .listening()
        .await
        .expect("listener should bind");
    wait_until_running(&app).await;

    let response = http_get(addr, "/health").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("uptime: "));
    assert!(response.contains("x-request-id: "));

    assert!(trigger.trigger(ShutdownSignal::Terminate));
    let outcome = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("run should return after the drain")
        .unwrap()
        .unwrap();

    assert!(matches!(
        outcome,
        ShutdownOutcome::Drained {
            signal: ShutdownSignal::Terminate,
            ..
        }
    ));
    assert_eq!(app.lifecycle().state(), LifecycleState::Stopping);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_occupied_port_fails_run() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = create_test_config();
    config.server.port = occupied.local_addr().unwrap().port();

    let app = MingoApp::new(config, create_test_context()).unwrap();
    let (signals, _trigger) = ManualSignals::new();

    let err = app.run_with_signals(signals).await.unwrap_err();
    assert!(matches!(err, MingoError::Bind { .. }));
    assert_eq!(err.exit_code(), exit_code::PORT_UNAVAILABLE);
    assert!(app.lifecycle().is_stopping());
}

#[tokio::test]
async fn test_cancelled_run_is_aborted() {
    let app = Arc::new(MingoApp::new(create_test_config(), create_test_context()).unwrap());
    let (signals, _trigger) = ManualSignals::new();

    let runner = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.run_with_signals(signals).await })
    };
    app.server_handle().listening().await.unwrap();

    app.cancellation_token().cancel();
    let outcome = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(outcome, ShutdownOutcome::Aborted);
}

#[test]
fn test_missing_static_dir_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config();
    config.server.static_dir = Some(dir.path().join("absent").to_string_lossy().into_owned());

    let err = MingoApp::new(config, create_test_context()).err().unwrap();
    assert!(matches!(err, MingoError::StaticDirMissing { .. }));
    assert_eq!(err.exit_code(), exit_code::CONFIG);
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_drains_on_sigterm() {
    let _signal = crate::shutdown::tests::OS_SIGNAL_LOCK.lock().await;
    let app = Arc::new(MingoApp::new(create_test_config(), create_test_context()).unwrap());

    let runner = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.run().await })
    };
    let addr = app.server_handle().listening().await.unwrap();
    wait_until_running(&app).await;

    assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("run should return after the drain")
        .unwrap()
        .unwrap();

    assert!(app.lifecycle().is_stopping());
    assert!(TcpStream::connect(addr).await.is_err());
}
