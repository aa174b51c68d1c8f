//! End-to-end execution of single commands.

use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use crate::fixtures::{executor, TestStore};

#[tokio::test]
async fn test_false_is_recorded_with_exit_one() {
    let fixture = TestStore::new();
    let exec = executor(&fixture.store);

    let log = assert_ok!(exec.execute("false", &CancellationToken::new()).await)
        .expect("non-blank command yields a log");

    assert_eq!(log.output.exit_code, 1);
    assert!(log.output.stderr.is_empty());
    assert!(log.output.error.is_none());

    let persisted = fixture.read_file();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, log.id);
    assert_eq!(persisted[0].command.executable, "false");
}

#[tokio::test]
async fn test_clean_success_leaves_no_file() {
    let fixture = TestStore::new();
    let exec = executor(&fixture.store);

    let log = assert_ok!(exec.execute("true", &CancellationToken::new()).await).unwrap();

    assert!(log.is_clean());
    assert!(!fixture.path.exists());
    assert!(assert_ok!(fixture.store.entries().await).is_empty());
}

#[tokio::test]
async fn test_stderr_is_captured_on_failure() {
    let fixture = TestStore::new();
    let exec = executor(&fixture.store);

    let log = assert_ok!(
        exec.execute("ls /nonexistent-termpilot-dir", &CancellationToken::new())
            .await
    )
    .unwrap();

    assert_ne!(log.output.exit_code, 0);
    assert!(!log.output.stderr.is_empty());
    assert_eq!(
        log.command.arguments,
        vec!["/nonexistent-termpilot-dir".to_string()]
    );

    let last = assert_ok!(fixture.store.last().await).unwrap();
    assert_eq!(last.output.stderr, log.output.stderr);
}

#[tokio::test]
async fn test_launch_failure_is_persisted_with_error() {
    let fixture = TestStore::new();
    let exec = executor(&fixture.store);

    let log = assert_ok!(
        exec.execute("/definitely/not/here --flag", &CancellationToken::new())
            .await
    )
    .unwrap();

    assert_eq!(log.output.exit_code, 1);
    assert!(log.output.error.is_some());

    let persisted = fixture.read_file();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].output.error, log.output.error);
}

#[tokio::test]
async fn test_blank_input_does_nothing() {
    let fixture = TestStore::new();
    let exec = executor(&fixture.store);

    assert!(assert_ok!(exec.execute("   \t ", &CancellationToken::new()).await).is_none());
    assert!(!fixture.path.exists());
}
