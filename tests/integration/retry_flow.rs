//! Retry layer: existence checks, suggestions and the retry budget.

use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use termpilot::RetryOutcome;

use crate::fixtures::{memory_store, retrying};

#[tokio::test]
async fn test_unknown_command_is_not_retried_or_logged() {
    let store = memory_store();
    let runner = retrying(&store);

    let outcome = assert_ok!(
        runner
            .execute_with_retry("nosuchcmd123", 2, &CancellationToken::new())
            .await
    );

    match &outcome {
        RetryOutcome::NotFound {
            executable,
            suggestions,
        } => {
            assert_eq!(executable, "nosuchcmd123");
            assert!(suggestions.is_empty());
        }
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert_eq!(outcome.report(), vec!["Command not found: nosuchcmd123"]);
    assert!(assert_ok!(store.entries().await).is_empty());
}

#[tokio::test]
async fn test_typo_gets_suggestions() {
    let store = memory_store();
    let runner = retrying(&store);

    let outcome = assert_ok!(
        runner
            .execute_with_retry("gti status", 2, &CancellationToken::new())
            .await
    );

    let RetryOutcome::NotFound { suggestions, .. } = &outcome else {
        panic!("expected NotFound, got {:?}", outcome);
    };
    assert!(suggestions.contains(&"git"));

    let report = outcome.report();
    assert_eq!(report[0], "Command not found: gti");
    assert_eq!(report[1], "Did you mean one of these?");
    assert!(report.contains(&"  git".to_string()));
}

#[tokio::test]
async fn test_failing_exit_is_not_retried() {
    let store = memory_store();
    let runner = retrying(&store);

    let outcome = assert_ok!(
        runner
            .execute_with_retry("false", 2, &CancellationToken::new())
            .await
    );

    let RetryOutcome::Completed(log) = outcome else {
        panic!("expected Completed");
    };
    assert_eq!(log.output.exit_code, 1);
    assert_eq!(assert_ok!(store.entries().await).len(), 1);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let store = memory_store();
    let runner = retrying(&store);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = assert_ok!(runner.execute_with_retry("true", 2, &cancel).await);

    assert!(matches!(outcome, RetryOutcome::Cancelled(None)));
    assert!(assert_ok!(store.entries().await).is_empty());
}

#[tokio::test]
async fn test_blank_line_is_empty() {
    let store = memory_store();
    let runner = retrying(&store);

    let outcome = assert_ok!(
        runner
            .execute_with_retry("  ", 2, &CancellationToken::new())
            .await
    );
    assert!(matches!(outcome, RetryOutcome::Empty));
}
