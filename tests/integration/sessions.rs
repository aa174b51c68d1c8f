//! Session lifecycle driven through the `session` command surface.

use termpilot::commands::{run_session_command, SessionCommand};
use termpilot::session::ProcessState;
use termpilot::{Error, Layout, Multiplexer, SessionId};

fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

async fn run(mux: &Multiplexer, line: &str) -> termpilot::Result<String> {
    let command = SessionCommand::parse(&words(line))?;
    run_session_command(mux, command, "sh").await
}

#[tokio::test]
async fn test_create_switch_close_scenario() {
    let mux = Multiplexer::new();

    assert_eq!(run(&mux, "create a").await.unwrap(), "Created session 1 (a)");
    assert_eq!(run(&mux, "create b").await.unwrap(), "Created session 2 (b)");
    assert_eq!(mux.get_active_session().await.unwrap().id, SessionId(1));

    assert_eq!(run(&mux, "switch 2").await.unwrap(), "Switched to session 2");
    assert_eq!(mux.get_active_session().await.unwrap().id, SessionId(2));

    assert_eq!(run(&mux, "close 2").await.unwrap(), "Closed session 2");
    assert_eq!(mux.get_active_session().await.unwrap().id, SessionId(1));

    run(&mux, "close 1").await.unwrap();
    assert!(matches!(
        mux.get_active_session().await,
        Err(Error::NoActiveSession)
    ));

    assert_eq!(run(&mux, "create c").await.unwrap(), "Created session 3 (c)");
}

#[tokio::test]
async fn test_listing_shows_state_and_active_marker() {
    let mux = Multiplexer::new();
    run(&mux, "create editor").await.unwrap();
    run(&mux, "create logs tail -f /dev/null").await.unwrap();

    let listing = run(&mux, "list").await.unwrap();
    assert_eq!(
        listing,
        "Available sessions:\n  1: editor [not started] (active)\n  2: logs [not started]"
    );
}

#[tokio::test]
async fn test_start_runs_process_and_close_kills_it() {
    let mux = Multiplexer::new();
    run(&mux, "create sleeper sleep 30").await.unwrap();

    let started = run(&mux, "start 1").await.unwrap();
    assert!(started.starts_with("Started session 1: running (pid "));

    let info = mux.get_active_session().await.unwrap();
    assert!(matches!(info.state, ProcessState::Running { .. }));
    assert_eq!(info.program, "sleep");

    let again = run(&mux, "start 1").await;
    assert!(matches!(again, Err(Error::InvalidSessionTransition { .. })));

    run(&mux, "close 1").await.unwrap();
    assert!(mux.is_empty().await);
}

#[tokio::test]
async fn test_unknown_ids_and_layouts() {
    let mux = Multiplexer::new();

    assert!(matches!(
        run(&mux, "switch 9").await,
        Err(Error::SessionNotFound(SessionId(9)))
    ));
    assert!(matches!(
        run(&mux, "close 9").await,
        Err(Error::SessionNotFound(SessionId(9)))
    ));
    assert!(matches!(run(&mux, "layout diagonal").await, Err(Error::Validation(_))));
    assert!(matches!(run(&mux, "switch abc").await, Err(Error::Validation(_))));

    assert_eq!(run(&mux, "layout GRID").await.unwrap(), "Changed layout to grid");
    assert_eq!(mux.layout().await, Layout::Grid);
}
