//! Session multiplexer.
//!
//! Owns every `Session`, the id counter, the active id and the layout. Each
//! public operation takes the lock for its whole duration, reads included, so
//! snapshots are consistent and a lookup never races a removal. Kills are
//! issued with `start_kill` and never awaited under the lock.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::session::{Layout, ProcessState, Session, SessionId, SessionInfo};
use crate::{tlog, tlog_debug, Error, Result};

struct Inner {
    sessions: HashMap<SessionId, Session>,
    next_id: u32,
    active: Option<SessionId>,
    layout: Layout,
}

impl Inner {
    fn info(&self, session: &Session) -> SessionInfo {
        session.info(self.active == Some(session.id))
    }
}

pub struct Multiplexer {
    inner: Mutex<Inner>,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiplexer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                next_id: 1,
                active: None,
                layout: Layout::default(),
            }),
        }
    }

    /// Register a new session. The process is prepared but not started.
    /// The first session of an empty set becomes active.
    pub async fn create_session(&self, name: &str, program: &str, args: &[String]) -> SessionId {
        let mut inner = self.inner.lock().await;
        let id = SessionId(inner.next_id);
        inner.next_id += 1;
        inner
            .sessions
            .insert(id, Session::new(id, name, program, args));
        if inner.sessions.len() == 1 {
            inner.active = Some(id);
        }
        tlog!(
            "Session created id={} name={} program={} active={:?}",
            id,
            name,
            program,
            inner.active
        );
        id
    }

    /// Spawn the process behind a prepared session.
    pub async fn start_session(&self, id: SessionId) -> Result<ProcessState> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or(Error::SessionNotFound(id))?;
        session.start()
    }

    /// Make `id` the active session. Processes are not touched.
    pub async fn switch_to_session(&self, id: SessionId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&id) {
            return Err(Error::SessionNotFound(id));
        }
        tlog_debug!("Switching active session {:?} -> {}", inner.active, id);
        inner.active = Some(id);
        Ok(())
    }

    /// Kill (best effort) and drop a session. If it was active, some other
    /// remaining session is promoted; which one is not specified.
    pub async fn remove_session(&self, id: SessionId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let mut session = inner
            .sessions
            .remove(&id)
            .ok_or(Error::SessionNotFound(id))?;
        session.kill();

        if inner.active == Some(id) {
            inner.active = inner.sessions.keys().next().copied();
        }
        tlog!("Session removed id={} active={:?}", id, inner.active);
        Ok(())
    }

    /// Snapshot of all sessions, sorted by id.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let mut inner = self.inner.lock().await;
        for session in inner.sessions.values_mut() {
            session.refresh();
        }
        let mut infos: Vec<_> = inner.sessions.values().map(|s| inner.info(s)).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    pub async fn get_active_session(&self) -> Result<SessionInfo> {
        let mut inner = self.inner.lock().await;
        let id = inner.active.ok_or(Error::NoActiveSession)?;
        match inner.sessions.get_mut(&id) {
            Some(session) => {
                session.refresh();
                Ok(session.info(true))
            }
            None => Err(Error::NoActiveSession),
        }
    }

    pub async fn set_layout(&self, layout: Layout) {
        let mut inner = self.inner.lock().await;
        tlog_debug!("Layout {} -> {}", inner.layout, layout);
        inner.layout = layout;
    }

    pub async fn layout(&self) -> Layout {
        self.inner.lock().await.layout
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Kill every session. Used on shutdown.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        for session in inner.sessions.values_mut() {
            session.kill();
        }
        inner.sessions.clear();
        inner.active = None;
    }
}
