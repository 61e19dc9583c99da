//! In-memory session repository.
//!
//! Owned by the engine for the whole process lifetime. Each session sits behind its
//! own async mutex so submissions for one session are serialized while different
//! sessions proceed in parallel. Idle sessions are removed by `sweep_expired`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, instrument};

use crate::domain::{AnsweredQuestion, Difficulty, Question, SessionStatus, Settings};
use crate::policy;

/// Live state of one interview. Mutated only by the engine while holding its lock.
#[derive(Debug)]
pub struct Session {
  pub id: String,
  pub settings: Settings,
  pub status: SessionStatus,
  /// Append-only answer log.
  pub history: Vec<AnsweredQuestion>,
  pub current_difficulty: Difficulty,
  pub strikes: u32,
  /// The one question awaiting an answer; `None` once the session has ended.
  pub pending: Option<Question>,
  pub preferred_skills: Vec<String>,
  pub asked: HashSet<String>,
  pub last_activity: Instant,
}

impl Session {
  pub fn new(id: String, settings: Settings, preferred_skills: Vec<String>) -> Self {
    Self {
      id,
      settings,
      status: SessionStatus::Active,
      history: Vec::new(),
      current_difficulty: Difficulty::Easy,
      strikes: 0,
      pending: None,
      preferred_skills,
      asked: HashSet::new(),
      last_activity: Instant::now(),
    }
  }

  /// Always derived from the log, never stored.
  pub fn readiness_score(&self) -> Option<f64> {
    policy::readiness(&self.history)
  }

  pub fn touch(&mut self) {
    self.last_activity = Instant::now();
  }
}

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
  sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn insert(&self, session: Session) -> SessionHandle {
    let id = session.id.clone();
    let handle = Arc::new(Mutex::new(session));
    self.sessions.write().await.insert(id, handle.clone());
    handle
  }

  pub async fn get(&self, id: &str) -> Option<SessionHandle> {
    self.sessions.read().await.get(id).cloned()
  }

  /// Lock a live session. `None` if the id is unknown or the session was swept
  /// while this call waited for its lock.
  pub async fn lock(&self, id: &str) -> Option<OwnedMutexGuard<Session>> {
    let handle = self.get(id).await?;
    self.lock_handle(id, handle).await
  }

  async fn lock_handle(&self, id: &str, handle: SessionHandle) -> Option<OwnedMutexGuard<Session>> {
    let guard = handle.clone().lock_owned().await;
    // A held guard keeps the sweeper off this session from here on.
    let live = self.sessions.read().await.get(id).is_some_and(|h| Arc::ptr_eq(h, &handle));
    live.then_some(guard)
  }

  pub async fn len(&self) -> usize {
    self.sessions.read().await.len()
  }

  /// Remove sessions idle for longer than `ttl`. Sessions currently locked are in use
  /// and are skipped. Returns how many were removed.
  #[instrument(level = "debug", skip(self))]
  pub async fn sweep_expired(&self, ttl: Duration) -> usize {
    let mut sessions = self.sessions.write().await;
    let before = sessions.len();
    sessions.retain(|id, handle| match handle.try_lock() {
      Ok(s) => {
        let keep = s.last_activity.elapsed() <= ttl;
        if !keep {
          debug!(target: "interview", session_id = %id, status = ?s.status, "Expiring idle session");
        }
        keep
      }
      Err(_) => true,
    });
    before - sessions.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn settings() -> Settings {
    Settings { time_limit_sec: 120, max_questions: 5, early_terminate_threshold: 40 }
  }

  #[tokio::test]
  async fn insert_and_get() {
    let store = SessionStore::new();
    store.insert(Session::new("a".into(), settings(), vec![])).await;
    assert!(store.get("a").await.is_some());
    assert!(store.get("b").await.is_none());
    assert_eq!(store.len().await, 1);
  }

  #[tokio::test]
  async fn lock_yields_live_sessions_only() {
    let store = SessionStore::new();
    store.insert(Session::new("a".into(), settings(), vec![])).await;
    assert_eq!(store.lock("a").await.map(|s| s.id.clone()).as_deref(), Some("a"));
    assert!(store.lock("b").await.is_none());
  }

  #[tokio::test]
  async fn session_swept_between_lookup_and_lock_is_gone() {
    let store = SessionStore::new();
    store.insert(Session::new("idle".into(), settings(), vec![])).await;
    let handle = store.get("idle").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.sweep_expired(Duration::from_millis(5)).await, 1);
    assert!(store.lock_handle("idle", handle).await.is_none());
  }

  #[tokio::test]
  async fn sweep_removes_only_idle_unlocked_sessions() {
    let store = SessionStore::new();
    store.insert(Session::new("stale".into(), settings(), vec![])).await;
    let busy = store.insert(Session::new("busy".into(), settings(), vec![])).await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    store.insert(Session::new("fresh".into(), settings(), vec![])).await;

    let _guard = busy.lock().await;
    let removed = store.sweep_expired(Duration::from_millis(60)).await;
    assert_eq!(removed, 1);
    assert!(store.get("stale").await.is_none());
    assert!(store.get("busy").await.is_some());
    assert!(store.get("fresh").await.is_some());
  }
}
