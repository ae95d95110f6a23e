//! Session recorder: lifecycle of one audit session and its snapshot boundaries.
//!
//! State machine: `Idle -> start -> Recording -> stop -> Idle`.
//! `record_action` is only valid while recording.

use std::time::Instant;

use a11y_harness_domain::{AuditError, Result, SessionId, Snapshot, SnapshotId};
use chrono::Utc;

#[derive(Debug, Clone, Copy)]
enum RecorderState {
    Idle,
    Recording { started: Instant },
}

/// Tracks the active session and the snapshots it produced.
///
/// Snapshots of the most recently stopped session stay readable until the
/// next `start()`, so a collector can still resolve and finalize them.
#[derive(Debug)]
pub struct SessionRecorder {
    state: RecorderState,
    session_id: Option<SessionId>,
    snapshots: Vec<Snapshot>,
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRecorder {
    pub fn new() -> Self {
        SessionRecorder {
            state: RecorderState::Idle,
            session_id: None,
            snapshots: Vec::new(),
        }
    }

    /// Begin a new session. Fails with `AlreadyRunning` while one is active.
    pub fn start(&mut self) -> Result<SessionId> {
        if let (RecorderState::Recording { .. }, Some(active)) = (self.state, self.session_id) {
            return Err(AuditError::AlreadyRunning(active));
        }

        let session_id = SessionId::new();
        self.session_id = Some(session_id);
        self.snapshots.clear();
        self.state = RecorderState::Recording {
            started: Instant::now(),
        };

        crate::obs::emit_session_started(&session_id);
        Ok(session_id)
    }

    /// Create a snapshot for the UI action `name`.
    pub fn record_action(&mut self, name: &str) -> Result<SnapshotId> {
        let (started, session_id) = match (self.state, self.session_id) {
            (RecorderState::Recording { started }, Some(session_id)) => (started, session_id),
            _ => return Err(AuditError::NotRunning),
        };

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        // Instant is monotonic, but keep the invariant explicit for consumers.
        let offset_ms = self
            .snapshots
            .last()
            .map_or(elapsed, |prev| elapsed.max(prev.offset_ms));

        let id = SnapshotId::new(session_id, self.snapshots.len() as u32);
        self.snapshots.push(Snapshot {
            id,
            action: name.to_string(),
            captured_at: Utc::now(),
            offset_ms,
        });

        crate::obs::emit_snapshot_recorded(&id, name, offset_ms);
        Ok(id)
    }

    /// End the active session, returning its snapshot ids in creation order.
    pub fn stop(&mut self) -> Result<Vec<SnapshotId>> {
        let session_id = match (self.state, self.session_id) {
            (RecorderState::Recording { .. }, Some(session_id)) => session_id,
            _ => return Err(AuditError::NotRunning),
        };

        self.state = RecorderState::Idle;
        let ids: Vec<SnapshotId> = self.snapshots.iter().map(|s| s.id).collect();
        crate::obs::emit_session_stopped(&session_id, ids.len());
        Ok(ids)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// The active session, or the most recently stopped one.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn snapshot(&self, id: &SnapshotId) -> Option<&Snapshot> {
        if Some(id.session) != self.session_id {
            return None;
        }
        self.snapshots.get(id.seq as usize)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recorder_is_idle() {
        let recorder = SessionRecorder::new();
        assert!(!recorder.is_recording());
        assert!(recorder.session_id().is_none());
        assert!(recorder.snapshots().is_empty());
    }

    #[test]
    fn test_record_action_requires_start() {
        let mut recorder = SessionRecorder::new();
        assert!(matches!(
            recorder.record_action("tap"),
            Err(AuditError::NotRunning)
        ));
    }

    #[test]
    fn test_start_twice_fails() {
        let mut recorder = SessionRecorder::new();
        let first = recorder.start().expect("start");
        match recorder.start() {
            Err(AuditError::AlreadyRunning(active)) => assert_eq!(active, first),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
    }

    #[test]
    fn test_stop_without_start_fails() {
        let mut recorder = SessionRecorder::new();
        assert!(matches!(recorder.stop(), Err(AuditError::NotRunning)));
    }

    #[test]
    fn test_snapshots_are_dense_and_ordered() {
        let mut recorder = SessionRecorder::new();
        let session = recorder.start().expect("start");
        let a = recorder.record_action("launch").expect("a");
        let b = recorder.record_action("tap login").expect("b");
        let c = recorder.record_action("scroll").expect("c");

        assert_eq!([a.seq, b.seq, c.seq], [0, 1, 2]);
        assert!(a.session == session && c.session == session);

        let offsets: Vec<u64> = recorder.snapshots().iter().map(|s| s.offset_ms).collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

        let ids = recorder.stop().expect("stop");
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_snapshots_survive_stop_until_restart() {
        let mut recorder = SessionRecorder::new();
        recorder.start().expect("start");
        let id = recorder.record_action("launch").expect("record");
        recorder.stop().expect("stop");

        assert_eq!(recorder.snapshot(&id).map(|s| s.action.as_str()), Some("launch"));

        recorder.start().expect("restart");
        assert!(recorder.snapshot(&id).is_none());
        assert!(recorder.snapshots().is_empty());
    }

    #[test]
    fn test_record_after_stop_fails() {
        let mut recorder = SessionRecorder::new();
        recorder.start().expect("start");
        recorder.stop().expect("stop");
        assert!(matches!(
            recorder.record_action("late"),
            Err(AuditError::NotRunning)
        ));
    }
}
