//! Fake ports shared by the controller test suites.
#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    AudioMode, MediaAsset, MediaLibrary, PermissionStatus, PlaybackAdapter, PlaybackRequest,
    PlaybackSessionId, PlaybackStatus, StatusCallback,
};
use core_playback::{SessionController, SessionSnapshot};
use core_runtime::config::PlaybackSettings;
use core_runtime::events::EventBus;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const URI_A: &str = "file:///music/a.mp3";
pub const URI_B: &str = "file:///music/b.mp3";
pub const URI_C: &str = "file:///music/c.mp3";

// ============================================================================
// Fake PlaybackAdapter
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ConfigureAudio(AudioMode),
    Load {
        session: PlaybackSessionId,
        uri: String,
    },
    Play(PlaybackSessionId),
    Pause(PlaybackSessionId),
    Seek(PlaybackSessionId, Duration),
    Unload(PlaybackSessionId),
}

#[derive(Default)]
struct AdapterState {
    calls: Vec<Call>,
    live: HashMap<PlaybackSessionId, String>,
    callbacks: HashMap<PlaybackSessionId, StatusCallback>,
    failing_uris: HashSet<String>,
    load_gates: HashMap<String, Arc<Notify>>,
    fail_play: bool,
    fail_pause: bool,
    fail_seek: bool,
    fail_unload: bool,
    hang_unload: bool,
}

/// Records every command and keeps the set of live resources.
#[derive(Default)]
pub struct FakeAdapter {
    state: Mutex<AdapterState>,
}

impl FakeAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_load_for(&self, uri: &str) {
        self.state.lock().failing_uris.insert(uri.to_string());
    }

    pub fn clear_load_failure(&self, uri: &str) {
        self.state.lock().failing_uris.remove(uri);
    }

    /// Loads of `uri` block until the returned gate is notified.
    pub fn gate_load(&self, uri: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .load_gates
            .insert(uri.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.state.lock().fail_play = fail;
    }

    pub fn set_fail_pause(&self, fail: bool) {
        self.state.lock().fail_pause = fail;
    }

    pub fn set_fail_seek(&self, fail: bool) {
        self.state.lock().fail_seek = fail;
    }

    pub fn set_fail_unload(&self, fail: bool) {
        self.state.lock().fail_unload = fail;
    }

    pub fn set_hang_unload(&self, hang: bool) {
        self.state.lock().hang_unload = hang;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn live_uris(&self) -> Vec<String> {
        let mut uris: Vec<_> = self.state.lock().live.values().cloned().collect();
        uris.sort();
        uris
    }

    pub fn load_count(&self, uri: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Load { uri: u, .. } if u == uri))
            .count()
    }

    /// Session id of the most recent load request for `uri`.
    pub fn handle_for(&self, uri: &str) -> Option<PlaybackSessionId> {
        self.state.lock().calls.iter().rev().find_map(|call| match call {
            Call::Load { session, uri: u } if u == uri => Some(*session),
            _ => None,
        })
    }

    pub fn was_unloaded(&self, session: PlaybackSessionId) -> bool {
        self.state
            .lock()
            .calls
            .iter()
            .any(|call| *call == Call::Unload(session))
    }

    /// Deliver a status update through the callback registered at load,
    /// even if the resource has since been released.
    pub fn emit(&self, status: PlaybackStatus) {
        let callback = self.state.lock().callbacks.get(&status.session).cloned();
        if let Some(callback) = callback {
            callback(status);
        }
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn check_live(&self, session: PlaybackSessionId) -> Result<()> {
        if self.state.lock().live.contains_key(&session) {
            Ok(())
        } else {
            Err(BridgeError::UnknownSession(session.to_string()))
        }
    }
}

#[async_trait]
impl PlaybackAdapter for FakeAdapter {
    async fn configure_audio_mode(&self, mode: AudioMode) -> Result<()> {
        self.record(Call::ConfigureAudio(mode));
        Ok(())
    }

    async fn load(
        &self,
        request: PlaybackRequest,
        on_status: StatusCallback,
    ) -> Result<PlaybackSessionId> {
        let gate = {
            let mut state = self.state.lock();
            state.calls.push(Call::Load {
                session: request.session,
                uri: request.uri.clone(),
            });
            state.callbacks.insert(request.session, on_status);
            state.load_gates.get(&request.uri).cloned()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if state.failing_uris.contains(&request.uri) {
            return Err(BridgeError::OperationFailed(format!(
                "cannot decode {}",
                request.uri
            )));
        }
        state.live.insert(request.session, request.uri);
        Ok(request.session)
    }

    async fn play(&self, session: PlaybackSessionId) -> Result<()> {
        self.record(Call::Play(session));
        if self.state.lock().fail_play {
            return Err(BridgeError::OperationFailed("play rejected".into()));
        }
        self.check_live(session)
    }

    async fn pause(&self, session: PlaybackSessionId) -> Result<()> {
        self.record(Call::Pause(session));
        if self.state.lock().fail_pause {
            return Err(BridgeError::OperationFailed("pause rejected".into()));
        }
        self.check_live(session)
    }

    async fn seek(&self, session: PlaybackSessionId, position: Duration) -> Result<()> {
        self.record(Call::Seek(session, position));
        if self.state.lock().fail_seek {
            return Err(BridgeError::OperationFailed("seek rejected".into()));
        }
        self.check_live(session)
    }

    async fn unload(&self, session: PlaybackSessionId) -> Result<()> {
        self.record(Call::Unload(session));
        let (hang, fail) = {
            let state = self.state.lock();
            (state.hang_unload, state.fail_unload)
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if fail {
            return Err(BridgeError::OperationFailed("unload rejected".into()));
        }
        self.state.lock().live.remove(&session);
        Ok(())
    }
}

// ============================================================================
// Fake MediaLibrary
// ============================================================================

pub struct FakeLibrary {
    permission: PermissionStatus,
    assets: Vec<MediaAsset>,
}

impl FakeLibrary {
    pub fn granted(assets: Vec<MediaAsset>) -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionStatus::Granted,
            assets,
        })
    }

    pub fn denied() -> Arc<Self> {
        Arc::new(Self {
            permission: PermissionStatus::Denied,
            assets: Vec::new(),
        })
    }
}

#[async_trait]
impl MediaLibrary for FakeLibrary {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn list_audio_assets(&self) -> Result<Vec<MediaAsset>> {
        Ok(self.assets.clone())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// A (id 1, 200 s), B (id 2, 150 s), C (id 3, unknown duration).
pub fn assets() -> Vec<MediaAsset> {
    vec![
        MediaAsset::new("1", "a.mp3", URI_A).with_duration(Duration::from_millis(200_000)),
        MediaAsset::new("2", "b.mp3", URI_B).with_duration(Duration::from_millis(150_000)),
        MediaAsset::new("3", "c.mp3", URI_C),
    ]
}

pub fn settings() -> PlaybackSettings {
    PlaybackSettings {
        load_timeout: Duration::from_secs(2),
        command_timeout: Duration::from_secs(1),
        release_timeout: Duration::from_millis(100),
        status_interval: Duration::from_millis(500),
    }
}

pub async fn mounted(adapter: Arc<FakeAdapter>) -> SessionController {
    mounted_with(adapter, FakeLibrary::granted(assets())).await
}

pub async fn mounted_with(
    adapter: Arc<FakeAdapter>,
    library: Arc<FakeLibrary>,
) -> SessionController {
    let controller = SessionController::new(adapter, library, settings(), EventBus::new(100));
    controller.mount().await.unwrap();
    controller
}

pub fn assert_invariants(snapshot: &SessionSnapshot) {
    if let Some(violation) = snapshot.invariant_violation() {
        panic!("invariant broken: {violation}: {snapshot:?}");
    }
}

/// Poll `condition` until it holds, yielding to other tasks in between.
pub async fn wait_until<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

pub fn status(session: PlaybackSessionId, position_ms: u64, duration_ms: u64) -> PlaybackStatus {
    PlaybackStatus::new(
        session,
        Duration::from_millis(position_ms),
        Some(Duration::from_millis(duration_ms)),
    )
}
