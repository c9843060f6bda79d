//! Recording background host for tests and demos
//!
//! [`RecordingHost`] keeps every call made against it in order and can be told
//! to fail a given operation.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{HostOperation, KeeperError, KeeperResult};
use crate::host::{AudioSessionProfile, BackgroundHost};

/// One recorded host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    StartForeground,
    StopForeground,
    ApplyProfile(AudioSessionProfile),
    SetKeepAwake(bool),
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<HostCall>,
    running: bool,
    keep_awake: bool,
    failing: HashSet<HostOperation>,
}

/// In-memory [`BackgroundHost`]
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<RecordingState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` fail until [`RecordingHost::clear_failures`]
    pub async fn fail(&self, operation: HostOperation) {
        self.state.lock().await.failing.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing.clear();
    }

    /// Simulate the OS killing the foreground task
    pub async fn kill_foreground(&self) {
        self.state.lock().await.running = false;
    }

    pub async fn calls(&self) -> Vec<HostCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn count(&self, call: &HostCall) -> usize {
        self.state.lock().await.calls.iter().filter(|c| *c == call).count()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    pub async fn keep_awake_held(&self) -> bool {
        self.state.lock().await.keep_awake
    }

    async fn record(&self, operation: HostOperation, call: HostCall) -> KeeperResult<()> {
        let mut state = self.state.lock().await;
        state.calls.push(call.clone());
        if state.failing.contains(&operation) {
            return Err(KeeperError::host(operation, "injected failure"));
        }
        match call {
            HostCall::StartForeground => state.running = true,
            HostCall::StopForeground => state.running = false,
            HostCall::SetKeepAwake(enabled) => state.keep_awake = enabled,
            HostCall::ApplyProfile(_) => {}
        }
        Ok(())
    }
}

#[async_trait]
impl BackgroundHost for RecordingHost {
    async fn start_foreground(&self) -> KeeperResult<()> {
        self.record(HostOperation::StartForeground, HostCall::StartForeground).await
    }

    async fn stop_foreground(&self) -> KeeperResult<()> {
        self.record(HostOperation::StopForeground, HostCall::StopForeground).await
    }

    async fn is_foreground_running(&self) -> bool {
        self.state.lock().await.running
    }

    async fn apply_audio_profile(&self, profile: &AudioSessionProfile) -> KeeperResult<()> {
        self.record(HostOperation::ApplyAudioProfile, HostCall::ApplyProfile(*profile)).await
    }

    async fn set_keep_awake(&self, enabled: bool) -> KeeperResult<()> {
        self.record(HostOperation::SetKeepAwake, HostCall::SetKeepAwake(enabled)).await
    }
}
