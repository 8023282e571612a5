//! Per-request image loading state machine.
//!
//! Transitions are listed in [`TRANSITIONS`]; any other `(state, command)`
//! pair leaves the state unchanged. Async completions can arrive after a
//! reset, so ignoring them is the normal case and only logged at debug.

use serde::{Deserialize, Serialize};

/// Loading state of one image request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageLoadingState {
    /// Nothing requested.
    #[default]
    Unloaded,
    /// Bytes are being read and probed.
    DataLoading,
    /// Bytes are available; the intrinsic size is known.
    DataReady,
    /// A canvas image is being produced.
    MakeCanvasImage,
    /// A canvas image is available.
    LoadSuccess,
    /// Loading or decoding failed.
    LoadFail,
}

impl ImageLoadingState {
    /// Every state.
    pub const ALL: [Self; 6] = [
        Self::Unloaded,
        Self::DataLoading,
        Self::DataReady,
        Self::MakeCanvasImage,
        Self::LoadSuccess,
        Self::LoadFail,
    ];
}

/// Input of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageLoadingCommand {
    /// Start loading the source bytes.
    LoadData,
    /// The bytes were loaded and probed.
    LoadDataSuccess,
    /// Produce a canvas image at the current size.
    MakeCanvasImage,
    /// The canvas image was delivered.
    MakeCanvasImageSuccess,
    /// Loading or decoding failed.
    LoadFail,
    /// Drop everything and go back to [`ImageLoadingState::Unloaded`].
    ResetState,
}

impl ImageLoadingCommand {
    /// Every command.
    pub const ALL: [Self; 6] = [
        Self::LoadData,
        Self::LoadDataSuccess,
        Self::MakeCanvasImage,
        Self::MakeCanvasImageSuccess,
        Self::LoadFail,
        Self::ResetState,
    ];
}

/// Accepted `(from, command, to)` transitions.
pub const TRANSITIONS: [(ImageLoadingState, ImageLoadingCommand, ImageLoadingState); 13] = {
    use ImageLoadingCommand as C;
    use ImageLoadingState as S;
    [
        (S::Unloaded, C::LoadData, S::DataLoading),
        (S::Unloaded, C::ResetState, S::Unloaded),
        (S::DataLoading, C::LoadDataSuccess, S::DataReady),
        (S::DataLoading, C::LoadFail, S::LoadFail),
        (S::DataLoading, C::ResetState, S::Unloaded),
        (S::DataReady, C::MakeCanvasImage, S::MakeCanvasImage),
        (S::DataReady, C::ResetState, S::Unloaded),
        (S::MakeCanvasImage, C::MakeCanvasImageSuccess, S::LoadSuccess),
        (S::MakeCanvasImage, C::LoadFail, S::LoadFail),
        (S::MakeCanvasImage, C::ResetState, S::Unloaded),
        (S::LoadSuccess, C::MakeCanvasImage, S::MakeCanvasImage),
        (S::LoadSuccess, C::ResetState, S::Unloaded),
        (S::LoadFail, C::ResetState, S::Unloaded),
    ]
};

/// State reached from `state` on `command`, or `None` if the pair is not a
/// transition.
#[must_use]
pub fn next_state(
    state: ImageLoadingState,
    command: ImageLoadingCommand,
) -> Option<ImageLoadingState> {
    TRANSITIONS
        .iter()
        .find(|(from, cmd, _)| *from == state && *cmd == command)
        .map(|(_, _, to)| *to)
}

/// Holds the current state and applies commands to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageStateManager {
    state: ImageLoadingState,
}

impl ImageStateManager {
    /// A manager in [`ImageLoadingState::Unloaded`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ImageLoadingState {
        self.state
    }

    /// Apply `command`. Returns the entered state, or `None` when ignored.
    pub fn handle_command(&mut self, command: ImageLoadingCommand) -> Option<ImageLoadingState> {
        let Some(next) = next_state(self.state, command) else {
            tracing::debug!("Ignoring {command:?} in state {:?}", self.state);
            return None;
        };
        tracing::debug!("Image state {:?} -> {next:?} on {command:?}", self.state);
        self.state = next;
        Some(next)
    }
}
