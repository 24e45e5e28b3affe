//! Transition requests and the hook plan derived from a state change.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::application::Hook;
use super::state::LifecycleState;

/// A lifecycle change requested by a platform thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Resume,
    Foreground,
    Background,
    Suspend,
    Destroy,
}

impl Transition {
    /// Target state required before this transition may be requested.
    pub fn precondition(self) -> LifecycleState {
        match self {
            Transition::Resume => LifecycleState::Initialised,
            Transition::Foreground => LifecycleState::Resumed,
            Transition::Background => LifecycleState::Foregrounded,
            Transition::Suspend => LifecycleState::Resumed,
            Transition::Destroy => LifecycleState::Initialised,
        }
    }

    /// Target state once the request is accepted.
    pub fn next_target(self) -> LifecycleState {
        match self {
            Transition::Resume => LifecycleState::Resumed,
            Transition::Foreground => LifecycleState::Foregrounded,
            Transition::Background => LifecycleState::Resumed,
            Transition::Suspend => LifecycleState::Initialised,
            Transition::Destroy => LifecycleState::Uninitialised,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Resume => "resume",
            Transition::Foreground => "foreground",
            Transition::Background => "background",
            Transition::Suspend => "suspend",
            Transition::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Hooks to run in one engine-thread iteration.
///
/// A jump across several states (e.g. `Initialised` straight to
/// `Foregrounded`) sets several flags at once; [`TransitionPlan::hooks`]
/// yields them in the fixed order Init, Resume, Foreground, Update,
/// Background, Suspend, Destroy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionPlan {
    pub init: bool,
    pub resume: bool,
    pub foreground: bool,
    pub update: bool,
    pub background: bool,
    pub suspend: bool,
    pub destroy: bool,
}

impl TransitionPlan {
    /// Build the plan for moving from `current` to `snapshot`.
    ///
    /// `live_target` is the target re-read after `snapshot` was taken. Only
    /// the update flag uses it, so a downgrade that lands between the two
    /// reads suppresses this iteration's tick.
    pub fn new(
        current: LifecycleState,
        snapshot: LifecycleState,
        live_target: LifecycleState,
    ) -> Self {
        use LifecycleState::*;

        Self {
            init: current == Uninitialised && snapshot != Uninitialised,
            resume: current.is_idle() && snapshot.is_active(),
            foreground: current != Foregrounded && snapshot == Foregrounded,
            update: live_target.is_active(),
            background: current == Foregrounded && snapshot != Foregrounded,
            suspend: current.is_active() && snapshot.is_idle(),
            destroy: current != Uninitialised && snapshot == Uninitialised,
        }
    }

    pub fn hooks(&self) -> impl Iterator<Item = Hook> {
        [
            (self.init, Hook::Init),
            (self.resume, Hook::Resume),
            (self.foreground, Hook::Foreground),
            (self.update, Hook::Update),
            (self.background, Hook::Background),
            (self.suspend, Hook::Suspend),
            (self.destroy, Hook::Destroy),
        ]
        .into_iter()
        .filter_map(|(enabled, hook)| enabled.then_some(hook))
    }
}
