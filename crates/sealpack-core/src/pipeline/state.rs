use serde::Serialize;
use std::fmt;

/// Pipeline progress.
///
/// `Idle → Staged → Built|Skipped → (Registered) → Running → Done`.
/// Registration only follows `Built`; a skipped assembly goes straight
/// to `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Idle,
    Staged,
    Built,
    Skipped,
    Registered,
    Running,
    Done,
}

impl State {
    pub fn can_transition_to(self, next: State) -> bool {
        use State::*;

        matches!(
            (self, next),
            (Idle, Staged)
                | (Staged, Built)
                | (Staged, Skipped)
                | (Built, Registered)
                | (Skipped, Running)
                | (Registered, Running)
                | (Running, Done)
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Idle => "idle",
            State::Staged => "staged",
            State::Built => "built",
            State::Skipped => "skipped",
            State::Registered => "registered",
            State::Running => "running",
            State::Done => "done",
        };
        f.write_str(name)
    }
}
