/// Subsystem lifecycle states.
///
/// Stable states:
/// - Created, Running, Halted, Shutdown, Failed
///
/// Intermediate states (a lifecycle hook is running):
/// - Initializing, Halting, Resuming, ShuttingDown
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum State {
    // Stable
    Created,
    Running,
    Halted,
    Shutdown,
    Failed,

    // Intermediate
    Initializing,
    Halting,
    Resuming,
    ShuttingDown,
}

/// Compact IDs used for error payloads and telemetry.
impl State {
    pub const fn id(self) -> u8 {
        match self {
            // Stable
            State::Created => 0,
            State::Running => 1,
            State::Halted => 2,
            State::Shutdown => 3,
            State::Failed => 4,

            // Intermediate
            State::Initializing => 10,
            State::Halting => 11,
            State::Resuming => 12,
            State::ShuttingDown => 13,
        }
    }

    /// True for stable states.
    pub const fn is_primary(self) -> bool {
        matches!(
            self,
            State::Created | State::Running | State::Halted | State::Shutdown | State::Failed
        )
    }

    /// True for intermediate states entered while hooks are running.
    pub const fn is_transitioning(self) -> bool {
        !self.is_primary()
    }

    /// True once the subsystem can never run again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, State::Shutdown | State::Failed)
    }

    /// Stable, human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            State::Created => "Created",
            State::Running => "Running",
            State::Halted => "Halted",
            State::Shutdown => "Shutdown",
            State::Failed => "Failed",
            State::Initializing => "Initializing",
            State::Halting => "Halting",
            State::Resuming => "Resuming",
            State::ShuttingDown => "ShuttingDown",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical list of all lifecycle states (stable + intermediate).
pub const ALL_STATES: [State; 9] = [
    State::Created,
    State::Running,
    State::Halted,
    State::Shutdown,
    State::Failed,
    State::Initializing,
    State::Halting,
    State::Resuming,
    State::ShuttingDown,
];
