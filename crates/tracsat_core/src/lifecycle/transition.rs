/// Externally requested lifecycle transitions.
///
/// Outcomes (success/failure of the hook that runs in the intermediate state)
/// are modeled via `finish(intermediate, via, CallbackResult)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Transition {
    Start,
    Halt,
    Resume,
    Shutdown,
}

impl Transition {
    pub const fn id(self) -> u8 {
        match self {
            Transition::Start => 1,
            Transition::Halt => 2,
            Transition::Resume => 3,
            Transition::Shutdown => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Halt => "halt",
            Transition::Resume => "resume",
            Transition::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
