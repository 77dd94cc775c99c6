use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Convenient result alias for tracsat_core.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Log/handling importance. Maps onto tracing levels at the edges.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Where an error came from (helps triage and routing).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Domain {
    Subsystem,
    Lifecycle,
    Target,
    Config,
    Other,
}

/// Stable error "kind" for matching/branching.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// `initialize` returned false.
    InitializationFailed,
    TargetNotFound,
    TargetAlreadyReached,
    DuplicateTarget,
    InvalidArgument,
    InvalidState,
    InvalidTransition,
    Timeout,
    /// A hook panicked on the worker thread.
    WorkerPanicked,
    /// A hook panicked on the thread that requested the transition.
    HookPanicked,
    Io,
    Other,
}

/// Optional structured payload for rich context without forcing allocation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Payload {
    None,

    /// Generic key/value context.
    Context {
        key: &'static str,
        value: Cow<'static, str>,
    },

    /// Lifecycle-specific context.
    LifecycleTransition { from_state: u8, via_transition: u8 },

    /// Name of the target involved.
    Target(String),

    /// Name of the subsystem involved.
    Subsystem(String),

    /// Deadline that elapsed, in milliseconds.
    TimeoutMs(u64),
}

/// The one error type that crosses module boundaries in tracsat_core.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{severity:?}: {message}")]
pub struct CoreError {
    pub domain: Domain,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: Cow<'static, str>,
    pub payload: Payload,
}

impl CoreError {
    // ---------------- Fluent entry points ----------------

    #[inline]
    pub fn warn() -> ErrB {
        ErrB::new(Severity::Warn)
    }
    #[inline]
    pub fn error() -> ErrB {
        ErrB::new(Severity::Error)
    }
    #[inline]
    pub fn fatal() -> ErrB {
        ErrB::new(Severity::Fatal)
    }

    // ---------------- Named constructors ----------------

    /// Lifecycle request not allowed from the current state.
    pub fn invalid_transition_lifecycle(from_state: u8, via_transition: u8) -> Self {
        CoreError::warn()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::InvalidTransition)
            .msg("invalid lifecycle transition")
            .payload(Payload::LifecycleTransition {
                from_state,
                via_transition,
            })
            .build()
    }

    pub fn target_not_found(name: &str) -> Self {
        CoreError::error()
            .domain(Domain::Target)
            .kind(ErrorKind::TargetNotFound)
            .msgf(format_args!(
                "a target with the name {name} does not exist; was it registered?"
            ))
            .payload(Payload::Target(name.to_string()))
            .build()
    }

    pub fn target_already_reached(name: &str) -> Self {
        CoreError::error()
            .domain(Domain::Target)
            .kind(ErrorKind::TargetAlreadyReached)
            .msgf(format_args!("target {name} was already reached"))
            .payload(Payload::Target(name.to_string()))
            .build()
    }

    pub fn duplicate_target(name: &str) -> Self {
        CoreError::error()
            .domain(Domain::Target)
            .kind(ErrorKind::DuplicateTarget)
            .msgf(format_args!("target {name} is already registered"))
            .payload(Payload::Target(name.to_string()))
            .build()
    }

    /// `initialize` reported that the subsystem must not start.
    pub fn initialization_failed(subsystem: &str) -> Self {
        CoreError::fatal()
            .domain(Domain::Subsystem)
            .kind(ErrorKind::InitializationFailed)
            .msgf(format_args!(
                "{subsystem} failed to start: initialization condition not met"
            ))
            .payload(Payload::Subsystem(subsystem.to_string()))
            .build()
    }

    pub fn worker_panicked(subsystem: &str) -> Self {
        CoreError::fatal()
            .domain(Domain::Subsystem)
            .kind(ErrorKind::WorkerPanicked)
            .msgf(format_args!("{subsystem} worker panicked"))
            .payload(Payload::Subsystem(subsystem.to_string()))
            .build()
    }

    /// A hook panicked on the thread that requested `hook`'s transition.
    pub fn hook_panicked(subsystem: &str, hook: &'static str) -> Self {
        CoreError::error()
            .domain(Domain::Subsystem)
            .kind(ErrorKind::HookPanicked)
            .msgf(format_args!("{subsystem}: {hook} panicked"))
            .payload(Payload::Subsystem(subsystem.to_string()))
            .build()
    }

    pub fn timeout(what: &'static str, after: Duration) -> Self {
        CoreError::warn()
            .domain(Domain::Subsystem)
            .kind(ErrorKind::Timeout)
            .msgf(format_args!("{what} timed out after {after:?}"))
            .payload(Payload::TimeoutMs(after.as_millis() as u64))
            .build()
    }
}

/// Fluent builder that behaves like iterator chains (takes self, returns Self).
/// Defaults:
/// - domain = Other
/// - kind = Other
/// - message = ""
/// - payload = None
#[derive(Debug, Clone)]
pub struct ErrB {
    domain: Domain,
    kind: ErrorKind,
    severity: Severity,
    message: Cow<'static, str>,
    payload: Payload,
}

impl ErrB {
    #[inline]
    fn new(severity: Severity) -> Self {
        Self {
            domain: Domain::Other,
            kind: ErrorKind::Other,
            severity,
            message: Cow::Borrowed(""),
            payload: Payload::None,
        }
    }

    #[inline]
    pub fn domain(mut self, d: Domain) -> Self {
        self.domain = d;
        self
    }

    #[inline]
    pub fn kind(mut self, k: ErrorKind) -> Self {
        self.kind = k;
        self
    }

    #[inline]
    pub fn msg(mut self, m: impl Into<Cow<'static, str>>) -> Self {
        self.message = m.into();
        self
    }

    /// Formatting-friendly message setter.
    #[inline]
    pub fn msgf(mut self, args: fmt::Arguments<'_>) -> Self {
        self.message = Cow::Owned(args.to_string());
        self
    }

    /// Only one payload: this replaces any previous payload.
    #[inline]
    pub fn payload(mut self, p: Payload) -> Self {
        self.payload = p;
        self
    }

    #[inline]
    pub fn build(self) -> CoreError {
        CoreError {
            domain: self.domain,
            kind: self.kind,
            severity: self.severity,
            message: self.message,
            payload: self.payload,
        }
    }
}

impl From<ErrB> for CoreError {
    fn from(b: ErrB) -> Self {
        b.build()
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::error()
            .kind(ErrorKind::Io)
            .msg("io error")
            .payload(Payload::Context {
                key: "io",
                value: e.to_string().into(),
            })
            .build()
    }
}
