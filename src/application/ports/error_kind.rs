use std::fmt;

/// Classification shared by every pipeline error; retry and exit-code decisions
/// are made on the kind, never on the concrete error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    ToolFailure,
    TransientService,
    Authentication,
    AssemblyInvariant,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::ToolFailure => "tool_failure",
            ErrorKind::TransientService => "transient_service",
            ErrorKind::Authentication => "authentication",
            ErrorKind::AssemblyInvariant => "assembly_invariant",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransientService)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
