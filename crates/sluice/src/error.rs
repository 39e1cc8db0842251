use thiserror::Error;

/// Errors produced while planning a migration.
#[derive(Debug, Error)]
pub enum Error {
    /// The changes describe a shape the engine cannot hold, such as a table
    /// without columns.
    #[error("{0}")]
    Structural(String),

    /// The target engine cannot express the requested attribute.
    #[error("{0}")]
    Capability(String),

    /// Two parts of a change contradict each other.
    #[error("{0}")]
    SemanticConflict(String),

    /// A modification matches none of the transforms the planner knows.
    #[error("{0}")]
    UnrecognizedChange(String),

    /// A change kind that is not valid where it appears.
    #[error("unsupported change {0}")]
    UnknownVariant(String),

    /// Views that select from each other in a loop.
    #[error("view dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// Column-body errors of one table, reported together.
    #[error("{action} table {table:?}: {}", join(.errors))]
    Table {
        action: &'static str,
        table: String,
        errors: Vec<Error>,
    },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// The classification of an [`Error`], looking through any context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Structural,
    Capability,
    SemanticConflict,
    UnrecognizedChange,
    UnknownVariant,
    Cycle,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Structural(_) => ErrorKind::Structural,
            Error::Capability(_) => ErrorKind::Capability,
            Error::SemanticConflict(_) => ErrorKind::SemanticConflict,
            Error::UnrecognizedChange(_) => ErrorKind::UnrecognizedChange,
            Error::UnknownVariant(_) => ErrorKind::UnknownVariant,
            Error::Cycle(_) => ErrorKind::Cycle,
            Error::Table { errors, .. } => errors
                .first()
                .map(Error::kind)
                .unwrap_or(ErrorKind::Structural),
            Error::Context { source, .. } => source.kind(),
        }
    }

    /// Wrap this error with a description of what was being planned.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

fn join(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.config/sluice.toml` found in any parent directory
    #[error("No .config/sluice.toml found in current directory or any parent")]
    NotFound,

    /// I/O error reading the file
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error in the TOML file
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
