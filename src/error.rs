use std::fmt;

use crate::ir::{BlockId, Ty, ValueId};

/// Errors that can occur while compiling Brainfuck source to a block graph.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Loops were not balanced; a matching `[` or `]` was not found.
    #[error("Unmatched bracket {kind} at instruction {ip}")]
    UnmatchedBracket { ip: usize, kind: UnmatchedBracketKind },

    /// The block graph builder rejected an operation.
    #[error("Block graph construction failed: {0}")]
    Build(#[from] BuildError),
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Misuse of the [`BlockGraphBuilder`](crate::builder::BlockGraphBuilder).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("no insertion point is set")]
    NoInsertionPoint,

    #[error("block '{label}' is already terminated")]
    BlockTerminated { label: String },

    #[error("block '{label}' has no terminator")]
    Unterminated { label: String },

    #[error("unknown block {0}")]
    UnknownBlock(BlockId),

    #[error("unknown value {0}")]
    UnknownValue(ValueId),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Ty, found: Ty },

    #[error("cannot sign-extend {from} to {to}")]
    InvalidExtension { from: Ty, to: Ty },
}
