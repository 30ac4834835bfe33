//! Error types for lumen programs.

use crate::diagnostic::Diagnostics;

/// Returned when a program is used where a valid one is required.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// The program carries error diagnostics.
    #[error("invalid program ({count} error(s)):\n{diagnostics}")]
    Invalid { count: usize, diagnostics: Diagnostics },
}
