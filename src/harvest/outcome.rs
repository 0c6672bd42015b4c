//! Typed result of a single fetch step.

use crate::error::FetchError;

/// Outcome of one remote fetch (one classification attempt or one page).
///
/// `NotFound` is a deliberate empty answer from the remote side and is not
/// an error; callers decide whether it means "try the next strategy" or
/// "stop paginating".
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Found(T),
    NotFound,
    Failed(FetchError),
}

impl<T> FetchOutcome<T> {
    /// Convert into `Some(value)` only when found.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_only_for_found() {
        assert_eq!(FetchOutcome::Found("x").found(), Some("x"));
        assert_eq!(FetchOutcome::<&str>::NotFound.found(), None);
        let failed: FetchOutcome<&str> = FetchOutcome::Failed(FetchError::malformed("eof"));
        assert_eq!(failed.found(), None);
    }
}
