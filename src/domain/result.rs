//! Result type alias for the sync engine

use super::errors::SvodError;

/// Result type alias using `SvodError` as the error type.
///
/// Use this throughout the codebase for fallible operations.
pub type Result<T> = std::result::Result<T, SvodError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SvodError;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(SvodError::Other("test error".to_string()));
        assert!(result.is_err());
    }
}
