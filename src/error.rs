/// Errors reported by the simulation core.
///
/// Allocation failure is not represented here: the global allocator aborts,
/// which is the intended fatal behaviour for `init`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("grid {width}x{height} is too large to address")]
    GridTooLarge { width: usize, height: usize },
    #[error("output buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("simulation is not initialized")]
    NotInitialized,
    #[error("simulation is already initialized; call teardown first")]
    AlreadyInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = CoreError::InvalidDimensions { width: 0, height: 4 };
        assert_eq!(e.to_string(), "grid dimensions must be positive, got 0x4");
        let e = CoreError::BufferSize { expected: 64, actual: 60 };
        assert_eq!(e.to_string(), "output buffer holds 60 bytes, expected 64");
    }
}
