use core::fmt;

/// Errors reported by map views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The view is a read-only projection of the map.
    UnsupportedOperation,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::UnsupportedOperation => {
                f.write_str("unsupported operation: map entries are read-only")
            }
        }
    }
}

impl std::error::Error for MapError {}
