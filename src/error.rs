//! Error types for the container.

use std::fmt;

/// Container errors.
///
/// Represents the error conditions that can occur during token registration,
/// resolution, or chain execution.
///
/// `NotFound` doubles as the not-found sentinel: resolution is probed
/// speculatively across provider lists, target chains and parent containers,
/// so an unregistered token is an ordinary, recoverable outcome. Callers that
/// want a fallback use [`Container::get_or`](crate::Container::get_or) instead
/// of matching on the error.
///
/// # Examples
///
/// ```rust
/// use ferric_ioc::DiError;
///
/// let not_found = DiError::NotFound("MyService".to_string());
/// let circular = DiError::Circular(vec!["A".to_string(), "B".to_string(), "A".to_string()]);
///
/// // All errors implement Display
/// println!("Error: {}", not_found);
/// println!("Error: {}", circular);
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// Token has no registration in the consulted containers
    NotFound(String),
    /// Type downcast failed
    TypeMismatch(&'static str),
    /// Circular constructor dependency detected (includes the full path)
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    DepthExceeded(usize),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "Token not found: {}", name),
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;
