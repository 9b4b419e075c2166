// ABOUTME: Error types for the axgrease engine including ErrorCode enum and TweakError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing different categories of engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A selector failed to compile at rule registration time.
    Selector,
    /// Malformed declarative rule data.
    Config,
    /// A transform failed while acting on a specific element.
    Transform,
    /// A mutation record could not be interpreted.
    Mutation,
    /// An engine lifecycle precondition was violated.
    Lifecycle,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Selector => "invalid selector",
            ErrorCode::Config => "config error",
            ErrorCode::Transform => "transform error",
            ErrorCode::Mutation => "mutation error",
            ErrorCode::Lifecycle => "lifecycle error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for engine operations.
///
/// `selector` carries the originating rule selector where one exists;
/// lifecycle and config errors leave it empty.
#[derive(Debug, thiserror::Error)]
pub struct TweakError {
    pub code: ErrorCode,
    pub selector: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for TweakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axgrease: {}", self.op)?;
        if !self.selector.is_empty() {
            write!(f, " '{}'", self.selector)?;
        }
        write!(f, ": {}", self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl TweakError {
    /// Create a Selector error.
    pub fn selector(
        selector: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Selector,
            selector: selector.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Config error.
    pub fn config(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::Config,
            selector: String::new(),
            op: op.into(),
            source,
        }
    }

    /// Create a Transform error.
    pub fn transform(
        selector: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code: ErrorCode::Transform,
            selector: selector.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Mutation error.
    pub fn mutation(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::Mutation,
            selector: String::new(),
            op: op.into(),
            source,
        }
    }

    /// Create a Lifecycle error.
    pub fn lifecycle(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::Lifecycle,
            selector: String::new(),
            op: op.into(),
            source,
        }
    }

    /// Returns true if this is a Selector error.
    pub fn is_selector(&self) -> bool {
        self.code == ErrorCode::Selector
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }

    /// Returns true if this is a Transform error.
    pub fn is_transform(&self) -> bool {
        self.code == ErrorCode::Transform
    }

    /// Returns true if this is a Mutation error.
    pub fn is_mutation(&self) -> bool {
        self.code == ErrorCode::Mutation
    }

    /// Returns true if this is a Lifecycle error.
    pub fn is_lifecycle(&self) -> bool {
        self.code == ErrorCode::Lifecycle
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TweakError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_selector_when_present() {
        let err = TweakError::transform(
            "div.items > *",
            "apply",
            Some(anyhow::anyhow!("missing child")),
        );
        let s = err.to_string();
        assert!(s.contains("apply"));
        assert!(s.contains("div.items > *"));
        assert!(s.contains("transform error"));
        assert!(s.contains("missing child"));
    }

    #[test]
    fn display_omits_empty_selector() {
        let err = TweakError::lifecycle("start", None);
        assert_eq!(err.to_string(), "axgrease: start: lifecycle error");
    }

    #[test]
    fn code_predicates() {
        assert!(TweakError::selector("x", "compile", None).is_selector());
        assert!(TweakError::config("parse", None).is_config());
        assert!(TweakError::mutation("route", None).is_mutation());
        assert!(!TweakError::mutation("route", None).is_transform());
    }
}
