// ABOUTME: Error types for the copy pipeline including ErrorCode enum and CopyError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the stage a copy failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Selection,
    Transform,
    Clipboard,
    Image,
    Host,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Selection => "selection error",
            ErrorCode::Transform => "transform error",
            ErrorCode::Clipboard => "clipboard error",
            ErrorCode::Image => "image capture error",
            ErrorCode::Host => "host messaging error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for copy operations.
#[derive(Debug, thiserror::Error)]
pub struct CopyError {
    pub code: ErrorCode,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "larkcopy: {}: {}", self.op, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl CopyError {
    fn with_code(code: ErrorCode, op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code,
            op: op.into(),
            source,
        }
    }

    /// Create a Selection error.
    pub fn selection(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Selection, op, source)
    }

    /// Create a Transform error.
    pub fn transform(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Transform, op, source)
    }

    /// Create a Clipboard error.
    pub fn clipboard(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Clipboard, op, source)
    }

    /// Create an Image error.
    pub fn image(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Image, op, source)
    }

    /// Create a Host error.
    pub fn host(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::with_code(ErrorCode::Host, op, source)
    }

    /// Returns true if this is a Selection error.
    pub fn is_selection(&self) -> bool {
        self.code == ErrorCode::Selection
    }

    /// Returns true if this is a Transform error.
    pub fn is_transform(&self) -> bool {
        self.code == ErrorCode::Transform
    }

    /// Returns true if this is a Clipboard error.
    pub fn is_clipboard(&self) -> bool {
        self.code == ErrorCode::Clipboard
    }

    /// Returns true if this is an Image error.
    pub fn is_image(&self) -> bool {
        self.code == ErrorCode::Image
    }

    /// Returns true if this is a Host error.
    pub fn is_host(&self) -> bool {
        self.code == ErrorCode::Host
    }

    /// Debug rendering of the full source chain, used as the "stack" of error reports.
    pub fn chain(&self) -> String {
        match &self.source {
            Some(src) => format!("{}\n{:?}", self, src),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_code_and_source() {
        let err = CopyError::clipboard("write", Some(anyhow::anyhow!("denied")));
        assert_eq!(err.to_string(), "larkcopy: write: clipboard error: denied");
        assert!(err.is_clipboard());
        assert!(!err.is_image());
    }

    #[test]
    fn display_without_source() {
        let err = CopyError::image("capture", None);
        assert_eq!(err.to_string(), "larkcopy: capture: image capture error");
    }

    #[test]
    fn predicates_match_codes() {
        assert!(CopyError::selection("capture", None).is_selection());
        assert!(CopyError::transform("normalize", None).is_transform());
        assert!(!CopyError::transform("normalize", None).is_selection());
        assert!(CopyError::host("decode", None).is_host());
    }

    #[test]
    fn chain_carries_source() {
        let err = CopyError::transform("clean", Some(anyhow::anyhow!("bad node")));
        let chain = err.chain();
        assert!(chain.starts_with("larkcopy: clean: transform error: bad node"));
        assert!(chain.contains("bad node"));
    }
}
