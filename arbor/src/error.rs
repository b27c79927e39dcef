//! Errors raised while building, querying or rendering a tree.

use facet::Facet;

/// Errors that can occur while building or querying a tree.
///
/// All of these are programmer-contract violations: nothing in the crate
/// catches or retries them, they propagate to the caller of the builder API.
#[derive(Facet, Debug, Clone, PartialEq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum BuildError {
    /// existing element {reference} not found
    NotFound { reference: String },

    /// invalid operation: {operation}
    InvalidOperation { operation: String },

    /// {what} is not implemented
    NotImplemented { what: String },

    /// no tag is registered for `{keyword}`
    UnknownTag { keyword: String },

    /// undefined helper `{name}`
    MissingHelper { name: String },

    /// invalid selector `{selector}`: {reason}
    InvalidSelector { selector: String, reason: String },

    /// malformed attribute string at byte {offset}
    MalformedAttributes { offset: usize },
}

impl BuildError {
    pub(crate) fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            reference: reference.into(),
        }
    }

    pub(crate) fn invalid(operation: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation: operation.into(),
        }
    }

    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_messages_name_the_reference() {
        let err = BuildError::not_found("<span#missing>");
        assert_eq!(err.to_string(), "existing element <span#missing> not found");

        let err = BuildError::selector("a[", "unterminated attribute filter");
        assert_eq!(
            err.to_string(),
            "invalid selector `a[`: unterminated attribute filter"
        );
    }
}
