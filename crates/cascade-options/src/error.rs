//! Error types for option declaration, sourcing and lookup.

/// Boxed cause carried by [`OptionError::SourceFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while declaring, sourcing or reading options.
#[derive(Debug, thiserror::Error)]
pub enum OptionError {
    /// The option was never declared at the store that was asked.
    #[error("Option `{name}` is not known by this store.")]
    UnknownOption { name: String },

    /// Two descriptors in one declared set share a canonical name.
    #[error("Duplicate option `{name}` found.")]
    DuplicateOption { name: String },

    /// A raw value does not satisfy the option's conversion rule.
    #[error("Failed to parse `{raw}` for option '{name}': {reason}")]
    Parse {
        name: String,
        raw: String,
        reason: String,
    },

    /// A stored value could not be read back as the requested type.
    #[error("Option '{name}' does not hold a {expected} value.")]
    TypeMismatch { name: String, expected: &'static str },

    /// A source failed while reading its input or delivering values.
    #[error("Source '{source_name}' failed: {cause}")]
    SourceFailure {
        source_name: String,
        #[source]
        cause: BoxError,
    },
}

impl OptionError {
    /// Create an unknown-option error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownOption { name: name.into() }
    }

    /// Create a duplicate-option error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateOption { name: name.into() }
    }

    /// Create a parse error.
    pub fn parse(name: impl Into<String>, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.into(),
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a failure raised inside a source.
    pub fn source_failure(source_name: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::SourceFailure {
            source_name: source_name.into(),
            cause: cause.into(),
        }
    }

    /// Returns true for [`OptionError::UnknownOption`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::UnknownOption { .. })
    }
}
