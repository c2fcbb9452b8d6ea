//! Option descriptors.
//!
//! [`AnyOpt`] is the untyped descriptor sources and stores work with.
//! [`Opt<T>`] wraps one with the Rust type its values convert to, so reads
//! come back typed:
//!
//! ```
//! use cascade_options::Opt;
//! use std::time::Duration;
//!
//! let verbose = Opt::boolean("verbose");
//! let timeout = Opt::duration("request timeout").default_value(Duration::from_secs(30));
//! assert!(verbose.is_boolean());
//! assert_eq!(timeout.name(), "request timeout");
//! ```
//!
//! Descriptors are compared by identity, not by name: two `Opt::string("name")`
//! calls produce two distinct options.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::name::canonical;
use crate::value::{FromValue, IntoValue, OptionKind, OptionValue};
use crate::OptionError;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(u64);

#[derive(Debug)]
struct OptionSpec {
    id: OptionId,
    name: String,
    kind: OptionKind,
    default: Option<OptionValue>,
}

/// An untyped option descriptor.
#[derive(Clone)]
pub struct AnyOpt(Arc<OptionSpec>);

impl AnyOpt {
    /// Declare an option of the given kind. The name is canonicalized.
    pub fn new(name: &str, kind: OptionKind) -> Self {
        Self(Arc::new(OptionSpec {
            id: OptionId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            name: canonical(name),
            kind,
            default: None,
        }))
    }

    fn with_default(self, value: OptionValue) -> Self {
        Self(Arc::new(OptionSpec {
            id: self.0.id,
            name: self.0.name.clone(),
            kind: self.0.kind.clone(),
            default: Some(value),
        }))
    }

    pub fn id(&self) -> OptionId {
        self.0.id
    }

    /// Canonical name: lowercase words separated by single spaces.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &OptionKind {
        &self.0.kind
    }

    /// Fallback value emitted by the defaults source.
    pub fn default(&self) -> Option<&OptionValue> {
        self.0.default.as_ref()
    }

    /// Boolean options also answer to `no`/`not`/`non` spellings.
    pub fn is_boolean(&self) -> bool {
        self.0.kind == OptionKind::Boolean
    }

    /// Convert a raw string into this option's value.
    pub fn parse_value(&self, raw: &str) -> Result<OptionValue, OptionError> {
        self.0
            .kind
            .parse(raw)
            .map_err(|reason| OptionError::parse(self.name(), raw, reason))
    }
}

impl PartialEq for AnyOpt {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for AnyOpt {}

impl Hash for AnyOpt {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for AnyOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opt")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind.label())
            .field("default", &self.0.default)
            .finish()
    }
}

impl fmt::Display for AnyOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// A typed option descriptor.
pub struct Opt<T> {
    inner: AnyOpt,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Opt<T> {
    fn declare(name: &str, kind: OptionKind) -> Self {
        Self {
            inner: AnyOpt::new(name, kind),
            _marker: PhantomData,
        }
    }

    /// The untyped descriptor.
    pub fn any(&self) -> AnyOpt {
        self.inner.clone()
    }

    pub fn as_any(&self) -> &AnyOpt {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn is_boolean(&self) -> bool {
        self.inner.is_boolean()
    }

    pub fn parse_value(&self, raw: &str) -> Result<OptionValue, OptionError> {
        self.inner.parse_value(raw)
    }
}

impl<T: FromValue> Opt<T> {
    /// The configured fallback, if any.
    pub fn get_default(&self) -> Option<T> {
        self.inner.default().and_then(T::from_value)
    }

    /// Parse a raw string straight into `T`.
    pub fn parse(&self, raw: &str) -> Result<T, OptionError> {
        let value = self.inner.parse_value(raw)?;
        T::from_value(&value).ok_or_else(|| OptionError::TypeMismatch {
            name: self.name().to_string(),
            expected: T::EXPECTED,
        })
    }
}

impl<T: IntoValue> Opt<T> {
    /// Set the fallback value. The descriptor keeps its identity.
    pub fn default_value(self, value: T) -> Self {
        Self {
            inner: self.inner.with_default(value.into_value()),
            _marker: PhantomData,
        }
    }
}

impl Opt<String> {
    pub fn string(name: &str) -> Self {
        Self::declare(name, OptionKind::String)
    }

    /// An option restricted to the given constants.
    pub fn one_of<I, S>(name: &str, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declare(
            name,
            OptionKind::Enum(constants.into_iter().map(Into::into).collect()),
        )
    }

    /// Set the fallback from a string slice.
    pub fn default_str(self, value: &str) -> Self {
        self.default_value(value.to_string())
    }
}

impl Opt<bool> {
    pub fn boolean(name: &str) -> Self {
        Self::declare(name, OptionKind::Boolean)
    }
}

impl Opt<i64> {
    pub fn integer(name: &str) -> Self {
        Self::declare(name, OptionKind::Integer)
    }
}

impl Opt<f64> {
    pub fn float(name: &str) -> Self {
        Self::declare(name, OptionKind::Float)
    }
}

impl Opt<PathBuf> {
    pub fn path(name: &str) -> Self {
        Self::declare(name, OptionKind::Path)
    }
}

impl Opt<Url> {
    pub fn uri(name: &str) -> Self {
        Self::declare(name, OptionKind::Uri)
    }

    /// Parse and set the fallback.
    pub fn default_uri(self, raw: &str) -> Result<Self, OptionError> {
        let url = self.parse(raw)?;
        Ok(self.default_value(url))
    }
}

impl Opt<Duration> {
    pub fn duration(name: &str) -> Self {
        Self::declare(name, OptionKind::Duration)
    }

    /// Parse and set the fallback from a duration expression like `5m 30s`.
    pub fn default_expr(self, raw: &str) -> Result<Self, OptionError> {
        let duration = self.parse(raw)?;
        Ok(self.default_value(duration))
    }
}

impl<T> Clone for Opt<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Opt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T> PartialEq for Opt<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> From<Opt<T>> for AnyOpt {
    fn from(opt: Opt<T>) -> Self {
        opt.inner
    }
}

impl<T> From<&Opt<T>> for AnyOpt {
    fn from(opt: &Opt<T>) -> Self {
        opt.inner.clone()
    }
}

impl From<&AnyOpt> for AnyOpt {
    fn from(opt: &AnyOpt) -> Self {
        opt.clone()
    }
}

impl<T> AsRef<AnyOpt> for Opt<T> {
    fn as_ref(&self) -> &AnyOpt {
        &self.inner
    }
}

impl AsRef<AnyOpt> for AnyOpt {
    fn as_ref(&self) -> &AnyOpt {
        self
    }
}
