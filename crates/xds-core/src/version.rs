//! Resource version numbers.
//!
//! Versions are a single monotonically increasing `u64` counter per store.
//! On the wire they travel as decimal strings in `version_info` and
//! `response_nonce`; [`ResourceVersion`] converts between the two forms.

use std::fmt;
use std::str::FromStr;

use crate::XdsError;

/// Version number of a resource store.
///
/// Version `0` is the initial state: nothing has been stored yet, and a
/// node reporting version `0` has only just made first contact.
///
/// # Example
///
/// ```rust
/// use xds_core::ResourceVersion;
///
/// let v = ResourceVersion::parse_wire("version_info", "42").unwrap();
/// assert_eq!(v.get(), 42);
/// assert_eq!(v.to_string(), "42");
///
/// // An empty version string is a node's first request.
/// assert!(ResourceVersion::parse_wire("version_info", "").unwrap().is_initial());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceVersion(u64);

impl ResourceVersion {
    /// The initial version.
    pub const INITIAL: Self = Self(0);

    /// Wrap a version number.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Parse a version string received from a node.
    ///
    /// `field` names the request field for error reporting. Empty strings
    /// parse as the initial version.
    pub fn parse_wire(field: &'static str, value: &str) -> Result<Self, XdsError> {
        if value.is_empty() {
            return Ok(Self::INITIAL);
        }
        value
            .parse::<u64>()
            .map(Self)
            .map_err(|_| XdsError::InvalidVersion {
                field,
                value: value.to_string(),
            })
    }

    /// Check if this is the initial version.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }

    /// Get the raw version number.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The version following this one.
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceVersion {
    type Err = XdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_wire("version", s)
    }
}

impl From<u64> for ResourceVersion {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<ResourceVersion> for u64 {
    fn from(v: ResourceVersion) -> Self {
        v.0
    }
}
