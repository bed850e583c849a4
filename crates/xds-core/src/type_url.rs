//! Type URLs identifying resource kinds.
//!
//! A type URL is an opaque string naming a kind of resource within a
//! versioned store. The ack tracker only ever compares type URLs for
//! equality; the constants below cover the kinds pushed to proxies.

use std::borrow::Borrow;
use std::fmt;

use crate::XdsError;

const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Owned type URL.
///
/// # Example
///
/// ```rust
/// use xds_core::TypeUrl;
///
/// let listeners = TypeUrl::new(TypeUrl::LISTENER);
/// assert_eq!(listeners.short_name(), "Listener");
/// assert!(listeners.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeUrl(String);

impl TypeUrl {
    /// Type URL for Cluster (CDS).
    pub const CLUSTER: &'static str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";

    /// Type URL for ClusterLoadAssignment (EDS).
    pub const ENDPOINT: &'static str =
        "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment";

    /// Type URL for Listener (LDS).
    pub const LISTENER: &'static str = "type.googleapis.com/envoy.config.listener.v3.Listener";

    /// Type URL for RouteConfiguration (RDS).
    pub const ROUTE: &'static str =
        "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";

    /// Type URL for Secret (SDS).
    pub const SECRET: &'static str =
        "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret";

    /// Type URL for per-endpoint L7 network policies.
    pub const NETWORK_POLICY: &'static str = "type.googleapis.com/cilium.NetworkPolicy";

    /// Type URL for network policy host mappings.
    pub const NETWORK_POLICY_HOSTS: &'static str =
        "type.googleapis.com/cilium.NetworkPolicyHosts";

    /// Create a new type URL from a string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the type URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last dotted component of the message name.
    ///
    /// `type.googleapis.com/envoy.config.cluster.v3.Cluster` yields `Cluster`;
    /// opaque URLs without separators are returned whole.
    #[must_use]
    pub fn short_name(&self) -> &str {
        let message = self.0.rsplit('/').next().unwrap_or(&self.0);
        message.rsplit('.').next().unwrap_or(message)
    }

    /// Check that the URL names a message under `type.googleapis.com/`.
    pub fn validate(&self) -> Result<(), XdsError> {
        match self.0.strip_prefix(TYPE_URL_PREFIX) {
            Some(message) if !message.is_empty() => Ok(()),
            Some(_) => Err(XdsError::InvalidTypeUrl {
                type_url: self.0.clone(),
                reason: "missing message name".to_string(),
            }),
            None => Err(XdsError::InvalidTypeUrl {
                type_url: self.0.clone(),
                reason: format!("expected prefix {TYPE_URL_PREFIX}"),
            }),
        }
    }
}

impl fmt::Display for TypeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TypeUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TypeUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<TypeUrl> for String {
    fn from(t: TypeUrl) -> Self {
        t.0
    }
}

impl AsRef<str> for TypeUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}
