//! Resource trait for pushed configuration.
//!
//! This module provides the [`Resource`] trait implemented by everything
//! stored in a versioned store, [`AnyResource`] for pre-encoded protobuf
//! messages, and [`same_content`], the structural equality used to decide
//! whether an upsert actually changes anything.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Trait for pushable resources.
///
/// # Example
///
/// ```rust
/// use xds_core::{Resource, TypeUrl};
/// use std::any::Any as StdAny;
///
/// #[derive(Debug)]
/// struct Backend {
///     name: String,
///     port: u16,
/// }
///
/// impl Resource for Backend {
///     fn type_url(&self) -> &str {
///         TypeUrl::ENDPOINT
///     }
///
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn encode(&self) -> Result<prost_types::Any, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(prost_types::Any {
///             type_url: self.type_url().to_string(),
///             value: self.port.to_be_bytes().to_vec(),
///         })
///     }
///
///     fn as_any(&self) -> &dyn StdAny {
///         self
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Get the type URL for this resource.
    fn type_url(&self) -> &str;

    /// Get the resource name.
    fn name(&self) -> &str;

    /// Encode the resource to a protobuf Any message.
    fn encode(&self) -> Result<prost_types::Any, Box<dyn std::error::Error + Send + Sync>>;

    /// Convert to Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a resource.
pub type BoxResource = Arc<dyn Resource>;

/// Error returned by [`same_content`] when a resource fails to encode.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode {type_url}/{name}: {source}")]
pub struct EncodeError {
    /// Type URL of the resource.
    pub type_url: String,
    /// Name of the resource.
    pub name: String,
    /// The encoder's error.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Compare two resources structurally.
///
/// Resources are the same if they are the same allocation, or if their type
/// URL, name and encoded bytes are all equal.
pub fn same_content(a: &BoxResource, b: &BoxResource) -> Result<bool, EncodeError> {
    if Arc::ptr_eq(a, b) {
        return Ok(true);
    }
    if a.type_url() != b.type_url() || a.name() != b.name() {
        return Ok(false);
    }
    let encode = |r: &BoxResource| {
        r.encode().map_err(|source| EncodeError {
            type_url: r.type_url().to_string(),
            name: r.name().to_string(),
            source,
        })
    };
    let (ea, eb) = (encode(a)?, encode(b)?);
    Ok(ea.type_url == eb.type_url && ea.value == eb.value)
}

/// A pre-encoded protobuf message stored as a resource.
#[derive(Debug, Clone)]
pub struct AnyResource {
    name: String,
    any: prost_types::Any,
}

impl AnyResource {
    /// Create a new AnyResource.
    #[must_use]
    pub fn new(name: impl Into<String>, any: prost_types::Any) -> Self {
        Self {
            name: name.into(),
            any,
        }
    }

    /// Build a resource from a type URL and already-encoded bytes.
    #[must_use]
    pub fn from_bytes(type_url: impl Into<String>, name: impl Into<String>, value: Vec<u8>) -> Self {
        Self::new(
            name,
            prost_types::Any {
                type_url: type_url.into(),
                value,
            },
        )
    }

    /// Wrap into a shared [`BoxResource`].
    #[must_use]
    pub fn boxed(self) -> BoxResource {
        Arc::new(self)
    }

    /// Get the inner Any message.
    #[must_use]
    pub fn inner(&self) -> &prost_types::Any {
        &self.any
    }
}

impl Resource for AnyResource {
    fn type_url(&self) -> &str {
        &self.any.type_url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self) -> Result<prost_types::Any, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.any.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
