//! Inbound acknowledgements.
//!
//! A node reports what it applied in its next discovery request: the
//! `version_info` it last applied cleanly, the `response_nonce` of the
//! response it is answering and, on rejection, an error detail.
//! [`AckMessage`] turns those wire fields into the version pair the
//! tracker works with.

use xds_cache::ResourceMutator;
use xds_core::{NodeId, ResourceVersion, XdsResult};

use crate::tracker::AckTracker;

/// Receiver of ack messages and restore-mode transitions.
///
/// Implemented by [`AckTracker`]; the transport layer talks to the tracker
/// through this trait.
pub trait ResourceVersionAckObserver: Send + Sync {
    /// Process one ack message. See
    /// [`AckTracker::handle_resource_version_ack`].
    fn handle_resource_version_ack(
        &self,
        ack_version: u64,
        nack_version: u64,
        node_id: &str,
        resource_names: &[String],
        type_url: &str,
        detail: &str,
    );

    /// Stop registering completions until restoring completes.
    fn mark_restore_pending(&self);

    /// Resume registering completions.
    fn mark_restore_completed(&self);

    /// Process a parsed ack message.
    fn observe(&self, message: &AckMessage) {
        self.handle_resource_version_ack(
            message.ack_version,
            message.nack_version,
            message.node_id.as_str(),
            &message.resource_names,
            &message.type_url,
            &message.detail,
        );
    }
}

impl<M: ResourceMutator> ResourceVersionAckObserver for AckTracker<M> {
    fn handle_resource_version_ack(
        &self,
        ack_version: u64,
        nack_version: u64,
        node_id: &str,
        resource_names: &[String],
        type_url: &str,
        detail: &str,
    ) {
        AckTracker::handle_resource_version_ack(
            self,
            ack_version,
            nack_version,
            node_id,
            resource_names,
            type_url,
            detail,
        );
    }

    fn mark_restore_pending(&self) {
        AckTracker::mark_restore_pending(self);
    }

    fn mark_restore_completed(&self) {
        AckTracker::mark_restore_completed(self);
    }
}

/// One ack message from a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckMessage {
    /// Reporting node.
    pub node_id: NodeId,
    /// Type URL the message is about.
    pub type_url: String,
    /// Last version the node applied cleanly.
    pub ack_version: u64,
    /// Last version the node attempted to apply. Never below `ack_version`.
    pub nack_version: u64,
    /// Resource names the node reported.
    pub resource_names: Vec<String>,
    /// Error detail of a rejection, empty otherwise.
    pub detail: String,
}

impl AckMessage {
    /// Build a message from the fields of a discovery request.
    ///
    /// Empty version strings count as version 0.
    ///
    /// # Errors
    ///
    /// Returns [`XdsError::InvalidVersion`](xds_core::XdsError::InvalidVersion)
    /// if `version_info` or `response_nonce` is not a decimal version.
    pub fn from_request(
        node_id: impl Into<NodeId>,
        type_url: impl Into<String>,
        version_info: &str,
        response_nonce: &str,
        resource_names: Vec<String>,
        error_detail: Option<&str>,
    ) -> XdsResult<Self> {
        let ack_version = ResourceVersion::parse_wire("version_info", version_info)?.get();
        let nonce = ResourceVersion::parse_wire("response_nonce", response_nonce)?.get();
        Ok(Self {
            node_id: node_id.into(),
            type_url: type_url.into(),
            ack_version,
            nack_version: nonce.max(ack_version),
            resource_names,
            detail: error_detail.unwrap_or_default().to_string(),
        })
    }

    /// Check whether the node rejected a version.
    pub fn is_nack(&self) -> bool {
        self.nack_version > self.ack_version
    }
}
