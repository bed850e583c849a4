//! Revert records for store mutations.

use xds_core::BoxResource;

/// Which kind of mutation a [`Revert`] undoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertKind {
    /// Undoes an upsert.
    Upsert,
    /// Undoes a delete.
    Delete,
}

/// Record of how to undo one store mutation.
///
/// Applying a revert puts `prior` back under `(type_url, name)`: it is
/// re-inserted when `Some`, and the resource is removed when `None` (the
/// undone upsert created it). Reverts are plain data so they can cross
/// threads and be inspected in tests; see
/// [`ResourceMutator::revert`](crate::ResourceMutator::revert).
#[derive(Debug, Clone)]
pub struct Revert {
    kind: RevertKind,
    type_url: String,
    name: String,
    prior: Option<BoxResource>,
}

impl Revert {
    /// Create a revert record.
    pub fn new(
        kind: RevertKind,
        type_url: impl Into<String>,
        name: impl Into<String>,
        prior: Option<BoxResource>,
    ) -> Self {
        Self {
            kind,
            type_url: type_url.into(),
            name: name.into(),
            prior,
        }
    }

    /// Which kind of mutation this undoes.
    #[inline]
    pub fn kind(&self) -> RevertKind {
        self.kind
    }

    /// Type URL of the mutated resource.
    #[inline]
    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// Name of the mutated resource.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value to restore, `None` to remove the resource.
    #[inline]
    pub fn prior(&self) -> Option<&BoxResource> {
        self.prior.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, String, Option<BoxResource>) {
        (self.type_url, self.name, self.prior)
    }
}
