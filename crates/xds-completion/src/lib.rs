//! # xds-completion
//!
//! Completions and wait groups for observing when pushed configuration has
//! taken effect.
//!
//! - [`Completion`] - Single-assignment future, completed once with the
//!   outcome of a push, with an optional synchronous [`Callback`]
//! - [`WaitGroup`] - Aggregates completions under one cancellation context
//!   (explicit cancel and/or deadline)
//!
//! A completion whose context ends before anyone completes it is abandoned:
//! it is never completed, and [`Completion::err`] reports
//! [`CompletionError::Canceled`] or [`CompletionError::DeadlineExceeded`].
//! Components that track completions poll `err` to drop abandoned ones.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use xds_completion::WaitGroup;
//!
//! let wg = WaitGroup::with_timeout(Duration::from_secs(10));
//! let revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster, &nodes, Some(&wg), None);
//! if let Err(err) = wg.wait().await {
//!     tracker.revert(revert, None);
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod completion;
mod context;
mod wait_group;

pub use completion::{Callback, Completion, CompletionId};
pub use wait_group::WaitGroup;
pub use xds_core::CompletionError;
