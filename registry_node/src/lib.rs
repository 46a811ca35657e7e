//! DeedChain registry node
//!
//! A property-sale transaction registry built around a guarded workflow:
//! seller consent is verified on video, both parties sign the generated
//! agreement, an official approves, payment is confirmed, and the record
//! is finalized with a content identifier and a chain transaction hash.
//! The workflow engine in [`workflow`] owns every status transition; the
//! rest of the crate is the HTTP surface, identity handling and storage
//! around it.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod consent;
pub mod finalization;
pub mod identity;
pub mod ledger;
pub mod storage;
pub mod workflow;
