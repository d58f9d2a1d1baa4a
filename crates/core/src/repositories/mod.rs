//! Document and annotation services.
//!
//! Every document write goes through the mutation guard; annotation writes check their span
//! against the stored document text inside the same transaction.

pub mod annotations;
pub mod documents;
