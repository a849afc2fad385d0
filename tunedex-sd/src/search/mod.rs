//! Fuzzy catalog search
//!
//! Two stages: [`normalize`](normalize::normalize) canonicalizes names,
//! [`matcher::search`] scores normalized queries against precomputed
//! candidate keys and buckets the survivors.

pub mod matcher;
pub mod normalize;

pub use matcher::{search, Candidate, MatchSet, ScoredMatch};
pub use normalize::{normalize, normalize_opt};
