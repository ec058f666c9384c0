//! Matches a time-ordered sequence of noisy positional observations onto the
//! most plausible path through a directed road graph.
//!
//! Four subsystems compose into the core: a geodetic/planar geometry kernel
//! ([`geo`]), a Hilbert-packed static spatial index ([`index`]), a
//! near-line-merge directed graph builder ([`graph`]), and a log-space HMM
//! map matcher with Viterbi decoding ([`hmm`], [`matching`]) whose
//! transition term leans on A* shortest-path search ([`search`]).
//!
//! [`config`] carries the caller-assembled tuning for a match; [`wkt_io`]
//! and [`batch`] are peripheral utilities (WKT ingestion and a `rayon`
//! batch-matching helper) that sit outside the four core subsystems.

pub mod batch;
pub mod config;
pub mod geo;
pub mod graph;
pub mod hmm;
pub mod index;
pub mod matching;
pub mod observation;
pub mod search;
pub mod util;
pub mod wkt_io;

pub use observation::Observation;
