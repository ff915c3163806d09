//! Domain logic over loaded search indexes.
//!
//! Integrity checks, ranked search, the page outline, statistics, diffs
//! between index generations, and absolute link resolution.

pub mod diff;
pub mod links;
pub mod outline;
pub mod search;
pub mod stats;
pub mod validate;

pub use diff::{IndexDiff, diff_indexes};
pub use outline::{Outline, OutlinePage, OutlineSection, build_outline};
pub use search::{SearchEngine, SearchFilter, SearchHit, search};
pub use stats::{IndexStats, fingerprint, index_stats};
pub use validate::{CheckReport, Issue, IssueKind, Severity, check_index, check_round_trip};
