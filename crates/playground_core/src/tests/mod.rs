//! Scenario tests for the sweep pipeline
//!
//! Tests are organized by topic:
//! - `sweep` - Grid execution, ordering and per-cell fault isolation
//! - `persistence` - Full pipeline through the result sink and back from disk
