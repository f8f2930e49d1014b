//! Security primitives for tinywaf.
//!
//! - **Patterns**: Immutable regex set describing forbidden request paths
//! - **Ban Table**: DashMap of client identifier to ban expiry, lazily evicted
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             Security Module              │
//! ├────────────────────┬─────────────────────┤
//! │     PatternSet     │      BanTable       │
//! │  regex, read-only  │  DashMap, per-key   │
//! │  shared lock-free  │  atomic check+evict │
//! └────────────────────┴─────────────────────┘
//! ```

pub mod ban_table;
pub mod patterns;

pub use ban_table::BanTable;
pub use patterns::PatternSet;
