//! Cross-conversation model statistics
//!
//! ```text
//! conversations/*.json → load_conversations → compute_stats → build_rows
//!                                                               ├→ format_table
//!                                                               └→ chart_input → chart::render_chart
//! ```

pub mod error;
pub mod stats;
pub mod table;

pub use error::{AnalyticsError, AnalyticsResult};
pub use stats::{
    build_rows, compute_stats, load_conversation, load_conversations, percentile, stage1_cost,
    ModelStats, StatsRow, StatsSummary,
};
pub use table::{chart_input, format_sig2, format_table};
