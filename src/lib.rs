// 特定の警告を無効化
#![allow(clippy::all)]
#![allow(clippy::needless_return)]
#![allow(clippy::redundant_closure)]
#![allow(clippy::let_and_return)]

pub mod cell;
pub mod error;
pub mod io;
pub mod stats;
pub mod table;
pub mod vis;

// Re-export commonly used types
pub use cell::CellValue;
pub use error::TabRSError;
pub use stats::{BoundsTracker, FeatureBounds, FeatureSummary};
pub use table::{DataTable, RecordInput, RecordView};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
