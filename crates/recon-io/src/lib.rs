//! # Recon IO
//!
//! 對帳引擎的檔案介面：收件匣、確認檔、計劃訂單與輸出報表

pub mod confirmation_files;
pub mod error;
pub mod inbox;
pub mod paths;
pub mod planned_orders;
pub mod reports;

// Re-export 主要類型
pub use confirmation_files::{
    confirmation_sources, discover_confirmation_files, ConfirmationFile, FileConfirmationSource,
};
pub use error::{IoError, Result};
pub use inbox::read_inbox;
pub use paths::{new_production_file, production_timestamp, timestamped_file};
pub use planned_orders::{load_planned_orders, PlannedOrderFile};
pub use reports::ReportWriter;
