//! # Inbox Recon
//!
//! 收件匣失敗訊息對帳工具：命令列流程與日誌初始化

pub mod app;
pub mod logging;

pub use app::{run, Cli, RunReport};
