//! 审计日志
//!
//! 财务敏感操作（班次、读数修正、标定表替换）的不可变审计追踪。
//! Append-only，SHA256 哈希链防篡改。

mod storage;
mod types;

pub use storage::{append, latest, query_last, verify_chain};
pub use types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditEvent,
};
