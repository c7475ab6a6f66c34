//! 审计日志类型定义
//!
//! 所有条目不可变、不可删除，支持 SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 标定 ═══
    /// 整罐进油（液位差换算体积）
    VesselFillRecorded,
    /// 标定表整体替换
    CalibrationReplaced,

    // ═══ 班次 ═══
    /// 班次开启
    ShiftOpened,
    /// 班次关闭
    ShiftClosed,
    /// 班次锁定（不可再修正）
    ShiftFinalized,

    // ═══ 修正（财务关键）═══
    /// 计量读数修正 + 前向级联
    MeterReadingCorrected,
    /// 手工现金存取
    CashMovementRecorded,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 待写入的审计事件
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    /// 资源类型（如 "shift", "meter_reading", "vessel"）
    pub resource_type: String,
    /// 资源 ID
    pub resource_id: String,
    /// 操作人 ID（系统事件为 None）
    pub operator_id: Option<i64>,
    /// 操作人名称
    pub operator_name: Option<String>,
    /// 人类可读描述
    pub description: String,
    /// 结构化详情（修正场景含 before/after 快照）
    pub details: serde_json::Value,
}

/// 审计日志条目（不可变）
///
/// 每条记录包含 SHA256 哈希链：
/// - `prev_hash`: 前一条记录的哈希
/// - `curr_hash`: 当前记录的哈希（包含 prev_hash + 所有字段）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    /// 全局递增序列号
    pub sequence: i64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<i64>,
    pub operator_name: Option<String>,
    pub description: String,
    /// 结构化详情（JSON 文本，写入时的规范序列化）
    pub details: String,
    pub prev_hash: String,
    pub curr_hash: String,
}

/// 审计链验证结果
#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    /// 验证的记录总数
    pub total_entries: u64,
    /// 链是否完整
    pub chain_intact: bool,
    /// 断裂点列表
    pub breaks: Vec<AuditChainBreak>,
}

/// 审计链断裂点
#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    /// 断裂处的序列号
    pub sequence: i64,
    /// 期望的哈希
    pub expected_hash: String,
    /// 实际存储的哈希
    pub actual_hash: String,
}
