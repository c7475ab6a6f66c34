//! 审计日志存储层
//!
//! Append-only 设计，没有任何删除/更新接口。
//! `append` 与调用方业务变更共用同一个事务：回滚的修正不会留下审计痕迹。
//! `details` 以写入时的序列化文本原样存储，验证时直接对文本再哈希，
//! 不存在数值精度漂移问题。

use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;

use super::types::{AuditChainBreak, AuditChainVerification, AuditEntry, AuditEvent};
use crate::db::repository::RepoResult;

const COLUMNS: &str = "sequence, timestamp, action, resource_type, resource_id, \
                       operator_id, operator_name, description, details, prev_hash, curr_hash";

/// 追加一条审计日志
///
/// 1. 事务内查询当前最大序列号和 last_hash（SQLite 单写者，天然串行）
/// 2. 计算新条目的哈希
/// 3. 写入条目
pub async fn append(conn: &mut SqliteConnection, event: AuditEvent) -> RepoResult<AuditEntry> {
    let last = latest(&mut *conn).await?;
    let (sequence, prev_hash) = match &last {
        Some(last) => (last.sequence + 1, last.curr_hash.clone()),
        None => (1, "genesis".to_string()),
    };

    let timestamp = shared::util::now_millis();
    let details = event.details.to_string();
    let action_str = serde_json::to_string(&event.action).unwrap_or_default();

    let entry = AuditEntry {
        sequence,
        timestamp,
        action: event.action,
        resource_type: event.resource_type,
        resource_id: event.resource_id,
        operator_id: event.operator_id,
        operator_name: event.operator_name,
        description: event.description,
        details,
        prev_hash,
        curr_hash: String::new(),
    };
    let curr_hash = compute_entry_hash(&entry, &action_str);

    sqlx::query(&format!(
        "INSERT INTO audit_log ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(entry.sequence)
    .bind(entry.timestamp)
    .bind(entry.action)
    .bind(&entry.resource_type)
    .bind(&entry.resource_id)
    .bind(entry.operator_id)
    .bind(entry.operator_name.as_deref())
    .bind(&entry.description)
    .bind(&entry.details)
    .bind(&entry.prev_hash)
    .bind(&curr_hash)
    .execute(&mut *conn)
    .await?;

    Ok(AuditEntry { curr_hash, ..entry })
}

/// 最新一条审计日志
pub async fn latest(conn: &mut SqliteConnection) -> RepoResult<Option<AuditEntry>> {
    let entry = sqlx::query_as::<_, AuditEntry>(&format!(
        "SELECT {COLUMNS} FROM audit_log ORDER BY sequence DESC LIMIT 1"
    ))
    .fetch_optional(conn)
    .await?;
    Ok(entry)
}

/// 查询最后 N 条审计日志（倒序）
pub async fn query_last(conn: &mut SqliteConnection, count: u32) -> RepoResult<Vec<AuditEntry>> {
    let entries = sqlx::query_as::<_, AuditEntry>(&format!(
        "SELECT {COLUMNS} FROM audit_log ORDER BY sequence DESC LIMIT ?"
    ))
    .bind(count)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

/// 验证整条哈希链
///
/// 从序列号 1 起重新推导每条记录的哈希并比对存储值及链接关系，
/// 报告所有断裂点。
pub async fn verify_chain(conn: &mut SqliteConnection) -> RepoResult<AuditChainVerification> {
    let entries = sqlx::query_as::<_, AuditEntry>(&format!(
        "SELECT {COLUMNS} FROM audit_log ORDER BY sequence ASC"
    ))
    .fetch_all(conn)
    .await?;

    let mut breaks = Vec::new();
    let mut expected_prev = "genesis".to_string();

    for entry in &entries {
        if entry.prev_hash != expected_prev {
            breaks.push(AuditChainBreak {
                sequence: entry.sequence,
                expected_hash: expected_prev.clone(),
                actual_hash: entry.prev_hash.clone(),
            });
        }
        let action_str = serde_json::to_string(&entry.action).unwrap_or_default();
        let recomputed = compute_entry_hash(entry, &action_str);
        if recomputed != entry.curr_hash {
            breaks.push(AuditChainBreak {
                sequence: entry.sequence,
                expected_hash: recomputed,
                actual_hash: entry.curr_hash.clone(),
            });
        }
        expected_prev = entry.curr_hash.clone();
    }

    Ok(AuditChainVerification {
        total_entries: entries.len() as u64,
        chain_intact: breaks.is_empty(),
        breaks,
    })
}

/// 计算审计条目的 SHA256 哈希
///
/// 所有存储字段参与哈希，任何修改都会导致不匹配。
///
/// 设计要点：
/// - 变长字段间用 `\x00` 分隔，防止 `("ab","cd")` 与 `("abc","d")` 碰撞
/// - 定长字段（i64）用 LE 字节序，无需分隔
/// - Optional 字段用 `\x00`=None / `\x01`+bytes=Some 区分，避免 None 与空值碰撞
/// - action 使用 serde 序列化（snake_case，跨版本稳定），而非 Debug trait
fn compute_entry_hash(entry: &AuditEntry, action_str: &str) -> String {
    let mut hasher = Sha256::new();

    // 链接前一条哈希
    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(b"\x00");

    // 定长字段
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.timestamp.to_le_bytes());

    // action — serde snake_case (稳定格式，与 DB 存储一致)
    hasher.update(action_str.as_bytes());
    hasher.update(b"\x00");

    // 变长字符串字段 — 分隔符隔离
    hasher.update(entry.resource_type.as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.resource_id.as_bytes());
    hasher.update(b"\x00");

    // Optional 字段 — tag byte 区分 None/Some
    match entry.operator_id {
        Some(id) => {
            hasher.update(b"\x01");
            hasher.update(id.to_le_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    hasher.update(b"\x00");
    hash_optional(&mut hasher, entry.operator_name.as_deref());

    hasher.update(entry.description.as_bytes());
    hasher.update(b"\x00");

    // details — 写入时的规范序列化文本
    hasher.update(entry.details.as_bytes());
    hasher.update(b"\x00");

    format!("{:x}", hasher.finalize())
}

/// Optional 字段哈希：`\x00` = None, `\x01` + bytes + `\x00` = Some
fn hash_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update(b"\x01");
            hasher.update(v.as_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    hasher.update(b"\x00");
}
