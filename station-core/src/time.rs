//! 时间工具函数 — 业务时区转换
//!
//! 班次的日期/时间以 TEXT 存储 (`YYYY-MM-DD` / `HH:MM:SS`)，
//! 字典序即时间序，链式遍历直接按字符串比较。

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use shared::error::{DomainError, DomainResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid date format: {date}")))
}

/// 解析时间字符串 (HH:MM:SS 或 HH:MM)
pub fn parse_time(time: &str) -> DomainResult<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .map_err(|_| DomainError::validation(format!("Invalid time format: {time}")))
}

/// 验证日期不在未来 (业务时区)
pub fn validate_not_future(date: NaiveDate, tz: Tz) -> DomainResult<()> {
    let today = chrono::Utc::now().with_timezone(&tz).date_naive();
    if date > today {
        return Err(DomainError::validation(format!(
            "Date {date} is in the future (today is {today})"
        )));
    }
    Ok(())
}
