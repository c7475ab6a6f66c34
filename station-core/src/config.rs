//! Engine configuration
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | STATION_DB_PATH | station.db | SQLite 数据库文件 |
//! | STATION_TIMEZONE | Europe/Madrid | 业务时区 |
//! | STATION_MAX_CHAIN_HOPS | 5000 | 链式遍历安全上限 |
//! | STATION_METHOD_MAP | (empty) | 额外的 CODE=CATEGORY 映射，逗号分隔 |

use std::collections::HashMap;

use chrono_tz::Tz;

use shared::models::MethodCategory;

/// Method-code → category mapping, resolved once at configuration time
///
/// Classification happens through this table only; allocation processing
/// never keyword-matches method strings.
#[derive(Debug, Clone)]
pub struct MethodCatalog {
    map: HashMap<String, MethodCategory>,
}

impl MethodCatalog {
    /// Built-in defaults: common English and Spanish method codes
    pub fn builtin() -> Self {
        let mut map = HashMap::new();
        for code in ["CASH", "EFECTIVO", "EFE", "CONTADO"] {
            map.insert(code.to_string(), MethodCategory::Cash);
        }
        for code in [
            "CARD",
            "TARJETA",
            "TJT",
            "VISA",
            "MASTERCARD",
            "CREDIT",
            "DEBIT",
        ] {
            map.insert(code.to_string(), MethodCategory::Card);
        }
        for code in ["TRANSFER", "TRANSFERENCIA", "WIRE", "BIZUM"] {
            map.insert(code.to_string(), MethodCategory::Transfer);
        }
        Self { map }
    }

    /// Built-in defaults plus `CODE=CATEGORY` overrides
    ///
    /// Unparseable pairs are skipped with a warning; an override may also
    /// remap a built-in code.
    pub fn with_overrides(mapping: &str) -> Self {
        let mut catalog = Self::builtin();
        for pair in mapping.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((code, category)) = pair.split_once('=') else {
                tracing::warn!(pair, "Ignoring malformed method mapping (expected CODE=CATEGORY)");
                continue;
            };
            let category = match category.trim().to_uppercase().as_str() {
                "CASH" => MethodCategory::Cash,
                "CARD" => MethodCategory::Card,
                "TRANSFER" => MethodCategory::Transfer,
                "OTHER" => MethodCategory::Other,
                other => {
                    tracing::warn!(category = other, "Ignoring unknown method category");
                    continue;
                }
            };
            catalog.map.insert(code.trim().to_uppercase(), category);
        }
        catalog
    }

    /// Classify a method code; unknown codes fall into `Other`
    pub fn classify(&self, method: &str) -> MethodCategory {
        let code = method.trim().to_uppercase();
        match self.map.get(&code) {
            Some(category) => *category,
            None => {
                tracing::debug!(method, "Unmapped payment method, classified as OTHER");
                MethodCategory::Other
            }
        }
    }
}

impl Default for MethodCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub db_path: String,
    /// Business timezone (shift date/time validation)
    pub timezone: Tz,
    /// Safety bound for forward chain walks
    pub max_chain_hops: u32,
    /// Payment-method classification table
    pub methods: MethodCatalog,
}

impl Config {
    /// 从环境变量加载配置；未设置的项使用默认值
    pub fn from_env() -> Self {
        let timezone = std::env::var("STATION_TIMEZONE")
            .ok()
            .and_then(|tz| tz.parse().ok())
            .unwrap_or(chrono_tz::Europe::Madrid);

        let methods = match std::env::var("STATION_METHOD_MAP") {
            Ok(mapping) => MethodCatalog::with_overrides(&mapping),
            Err(_) => MethodCatalog::builtin(),
        };

        Self {
            db_path: std::env::var("STATION_DB_PATH").unwrap_or_else(|_| "station.db".into()),
            timezone,
            max_chain_hops: std::env::var("STATION_MAX_CHAIN_HOPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            methods,
        }
    }

    /// 使用自定义数据库路径覆盖配置，常用于测试场景
    pub fn with_overrides(db_path: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.db_path = db_path.into();
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_classifies_known_codes() {
        let catalog = MethodCatalog::builtin();
        assert_eq!(catalog.classify("CASH"), MethodCategory::Cash);
        assert_eq!(catalog.classify("efectivo"), MethodCategory::Cash);
        assert_eq!(catalog.classify("Tarjeta"), MethodCategory::Card);
        assert_eq!(catalog.classify("BIZUM"), MethodCategory::Transfer);
        assert_eq!(catalog.classify("SODEXO"), MethodCategory::Other);
    }

    #[test]
    fn overrides_extend_and_remap() {
        let catalog = MethodCatalog::with_overrides("SODEXO=OTHER, wallet=CARD, BIZUM=OTHER");
        assert_eq!(catalog.classify("SODEXO"), MethodCategory::Other);
        assert_eq!(catalog.classify("WALLET"), MethodCategory::Card);
        // Override wins over the built-in mapping
        assert_eq!(catalog.classify("BIZUM"), MethodCategory::Other);
    }

    #[test]
    fn malformed_override_pairs_are_skipped() {
        let catalog = MethodCatalog::with_overrides("nonsense, X=NOPE, OK=CASH");
        assert_eq!(catalog.classify("OK"), MethodCategory::Cash);
        assert_eq!(catalog.classify("X"), MethodCategory::Other);
    }
}
