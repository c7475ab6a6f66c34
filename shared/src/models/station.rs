//! Station Model (point of sale)

use serde::{Deserialize, Serialize};

/// A point of sale — one forecourt with its own shift chain and cash register
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create station payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationCreate {
    pub name: String,
}
