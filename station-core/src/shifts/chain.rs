//! Shift chain traversal
//!
//! Shifts chain per station by `(business_date, start_time)`. Traversal is
//! always forward-only, modelled as an explicit bounded cursor rather than
//! recursion: the hop counter makes the safety bound auditable, and hitting
//! it is a fatal `ChainBoundExceeded`, never a silent truncation.

use sqlx::SqliteConnection;

use shared::error::{DomainError, DomainResult};
use shared::models::ShiftClosure;

use crate::db::repository::shift;

/// The shift immediately following the given one, if any
pub async fn following_shift(
    conn: &mut SqliteConnection,
    current: &ShiftClosure,
) -> DomainResult<Option<ShiftClosure>> {
    let next = shift::find_following(
        conn,
        current.station_id,
        &current.business_date,
        &current.start_time,
    )
    .await?;
    Ok(next)
}

/// Bounded forward cursor over one station's shift chain
///
/// `next()` either yields the following shift, yields `None` at the chain
/// end, or fails with `ChainBoundExceeded` once the hop budget is spent.
pub struct ChainCursor {
    position: ShiftClosure,
    origin_shift_id: i64,
    hops: u32,
    max_hops: u32,
}

impl ChainCursor {
    /// Start walking forward from (not including) `origin`
    pub fn after(origin: ShiftClosure, max_hops: u32) -> Self {
        Self {
            origin_shift_id: origin.id,
            position: origin,
            hops: 0,
            max_hops,
        }
    }

    /// Shifts visited so far
    pub fn hops(&self) -> u32 {
        self.hops
    }

    pub async fn next(
        &mut self,
        conn: &mut SqliteConnection,
    ) -> DomainResult<Option<ShiftClosure>> {
        let Some(next) = following_shift(conn, &self.position).await? else {
            return Ok(None);
        };

        self.hops += 1;
        if self.hops > self.max_hops {
            return Err(DomainError::ChainBoundExceeded {
                shift_id: self.origin_shift_id,
                max_hops: self.max_hops,
            });
        }

        self.position = next.clone();
        Ok(Some(next))
    }
}
