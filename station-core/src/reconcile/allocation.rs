//! Payment allocation aggregation (支付方式分摊)
//!
//! Keeps a shift's payment-method breakdown balanced against its sales
//! total: applies a correction's monetary delta to the shift's cash
//! allocation, recomputes every method's percentage against the new total,
//! and re-buckets allocations into category totals.

use sqlx::SqliteConnection;

use shared::error::DomainResult;
use shared::models::{CategoryTotals, MethodCategory, PaymentAllocation};

use crate::db::repository::allocation;
use crate::money::{percentage_of, to_decimal, to_money_f64};

/// Result of applying a monetary delta to a shift's allocations
#[derive(Debug, Clone)]
pub struct AllocationAdjustment {
    /// Method code that absorbed the delta (None when no cash allocation
    /// exists — tolerated no-op fallback)
    pub method: Option<String>,
    /// Delta actually applied to that allocation, after flooring at zero
    pub applied_delta: f64,
    /// Re-bucketed category totals over all allocations
    pub buckets: CategoryTotals,
}

/// Sum allocations into per-category totals
pub fn bucket_totals(allocations: &[PaymentAllocation]) -> CategoryTotals {
    let mut cash = to_decimal(0.0);
    let mut card = to_decimal(0.0);
    let mut transfer = to_decimal(0.0);
    let mut other = to_decimal(0.0);

    for alloc in allocations {
        let amount = to_decimal(alloc.amount);
        match alloc.category {
            MethodCategory::Cash => cash += amount,
            MethodCategory::Card => card += amount,
            MethodCategory::Transfer => transfer += amount,
            MethodCategory::Other => other += amount,
        }
    }

    CategoryTotals {
        cash: to_money_f64(cash),
        card: to_money_f64(card),
        transfer: to_money_f64(transfer),
        other: to_money_f64(other),
    }
}

/// Apply a correction's value delta to a shift's allocation breakdown
///
/// The delta lands on the shift's largest cash-category allocation (sales
/// corrections settle against the drawer). Percentages of *all*
/// allocations are recomputed against `new_total_sales`, and category
/// buckets are rebuilt. The caller persists the shift row's totals.
pub async fn apply_delta(
    conn: &mut SqliteConnection,
    shift_id: i64,
    delta_value: f64,
    new_total_sales: f64,
) -> DomainResult<AllocationAdjustment> {
    let mut allocations = allocation::find_by_shift(&mut *conn, shift_id).await?;

    // Ordered by amount DESC, so the first cash allocation is the largest
    let target = allocations
        .iter()
        .position(|a| a.category == MethodCategory::Cash);

    let (method, applied_delta) = match target {
        Some(idx) => {
            let alloc = &mut allocations[idx];
            let old_amount = to_decimal(alloc.amount);
            let mut new_amount = old_amount + to_decimal(delta_value);
            if new_amount.is_sign_negative() {
                tracing::warn!(
                    shift_id,
                    method = %alloc.method,
                    amount = alloc.amount,
                    delta_value,
                    "Allocation delta would go negative, flooring at zero (breaks Σ invariant)"
                );
                new_amount = to_decimal(0.0);
            }
            alloc.amount = to_money_f64(new_amount);
            (
                Some(alloc.method.clone()),
                to_money_f64(new_amount - old_amount),
            )
        }
        None => {
            tracing::warn!(
                shift_id,
                delta_value,
                "No cash allocation found for shift, delta not absorbed"
            );
            (None, 0.0)
        }
    };

    // Every allocation's percentage is recomputed against the new total
    for alloc in &mut allocations {
        alloc.percentage = percentage_of(alloc.amount, new_total_sales);
        allocation::update_amount(&mut *conn, alloc.id, alloc.amount, alloc.percentage).await?;
    }

    Ok(AllocationAdjustment {
        method,
        applied_delta,
        buckets: bucket_totals(&allocations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(method: &str, category: MethodCategory, amount: f64) -> PaymentAllocation {
        PaymentAllocation {
            id: 0,
            shift_id: 1,
            method: method.into(),
            category,
            amount,
            percentage: 0.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn buckets_sum_per_category() {
        let allocations = vec![
            alloc("EFECTIVO", MethodCategory::Cash, 120.50),
            alloc("TARJETA", MethodCategory::Card, 300.0),
            alloc("VISA", MethodCategory::Card, 50.25),
            alloc("BIZUM", MethodCategory::Transfer, 29.25),
        ];
        let buckets = bucket_totals(&allocations);
        assert_eq!(buckets.cash, 120.50);
        assert_eq!(buckets.card, 350.25);
        assert_eq!(buckets.transfer, 29.25);
        assert_eq!(buckets.other, 0.0);
    }

    #[test]
    fn empty_breakdown_buckets_to_zero() {
        assert_eq!(bucket_totals(&[]), CategoryTotals::default());
    }
}
