//! Correction cascade over a real shift chain: forward propagation,
//! fixed downstream quantities, allocation re-balancing and the register.

mod common;

use std::sync::Arc;

use shared::error::DomainError;
use shared::models::{AllocationInput, CascadePhase, ShiftStatus};
use station_core::{CascadeReconciler, RegisterService};

async fn first_reading_id(ctx: &common::TestContext, shift_id: i64) -> i64 {
    ctx.shifts().readings_of(shift_id).await.unwrap()[0].id
}

/// Two cash shifts on one hose; the upstream quantity gets corrected.
///
/// Counter starts at 100. Shift A closes at 150 (50 sold), shift B at 180
/// (30 sold). Correcting A to 70 sold moves A's close to 170 and re-anchors
/// B onto [170, 200] without touching B's quantity.
#[tokio::test]
async fn test_correction_cascades_forward() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    let b = common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    let outcome = ctx
        .reconciler()
        .correct_meter_reading(reading_a, 70.0, Some(1), Some("Ana".into()))
        .await
        .unwrap();

    assert_eq!(outcome.cascade.phase, CascadePhase::Committed);
    assert_eq!(outcome.cascade.delta_quantity, 20.0);
    assert_eq!(outcome.cascade.delta_value, 30.0);
    assert_eq!(outcome.cascade.shifts_visited, 1);
    assert_eq!(outcome.cascade.readings_updated, 1);

    assert_eq!(outcome.reading.previous_reading, 100.0);
    assert_eq!(outcome.reading.current_reading, 170.0);
    assert_eq!(outcome.reading.quantity_sold, 70.0);
    assert_eq!(outcome.reading.sale_value, 105.0);

    let downstream = &ctx.shifts().readings_of(b.id).await.unwrap()[0];
    assert_eq!(downstream.previous_reading, 170.0);
    assert_eq!(downstream.current_reading, 200.0);
    assert_eq!(downstream.quantity_sold, 30.0);
}

#[tokio::test]
async fn test_edited_shift_totals_and_breakdown_rebalance() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    let b = common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    ctx.reconciler()
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();

    let shifts = ctx.shifts().shift_chain(ctx.station_id).await.unwrap();
    let edited = shifts.iter().find(|s| s.id == a.id).unwrap();
    assert_eq!(edited.total_volume, 70.0);
    assert_eq!(edited.total_sales, 105.0);
    assert_eq!(edited.cash_total, 105.0);

    // Downstream totals deliberately stay: its quantity never changed
    let following = shifts.iter().find(|s| s.id == b.id).unwrap();
    assert_eq!(following.total_sales, 45.0);

    let allocations = ctx.shifts().allocations_of(a.id).await.unwrap();
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].amount, 105.0);
    assert_eq!(allocations[0].percentage, 100.0);
}

#[tokio::test]
async fn test_delta_lands_on_largest_cash_allocation_only() {
    let ctx = common::setup().await;
    let a = common::closed_shift(
        &ctx,
        "2024-03-01",
        "06:00",
        ctx.hose_id,
        150.0,
        vec![
            AllocationInput { method: "EFECTIVO".into(), amount: 30.0 },
            AllocationInput { method: "TARJETA".into(), amount: 45.0 },
        ],
    )
    .await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    ctx.reconciler()
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();

    let allocations = ctx.shifts().allocations_of(a.id).await.unwrap();
    let cash = allocations.iter().find(|al| al.method == "EFECTIVO").unwrap();
    let card = allocations.iter().find(|al| al.method == "TARJETA").unwrap();
    assert_eq!(cash.amount, 60.0);
    assert_eq!(card.amount, 45.0);

    // Percentages recomputed over the new total of 105
    assert_eq!(cash.percentage, 57.14);
    assert_eq!(card.percentage, 42.86);
}

#[tokio::test]
async fn test_register_cache_matches_chain_derivation() {
    let ctx = common::setup().await;
    common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    let b = common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;

    let shifts = ctx.shifts().shift_chain(ctx.station_id).await.unwrap();
    let reading_a = first_reading_id(&ctx, shifts[0].id).await;
    ctx.reconciler()
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();

    let registers = RegisterService::new(ctx.db.clone(), ctx.config.clone());
    let derived = registers
        .chained_cash_balance(ctx.station_id, b.id)
        .await
        .unwrap();
    assert_eq!(derived.closing_balance, 150.0);

    let mut conn = ctx.db.pool.acquire().await.unwrap();
    let cached = station_core::db::repository::register::find_by_station(&mut conn, ctx.station_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.current_balance, derived.closing_balance);
}

#[tokio::test]
async fn test_reducing_a_quantity_cascades_too() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    let b = common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    let outcome = ctx
        .reconciler()
        .correct_meter_reading(reading_a, 20.0, None, None)
        .await
        .unwrap();
    assert_eq!(outcome.cascade.delta_value, -45.0);
    assert_eq!(outcome.reading.current_reading, 120.0);

    let downstream = &ctx.shifts().readings_of(b.id).await.unwrap()[0];
    assert_eq!(downstream.previous_reading, 120.0);
    assert_eq!(downstream.current_reading, 150.0);

    let allocations = ctx.shifts().allocations_of(a.id).await.unwrap();
    assert_eq!(allocations[0].amount, 30.0);

    let mut conn = ctx.db.pool.acquire().await.unwrap();
    let cached = station_core::db::repository::register::find_by_station(&mut conn, ctx.station_id)
        .await
        .unwrap()
        .unwrap();
    // 30 cash from A plus 45 from B
    assert_eq!(cached.current_balance, 75.0);
}

#[tokio::test]
async fn test_correction_is_idempotent() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    let reconciler = ctx.reconciler();
    reconciler
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();
    let again = reconciler
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();

    assert_eq!(again.cascade.delta_quantity, 0.0);
    assert_eq!(again.cascade.delta_value, 0.0);
    assert_eq!(again.cascade.readings_updated, 0);
}

#[tokio::test]
async fn test_finalized_shift_rejects_correction() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    ctx.shifts().finalize_shift(a.id).await.unwrap();

    let reading_a = first_reading_id(&ctx, a.id).await;
    let result = ctx
        .reconciler()
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await;
    assert!(matches!(
        result,
        Err(DomainError::ShiftLocked { shift_id }) if shift_id == a.id
    ));
}

#[tokio::test]
async fn test_finalized_downstream_is_still_re_anchored() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    let b = common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;
    ctx.shifts().finalize_shift(b.id).await.unwrap();

    let reading_a = first_reading_id(&ctx, a.id).await;
    ctx.reconciler()
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();

    // Finalization locks a shift's own edits, not chain continuity repairs
    let downstream = &ctx.shifts().readings_of(b.id).await.unwrap()[0];
    assert_eq!(downstream.previous_reading, 170.0);
    assert_eq!(downstream.current_reading, 200.0);
    let stored = ctx.shifts().shift_chain(ctx.station_id).await.unwrap();
    assert_eq!(stored.iter().find(|s| s.id == b.id).unwrap().status, ShiftStatus::Finalized);
}

/// A shift where the hose stayed idle carries the corrected counter
/// through without a rewrite.
#[tokio::test]
async fn test_idle_shift_carries_counter_through() {
    let ctx = common::setup().await;
    let hose2 = ctx.add_hose("2A", 0.0).await;

    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    common::closed_shift(&ctx, "2024-03-01", "14:00", hose2, 40.0, common::all_cash(60.0)).await;
    let c = common::closed_shift(&ctx, "2024-03-01", "22:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    let outcome = ctx
        .reconciler()
        .correct_meter_reading(reading_a, 70.0, None, None)
        .await
        .unwrap();
    assert_eq!(outcome.cascade.shifts_visited, 2);
    assert_eq!(outcome.cascade.readings_updated, 1);

    let downstream = &ctx.shifts().readings_of(c.id).await.unwrap()[0];
    assert_eq!(downstream.previous_reading, 170.0);
    assert_eq!(downstream.current_reading, 200.0);
}

#[tokio::test]
async fn test_chain_bound_is_fatal_not_truncating() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;
    let b = common::closed_shift(&ctx, "2024-03-01", "14:00", ctx.hose_id, 180.0, common::all_cash(45.0)).await;
    common::closed_shift(&ctx, "2024-03-01", "22:00", ctx.hose_id, 200.0, common::all_cash(30.0)).await;

    let mut tight = (*ctx.config).clone();
    tight.max_chain_hops = 1;
    let reconciler = CascadeReconciler::new(ctx.db.clone(), Arc::new(tight));

    let reading_a = first_reading_id(&ctx, a.id).await;
    let result = reconciler.correct_meter_reading(reading_a, 70.0, None, None).await;
    assert!(matches!(
        result,
        Err(DomainError::ChainBoundExceeded { shift_id, max_hops: 1 }) if shift_id == a.id
    ));

    // Aborted wholesale: nothing downstream moved
    let downstream = &ctx.shifts().readings_of(b.id).await.unwrap()[0];
    assert_eq!(downstream.previous_reading, 150.0);
}

/// Valuation always uses the current price. Correcting a reading to the
/// same quantity after a price change still revalues the sale.
#[tokio::test]
async fn test_correction_revalues_at_the_current_price() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;

    let mut conn = ctx.db.pool.acquire().await.unwrap();
    station_core::db::repository::product::update_price(&mut conn, ctx.product_id, 2.00)
        .await
        .unwrap();
    let product = station_core::db::repository::product::find_by_id(&mut conn, ctx.product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.unit_price, 2.00);
    drop(conn);

    let reading_a = first_reading_id(&ctx, a.id).await;
    let outcome = ctx
        .reconciler()
        .correct_meter_reading(reading_a, 50.0, None, None)
        .await
        .unwrap();

    assert_eq!(outcome.cascade.delta_quantity, 0.0);
    assert_eq!(outcome.cascade.delta_value, 25.0);
    assert_eq!(outcome.reading.current_reading, 150.0);
    assert_eq!(outcome.reading.unit_price, 2.00);
    assert_eq!(outcome.reading.sale_value, 100.0);

    let allocations = ctx.shifts().allocations_of(a.id).await.unwrap();
    assert_eq!(allocations[0].amount, 100.0);
}

#[tokio::test]
async fn test_negative_quantity_is_rejected() {
    let ctx = common::setup().await;
    let a = common::closed_shift(&ctx, "2024-03-01", "06:00", ctx.hose_id, 150.0, common::all_cash(75.0)).await;

    let reading_a = first_reading_id(&ctx, a.id).await;
    let result = ctx
        .reconciler()
        .correct_meter_reading(reading_a, -5.0, None, None)
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}
