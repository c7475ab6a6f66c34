//! Calibration table behaviour against a real database: interpolation,
//! boundary errors, table replacement atomicity and vessel fills.

mod common;

use shared::error::DomainError;
use shared::models::CalibrationPointInput;
use station_core::CalibrationService;
use station_core::db::repository::{calibration, vessel};

fn points(pairs: &[(f64, f64)]) -> Vec<CalibrationPointInput> {
    pairs
        .iter()
        .map(|&(height, volume)| CalibrationPointInput { height, volume })
        .collect()
}

async fn seed_table(ctx: &common::TestContext, pairs: &[(f64, f64)]) {
    let service = CalibrationService::new(ctx.db.clone());
    let report = service
        .replace_table(ctx.vessel_id, points(pairs))
        .await
        .unwrap();
    assert!(report.is_valid());
}

#[tokio::test]
async fn test_interpolation_between_points() {
    let ctx = common::setup().await;
    seed_table(&ctx, &[(0.0, 0.0), (10.0, 500.0), (20.0, 1200.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    // Halfway between (10, 500) and (20, 1200)
    let volume = service.interpolate_height(ctx.vessel_id, 15.0).await.unwrap();
    assert_eq!(volume, 850.0);
}

#[tokio::test]
async fn test_exact_point_needs_no_interpolation() {
    let ctx = common::setup().await;
    seed_table(&ctx, &[(0.0, 0.0), (10.0, 500.0), (20.0, 1200.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    assert_eq!(
        service.interpolate_height(ctx.vessel_id, 10.0).await.unwrap(),
        500.0
    );
    assert_eq!(
        service.interpolate_height(ctx.vessel_id, 20.0).await.unwrap(),
        1200.0
    );
}

#[tokio::test]
async fn test_height_outside_table_is_an_error() {
    let ctx = common::setup().await;
    seed_table(&ctx, &[(5.0, 100.0), (10.0, 500.0), (20.0, 1200.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    let too_high = service.interpolate_height(ctx.vessel_id, 25.0).await;
    assert!(matches!(
        too_high,
        Err(DomainError::CalibrationRange { min, max, .. }) if min == 5.0 && max == 20.0
    ));

    let too_low = service.interpolate_height(ctx.vessel_id, 2.0).await;
    assert!(matches!(too_low, Err(DomainError::CalibrationRange { .. })));
}

#[tokio::test]
async fn test_zero_height_is_empty_even_below_table_start() {
    let ctx = common::setup().await;
    // Table starts above zero, but a zero dip still means an empty vessel
    seed_table(&ctx, &[(5.0, 100.0), (20.0, 1200.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    assert_eq!(
        service.interpolate_height(ctx.vessel_id, 0.0).await.unwrap(),
        0.0
    );
}

#[tokio::test]
async fn test_vessel_without_table_reports_missing_data() {
    let ctx = common::setup().await;
    let service = CalibrationService::new(ctx.db.clone());

    let result = service.interpolate_height(ctx.vessel_id, 10.0).await;
    assert!(matches!(
        result,
        Err(DomainError::MissingCalibrationData { vessel_id }) if vessel_id == ctx.vessel_id
    ));
}

#[tokio::test]
async fn test_unknown_vessel_is_not_found() {
    let ctx = common::setup().await;
    let service = CalibrationService::new(ctx.db.clone());

    let result = service.interpolate_height(9999, 10.0).await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_replacement_leaves_old_table_intact() {
    let ctx = common::setup().await;
    seed_table(&ctx, &[(0.0, 0.0), (10.0, 500.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    // Non-ascending heights must be rejected wholesale
    let result = service
        .replace_table(ctx.vessel_id, points(&[(0.0, 0.0), (10.0, 500.0), (10.0, 700.0)]))
        .await;
    assert!(matches!(result, Err(DomainError::Validation(_))));

    let mut conn = ctx.db.pool.acquire().await.unwrap();
    let stored = calibration::find_by_vessel(&mut conn, ctx.vessel_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].volume, 500.0);
}

#[tokio::test]
async fn test_replacement_with_decreasing_volume_warns_but_applies() {
    let ctx = common::setup().await;
    let service = CalibrationService::new(ctx.db.clone());

    let report = service
        .replace_table(ctx.vessel_id, points(&[(0.0, 0.0), (10.0, 500.0), (20.0, 400.0)]))
        .await
        .unwrap();
    assert!(report.is_valid());
    assert!(!report.warnings.is_empty());

    let mut conn = ctx.db.pool.acquire().await.unwrap();
    let stored = calibration::find_by_vessel(&mut conn, ctx.vessel_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn test_validate_vessel_reports_on_the_stored_table() {
    let ctx = common::setup().await;
    let service = CalibrationService::new(ctx.db.clone());

    // Nothing stored yet
    let report = service.validate_vessel(ctx.vessel_id).await.unwrap();
    assert!(!report.is_valid());

    // Decreasing volume is stored with a warning, and validation keeps
    // reporting it afterwards
    seed_table(&ctx, &[(0.0, 0.0), (10.0, 500.0), (20.0, 400.0)]).await;
    let report = service.validate_vessel(ctx.vessel_id).await.unwrap();
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test]
async fn test_vessel_fill_updates_level_and_returns_delta() {
    let ctx = common::setup().await;
    seed_table(&ctx, &[(0.0, 0.0), (10.0, 500.0), (20.0, 1200.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    // Tanker delivery raised the dip from 10 to 15
    let delta = service
        .record_vessel_fill(ctx.vessel_id, 10.0, 15.0)
        .await
        .unwrap();
    assert_eq!(delta, 350.0);

    let mut conn = ctx.db.pool.acquire().await.unwrap();
    let stored = vessel::find_by_id(&mut conn, ctx.vessel_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_height, 15.0);
    assert_eq!(stored.current_volume, 850.0);
}

#[tokio::test]
async fn test_vessel_drain_has_negative_delta() {
    let ctx = common::setup().await;
    seed_table(&ctx, &[(0.0, 0.0), (10.0, 500.0), (20.0, 1200.0)]).await;
    let service = CalibrationService::new(ctx.db.clone());

    let delta = service
        .record_vessel_fill(ctx.vessel_id, 15.0, 10.0)
        .await
        .unwrap();
    assert_eq!(delta, -350.0);
}
