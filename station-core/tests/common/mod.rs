//! Shared fixture for integration tests: temp database plus a seeded
//! station with one product, one vessel and one hose.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use shared::models::{
    AllocationInput, DispenserCreate, HoseCreate, HoseReadingInput, ProductCreate, ShiftClose,
    ShiftClosure, ShiftOpen, StationCreate, VesselCreate,
};
use station_core::db::repository::{dispenser, hose, product, register, station, vessel};
use station_core::{CascadeReconciler, Config, DbService, ShiftService};

pub const UNIT_PRICE: f64 = 1.50;

pub struct TestContext {
    pub db: DbService,
    pub config: Arc<Config>,
    pub station_id: i64,
    pub product_id: i64,
    pub vessel_id: i64,
    pub hose_id: i64,
    // Dropped last, keeps the database file alive for the test's duration
    _dir: TempDir,
}

impl TestContext {
    pub fn shifts(&self) -> ShiftService {
        ShiftService::new(self.db.clone(), self.config.clone())
    }

    pub fn reconciler(&self) -> CascadeReconciler {
        CascadeReconciler::new(self.db.clone(), self.config.clone())
    }

    /// Add a second hose on the same dispenser and product
    pub async fn add_hose(&self, label: &str, initial_reading: f64) -> i64 {
        let mut conn = self.db.pool.acquire().await.unwrap();
        let d = dispenser::create(
            &mut conn,
            DispenserCreate {
                station_id: self.station_id,
                name: format!("Dispenser for {label}"),
            },
        )
        .await
        .unwrap();
        hose::create(
            &mut conn,
            HoseCreate {
                dispenser_id: d.id,
                product_id: self.product_id,
                label: label.to_string(),
                last_reading: Some(initial_reading),
            },
        )
        .await
        .unwrap()
        .id
    }
}

pub async fn setup() -> TestContext {
    setup_with(|config| config).await
}

pub async fn setup_with(adjust: impl FnOnce(Config) -> Config) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("station.db");
    let config = Arc::new(adjust(Config::with_overrides(db_path.to_str().unwrap())));
    let db = DbService::new(&config.db_path).await.unwrap();

    let mut conn = db.pool.acquire().await.unwrap();
    let st = station::create(
        &mut conn,
        StationCreate {
            name: "Estación Norte".into(),
        },
    )
    .await
    .unwrap();
    let pr = product::create(
        &mut conn,
        ProductCreate {
            name: "Diesel".into(),
            unit: Some("L".into()),
            unit_price: UNIT_PRICE,
        },
    )
    .await
    .unwrap();
    let ve = vessel::create(
        &mut conn,
        VesselCreate {
            station_id: st.id,
            product_id: pr.id,
            name: "Tank 1".into(),
            capacity: 20_000.0,
            min_level: Some(500.0),
            unit: Some("L".into()),
        },
    )
    .await
    .unwrap();
    let di = dispenser::create(
        &mut conn,
        DispenserCreate {
            station_id: st.id,
            name: "Dispenser 1".into(),
        },
    )
    .await
    .unwrap();
    let ho = hose::create(
        &mut conn,
        HoseCreate {
            dispenser_id: di.id,
            product_id: pr.id,
            label: "1A".into(),
            last_reading: Some(100.0),
        },
    )
    .await
    .unwrap();
    register::ensure(&mut conn, st.id).await.unwrap();
    drop(conn);

    TestContext {
        db,
        config,
        station_id: st.id,
        product_id: pr.id,
        vessel_id: ve.id,
        hose_id: ho.id,
        _dir: dir,
    }
}

/// Open a shift and close it with one cumulative reading on `hose_id`,
/// the whole takings allocated to the given method breakdown
pub async fn closed_shift(
    ctx: &TestContext,
    date: &str,
    time: &str,
    hose_id: i64,
    current_reading: f64,
    allocations: Vec<AllocationInput>,
) -> ShiftClosure {
    let service = ctx.shifts();
    let opened = service
        .open_shift(ShiftOpen {
            station_id: ctx.station_id,
            business_date: date.into(),
            start_time: time.into(),
            operator_id: Some(1),
            operator_name: Some("Ana".into()),
            note: None,
        })
        .await
        .unwrap();
    service
        .close_shift(
            opened.id,
            ShiftClose {
                readings: vec![HoseReadingInput {
                    hose_id,
                    current_reading,
                }],
                allocations,
                note: None,
            },
        )
        .await
        .unwrap()
}

/// Everything paid in cash
pub fn all_cash(amount: f64) -> Vec<AllocationInput> {
    vec![AllocationInput {
        method: "CASH".into(),
        amount,
    }]
}
