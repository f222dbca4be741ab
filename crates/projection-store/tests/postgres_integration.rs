//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p projection-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use common::{CityId, GuestId, HostId, Money, PropertyId, ReservationId};
use domain::ReservationStatus;
use projection_store::{
    AvailabilityFlag, CityReservationEntry, HostReservationEntry, PostgresProjectionStore,
    ProjectionStore,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_projection_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresProjectionStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE occupancy_by_city, availability_by_date, reservations_by_host_date, reservations_by_city_date",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresProjectionStore::new(pool)
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

#[tokio::test]
async fn init_occupancy_is_conditional() {
    let store = get_test_store().await;
    let city = CityId::new(1);

    assert!(store.init_occupancy(city, date(1)).await.unwrap());
    store
        .increment_occupancy(city, date(1), 1, -1)
        .await
        .unwrap();
    assert!(!store.init_occupancy(city, date(1)).await.unwrap());

    let counter = store.get_occupancy(city, date(1)).await.unwrap().unwrap();
    assert_eq!(counter.nights_occupied, 1);
    assert_eq!(counter.nights_available, 0);
}

#[tokio::test]
async fn increment_clamps_at_zero() {
    let store = get_test_store().await;
    let city = CityId::new(1);
    store.init_occupancy(city, date(2)).await.unwrap();

    let counter = store
        .increment_occupancy(city, date(2), -3, -3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(counter.nights_occupied, 0);
    assert_eq!(counter.nights_available, 0);
}

#[tokio::test]
async fn increment_missing_row_returns_none() {
    let store = get_test_store().await;
    let counter = store
        .increment_occupancy(CityId::new(9), date(3), 1, -1)
        .await
        .unwrap();
    assert!(counter.is_none());
}

#[tokio::test]
async fn concurrent_increments_do_not_lose_updates() {
    let store = get_test_store().await;
    let city = CityId::new(1);
    store.init_occupancy(city, date(4)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .increment_occupancy(city, date(4), 1, 0)
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let counter = store.get_occupancy(city, date(4)).await.unwrap().unwrap();
    assert_eq!(counter.nights_occupied, 20);
}

#[tokio::test]
async fn occupancy_range_orders_by_date() {
    let store = get_test_store().await;
    let city = CityId::new(3);
    for day in [5, 1, 3] {
        store.init_occupancy(city, date(day)).await.unwrap();
    }

    let range = store
        .occupancy_range(city, date(1), date(4))
        .await
        .unwrap();
    let days: Vec<_> = range.iter().map(|c| c.date).collect();
    assert_eq!(days, vec![date(1), date(3)]);
}

#[tokio::test]
async fn availability_upsert_overwrites() {
    let store = get_test_store().await;
    let property = PropertyId::new(10);

    store
        .upsert_availability(AvailabilityFlag::now(property, CityId::new(1), date(1), true))
        .await
        .unwrap();
    store
        .upsert_availability(AvailabilityFlag::now(property, CityId::new(1), date(1), false))
        .await
        .unwrap();
    store
        .upsert_availability(AvailabilityFlag::now(
            PropertyId::new(11),
            CityId::new(1),
            date(1),
            true,
        ))
        .await
        .unwrap();
    store
        .upsert_availability(AvailabilityFlag::now(
            PropertyId::new(12),
            CityId::new(2),
            date(1),
            true,
        ))
        .await
        .unwrap();

    let flag = store
        .get_availability(property, date(1))
        .await
        .unwrap()
        .unwrap();
    assert!(!flag.available);

    let available = store.available_properties(date(1), None, 10).await.unwrap();
    let ids: Vec<_> = available.iter().map(|f| f.property_id).collect();
    assert_eq!(ids, vec![PropertyId::new(11), PropertyId::new(12)]);

    let in_city = store
        .available_properties(date(1), Some(CityId::new(1)), 10)
        .await
        .unwrap();
    assert_eq!(in_city.len(), 1);
    assert_eq!(in_city[0].property_id, PropertyId::new(11));
    assert_eq!(in_city[0].city_id, CityId::new(1));
}

#[tokio::test]
async fn host_reservation_round_trip() {
    let store = get_test_store().await;
    let entry = HostReservationEntry {
        host_id: HostId::new(5),
        date: date(1),
        reservation_id: ReservationId::new(100),
        property_id: PropertyId::new(10),
        guest_id: GuestId::new(77),
        amount: Money::from_cents(45_000),
        status: ReservationStatus::Confirmed,
        created_at: Utc::now(),
    };

    store.insert_host_reservation(entry.clone()).await.unwrap();
    let rows = store
        .host_reservations(HostId::new(5), date(1), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reservation_id, entry.reservation_id);
    assert_eq!(rows[0].amount, entry.amount);
    assert_eq!(rows[0].status, ReservationStatus::Confirmed);

    let removed = store
        .delete_host_reservation(HostId::new(5), date(1), ReservationId::new(100))
        .await
        .unwrap();
    assert!(removed);
    assert!(
        store
            .host_reservations(HostId::new(5), date(1), 10)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn city_reservation_round_trip() {
    let store = get_test_store().await;
    let entry = CityReservationEntry {
        city_id: CityId::new(1),
        date: date(1),
        reservation_id: ReservationId::new(100),
        property_id: PropertyId::new(10),
        host_id: HostId::new(5),
        guest_id: GuestId::new(77),
        amount: Money::from_cents(45_000),
        status: ReservationStatus::Confirmed,
        created_at: Utc::now(),
    };

    store.insert_city_reservation(entry.clone()).await.unwrap();
    let rows = store
        .city_reservations(CityId::new(1), date(1), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].host_id, HostId::new(5));
    assert_eq!(rows[0].amount, entry.amount);

    let removed = store
        .delete_city_reservation(CityId::new(1), date(1), ReservationId::new(100))
        .await
        .unwrap();
    assert!(removed);
    assert!(
        store
            .city_reservations(CityId::new(1), date(1), 10)
            .await
            .unwrap()
            .is_empty()
    );
}
