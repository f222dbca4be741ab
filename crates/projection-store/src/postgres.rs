use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{CityId, GuestId, HostId, Money, PropertyId, ReservationId};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::{
    AvailabilityFlag, CityReservationEntry, HostReservationEntry, OccupancyCounter,
    ProjectionStore, Result, StoreError,
};

/// PostgreSQL-backed projection store.
///
/// The pool is injected by the caller and shared by every clone of the store.
#[derive(Clone)]
pub struct PostgresProjectionStore {
    pool: PgPool,
}

impl PostgresProjectionStore {
    /// Creates a new PostgreSQL projection store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_counter(row: PgRow) -> Result<OccupancyCounter> {
        Ok(OccupancyCounter {
            city_id: CityId::new(row.try_get("city_id")?),
            date: row.try_get("date")?,
            nights_occupied: row.try_get("nights_occupied")?,
            nights_available: row.try_get("nights_available")?,
        })
    }

    fn row_to_flag(row: PgRow) -> Result<AvailabilityFlag> {
        Ok(AvailabilityFlag {
            property_id: PropertyId::new(row.try_get("property_id")?),
            city_id: CityId::new(row.try_get("city_id")?),
            date: row.try_get("date")?,
            available: row.try_get("available")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_entry(row: PgRow) -> Result<HostReservationEntry> {
        let status: String = row.try_get("status")?;
        Ok(HostReservationEntry {
            host_id: HostId::new(row.try_get("host_id")?),
            date: row.try_get("date")?,
            reservation_id: ReservationId::new(row.try_get("reservation_id")?),
            property_id: PropertyId::new(row.try_get("property_id")?),
            guest_id: GuestId::new(row.try_get("guest_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            status: status.parse().map_err(StoreError::InvalidRow)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_city_entry(row: PgRow) -> Result<CityReservationEntry> {
        let status: String = row.try_get("status")?;
        Ok(CityReservationEntry {
            city_id: CityId::new(row.try_get("city_id")?),
            date: row.try_get("date")?,
            reservation_id: ReservationId::new(row.try_get("reservation_id")?),
            property_id: PropertyId::new(row.try_get("property_id")?),
            host_id: HostId::new(row.try_get("host_id")?),
            guest_id: GuestId::new(row.try_get("guest_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            status: status.parse().map_err(StoreError::InvalidRow)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ProjectionStore for PostgresProjectionStore {
    async fn init_occupancy(&self, city_id: CityId, date: NaiveDate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO occupancy_by_city (city_id, date, nights_occupied, nights_available)
            VALUES ($1, $2, 0, 1)
            ON CONFLICT (city_id, date) DO NOTHING
            "#,
        )
        .bind(city_id.as_i64())
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
        occupied_delta: i64,
        available_delta: i64,
    ) -> Result<Option<OccupancyCounter>> {
        // Single-statement update: concurrent deltas on the same key serialize on the row lock.
        let row = sqlx::query(
            r#"
            UPDATE occupancy_by_city
            SET nights_occupied = GREATEST(0, nights_occupied + $3),
                nights_available = GREATEST(0, nights_available + $4)
            WHERE city_id = $1 AND date = $2
            RETURNING city_id, date, nights_occupied, nights_available
            "#,
        )
        .bind(city_id.as_i64())
        .bind(date)
        .bind(occupied_delta)
        .bind(available_delta)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_counter).transpose()
    }

    async fn get_occupancy(
        &self,
        city_id: CityId,
        date: NaiveDate,
    ) -> Result<Option<OccupancyCounter>> {
        let row = sqlx::query(
            r#"
            SELECT city_id, date, nights_occupied, nights_available
            FROM occupancy_by_city
            WHERE city_id = $1 AND date = $2
            "#,
        )
        .bind(city_id.as_i64())
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_counter).transpose()
    }

    async fn occupancy_range(
        &self,
        city_id: CityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccupancyCounter>> {
        let rows = sqlx::query(
            r#"
            SELECT city_id, date, nights_occupied, nights_available
            FROM occupancy_by_city
            WHERE city_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
        )
        .bind(city_id.as_i64())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_counter).collect()
    }

    async fn upsert_availability(&self, flag: AvailabilityFlag) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO availability_by_date (date, property_id, city_id, available, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (date, property_id) DO UPDATE SET
                city_id = EXCLUDED.city_id,
                available = EXCLUDED.available,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(flag.date)
        .bind(flag.property_id.as_i64())
        .bind(flag.city_id.as_i64())
        .bind(flag.available)
        .bind(flag.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_availability(
        &self,
        property_id: PropertyId,
        date: NaiveDate,
    ) -> Result<Option<AvailabilityFlag>> {
        let row = sqlx::query(
            r#"
            SELECT date, property_id, city_id, available, updated_at
            FROM availability_by_date
            WHERE date = $1 AND property_id = $2
            "#,
        )
        .bind(date)
        .bind(property_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_flag).transpose()
    }

    async fn available_properties(
        &self,
        date: NaiveDate,
        city_id: Option<CityId>,
        limit: usize,
    ) -> Result<Vec<AvailabilityFlag>> {
        let rows = sqlx::query(
            r#"
            SELECT date, property_id, city_id, available, updated_at
            FROM availability_by_date
            WHERE date = $1 AND available AND ($2::BIGINT IS NULL OR city_id = $2)
            ORDER BY property_id ASC
            LIMIT $3
            "#,
        )
        .bind(date)
        .bind(city_id.map(|city| city.as_i64()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_flag).collect()
    }

    async fn insert_host_reservation(&self, entry: HostReservationEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations_by_host_date
                (host_id, date, reservation_id, property_id, guest_id, amount_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (host_id, date, reservation_id) DO UPDATE SET
                property_id = EXCLUDED.property_id,
                guest_id = EXCLUDED.guest_id,
                amount_cents = EXCLUDED.amount_cents,
                status = EXCLUDED.status
            "#,
        )
        .bind(entry.host_id.as_i64())
        .bind(entry.date)
        .bind(entry.reservation_id.as_i64())
        .bind(entry.property_id.as_i64())
        .bind(entry.guest_id.as_i64())
        .bind(entry.amount.cents())
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_host_reservation(
        &self,
        host_id: HostId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reservations_by_host_date
            WHERE host_id = $1 AND date = $2 AND reservation_id = $3
            "#,
        )
        .bind(host_id.as_i64())
        .bind(date)
        .bind(reservation_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn host_reservations(
        &self,
        host_id: HostId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<HostReservationEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT host_id, date, reservation_id, property_id, guest_id, amount_cents, status, created_at
            FROM reservations_by_host_date
            WHERE host_id = $1 AND date = $2
            ORDER BY reservation_id ASC
            LIMIT $3
            "#,
        )
        .bind(host_id.as_i64())
        .bind(date)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn insert_city_reservation(&self, entry: CityReservationEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations_by_city_date
                (city_id, date, reservation_id, property_id, host_id, guest_id, amount_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (city_id, date, reservation_id) DO UPDATE SET
                property_id = EXCLUDED.property_id,
                host_id = EXCLUDED.host_id,
                guest_id = EXCLUDED.guest_id,
                amount_cents = EXCLUDED.amount_cents,
                status = EXCLUDED.status
            "#,
        )
        .bind(entry.city_id.as_i64())
        .bind(entry.date)
        .bind(entry.reservation_id.as_i64())
        .bind(entry.property_id.as_i64())
        .bind(entry.host_id.as_i64())
        .bind(entry.guest_id.as_i64())
        .bind(entry.amount.cents())
        .bind(entry.status.as_str())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_city_reservation(
        &self,
        city_id: CityId,
        date: NaiveDate,
        reservation_id: ReservationId,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reservations_by_city_date
            WHERE city_id = $1 AND date = $2 AND reservation_id = $3
            "#,
        )
        .bind(city_id.as_i64())
        .bind(date)
        .bind(reservation_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn city_reservations(
        &self,
        city_id: CityId,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<CityReservationEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT city_id, date, reservation_id, property_id, host_id, guest_id, amount_cents, status, created_at
            FROM reservations_by_city_date
            WHERE city_id = $1 AND date = $2
            ORDER BY reservation_id ASC
            LIMIT $3
            "#,
        )
        .bind(city_id.as_i64())
        .bind(date)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_city_entry).collect()
    }
}
