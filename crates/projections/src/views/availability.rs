//! Availability flags: whether a property can be booked on a date.

use chrono::NaiveDate;
use common::{CityId, PropertyId};
use projection_store::{AvailabilityFlag, ProjectionStore};

use crate::Result;
use crate::projection::{Projection, record_write};

const COLLECTION: &str = "availability_by_date";

/// Per (property, date) boolean availability.
///
/// Writes are unconditional upserts with no read-before-write. Concurrent
/// writes to the same key resolve to whichever lands last.
#[derive(Clone)]
pub struct AvailabilityFlags<S> {
    store: S,
}

impl<S: ProjectionStore> AvailabilityFlags<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Overwrites the flag for a property on a date.
    #[tracing::instrument(skip(self), fields(collection = COLLECTION))]
    pub async fn set_available(
        &self,
        property_id: PropertyId,
        city_id: CityId,
        date: NaiveDate,
        available: bool,
    ) -> Result<()> {
        let flag = AvailabilityFlag::now(property_id, city_id, date, available);
        let result = self.store.upsert_availability(flag).await;
        record_write(COLLECTION, result.is_ok());
        Ok(result?)
    }

    /// Returns the flag, or `None` if the date was never generated for the property.
    pub async fn is_available(
        &self,
        property_id: PropertyId,
        date: NaiveDate,
    ) -> Result<Option<bool>> {
        let flag = self.store.get_availability(property_id, date).await?;
        Ok(flag.map(|f| f.available))
    }

    /// Lists properties bookable on a date, ascending by id, optionally
    /// narrowed to one city.
    pub async fn available_properties(
        &self,
        date: NaiveDate,
        city_id: Option<CityId>,
        limit: usize,
    ) -> Result<Vec<PropertyId>> {
        let flags = self.store.available_properties(date, city_id, limit).await?;
        Ok(flags.into_iter().map(|f| f.property_id).collect())
    }
}

impl<S: ProjectionStore> Projection for AvailabilityFlags<S> {
    fn name(&self) -> &'static str {
        "AvailabilityFlags"
    }

    fn collection(&self) -> &'static str {
        COLLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection_store::InMemoryProjectionStore;

    const CITY: CityId = CityId::new(2);

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[tokio::test]
    async fn unknown_date_has_no_flag() {
        let flags = AvailabilityFlags::new(InMemoryProjectionStore::new());
        let value = flags.is_available(PropertyId::new(1), date(1)).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let flags = AvailabilityFlags::new(InMemoryProjectionStore::new());
        let property = PropertyId::new(20);

        flags.set_available(property, CITY, date(1), true).await.unwrap();
        flags.set_available(property, CITY, date(1), false).await.unwrap();
        assert_eq!(
            flags.is_available(property, date(1)).await.unwrap(),
            Some(false)
        );

        flags.set_available(property, CITY, date(1), true).await.unwrap();
        assert_eq!(
            flags.is_available(property, date(1)).await.unwrap(),
            Some(true)
        );
    }

    #[tokio::test]
    async fn dates_are_independent() {
        let flags = AvailabilityFlags::new(InMemoryProjectionStore::new());
        let property = PropertyId::new(20);

        flags.set_available(property, CITY, date(1), true).await.unwrap();
        flags.set_available(property, CITY, date(2), false).await.unwrap();

        assert_eq!(
            flags.is_available(property, date(1)).await.unwrap(),
            Some(true)
        );
        assert_eq!(
            flags.is_available(property, date(2)).await.unwrap(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn lists_available_properties_for_a_date() {
        let flags = AvailabilityFlags::new(InMemoryProjectionStore::new());
        flags.set_available(PropertyId::new(3), CITY, date(1), true).await.unwrap();
        flags.set_available(PropertyId::new(1), CITY, date(1), true).await.unwrap();
        flags.set_available(PropertyId::new(2), CITY, date(1), false).await.unwrap();

        let ids = flags.available_properties(date(1), None, 50).await.unwrap();
        assert_eq!(ids, vec![PropertyId::new(1), PropertyId::new(3)]);
    }

    #[tokio::test]
    async fn listing_can_be_narrowed_to_a_city() {
        let flags = AvailabilityFlags::new(InMemoryProjectionStore::new());
        flags.set_available(PropertyId::new(1), CITY, date(1), true).await.unwrap();
        flags
            .set_available(PropertyId::new(2), CityId::new(9), date(1), true)
            .await
            .unwrap();

        let ids = flags
            .available_properties(date(1), Some(CityId::new(9)), 50)
            .await
            .unwrap();
        assert_eq!(ids, vec![PropertyId::new(2)]);
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let store = InMemoryProjectionStore::new();
        store.fail_writes_on(date(4)).await;
        let flags = AvailabilityFlags::new(store);

        assert!(flags.set_available(PropertyId::new(1), CITY, date(4), false).await.is_err());
        assert!(flags.set_available(PropertyId::new(1), CITY, date(5), false).await.is_ok());
    }
}
