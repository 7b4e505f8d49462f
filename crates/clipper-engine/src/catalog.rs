//! TimeSlot Catalog: the administered, ordered set of bookable slots.

use clipper_core::TimeSlot;
use clipper_db::Database;

use crate::error::EngineResult;

/// Read-only view of the slot catalog.
#[derive(Debug, Clone)]
pub struct TimeSlotCatalog {
    db: Database,
}

impl TimeSlotCatalog {
    pub fn new(db: Database) -> Self {
        TimeSlotCatalog { db }
    }

    /// All slots ordered by start time.
    pub async fn list_slots(&self) -> EngineResult<Vec<TimeSlot>> {
        Ok(self.db.time_slots().list().await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::shop;

    #[tokio::test]
    async fn test_list_slots_in_start_order() {
        let shop = shop().await;
        let slots = shop.engine.catalog().list_slots().await.unwrap();

        assert_eq!(slots, shop.slots);
        assert!(slots.windows(2).all(|w| w[0].start_time < w[1].start_time));
    }
}
