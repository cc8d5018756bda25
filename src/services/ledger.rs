//! Per-night exclusivity for hotels.
//!
//! A stay is expanded into one row per night in `hotel_availability`; the
//! table's unique `(hotel_id, night)` constraint turns "does this range overlap
//! a confirmed stay" into a set of point checks SQLite enforces on its own.
//! Disjoint stays never touch the same row and so never contend.

use chrono::{NaiveDate, Utc};
use rusqlite::Transaction;

use crate::db::queries;
use crate::errors::{is_unique_violation, AppError};
use crate::models::Stay;

// Nights inserted before a conflict are only undone when the surrounding
// transaction is dropped; callers must abort the unit of work on error.
pub fn claim_nights(tx: &Transaction<'_>, hotel_id: &str, stay: &Stay) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();

    for night in stay.nights() {
        match queries::insert_availability_lock(tx, hotel_id, night, now) {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => {
                tracing::info!(hotel_id, %night, "night already claimed");
                return Err(AppError::already_booked());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

pub fn release_nights(
    tx: &Transaction<'_>,
    hotel_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<usize, AppError> {
    let released = queries::delete_availability_range(tx, hotel_id, start, end)?;
    tracing::debug!(hotel_id, %start, %end, released, "released nights");
    Ok(released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::models::Hotel;

    fn setup() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("test.db")).unwrap();
        let conn = store.connect().unwrap();
        queries::insert_hotel(
            &conn,
            &Hotel {
                id: "h1".to_string(),
                name: "Harbour Inn".to_string(),
                city: "Goa".to_string(),
                country: "India".to_string(),
                price_per_night: 1000,
            },
        )
        .unwrap();
        (dir, store)
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn stay(a: &str, b: &str) -> Stay {
        Stay::new(d(a), d(b)).unwrap()
    }

    fn locked_nights(store: &Store) -> Vec<NaiveDate> {
        let conn = store.connect().unwrap();
        queries::get_availability_locks(&conn, "h1", d("2000-01-01"), d("2100-01-01"))
            .unwrap()
            .into_iter()
            .map(|l| l.night)
            .collect()
    }

    #[test]
    fn test_claim_inserts_one_lock_per_night() {
        let (_dir, store) = setup();
        store
            .unit_of_work_blocking(|tx| claim_nights(tx, "h1", &stay("2024-06-01", "2024-06-03")))
            .unwrap();
        assert_eq!(locked_nights(&store), vec![d("2024-06-01"), d("2024-06-02")]);
    }

    #[test]
    fn test_overlapping_claim_conflicts_and_commits_nothing() {
        let (_dir, store) = setup();
        store
            .unit_of_work_blocking(|tx| claim_nights(tx, "h1", &stay("2024-06-02", "2024-06-03")))
            .unwrap();

        // 06-01 would be inserted before 06-02 collides; it must not survive
        let result = store
            .unit_of_work_blocking(|tx| claim_nights(tx, "h1", &stay("2024-06-01", "2024-06-04")));
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(locked_nights(&store), vec![d("2024-06-02")]);
    }

    #[test]
    fn test_adjacent_stays_do_not_conflict() {
        let (_dir, store) = setup();
        store
            .unit_of_work_blocking(|tx| claim_nights(tx, "h1", &stay("2024-06-01", "2024-06-03")))
            .unwrap();
        store
            .unit_of_work_blocking(|tx| claim_nights(tx, "h1", &stay("2024-06-03", "2024-06-05")))
            .unwrap();
        assert_eq!(locked_nights(&store).len(), 4);
    }

    #[test]
    fn test_release_is_scoped_and_idempotent() {
        let (_dir, store) = setup();
        store
            .unit_of_work_blocking(|tx| claim_nights(tx, "h1", &stay("2024-06-01", "2024-06-05")))
            .unwrap();

        let released = store
            .unit_of_work_blocking(|tx| release_nights(tx, "h1", d("2024-06-02"), d("2024-06-04")))
            .unwrap();
        assert_eq!(released, 2);
        assert_eq!(locked_nights(&store), vec![d("2024-06-01"), d("2024-06-04")]);

        let released = store
            .unit_of_work_blocking(|tx| release_nights(tx, "h1", d("2024-06-02"), d("2024-06-04")))
            .unwrap();
        assert_eq!(released, 0);
    }
}
