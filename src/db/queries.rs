use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    AvailabilityLock, Booking, BookingStatus, GuestCounts, Hotel, IntentStatus, PaymentIntent,
};

// ── Hotels ──

pub fn insert_hotel(conn: &Connection, hotel: &Hotel) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO hotels (id, name, city, country, price_per_night) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            hotel.id,
            hotel.name,
            hotel.city,
            hotel.country,
            hotel.price_per_night
        ],
    )?;
    Ok(())
}

pub fn get_hotel(conn: &Connection, id: &str) -> rusqlite::Result<Option<Hotel>> {
    conn.query_row(
        "SELECT id, name, city, country, price_per_night FROM hotels WHERE id = ?1",
        params![id],
        |row| {
            Ok(Hotel {
                id: row.get(0)?,
                name: row.get(1)?,
                city: row.get(2)?,
                country: row.get(3)?,
                price_per_night: row.get(4)?,
            })
        },
    )
    .optional()
}

// ── Availability ──

pub fn insert_availability_lock(
    conn: &Connection,
    hotel_id: &str,
    night: NaiveDate,
    created_at: NaiveDateTime,
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO hotel_availability (hotel_id, night, created_at) VALUES (?1, ?2, ?3)",
    )?;
    stmt.execute(params![hotel_id, night, created_at])?;
    Ok(())
}

pub fn delete_availability_range(
    conn: &Connection,
    hotel_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM hotel_availability WHERE hotel_id = ?1 AND night >= ?2 AND night < ?3",
        params![hotel_id, start, end],
    )
}

pub fn get_availability_locks(
    conn: &Connection,
    hotel_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> rusqlite::Result<Vec<AvailabilityLock>> {
    let mut stmt = conn.prepare(
        "SELECT hotel_id, night, created_at FROM hotel_availability
         WHERE hotel_id = ?1 AND night >= ?2 AND night < ?3 ORDER BY night ASC",
    )?;

    let rows = stmt.query_map(params![hotel_id, start, end], |row| {
        Ok(AvailabilityLock {
            hotel_id: row.get(0)?,
            night: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?;

    rows.collect()
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, hotel_id, user_id, check_in, check_out, total_cost, status, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO bookings
             (id, hotel_id, user_id, check_in, check_out, total_cost, status, created_at,
              updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.hotel_id,
            booking.user_id,
            booking.check_in,
            booking.check_out,
            booking.total_cost,
            booking.status,
            booking.created_at,
            booking.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    updated_at: NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status, updated_at, id],
    )?;
    Ok(count > 0)
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], parse_booking_row)?;
    rows.collect()
}

pub fn get_bookings_page(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
    ))?;

    let rows = stmt.query_map(params![limit, offset], parse_booking_row)?;
    rows.collect()
}

pub fn count_bookings(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
}

pub fn get_confirmed_bookings_for_hotel(
    conn: &Connection,
    hotel_id: &str,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE hotel_id = ?1 AND status = 'confirmed'
         ORDER BY check_in ASC"
    ))?;

    let rows = stmt.query_map(params![hotel_id], parse_booking_row)?;
    rows.collect()
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        hotel_id: row.get(1)?,
        user_id: row.get(2)?,
        check_in: row.get(3)?,
        check_out: row.get(4)?,
        total_cost: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// ── Payment Intents ──

const INTENT_COLUMNS: &str =
    "order_id, user_id, hotel_id, check_in, check_out, adult_count, child_count, amount, currency, \
     status, booking_id, provider_status, payment_session_id, created_at, updated_at";

pub fn insert_payment_intent(conn: &Connection, intent: &PaymentIntent) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO payment_intents ({INTENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            intent.order_id,
            intent.user_id,
            intent.hotel_id,
            intent.check_in,
            intent.check_out,
            intent.guests.adult_count,
            intent.guests.child_count,
            intent.amount,
            intent.currency,
            intent.status,
            intent.booking_id,
            intent.provider_status,
            intent.payment_session_id,
            intent.created_at,
            intent.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_payment_intent(
    conn: &Connection,
    order_id: &str,
) -> rusqlite::Result<Option<PaymentIntent>> {
    conn.query_row(
        &format!("SELECT {INTENT_COLUMNS} FROM payment_intents WHERE order_id = ?1"),
        params![order_id],
        parse_intent_row,
    )
    .optional()
}

// Only `created` intents move; returns false otherwise.
pub fn mark_intent_paid(
    conn: &Connection,
    order_id: &str,
    booking_id: &str,
    provider_status: &str,
    updated_at: NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE payment_intents
         SET status = 'paid', booking_id = ?1, provider_status = ?2, updated_at = ?3
         WHERE order_id = ?4 AND status = 'created'",
        params![booking_id, provider_status, updated_at, order_id],
    )?;
    Ok(count > 0)
}

pub fn mark_intent_failed(
    conn: &Connection,
    order_id: &str,
    provider_status: &str,
    updated_at: NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE payment_intents SET status = 'failed', provider_status = ?1, updated_at = ?2
         WHERE order_id = ?3 AND status = 'created'",
        params![provider_status, updated_at, order_id],
    )?;
    Ok(count > 0)
}

pub fn set_payment_session_id(
    conn: &Connection,
    order_id: &str,
    payment_session_id: &str,
    updated_at: NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE payment_intents SET payment_session_id = ?1, updated_at = ?2 WHERE order_id = ?3",
        params![payment_session_id, updated_at, order_id],
    )?;
    Ok(count > 0)
}

fn parse_intent_row(row: &rusqlite::Row) -> rusqlite::Result<PaymentIntent> {
    Ok(PaymentIntent {
        order_id: row.get(0)?,
        user_id: row.get(1)?,
        hotel_id: row.get(2)?,
        check_in: row.get(3)?,
        check_out: row.get(4)?,
        guests: GuestCounts {
            adult_count: row.get(5)?,
            child_count: row.get(6)?,
        },
        amount: row.get(7)?,
        currency: row.get(8)?,
        status: row.get::<_, IntentStatus>(9)?,
        booking_id: row.get(10)?,
        provider_status: row.get(11)?,
        payment_session_id: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
