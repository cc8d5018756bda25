pub mod availability;
pub mod booking;
pub mod hotel;
pub mod payment_intent;
pub mod stay;

pub use availability::AvailabilityLock;
pub use booking::{Booking, BookingStatus};
pub use hotel::Hotel;
pub use payment_intent::{GuestCounts, IntentStatus, PaymentIntent};
pub use stay::Stay;
