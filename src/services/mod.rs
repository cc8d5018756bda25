pub mod bookings;
pub mod intents;
pub mod ledger;
pub mod orchestrator;
pub mod payments;
pub mod pricing;
pub mod retry;
