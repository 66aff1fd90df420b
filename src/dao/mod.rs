/// Persistence backends for the directory, vouchers, users and bookings.
pub mod booking_store;
/// Domain records shared by every backend.
pub mod models;
/// Backend-agnostic storage errors and outcomes.
pub mod storage;
