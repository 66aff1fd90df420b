/// Slot boards and blocked-slot computation.
pub mod availability;
/// Booking creation, lifecycle changes and statistics.
pub mod booking_service;
/// Arena and court catalogue.
pub mod directory_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Background expiry of unpaid holds.
pub mod expiry_sweeper;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events subscription and streaming.
pub mod sse_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// User accounts and profiles.
pub mod user_service;
/// Voucher eligibility, discounts and maintenance.
pub mod voucher_service;
