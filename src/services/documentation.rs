use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Courtside booking API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::directory::list_arenas,
        crate::routes::directory::get_arena,
        crate::routes::directory::list_courts,
        crate::routes::directory::get_court,
        crate::routes::directory::create_arena,
        crate::routes::directory::update_arena,
        crate::routes::directory::create_court,
        crate::routes::directory::update_court,
        crate::routes::bookings::available_slots,
        crate::routes::bookings::courts_availability,
        crate::routes::bookings::create_booking,
        crate::routes::bookings::my_bookings,
        crate::routes::bookings::get_booking,
        crate::routes::bookings::confirm_payment,
        crate::routes::bookings::cancel_booking,
        crate::routes::bookings::list_bookings,
        crate::routes::bookings::booking_stats,
        crate::routes::bookings::update_status,
        crate::routes::vouchers::list_active,
        crate::routes::vouchers::check_voucher,
        crate::routes::vouchers::list_all,
        crate::routes::vouchers::create_voucher,
        crate::routes::vouchers::update_voucher,
        crate::routes::users::get_profile,
        crate::routes::users::update_profile,
        crate::routes::users::list_users,
        crate::routes::users::create_user,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::booking::CreateBookingRequest,
            crate::dto::booking::UpdateBookingStatusRequest,
            crate::dto::booking::ConfirmPaymentRequest,
            crate::dto::booking::BookingResponse,
            crate::dto::booking::BookingStatsResponse,
            crate::dto::booking::CourtAvailabilityResponse,
            crate::dto::booking::SlotStatusResponse,
            crate::dto::booking::SlotState,
            crate::dto::directory::ArenaRequest,
            crate::dto::directory::ArenaResponse,
            crate::dto::directory::CreateCourtRequest,
            crate::dto::directory::UpdateCourtRequest,
            crate::dto::directory::CourtResponse,
            crate::dto::voucher::VoucherRequest,
            crate::dto::voucher::VoucherResponse,
            crate::dto::voucher::VoucherCheckResponse,
            crate::dto::user::CreateUserRequest,
            crate::dto::user::UpdateProfileRequest,
            crate::dto::user::UserResponse,
            crate::dto::sse::SlotAvailability,
            crate::dto::sse::SlotAvailabilityEvent,
            crate::dto::sse::BookingStatusEvent,
            crate::dto::sse::ConnectedEvent,
            crate::dto::sse::ResyncRequiredEvent,
            crate::state::lifecycle::BookingStatus,
            crate::state::lifecycle::PaymentStatus,
            crate::state::auth::UserRole,
            crate::dao::models::CourtType,
            crate::dao::models::CourtStatus,
            crate::dao::models::DiscountType,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "directory", description = "Arenas and courts"),
        (name = "bookings", description = "Availability and the booking flow"),
        (name = "vouchers", description = "Discount vouchers"),
        (name = "users", description = "User profiles"),
        (name = "admin", description = "Back-office operations"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_booking_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/bookings"));
        assert!(
            doc.paths
                .paths
                .contains_key("/api/bookings/admin/{invoice_number}/status")
        );
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
