use std::{collections::BTreeSet, fmt::Display};

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{
        ArenaEntity, BookingEntity, CourtEntity, CourtStatus, CourtType, DiscountType, UserEntity,
        VoucherEntity,
    },
    state::{
        auth::UserRole,
        clock::{format_date, parse_date},
        lifecycle::{BookingStatus, PaymentStatus},
        slots::Slot,
    },
};

pub const ARENA_COLLECTION_NAME: &str = "arenas";
pub const COURT_COLLECTION_NAME: &str = "courts";
pub const USER_COLLECTION_NAME: &str = "users";
pub const VOUCHER_COLLECTION_NAME: &str = "vouchers";
pub const BOOKING_COLLECTION_NAME: &str = "bookings";
pub const SLOT_CLAIM_COLLECTION_NAME: &str = "slot_claims";

fn malformed(collection: &'static str, id: &str, reason: impl Display) -> MongoDaoError {
    MongoDaoError::Malformed {
        collection,
        id: id.to_owned(),
        reason: reason.to_string(),
    }
}

fn read_uuid(collection: &'static str, id: &str, value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|err| malformed(collection, id, err))
}

fn read_date(collection: &'static str, id: &str, value: &str) -> MongoResult<Date> {
    parse_date(value).map_err(|err| malformed(collection, id, err))
}

fn read_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoArenaDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price_per_hour: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews_count: i64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub opening_hours: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl From<ArenaEntity> for MongoArenaDocument {
    fn from(value: ArenaEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            address: value.address,
            city: value.city,
            category: value.category,
            description: value.description,
            price_per_hour: value.price_per_hour,
            rating: value.rating,
            reviews_count: i64::from(value.reviews_count),
            images: value.images,
            facilities: value.facilities.into_iter().collect(),
            opening_hours: value.opening_hours,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoArenaDocument> for ArenaEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoArenaDocument) -> MongoResult<Self> {
        Ok(Self {
            id: read_uuid(ARENA_COLLECTION_NAME, &value.id, &value.id)?,
            name: value.name,
            address: value.address,
            city: value.city,
            category: value.category,
            description: value.description,
            price_per_hour: value.price_per_hour,
            rating: value.rating,
            reviews_count: read_count(value.reviews_count),
            images: value.images,
            facilities: value.facilities.into_iter().collect(),
            opening_hours: value.opening_hours,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCourtDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub arena_id: String,
    pub name: String,
    pub court_type: CourtType,
    pub price_per_hour: Option<i64>,
    pub status: CourtStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl From<CourtEntity> for MongoCourtDocument {
    fn from(value: CourtEntity) -> Self {
        Self {
            id: value.id.to_string(),
            arena_id: value.arena_id.to_string(),
            name: value.name,
            court_type: value.court_type,
            price_per_hour: value.price_per_hour,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoCourtDocument> for CourtEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCourtDocument) -> MongoResult<Self> {
        Ok(Self {
            id: read_uuid(COURT_COLLECTION_NAME, &value.id, &value.id)?,
            arena_id: read_uuid(COURT_COLLECTION_NAME, &value.id, &value.arena_id)?,
            name: value.name,
            court_type: value.court_type,
            price_per_hour: value.price_per_hour,
            status: value.status,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            email: value.email,
            phone: value.phone,
            birth_date: value.birth_date.map(format_date),
            role: value.role,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoUserDocument> for UserEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoUserDocument) -> MongoResult<Self> {
        let birth_date = value
            .birth_date
            .as_deref()
            .map(|raw| read_date(USER_COLLECTION_NAME, &value.id, raw))
            .transpose()?;
        Ok(Self {
            id: read_uuid(USER_COLLECTION_NAME, &value.id, &value.id)?,
            name: value.name,
            email: value.email,
            phone: value.phone,
            birth_date,
            role: value.role,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoVoucherDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[serde(default)]
    pub min_purchase: i64,
    pub max_discount: Option<i64>,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub usage_count: i64,
    #[serde(default)]
    pub redeemed_by: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl From<VoucherEntity> for MongoVoucherDocument {
    fn from(value: VoucherEntity) -> Self {
        Self {
            id: value.id.to_string(),
            code: value.code,
            title: value.title,
            description: value.description,
            discount_type: value.discount_type,
            discount_value: value.discount_value,
            min_purchase: value.min_purchase,
            max_discount: value.max_discount,
            start_date: format_date(value.start_date),
            end_date: format_date(value.end_date),
            is_active: value.is_active,
            usage_limit: value.usage_limit.map(i64::from),
            usage_count: i64::from(value.usage_count),
            redeemed_by: value.redeemed_by.iter().map(Uuid::to_string).collect(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoVoucherDocument> for VoucherEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoVoucherDocument) -> MongoResult<Self> {
        let id = value.id.as_str();
        let redeemed_by = value
            .redeemed_by
            .iter()
            .map(|raw| read_uuid(VOUCHER_COLLECTION_NAME, id, raw))
            .collect::<MongoResult<Vec<_>>>()?;
        Ok(Self {
            id: read_uuid(VOUCHER_COLLECTION_NAME, id, id)?,
            start_date: read_date(VOUCHER_COLLECTION_NAME, id, &value.start_date)?,
            end_date: read_date(VOUCHER_COLLECTION_NAME, id, &value.end_date)?,
            code: value.code,
            title: value.title,
            description: value.description,
            discount_type: value.discount_type,
            discount_value: value.discount_value,
            min_purchase: value.min_purchase,
            max_discount: value.max_discount,
            is_active: value.is_active,
            usage_limit: value.usage_limit.map(read_count),
            usage_count: read_count(value.usage_count),
            redeemed_by,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBookingDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub invoice_number: String,
    pub user_id: String,
    pub court_id: String,
    pub arena_id: String,
    pub booking_date: String,
    pub time_slots: BTreeSet<Slot>,
    pub start_time: String,
    pub end_time: String,
    pub total_price: i64,
    pub service_fee: i64,
    pub protection_fee: i64,
    pub discount_amount: i64,
    pub final_total_amount: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub applied_voucher_id: Option<String>,
    #[serde(default)]
    pub voucher_redeemed: bool,
    pub notes: Option<String>,
    pub expiry_time: DateTime,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    #[serde(default)]
    pub version: i64,
}

impl From<BookingEntity> for MongoBookingDocument {
    fn from(value: BookingEntity) -> Self {
        Self {
            id: value.id.to_string(),
            invoice_number: value.invoice_number,
            user_id: value.user_id.to_string(),
            court_id: value.court_id.to_string(),
            arena_id: value.arena_id.to_string(),
            booking_date: format_date(value.booking_date),
            time_slots: value.time_slots,
            start_time: value.start_time,
            end_time: value.end_time,
            total_price: value.total_price,
            service_fee: value.service_fee,
            protection_fee: value.protection_fee,
            discount_amount: value.discount_amount,
            final_total_amount: value.final_total_amount,
            status: value.status,
            payment_status: value.payment_status,
            payment_method: value.payment_method,
            applied_voucher_id: value.applied_voucher_id.map(|id| id.to_string()),
            voucher_redeemed: value.voucher_redeemed,
            notes: value.notes,
            expiry_time: DateTime::from_system_time(value.expiry_time),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            version: version_to_bson(value.version),
        }
    }
}

impl TryFrom<MongoBookingDocument> for BookingEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoBookingDocument) -> MongoResult<Self> {
        let id = value.id.as_str();
        let applied_voucher_id = value
            .applied_voucher_id
            .as_deref()
            .map(|raw| read_uuid(BOOKING_COLLECTION_NAME, id, raw))
            .transpose()?;
        Ok(Self {
            id: read_uuid(BOOKING_COLLECTION_NAME, id, id)?,
            user_id: read_uuid(BOOKING_COLLECTION_NAME, id, &value.user_id)?,
            court_id: read_uuid(BOOKING_COLLECTION_NAME, id, &value.court_id)?,
            arena_id: read_uuid(BOOKING_COLLECTION_NAME, id, &value.arena_id)?,
            booking_date: read_date(BOOKING_COLLECTION_NAME, id, &value.booking_date)?,
            invoice_number: value.invoice_number,
            time_slots: value.time_slots,
            start_time: value.start_time,
            end_time: value.end_time,
            total_price: value.total_price,
            service_fee: value.service_fee,
            protection_fee: value.protection_fee,
            discount_amount: value.discount_amount,
            final_total_amount: value.final_total_amount,
            status: value.status,
            payment_status: value.payment_status,
            payment_method: value.payment_method,
            applied_voucher_id,
            voucher_redeemed: value.voucher_redeemed,
            notes: value.notes,
            expiry_time: value.expiry_time.to_system_time(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            version: u64::try_from(value.version.max(0)).unwrap_or_default(),
        })
    }
}

/// Versions are stored as signed 64-bit integers.
pub fn version_to_bson(version: u64) -> i64 {
    i64::try_from(version).unwrap_or(i64::MAX)
}

/// Key of the claim document reserving one slot of one court on one day.
pub fn slot_claim_id(court_id: Uuid, booking_date: Date, slot: Slot) -> String {
    format!("{court_id}|{}|{slot}", format_date(booking_date))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use time::macros::date;

    use super::*;

    // BSON datetimes keep millisecond precision.
    fn at(millis: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(millis)
    }

    fn booking() -> BookingEntity {
        BookingEntity {
            id: Uuid::new_v4(),
            invoice_number: "INV-20250110-ABCD2345".into(),
            user_id: Uuid::new_v4(),
            court_id: Uuid::new_v4(),
            arena_id: Uuid::new_v4(),
            booking_date: date!(2025 - 01 - 10),
            time_slots: ["10:00", "11:00"]
                .iter()
                .map(|label| label.parse().unwrap())
                .collect(),
            start_time: "10:00".into(),
            end_time: "12:00".into(),
            total_price: 100_000,
            service_fee: 5_000,
            protection_fee: 3_000,
            discount_amount: 10_000,
            final_total_amount: 98_000,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Paid,
            payment_method: Some("qris".into()),
            applied_voucher_id: Some(Uuid::new_v4()),
            voucher_redeemed: true,
            notes: None,
            expiry_time: at(1_736_500_200_000),
            created_at: at(1_736_499_600_000),
            updated_at: at(1_736_499_900_123),
            version: 3,
        }
    }

    #[test]
    fn booking_survives_document_conversion() {
        let entity = booking();
        let document = MongoBookingDocument::from(entity.clone());
        assert_eq!(document.booking_date, "2025-01-10");
        assert_eq!(document.version, 3);
        assert_eq!(BookingEntity::try_from(document).unwrap(), entity);
    }

    #[test]
    fn voucher_and_user_survive_document_conversion() {
        let voucher = VoucherEntity {
            id: Uuid::new_v4(),
            code: "SMASH10".into(),
            title: "Smash".into(),
            description: "ten percent".into(),
            discount_type: DiscountType::Percentage,
            discount_value: 10,
            min_purchase: 50_000,
            max_discount: Some(20_000),
            start_date: date!(2025 - 01 - 01),
            end_date: date!(2025 - 01 - 31),
            is_active: true,
            usage_limit: Some(100),
            usage_count: 2,
            redeemed_by: vec![Uuid::new_v4(), Uuid::new_v4()],
            created_at: at(1_735_689_600_000),
            updated_at: at(1_735_689_600_000),
        };
        let document = MongoVoucherDocument::from(voucher.clone());
        assert_eq!(VoucherEntity::try_from(document).unwrap(), voucher);

        let user = UserEntity {
            id: Uuid::new_v4(),
            name: "Taufik".into(),
            email: "taufik@example.com".into(),
            phone: None,
            birth_date: Some(date!(1981 - 08 - 10)),
            role: UserRole::Admin,
            created_at: at(1_735_689_600_000),
            updated_at: at(1_735_689_600_000),
        };
        let document = MongoUserDocument::from(user.clone());
        assert_eq!(document.birth_date.as_deref(), Some("1981-08-10"));
        assert_eq!(UserEntity::try_from(document).unwrap(), user);
    }

    #[test]
    fn arena_and_court_survive_document_conversion() {
        let arena = ArenaEntity {
            id: Uuid::new_v4(),
            name: "Smash Hall".into(),
            address: "Jl. Merdeka 1".into(),
            city: "Bandung".into(),
            category: "indoor".into(),
            description: String::new(),
            price_per_hour: 50_000,
            rating: 4.5,
            reviews_count: 12,
            images: vec!["hall.jpg".into()],
            facilities: BTreeSet::from(["parking".to_owned(), "showers".to_owned()]),
            opening_hours: "06:00 - 24:00".into(),
            created_at: at(1_735_689_600_000),
            updated_at: at(1_735_689_600_000),
        };
        let court = CourtEntity {
            id: Uuid::new_v4(),
            arena_id: arena.id,
            name: "Court 1".into(),
            court_type: CourtType::Premium,
            price_per_hour: Some(80_000),
            status: CourtStatus::Maintenance,
            created_at: at(1_735_689_600_000),
            updated_at: at(1_735_689_600_000),
        };
        assert_eq!(
            ArenaEntity::try_from(MongoArenaDocument::from(arena.clone())).unwrap(),
            arena
        );
        assert_eq!(
            CourtEntity::try_from(MongoCourtDocument::from(court.clone())).unwrap(),
            court
        );
    }

    #[test]
    fn malformed_ids_are_reported() {
        let mut document = MongoBookingDocument::from(booking());
        document.court_id = "not-a-uuid".into();
        assert!(matches!(
            BookingEntity::try_from(document),
            Err(MongoDaoError::Malformed { .. })
        ));
    }

    #[test]
    fn versions_and_claim_keys_are_stable() {
        assert_eq!(version_to_bson(7), 7);
        assert_eq!(version_to_bson(u64::MAX), i64::MAX);

        let court = Uuid::nil();
        let key = slot_claim_id(court, date!(2025 - 01 - 10), "09:00".parse().unwrap());
        assert_eq!(key, format!("{court}|2025-01-10|09:00"));
    }
}
