use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use time::Date;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        ARENA_COLLECTION_NAME, BOOKING_COLLECTION_NAME, COURT_COLLECTION_NAME,
        MongoArenaDocument, MongoBookingDocument, MongoCourtDocument, MongoUserDocument,
        MongoVoucherDocument, SLOT_CLAIM_COLLECTION_NAME, USER_COLLECTION_NAME,
        VOUCHER_COLLECTION_NAME, slot_claim_id, version_to_bson,
    },
};
use crate::{
    dao::{
        booking_store::BookingStore,
        models::{
            ArenaEntity, BookingEntity, BookingQuery, ClaimOutcome, CourtEntity, DiscountType,
            RedeemOutcome, SlotClaimRequest, UserEntity, VoucherEntity,
        },
        storage::{InsertOutcome, StorageResult},
    },
    state::{
        clock::format_date,
        lifecycle::{BookingStatus, PaymentStatus},
        slots::Slot,
    },
};

/// MongoDB-backed [`BookingStore`] implementation.
#[derive(Clone)]
pub struct MongoBookingStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn index(keys: Document, name: &str, unique: bool) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(Some(name.to_owned()))
                .unique(unique.then_some(true))
                .build(),
        )
        .build()
}

fn discount_type_name(discount_type: DiscountType) -> &'static str {
    match discount_type {
        DiscountType::Percentage => "percentage",
        DiscountType::Fixed => "fixed",
    }
}

fn booking_filter(query: &BookingQuery) -> Document {
    let mut filter = Document::new();
    if let Some(user_id) = query.user_id {
        filter.insert("user_id", user_id.to_string());
    }
    if let Some(court_id) = query.court_id {
        filter.insert("court_id", court_id.to_string());
    }
    if let Some(arena_id) = query.arena_id {
        filter.insert("arena_id", arena_id.to_string());
    }
    if let Some(date) = query.booking_date {
        filter.insert("booking_date", format_date(date));
    }
    if let Some(statuses) = &query.statuses {
        let names: Vec<&str> = statuses.iter().map(|status| status.as_str()).collect();
        filter.insert("status", doc! { "$in": names });
    }
    filter
}

impl MongoBookingStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let specs: [(&'static str, &'static str, Document, bool); 8] = [
            (BOOKING_COLLECTION_NAME, "invoice_number", doc! {"invoice_number": 1}, true),
            (
                BOOKING_COLLECTION_NAME,
                "court_id,booking_date,status",
                doc! {"court_id": 1, "booking_date": 1, "status": 1},
                false,
            ),
            (
                BOOKING_COLLECTION_NAME,
                "status,expiry_time",
                doc! {"status": 1, "expiry_time": 1},
                false,
            ),
            (BOOKING_COLLECTION_NAME, "user_id", doc! {"user_id": 1, "created_at": 1}, false),
            (VOUCHER_COLLECTION_NAME, "code", doc! {"code": 1}, true),
            (USER_COLLECTION_NAME, "email", doc! {"email": 1}, true),
            (COURT_COLLECTION_NAME, "arena_id", doc! {"arena_id": 1}, false),
            (SLOT_CLAIM_COLLECTION_NAME, "booking_id", doc! {"booking_id": 1}, false),
        ];

        let database = self.database().await;
        for (collection, name, keys, unique) in specs {
            let index_name = format!("{}_idx", name.replace(',', "_"));
            database
                .collection::<Document>(collection)
                .create_index(index(keys, &index_name, unique))
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: name,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn find_all<D, E>(
        &self,
        collection: &'static str,
        filter: Document,
        sort: Document,
    ) -> MongoResult<Vec<E>>
    where
        D: DeserializeOwned + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        let documents: Vec<D> = self
            .collection::<D>(collection)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(MongoDaoError::operation(collection, "list documents"))?
            .try_collect()
            .await
            .map_err(MongoDaoError::operation(collection, "list documents"))?;

        documents.into_iter().map(E::try_from).collect()
    }

    async fn find_by<D, E>(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> MongoResult<Option<E>>
    where
        D: DeserializeOwned + Send + Sync,
        E: TryFrom<D, Error = MongoDaoError>,
    {
        self.collection::<D>(collection)
            .await
            .find_one(filter)
            .await
            .map_err(MongoDaoError::operation(collection, "load document"))?
            .map(E::try_from)
            .transpose()
    }

    async fn upsert<D>(&self, collection: &'static str, id: String, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .replace_one(doc! {"_id": id}, &document)
            .upsert(true)
            .await
            .map_err(MongoDaoError::operation(collection, "save document"))?;
        Ok(())
    }

    async fn insert_unique<D>(
        &self,
        collection: &'static str,
        document: D,
    ) -> MongoResult<InsertOutcome>
    where
        D: Serialize + Send + Sync,
    {
        match self
            .collection::<D>(collection)
            .await
            .insert_one(&document)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::Duplicate),
            Err(source) => Err(MongoDaoError::operation(collection, "insert document")(source)),
        }
    }

    async fn update_voucher_fields(&self, voucher: VoucherEntity) -> MongoResult<InsertOutcome> {
        let document = MongoVoucherDocument::from(voucher);
        let update = doc! {
            "$set": {
                "code": document.code,
                "title": document.title,
                "description": document.description,
                "discount_type": discount_type_name(document.discount_type),
                "discount_value": document.discount_value,
                "min_purchase": document.min_purchase,
                "max_discount": document.max_discount,
                "start_date": document.start_date,
                "end_date": document.end_date,
                "is_active": document.is_active,
                "usage_limit": document.usage_limit,
                "updated_at": document.updated_at,
            }
        };

        match self
            .collection::<Document>(VOUCHER_COLLECTION_NAME)
            .await
            .update_one(doc! {"_id": document.id}, update)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::Duplicate),
            Err(source) => Err(MongoDaoError::operation(
                VOUCHER_COLLECTION_NAME,
                "update voucher",
            )(source)),
        }
    }

    async fn redeem_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> MongoResult<RedeemOutcome> {
        let booking = booking_id.to_string();
        let filter = doc! {
            "_id": voucher_id.to_string(),
            "redeemed_by": { "$ne": &booking },
            "$or": [
                { "usage_limit": null },
                { "$expr": { "$lt": ["$usage_count", "$usage_limit"] } },
            ],
        };
        let update = doc! {
            "$inc": { "usage_count": 1_i64 },
            "$push": { "redeemed_by": &booking },
        };

        let result = self
            .collection::<Document>(VOUCHER_COLLECTION_NAME)
            .await
            .update_one(filter, update)
            .await
            .map_err(MongoDaoError::operation(VOUCHER_COLLECTION_NAME, "redeem voucher"))?;
        if result.matched_count > 0 {
            return Ok(RedeemOutcome::Redeemed);
        }

        let current: Option<VoucherEntity> = self
            .find_by::<MongoVoucherDocument, _>(
                VOUCHER_COLLECTION_NAME,
                doc! {"_id": voucher_id.to_string()},
            )
            .await?;
        Ok(match current {
            None => RedeemOutcome::NotFound,
            Some(voucher) if voucher.redeemed_by.contains(&booking_id) => {
                RedeemOutcome::AlreadyRedeemed
            }
            Some(_) => RedeemOutcome::Exhausted,
        })
    }

    async fn release_voucher(&self, voucher_id: Uuid, booking_id: Uuid) -> MongoResult<bool> {
        let booking = booking_id.to_string();
        let result = self
            .collection::<Document>(VOUCHER_COLLECTION_NAME)
            .await
            .update_one(
                doc! {"_id": voucher_id.to_string(), "redeemed_by": &booking},
                doc! {
                    "$inc": { "usage_count": -1_i64 },
                    "$pull": { "redeemed_by": &booking },
                },
            )
            .await
            .map_err(MongoDaoError::operation(VOUCHER_COLLECTION_NAME, "release voucher"))?;
        Ok(result.modified_count > 0)
    }

    async fn replace_booking(
        &self,
        booking: BookingEntity,
        expected_version: u64,
    ) -> MongoResult<bool> {
        let document = MongoBookingDocument::from(booking);
        let filter = doc! {
            "_id": document.id.clone(),
            "version": version_to_bson(expected_version),
        };
        let result = self
            .collection::<MongoBookingDocument>(BOOKING_COLLECTION_NAME)
            .await
            .replace_one(filter, &document)
            .await
            .map_err(MongoDaoError::operation(BOOKING_COLLECTION_NAME, "replace booking"))?;
        Ok(result.matched_count > 0)
    }

    async fn claim_slots(
        &self,
        request: SlotClaimRequest,
        now: SystemTime,
    ) -> MongoResult<ClaimOutcome> {
        let claims = self.collection::<Document>(SLOT_CLAIM_COLLECTION_NAME).await;
        let booking = request.booking_id.to_string();
        let date = format_date(request.booking_date);
        let hold_until = DateTime::from_system_time(request.hold_until);
        let now = DateTime::from_system_time(now);

        let mut acquired: Vec<String> = Vec::new();
        let mut taken: Vec<Slot> = Vec::new();

        for slot in &request.slots {
            let key = slot_claim_id(request.court_id, request.booking_date, *slot);
            // Matches only claims that may be taken over; otherwise the upsert collides on `_id`.
            let filter = doc! {
                "_id": &key,
                "$or": [
                    { "booking_id": &booking },
                    { "hold_until": { "$ne": null, "$lt": now } },
                ],
            };
            let update = doc! {
                "$set": {
                    "court_id": request.court_id.to_string(),
                    "booking_date": &date,
                    "slot": slot.to_string(),
                    "booking_id": &booking,
                    "hold_until": hold_until,
                }
            };

            match claims.update_one(filter, update).upsert(true).await {
                Ok(_) => acquired.push(key),
                Err(err) if is_duplicate_key(&err) => taken.push(*slot),
                Err(source) => {
                    self.rollback_claims(&claims, &acquired, &booking).await;
                    return Err(MongoDaoError::operation(
                        SLOT_CLAIM_COLLECTION_NAME,
                        "claim slot",
                    )(source));
                }
            }
        }

        if taken.is_empty() {
            return Ok(ClaimOutcome::Claimed);
        }

        debug!(
            booking_id = %request.booking_id,
            conflicts = taken.len(),
            "slot claim lost; rolling back"
        );
        self.rollback_claims(&claims, &acquired, &booking).await;
        Ok(ClaimOutcome::Taken(taken))
    }

    async fn rollback_claims(&self, claims: &Collection<Document>, keys: &[String], booking: &str) {
        if keys.is_empty() {
            return;
        }
        if let Err(err) = claims
            .delete_many(doc! {"_id": {"$in": keys.to_vec()}, "booking_id": booking})
            .await
        {
            warn!(error = %err, booking_id = booking, "failed to roll back partial slot claim");
        }
    }

    async fn pin_slots(&self, booking_id: Uuid) -> MongoResult<usize> {
        let result = self
            .collection::<Document>(SLOT_CLAIM_COLLECTION_NAME)
            .await
            .update_many(
                doc! {"booking_id": booking_id.to_string()},
                doc! {"$set": {"hold_until": null}},
            )
            .await
            .map_err(MongoDaoError::operation(SLOT_CLAIM_COLLECTION_NAME, "pin slots"))?;
        Ok(usize::try_from(result.matched_count).unwrap_or(usize::MAX))
    }

    async fn prune_claims(&self, before: Date) -> MongoResult<usize> {
        // Dates are stored as `YYYY-MM-DD`, so string order is calendar order.
        let result = self
            .collection::<Document>(SLOT_CLAIM_COLLECTION_NAME)
            .await
            .delete_many(doc! {"booking_date": {"$lt": format_date(before)}})
            .await
            .map_err(MongoDaoError::operation(SLOT_CLAIM_COLLECTION_NAME, "prune claims"))?;
        Ok(usize::try_from(result.deleted_count).unwrap_or(usize::MAX))
    }

    async fn release_slots(&self, booking_id: Uuid) -> MongoResult<()> {
        self.collection::<Document>(SLOT_CLAIM_COLLECTION_NAME)
            .await
            .delete_many(doc! {"booking_id": booking_id.to_string()})
            .await
            .map_err(MongoDaoError::operation(SLOT_CLAIM_COLLECTION_NAME, "release slots"))?;
        Ok(())
    }
}

fn id_filter(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

impl BookingStore for MongoBookingStore {
    fn list_arenas(&self) -> BoxFuture<'static, StorageResult<Vec<ArenaEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_all::<MongoArenaDocument, _>(
                    ARENA_COLLECTION_NAME,
                    doc! {},
                    doc! {"created_at": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_arena(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ArenaEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by::<MongoArenaDocument, _>(ARENA_COLLECTION_NAME, id_filter(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_arena(&self, arena: ArenaEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = arena.id.to_string();
            store
                .upsert(ARENA_COLLECTION_NAME, id, MongoArenaDocument::from(arena))
                .await
                .map_err(Into::into)
        })
    }

    fn list_courts(
        &self,
        arena_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<CourtEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = match arena_id {
                Some(arena_id) => doc! {"arena_id": arena_id.to_string()},
                None => doc! {},
            };
            store
                .find_all::<MongoCourtDocument, _>(
                    COURT_COLLECTION_NAME,
                    filter,
                    doc! {"created_at": 1, "name": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_court(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<CourtEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by::<MongoCourtDocument, _>(COURT_COLLECTION_NAME, id_filter(id))
                .await
                .map_err(Into::into)
        })
    }

    fn save_court(&self, court: CourtEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = court.id.to_string();
            store
                .upsert(COURT_COLLECTION_NAME, id, MongoCourtDocument::from(court))
                .await
                .map_err(Into::into)
        })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_all::<MongoUserDocument, _>(
                    USER_COLLECTION_NAME,
                    doc! {},
                    doc! {"created_at": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_user(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by::<MongoUserDocument, _>(USER_COLLECTION_NAME, id_filter(id))
                .await
                .map_err(Into::into)
        })
    }

    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_unique(USER_COLLECTION_NAME, MongoUserDocument::from(user))
                .await
                .map_err(Into::into)
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = user.id.to_string();
            store
                .upsert(USER_COLLECTION_NAME, id, MongoUserDocument::from(user))
                .await
                .map_err(Into::into)
        })
    }

    fn list_vouchers(&self) -> BoxFuture<'static, StorageResult<Vec<VoucherEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_all::<MongoVoucherDocument, _>(
                    VOUCHER_COLLECTION_NAME,
                    doc! {},
                    doc! {"created_at": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn find_voucher(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<VoucherEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by::<MongoVoucherDocument, _>(VOUCHER_COLLECTION_NAME, id_filter(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_voucher_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<VoucherEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by::<MongoVoucherDocument, _>(VOUCHER_COLLECTION_NAME, doc! {"code": code})
                .await
                .map_err(Into::into)
        })
    }

    fn insert_voucher(
        &self,
        voucher: VoucherEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_unique(VOUCHER_COLLECTION_NAME, MongoVoucherDocument::from(voucher))
                .await
                .map_err(Into::into)
        })
    }

    fn update_voucher(
        &self,
        voucher: VoucherEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.update_voucher_fields(voucher).await.map_err(Into::into) })
    }

    fn redeem_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<RedeemOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .redeem_voucher(voucher_id, booking_id)
                .await
                .map_err(Into::into)
        })
    }

    fn release_voucher(
        &self,
        voucher_id: Uuid,
        booking_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .release_voucher(voucher_id, booking_id)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_booking(
        &self,
        booking: BookingEntity,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_unique(BOOKING_COLLECTION_NAME, MongoBookingDocument::from(booking))
                .await
                .map_err(Into::into)
        })
    }

    fn find_booking_by_invoice(
        &self,
        invoice_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<BookingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_by::<MongoBookingDocument, _>(
                    BOOKING_COLLECTION_NAME,
                    doc! {"invoice_number": invoice_number},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn list_bookings(
        &self,
        query: BookingQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_all::<MongoBookingDocument, _>(
                    BOOKING_COLLECTION_NAME,
                    booking_filter(&query),
                    doc! {"created_at": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn replace_booking(
        &self,
        booking: BookingEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_booking(booking, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn list_stale_holds(
        &self,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<Vec<BookingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {
                "status": BookingStatus::Pending.as_str(),
                "payment_status": {
                    "$in": [PaymentStatus::Unpaid.as_str(), PaymentStatus::Failed.as_str()],
                },
                "expiry_time": { "$lt": DateTime::from_system_time(now) },
            };
            store
                .find_all::<MongoBookingDocument, _>(
                    BOOKING_COLLECTION_NAME,
                    filter,
                    doc! {"expiry_time": 1},
                )
                .await
                .map_err(Into::into)
        })
    }

    fn claim_slots(
        &self,
        request: SlotClaimRequest,
        now: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ClaimOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.claim_slots(request, now).await.map_err(Into::into) })
    }

    fn pin_slots(&self, booking_id: Uuid) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.pin_slots(booking_id).await.map_err(Into::into) })
    }

    fn prune_claims(&self, before: Date) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.prune_claims(before).await.map_err(Into::into) })
    }

    fn release_slots(&self, booking_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.release_slots(booking_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
