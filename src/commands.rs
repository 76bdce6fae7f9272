//! Write side: listing toys and executing purchases
//!
//! Command failures other than an unknown toy never reach the caller as a
//! typed error. They are logged, counted, and reported as
//! [`CommandOutcome::Failed`], which deliberately carries no cause.

use rand::Rng;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, debug, error, info};

use crate::error::{ToyBoxError, ToyBoxResult};
use crate::logging::operation_span;
use crate::metrics::METRICS;
use crate::model::{TOY_ID_PREFIX, ToyPurchaseRequest, ToyRecord, buyer_coordinates};
use crate::store::{self, DocumentStore, TOYS_COLLECTION, USERS_COLLECTION};

/// Numeric part of generated toy ids
pub const TOY_ID_RANGE: Range<u32> = 200..500;

/// Result of a command whose internal failures are swallowed.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome<T> {
    Applied(T),
    Failed,
}

impl<T> CommandOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            CommandOutcome::Applied(value) => Some(value),
            CommandOutcome::Failed => None,
        }
    }
}

/// Source of ids for new toys.
pub trait ToyIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// `JP{n}` with `n` drawn uniformly from [`TOY_ID_RANGE`]. Ids are not checked
/// against the store, so two toys can end up sharing one.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomToyIds;

impl ToyIdGenerator for RandomToyIds {
    fn next_id(&self) -> String {
        let n = rand::thread_rng().gen_range(TOY_ID_RANGE);
        format!("{TOY_ID_PREFIX}{n}")
    }
}

#[derive(Clone)]
pub struct ToyCommandProcessor {
    store: Arc<dyn DocumentStore>,
    ids: Arc<dyn ToyIdGenerator>,
}

impl ToyCommandProcessor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            ids: Arc::new(RandomToyIds),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn ToyIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// List a new toy under a freshly generated id.
    pub async fn add_toy(&self, toy: ToyRecord) -> CommandOutcome<ToyRecord> {
        let started = Instant::now();
        let result = self
            .insert_toy(toy)
            .instrument(operation_span("add_toy", ""))
            .await;

        match result {
            Ok(toy) => {
                info!(toy_id = %toy.toy_id, name = %toy.name, "toy listed");
                METRICS.record_success("add_toy", started.elapsed());
                CommandOutcome::Applied(toy)
            }
            Err(failure) => {
                error!(error = %failure, "failed to list toy");
                METRICS.record_failure("add_toy", started.elapsed(), failure.error_type());
                CommandOutcome::Failed
            }
        }
    }

    async fn insert_toy(&self, mut toy: ToyRecord) -> ToyBoxResult<ToyRecord> {
        toy.toy_id = self.ids.next_id();
        let document = store::to_document(&toy)?;
        let receipt = self.store.add_item(TOYS_COLLECTION, document).await?;
        debug!(toy_id = %toy.toy_id, inserted_id = %receipt.inserted_id, "toy persisted");
        Ok(toy)
    }

    /// Sell a toy to the buyer named in `purchase`.
    ///
    /// The toy becomes unavailable, the buyer becomes its owner, the selling
    /// price becomes its price and it moves to the buyer's coordinates (`""`
    /// when the buyer is unknown). Availability is not checked first, and
    /// concurrent purchases of one toy are last-write-wins.
    ///
    /// # Errors
    /// Only `NotFound` ("{toy_id} in not registered") is returned as an
    /// error. Every other failure becomes `CommandOutcome::Failed`.
    pub async fn buy_toy(
        &self,
        purchase: &ToyPurchaseRequest,
    ) -> ToyBoxResult<CommandOutcome<ToyRecord>> {
        let started = Instant::now();
        let result = self
            .execute_purchase(purchase)
            .instrument(operation_span("buy_toy", &purchase.toy_id))
            .await;

        match result {
            Ok(toy) => {
                info!(
                    toy_id = %toy.toy_id,
                    buyer_id = %purchase.buyer_id,
                    seller_id = purchase.seller_id.as_deref().unwrap_or(""),
                    price = toy.mrp,
                    purchased_at = purchase.purchase_timestamp,
                    "toy purchased"
                );
                METRICS.record_success("buy_toy", started.elapsed());
                Ok(CommandOutcome::Applied(toy))
            }
            Err(not_found @ ToyBoxError::NotFound { .. }) => {
                METRICS.record_failure("buy_toy", started.elapsed(), not_found.error_type());
                Err(not_found)
            }
            Err(failure) => {
                error!(toy_id = %purchase.toy_id, error = %failure, "failed to purchase toy");
                METRICS.record_failure("buy_toy", started.elapsed(), failure.error_type());
                Ok(CommandOutcome::Failed)
            }
        }
    }

    async fn execute_purchase(&self, purchase: &ToyPurchaseRequest) -> ToyBoxResult<ToyRecord> {
        let toy_id = purchase.toy_id.as_str();
        let document = self
            .store
            .get_item(TOYS_COLLECTION, "toy_id", toy_id)
            .await?
            .ok_or_else(|| ToyBoxError::not_found(format!("{toy_id} in not registered")))?;
        let mut toy = ToyRecord::from_document(document)?;

        let buyer = self
            .store
            .get_item(USERS_COLLECTION, "user_id", &purchase.buyer_id)
            .await?;
        if buyer.is_none() {
            debug!(buyer_id = %purchase.buyer_id, "buyer not registered, clearing coordinates");
        }

        toy.mark_sold(
            &purchase.buyer_id,
            purchase.selling_price,
            buyer_coordinates(buyer.as_ref()),
        );
        self.store
            .update_item(TOYS_COLLECTION, "toy_id", toy_id, toy.sale_patch())
            .await?;
        Ok(toy)
    }
}
