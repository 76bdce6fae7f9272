//! Toy, purchase and user records
//!
//! Every record is validated when it is built, whichever way it is built:
//! through the typed constructors, from a JSON value, or through serde
//! (`#[serde(try_from = ...)]`). A record that exists is a valid record.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ValidationError;
use crate::store::Document;

/// Prefix of every generated toy id
pub const TOY_ID_PREFIX: &str = "JP";

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteNumber { field, value });
    }
    Ok(())
}

/// Current wall-clock time in epoch seconds.
///
/// Used as the serde default for `purchase_timestamp`, so it runs once per
/// constructed request.
pub fn now_epoch_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

// ============================================================================
// ToyRecord
// ============================================================================

/// Unchecked shape of a toy as sent by a client or read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToyFields {
    #[serde(default)]
    pub toy_id: Option<String>,
    pub owner_id: String,
    pub coordinates: String,
    pub name: String,
    #[serde(default)]
    pub mrp: Option<f64>,
    pub description: String,
    pub images: Vec<String>,
    pub weight: String,
    pub features: Vec<String>,
    pub recommended_age: String,
    pub dimensions: String,
    pub brand: String,
    pub available: bool,
    pub rating: f64,
    pub review_count: f64,
}

/// A toy listing.
///
/// `toy_id` stays empty until the command processor assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToyFields")]
pub struct ToyRecord {
    pub toy_id: String,
    pub owner_id: String,
    pub coordinates: String,
    pub name: String,
    pub mrp: f64,
    pub description: String,
    pub images: Vec<String>,
    pub weight: String,
    pub features: Vec<String>,
    pub recommended_age: String,
    pub dimensions: String,
    pub brand: String,
    pub available: bool,
    pub rating: f64,
    pub review_count: f64,
}

impl TryFrom<ToyFields> for ToyRecord {
    type Error = ValidationError;

    fn try_from(fields: ToyFields) -> Result<Self, Self::Error> {
        require_non_empty("owner_id", &fields.owner_id)?;
        require_non_empty("name", &fields.name)?;
        require_non_empty("description", &fields.description)?;
        require_non_empty("weight", &fields.weight)?;
        require_non_empty("recommended_age", &fields.recommended_age)?;
        require_non_empty("dimensions", &fields.dimensions)?;
        require_non_empty("brand", &fields.brand)?;

        let mrp = fields.mrp.unwrap_or_default();
        require_finite("mrp", mrp)?;
        require_finite("rating", fields.rating)?;
        require_finite("review_count", fields.review_count)?;

        Ok(Self {
            toy_id: fields.toy_id.unwrap_or_default(),
            owner_id: fields.owner_id,
            coordinates: fields.coordinates,
            name: fields.name,
            mrp,
            description: fields.description,
            images: fields.images,
            weight: fields.weight,
            features: fields.features,
            recommended_age: fields.recommended_age,
            dimensions: fields.dimensions,
            brand: fields.brand,
            available: fields.available,
            rating: fields.rating,
            review_count: fields.review_count,
        })
    }
}

impl ToyRecord {
    /// Build from an arbitrary JSON value, e.g. a request body.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let fields: ToyFields = serde_json::from_value(value)?;
        Self::try_from(fields)
    }

    /// Build from a stored document. Fields the model does not know are ignored.
    pub fn from_document(document: Document) -> Result<Self, ValidationError> {
        Self::from_value(Value::Object(document))
    }

    /// Apply a sale: the buyer becomes the owner at the agreed price and the
    /// toy leaves the market.
    pub fn mark_sold(&mut self, buyer_id: &str, selling_price: f64, coordinates: String) {
        self.available = false;
        self.owner_id = buyer_id.to_string();
        self.mrp = selling_price;
        self.coordinates = coordinates;
    }

    /// The fields a sale changes, as a store patch.
    pub fn sale_patch(&self) -> Document {
        let mut patch = Document::new();
        patch.insert("available".into(), json!(self.available));
        patch.insert("owner_id".into(), json!(self.owner_id));
        patch.insert("mrp".into(), json!(self.mrp));
        patch.insert("coordinates".into(), json!(self.coordinates));
        patch
    }
}

// ============================================================================
// ToyPurchaseRequest
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct PurchaseFields {
    toy_id: String,
    #[serde(default)]
    seller_id: Option<String>,
    buyer_id: String,
    selling_price: f64,
    #[serde(default = "now_epoch_seconds")]
    purchase_timestamp: i64,
}

/// Intent to buy a listed toy. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PurchaseFields")]
pub struct ToyPurchaseRequest {
    pub toy_id: String,
    pub seller_id: Option<String>,
    pub buyer_id: String,
    pub selling_price: f64,
    pub purchase_timestamp: i64,
}

impl TryFrom<PurchaseFields> for ToyPurchaseRequest {
    type Error = ValidationError;

    fn try_from(fields: PurchaseFields) -> Result<Self, Self::Error> {
        require_non_empty("toy_id", &fields.toy_id)?;
        require_non_empty("buyer_id", &fields.buyer_id)?;
        require_finite("selling_price", fields.selling_price)?;
        if fields.selling_price < 0.0 {
            return Err(ValidationError::NegativePrice {
                value: fields.selling_price,
            });
        }

        Ok(Self {
            toy_id: fields.toy_id,
            seller_id: fields.seller_id,
            buyer_id: fields.buyer_id,
            selling_price: fields.selling_price,
            purchase_timestamp: fields.purchase_timestamp,
        })
    }
}

impl ToyPurchaseRequest {
    /// Purchase stamped with the current time.
    pub fn new(
        toy_id: impl Into<String>,
        buyer_id: impl Into<String>,
        selling_price: f64,
    ) -> Result<Self, ValidationError> {
        Self::try_from(PurchaseFields {
            toy_id: toy_id.into(),
            seller_id: None,
            buyer_id: buyer_id.into(),
            selling_price,
            purchase_timestamp: now_epoch_seconds(),
        })
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let fields: PurchaseFields = serde_json::from_value(value)?;
        Self::try_from(fields)
    }

    pub fn with_seller(mut self, seller_id: impl Into<String>) -> Self {
        self.seller_id = Some(seller_id.into());
        self
    }
}

// ============================================================================
// UserRecord
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct UserFields {
    user_id: String,
    coordinates: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    address: String,
}

/// A buyer or owner. Read-only for this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserFields")]
pub struct UserRecord {
    pub user_id: String,
    pub coordinates: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub address: String,
}

impl TryFrom<UserFields> for UserRecord {
    type Error = ValidationError;

    fn try_from(fields: UserFields) -> Result<Self, Self::Error> {
        require_non_empty("user_id", &fields.user_id)?;
        require_non_empty("coordinates", &fields.coordinates)?;
        require_non_empty("first_name", &fields.first_name)?;
        require_non_empty("last_name", &fields.last_name)?;
        require_non_empty("phone_number", &fields.phone_number)?;
        require_non_empty("address", &fields.address)?;

        Ok(Self {
            user_id: fields.user_id,
            coordinates: fields.coordinates,
            first_name: fields.first_name,
            last_name: fields.last_name,
            phone_number: fields.phone_number,
            address: fields.address,
        })
    }
}

impl UserRecord {
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let fields: UserFields = serde_json::from_value(value)?;
        Self::try_from(fields)
    }
}

/// Coordinates of a stored user document, or `""` when the user or the
/// field is missing.
pub fn buyer_coordinates(user: Option<&Document>) -> String {
    user.and_then(|document| document.get("coordinates"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
