//! Property tests for record validation.

use proptest::prelude::*;
use serde_json::{Value, json};

use toybox::{ToyPurchaseRequest, ToyRecord, ValidationError};

const REQUIRED_TEXT_FIELDS: [&str; 7] = [
    "owner_id",
    "name",
    "description",
    "weight",
    "recommended_age",
    "dimensions",
    "brand",
];

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ,.+]{0,24}"
}

fn arb_toy_json() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec(arb_text(), 7),
        "[0-9]{1,3},[0-9]{1,3}",
        prop::collection::vec(arb_text(), 0..4),
        prop::collection::vec(arb_text(), 0..4),
        any::<bool>(),
        0.0f64..5.0,
        0.0f64..10_000.0,
        0.0f64..1_000.0,
    )
        .prop_map(
            |(texts, coordinates, images, features, available, rating, reviews, mrp)| {
                json!({
                    "toy_id": "JP250",
                    "owner_id": texts[0],
                    "coordinates": coordinates,
                    "name": texts[1],
                    "mrp": mrp,
                    "description": texts[2],
                    "images": images,
                    "weight": texts[3],
                    "features": features,
                    "recommended_age": texts[4],
                    "dimensions": texts[5],
                    "brand": texts[6],
                    "available": available,
                    "rating": rating,
                    "review_count": reviews
                })
            },
        )
}

proptest! {
    #[test]
    fn valid_toys_round_trip_every_field(toy_json in arb_toy_json()) {
        let toy = ToyRecord::from_value(toy_json.clone()).expect("valid toy");
        prop_assert_eq!(serde_json::to_value(&toy).unwrap(), toy_json);
    }

    #[test]
    fn empty_required_field_is_rejected(
        toy_json in arb_toy_json(),
        index in 0usize..REQUIRED_TEXT_FIELDS.len(),
    ) {
        let field = REQUIRED_TEXT_FIELDS[index];
        let mut toy_json = toy_json;
        toy_json[field] = json!("");

        let result = ToyRecord::from_value(toy_json);
        prop_assert_eq!(result, Err(ValidationError::EmptyField { field }));
    }

    #[test]
    fn whitespace_required_field_round_trips(
        toy_json in arb_toy_json(),
        index in 0usize..REQUIRED_TEXT_FIELDS.len(),
        blank in "[ \t]{1,3}",
    ) {
        let field = REQUIRED_TEXT_FIELDS[index];
        let mut toy_json = toy_json;
        toy_json[field] = json!(blank);

        let toy = ToyRecord::from_value(toy_json.clone()).expect("non-empty text is valid");
        prop_assert_eq!(serde_json::to_value(&toy).unwrap(), toy_json);
    }

    #[test]
    fn negative_selling_price_is_rejected(price in -1.0e9f64..-1.0e-9) {
        let result = ToyPurchaseRequest::new("JP201", "user123", price);
        let is_negative_price = matches!(result, Err(ValidationError::NegativePrice { .. }));
        prop_assert!(is_negative_price);
    }

    #[test]
    fn non_negative_selling_price_is_accepted(price in 0.0f64..1.0e9) {
        let purchase = ToyPurchaseRequest::new("JP201", "user123", price).expect("valid purchase");
        prop_assert_eq!(purchase.selling_price, price);
    }
}
