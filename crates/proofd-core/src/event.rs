use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One purchase to announce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEvent {
    pub customer: String,
    pub location: String,
    pub product: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Price as shown to shoppers.
pub fn format_currency(price: f64) -> String {
    format!("${price:.2}")
}

const FIRST_NAMES: &[&str] = &[
    "Emma", "Liam", "Olivia", "Noah", "Ava", "Ethan", "Sophia", "Mason", "Isabella", "William",
];

const CITIES: &[&str] = &[
    "Toronto", "Vancouver", "Montreal", "New York", "London", "Sydney", "Paris", "Tokyo", "Berlin",
    "Amsterdam",
];

const PRODUCTS: &[(&str, f64)] = &[
    ("Classic T-Shirt", 29.99),
    ("Denim Jeans", 89.99),
    ("Running Shoes", 119.99),
    ("Backpack", 59.99),
    ("Watch", 199.99),
];

/// Upper bound on purchases synthesized per request.
pub const MAX_MOCK_BATCH: usize = 100;

/// Synthesize a plausible purchase that happened within the last hour.
pub fn mock_purchase<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> PurchaseEvent {
    let customer = FIRST_NAMES.choose(rng).copied().unwrap_or("Someone");
    let location = CITIES.choose(rng).copied().unwrap_or("somewhere");
    let (product, price) = PRODUCTS.choose(rng).copied().unwrap_or(("a product", 0.0));
    let minutes_ago = rng.gen_range(0..60);

    PurchaseEvent {
        customer: customer.to_string(),
        location: location.to_string(),
        product: product.to_string(),
        price,
        timestamp: now - chrono::Duration::minutes(minutes_ago),
    }
}

pub fn mock_purchases<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, count: usize) -> Vec<PurchaseEvent> {
    (0..count.min(MAX_MOCK_BATCH)).map(|_| mock_purchase(rng, now)).collect()
}

/// [`mock_purchase`] with the thread RNG and the current time.
pub fn random_purchase() -> PurchaseEvent {
    mock_purchase(&mut rand::thread_rng(), Utc::now())
}

pub fn random_purchases(count: usize) -> Vec<PurchaseEvent> {
    mock_purchases(&mut rand::thread_rng(), Utc::now(), count)
}
