//! Checkout endpoints: payment-intent creation and payment confirmation
//!
//! The intent metadata is the trust boundary: order contents are written into
//! the intent server-side at creation time and read back at confirmation.
//! The confirming client sends nothing but the intent id, so prices and
//! quantities cannot be tampered with after the intent exists.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::UserIdentity;
use crate::auth::user_auth::auth_middleware;
use crate::db;
use crate::db::orders::{NewOrder, NewOrderItem, OrderStatus, PaymentStatus};
use crate::error::{AppError, ErrorCode};
use crate::live::AdminEvent;
use crate::state::AppState;
use crate::stripe;
use crate::util::now_millis;

use super::{ApiResult, internal};

/// Stripe's minimum chargeable amount in minor currency units ($0.50)
const MIN_CHARGE_MINOR_UNITS: i64 = 50;

pub fn router(state: &AppState) -> Router<AppState> {
    let authed = Router::new()
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/confirm-payment", post(confirm_payment))
        .route("/payment-intents/{id}", get(get_payment_intent))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // The webhook authenticates with the provider signature, not a user token
    let public = Router::new().route("/webhook", post(super::webhook::handle_webhook));

    Router::new().nest("/api/checkout", authed.merge(public))
}

/// One purchased product as serialized into the intent metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub sale_price: Option<f64>,
}

impl CheckoutItem {
    /// Sale price applies only when the item is flagged on sale and one is set
    fn effective_price(&self) -> f64 {
        match (self.on_sale, self.sale_price) {
            (true, Some(sale)) => sale,
            _ => self.price,
        }
    }
}

/// Sum of effective price * quantity over the submitted items
fn order_total(items: &[CheckoutItem]) -> f64 {
    items
        .iter()
        .map(|item| item.effective_price() * item.quantity as f64)
        .sum()
}

#[derive(Deserialize)]
pub struct IntentMetadata {
    pub customer_email: String,
    pub customer_name: String,
    /// JSON-serialized `Vec<CheckoutItem>`
    pub order_items: String,
}

#[derive(Deserialize)]
pub struct CreateIntentRequest {
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub metadata: Option<IntentMetadata>,
}

#[derive(Serialize)]
pub struct CreateIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// POST /api/checkout/create-payment-intent
///
/// Pure intent setup: one provider call, no local persistence. The
/// authenticated user's id is stamped into the metadata so confirmation can
/// enforce ownership.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<CreateIntentRequest>,
) -> ApiResult<CreateIntentResponse> {
    let amount = match req.amount {
        Some(a) if a >= MIN_CHARGE_MINOR_UNITS => a,
        _ => return Err(AppError::new(ErrorCode::PaymentAmountTooSmall)),
    };

    let metadata = req
        .metadata
        .ok_or_else(|| AppError::validation("Missing required metadata"))?;
    if metadata.customer_email.trim().is_empty() {
        return Err(
            AppError::validation("Missing required metadata").with_detail("field", "customer_email")
        );
    }
    if metadata.customer_name.trim().is_empty() {
        return Err(
            AppError::validation("Missing required metadata").with_detail("field", "customer_name")
        );
    }

    // Server-authored metadata is trusted at confirmation time, so a list
    // that does not parse must be rejected here, where it is caller-fixable.
    let items: Vec<CheckoutItem> = serde_json::from_str(&metadata.order_items)
        .map_err(|_| AppError::validation("order_items must be a JSON item list"))?;
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let currency = req.currency.unwrap_or_else(|| "usd".into());
    let user_id = identity.user_id.to_string();
    let meta_fields = [
        ("customer_email", metadata.customer_email.trim()),
        ("customer_name", metadata.customer_name.trim()),
        ("order_items", metadata.order_items.as_str()),
        ("user_id", user_id.as_str()),
    ];

    let intent = stripe::create_payment_intent(
        &state.stripe.secret_key,
        amount,
        &currency,
        &meta_fields,
    )
    .await
    .map_err(|e| {
        tracing::error!("Failed to create payment intent: {e}");
        AppError::new(ErrorCode::PaymentProviderError)
    })?;

    let client_secret = intent.client_secret.ok_or_else(|| {
        tracing::error!(intent_id = %intent.id, "Payment intent missing client_secret");
        AppError::new(ErrorCode::PaymentProviderError)
    })?;

    Ok(Json(CreateIntentResponse {
        client_secret,
        payment_intent_id: intent.id,
    }))
}

/// Order fields recovered from intent metadata
#[derive(Debug)]
struct IntentOrder {
    customer_email: String,
    customer_name: String,
    user_id: i64,
    items: Vec<CheckoutItem>,
}

/// Read the order back out of provider metadata.
///
/// The metadata was authored by this server; a field that is missing or
/// malformed indicates a producer/consumer mismatch, not user error.
fn parse_intent_metadata(metadata: &HashMap<String, String>) -> Result<IntentOrder, AppError> {
    fn field<'a>(
        metadata: &'a HashMap<String, String>,
        key: &str,
    ) -> Result<&'a str, AppError> {
        metadata.get(key).map(String::as_str).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::PaymentMetadataInvalid,
                format!("metadata field {key} is missing"),
            )
        })
    }

    let customer_email = field(metadata, "customer_email")?.to_string();
    let customer_name = field(metadata, "customer_name")?.to_string();
    let user_id = field(metadata, "user_id")?.parse().map_err(|_| {
        AppError::with_message(ErrorCode::PaymentMetadataInvalid, "user_id is not numeric")
    })?;

    let items: Vec<CheckoutItem> =
        serde_json::from_str(field(metadata, "order_items")?).map_err(|e| {
            AppError::with_message(
                ErrorCode::PaymentMetadataInvalid,
                format!("order_items did not parse: {e}"),
            )
        })?;
    if items.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::PaymentMetadataInvalid,
            "order_items is empty",
        ));
    }

    Ok(IntentOrder {
        customer_email,
        customer_name,
        user_id,
        items,
    })
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
}

#[derive(Serialize)]
pub struct ConfirmPaymentResponse {
    pub order_id: i64,
    pub customer_email: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub order_items: Vec<db::orders::OrderItem>,
}

/// POST /api/checkout/confirm-payment
///
/// Verifies the intent succeeded with the provider, then materializes the
/// order and its items atomically. A duplicate confirmation (client racing a
/// webhook, or a retried request) loses against the unique constraint and is
/// answered with a conflict, never a second order.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> ApiResult<ConfirmPaymentResponse> {
    if req.payment_intent_id.trim().is_empty() {
        return Err(AppError::validation("payment_intent_id is required"));
    }

    let intent =
        stripe::retrieve_payment_intent(&state.stripe.secret_key, &req.payment_intent_id)
            .await
            .map_err(|e| {
                tracing::error!(
                    payment_intent_id = %req.payment_intent_id,
                    "Failed to retrieve payment intent: {e}"
                );
                AppError::new(ErrorCode::PaymentProviderError)
            })?;

    if intent.status != "succeeded" {
        return Err(AppError::with_message(
            ErrorCode::PaymentNotCompleted,
            format!("Payment intent status is {}", intent.status),
        ));
    }

    let parsed = parse_intent_metadata(&intent.metadata)?;

    if parsed.user_id != identity.user_id {
        return Err(AppError::new(ErrorCode::PermissionDenied));
    }

    let total_amount = order_total(&parsed.items);

    let new_order = NewOrder {
        user_id: identity.user_id,
        payment_intent_id: &intent.id,
        customer_email: &parsed.customer_email,
        customer_name: &parsed.customer_name,
        total_amount,
        status: OrderStatus::Paid,
        payment_status: PaymentStatus::Completed,
        now: now_millis(),
    };
    let new_items: Vec<NewOrderItem> = parsed
        .items
        .iter()
        .map(|item| NewOrderItem {
            product_id: item.id,
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.effective_price(),
            image: item.image.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
        })
        .collect();

    let (order, order_items) =
        match db::orders::create_with_items(&state.pool, &new_order, &new_items).await {
            Ok(created) => created,
            Err(e) if db::is_unique_violation(&e) => {
                tracing::info!(
                    payment_intent_id = %intent.id,
                    "Duplicate confirmation for already-processed payment"
                );
                return Err(AppError::new(ErrorCode::OrderAlreadyProcessed));
            }
            Err(e) => return Err(internal(e)),
        };

    tracing::info!(
        order_id = order.id,
        payment_intent_id = %intent.id,
        total_amount,
        "Order created from confirmed payment"
    );

    state.admin_hub.publish(AdminEvent::OrderChanged {
        order_id: order.id,
        status: order.status.clone(),
        payment_status: order.payment_status.clone(),
        total_amount: order.total_amount,
        customer_email: order.customer_email.clone(),
    });

    Ok(Json(ConfirmPaymentResponse {
        order_id: order.id,
        customer_email: order.customer_email,
        customer_name: order.customer_name,
        total_amount: order.total_amount,
        order_items,
    }))
}

/// GET /api/checkout/payment-intents/{id}
pub async fn get_payment_intent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<stripe::PaymentIntent> {
    let intent = stripe::retrieve_payment_intent(&state.stripe.secret_key, &id)
        .await
        .map_err(|e| {
            tracing::warn!(payment_intent_id = %id, "Payment intent lookup failed: {e}");
            AppError::new(ErrorCode::PaymentIntentNotFound)
        })?;
    Ok(Json(intent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: i32) -> CheckoutItem {
        CheckoutItem {
            id: 1,
            name: "item".into(),
            price,
            quantity,
            image: None,
            size: None,
            color: None,
            on_sale: false,
            sale_price: None,
        }
    }

    #[test]
    fn test_order_total() {
        let items = [item(10.0, 2), item(5.0, 3)];
        assert_eq!(order_total(&items), 35.0);
    }

    #[test]
    fn test_order_total_uses_sale_price_when_on_sale() {
        let mut discounted = item(20.0, 2);
        discounted.on_sale = true;
        discounted.sale_price = Some(15.0);
        assert_eq!(order_total(&[discounted]), 30.0);
    }

    #[test]
    fn test_sale_price_ignored_when_not_on_sale() {
        let mut not_discounted = item(20.0, 1);
        not_discounted.sale_price = Some(15.0);
        assert_eq!(order_total(&[not_discounted]), 20.0);

        let mut on_sale_without_price = item(20.0, 1);
        on_sale_without_price.on_sale = true;
        assert_eq!(order_total(&[on_sale_without_price]), 20.0);
    }

    fn metadata(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_intent_metadata() {
        let meta = metadata(&[
            ("customer_email", "buyer@example.com"),
            ("customer_name", "Buyer"),
            ("user_id", "7"),
            (
                "order_items",
                r#"[{"id":1,"name":"Cap","price":12.5,"quantity":2}]"#,
            ),
        ]);
        let parsed = parse_intent_metadata(&meta).unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.customer_email, "buyer@example.com");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].quantity, 2);
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let meta = metadata(&[
            ("customer_email", "buyer@example.com"),
            ("user_id", "7"),
            ("order_items", "[]"),
        ]);
        let err = parse_intent_metadata(&meta).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentMetadataInvalid);
    }

    #[test]
    fn test_parse_rejects_malformed_items_json() {
        let meta = metadata(&[
            ("customer_email", "buyer@example.com"),
            ("customer_name", "Buyer"),
            ("user_id", "7"),
            ("order_items", "{not json"),
        ]);
        let err = parse_intent_metadata(&meta).unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentMetadataInvalid);
    }

    #[test]
    fn test_parse_rejects_empty_items() {
        let meta = metadata(&[
            ("customer_email", "buyer@example.com"),
            ("customer_name", "Buyer"),
            ("user_id", "7"),
            ("order_items", "[]"),
        ]);
        assert!(parse_intent_metadata(&meta).is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric_user_id() {
        let meta = metadata(&[
            ("customer_email", "buyer@example.com"),
            ("customer_name", "Buyer"),
            ("user_id", "abc"),
            (
                "order_items",
                r#"[{"id":1,"name":"Cap","price":12.5,"quantity":2}]"#,
            ),
        ]);
        assert!(parse_intent_metadata(&meta).is_err());
    }

    #[test]
    fn test_checkout_item_optional_fields_default() {
        let item: CheckoutItem =
            serde_json::from_str(r#"{"id":3,"name":"Tee","price":9.0,"quantity":1}"#).unwrap();
        assert!(!item.on_sale);
        assert!(item.sale_price.is_none());
        assert!(item.image.is_none());
    }
}
