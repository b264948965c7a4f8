//! Stripe webhook handler
//!
//! POST /api/checkout/webhook — raw body in, signature-verified before any
//! parsing. The provider retries on any non-2xx, so every verified event is
//! acknowledged even when no matching order exists.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db;
use crate::live::AdminEvent;
use crate::state::AppState;
use crate::stripe;
use crate::util::now_millis;

fn received() -> Response {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "received": true })),
    )
        .into_response()
}

fn rejected(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Handle incoming Stripe webhook events
///
/// Must receive the raw body (not parsed JSON) for HMAC signature
/// verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let sig_header = match headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s,
        None => {
            tracing::warn!("Missing Stripe-Signature header");
            return rejected(StatusCode::BAD_REQUEST, "Missing Stripe-Signature header");
        }
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe.webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return rejected(StatusCode::BAD_REQUEST, "Signature verification failed");
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return rejected(StatusCode::BAD_REQUEST, "Malformed event payload");
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    tracing::info!(event_type = event_type, "Received Stripe webhook");

    match event_type {
        "payment_intent.succeeded" => handle_payment_succeeded(&state, &event).await,
        "payment_intent.payment_failed" => {
            let intent_id = intent_id_of(&event).unwrap_or("<unknown>");
            tracing::warn!(payment_intent_id = intent_id, "Payment intent failed");
            received()
        }
        _ => {
            // Unhandled event types are acknowledged, never rejected
            tracing::debug!(event_type = event_type, "Unhandled webhook event type");
            received()
        }
    }
}

fn intent_id_of(event: &serde_json::Value) -> Option<&str> {
    event
        .get("data")
        .and_then(|d| d.get("object"))
        .and_then(|o| o["id"].as_str())
}

/// payment_intent.succeeded → mark the matching order paid
///
/// The update is a no-op for an already-paid order, so redelivery of the same
/// event has no further effect.
async fn handle_payment_succeeded(state: &AppState, event: &serde_json::Value) -> Response {
    let intent_id = match intent_id_of(event) {
        Some(id) => id,
        None => {
            tracing::warn!("payment_intent.succeeded missing intent id");
            return rejected(StatusCode::BAD_REQUEST, "Event missing intent id");
        }
    };

    match db::orders::mark_paid_by_intent(&state.pool, intent_id, now_millis()).await {
        Ok(Some(order)) => {
            tracing::info!(
                order_id = order.id,
                payment_intent_id = intent_id,
                "Order marked as paid via webhook"
            );
            state.admin_hub.publish(AdminEvent::OrderChanged {
                order_id: order.id,
                status: order.status.clone(),
                payment_status: order.payment_status.clone(),
                total_amount: order.total_amount,
                customer_email: order.customer_email,
            });
            received()
        }
        Ok(None) => {
            // Deferred order creation means the webhook can outrun the client
            // confirmation; acknowledge to stop redelivery.
            tracing::warn!(
                payment_intent_id = intent_id,
                "No order found for payment intent"
            );
            received()
        }
        Err(e) => {
            tracing::error!(%e, "DB error applying webhook event");
            rejected(StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
        }
    }
}
