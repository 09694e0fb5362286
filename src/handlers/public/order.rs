use axum::extract::State;

use crate::credentials;
use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::gateway::RazorpayClient;
use crate::models::{CreateOrderRequest, CreateOrderResponse};

/// Create a gateway order for a membership purchase or daily pass.
///
/// Validation runs before any gateway call; an invalid request never
/// reaches Razorpay. The response carries the public key id so the client
/// can open the hosted checkout, never the secret.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>> {
    request.validate()?;

    let conn = state.db.get()?;
    let resolved = credentials::resolve_for_branch(
        &conn,
        &state.master_key,
        state.platform_credential.as_ref(),
        &request.branch_id,
    )?;
    drop(conn);

    let client = RazorpayClient::new(resolved.credential());

    let receipt = format!("rcpt_{}", uuid::Uuid::new_v4().simple());
    let order = client
        .create_order(request.amount_paise(), &receipt, &request.to_notes())
        .await?;

    tracing::info!(
        order_id = %order.id,
        branch_id = %request.branch_id,
        amount_paise = order.amount,
        "Created gateway order"
    );

    Ok(Json(CreateOrderResponse {
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: client.key_id().to_string(),
    }))
}
