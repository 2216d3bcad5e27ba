//! Queue status and purchase completion handlers.

use axum::Json;
use axum::extract::{Path, State};
use tracing::info;

use ticketqueue_core::error::AppError;
use ticketqueue_core::traits::InventorySource;
use ticketqueue_realtime::message::TRANSACTION_SUCCESSFUL;

use crate::dto::request::CompleteRequest;
use crate::dto::response::{ApiResponse, MessageResponse, QueueStatusResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/queue/{tier}/status
pub async fn status(
    State(state): State<AppState>,
    Path(tier): Path<String>,
) -> Result<Json<ApiResponse<QueueStatusResponse>>, ApiError> {
    let hub = state.engine.require_hub(&tier)?.snapshot().await?;

    Ok(Json(ApiResponse::ok(QueueStatusResponse {
        hub,
        metrics: state.engine.metrics(),
    })))
}

/// POST /api/queue/{tier}/complete
///
/// Ends the caller's transaction successfully. The caller must currently hold
/// a slot in the tier and declare the variant its session selected, and that
/// variant's pool must still have stock.
pub async fn complete(
    State(state): State<AppState>,
    Path(tier): Path<String>,
    user: AuthUser,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let hub = state.engine.require_hub(&tier)?;

    let session = hub
        .client_in_transaction(user.identity())
        .await?
        .ok_or_else(|| AppError::not_found("No transaction in progress for this account"))?;

    if session.merch_selected().await != req.with_merch {
        return Err(
            AppError::conflict("Declared variant does not match the session's selection").into(),
        );
    }

    let pool = if req.with_merch {
        hub.tier_config().with_merch_pool
    } else {
        hub.tier_config().no_merch_pool
    };
    // The memory provider doubles as the ticket ledger. The sale must land
    // before the session ends and the hub recomputes its ceiling.
    let ledger = state.inventory.memory();
    match ledger {
        Some(memory) => {
            memory.try_record_registration(&pool)?;
        }
        None => {
            if state.inventory.get_by_id(&pool).await?.is_exhausted() {
                return Err(AppError::conflict("Event is full").into());
            }
        }
    }

    if !session.finish(Ok(())).await {
        if let Some(memory) = ledger {
            memory.release_registration(&pool)?;
        }
        return Err(AppError::conflict("Transaction already finished").into());
    }

    info!(
        tier = %tier,
        identity = %user.identity(),
        session_id = %session.id(),
        with_merch = req.with_merch,
        "Purchase completed"
    );

    Ok(Json(ApiResponse::ok(MessageResponse::new(TRANSACTION_SUCCESSFUL))))
}
