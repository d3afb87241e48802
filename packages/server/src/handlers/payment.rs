use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use common::payment::provider::IntentMetadata;
use common::payment::webhook;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event_participant, payment, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::event::load_settings;
use crate::models::payment::*;
use crate::registration::{self, ParticipantEntry};
use crate::state::AppState;
use crate::utils::event::find_event;

#[utoipa::path(
    post,
    path = "/create-payment-intent",
    tag = "Payments",
    operation_id = "createPaymentIntent",
    summary = "Create a payment intent for a paid event",
    description = "Records a pending payment and asks the provider for an intent. The returned client secret is used by the frontend to confirm the charge; the registration itself happens at settlement.",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 201, description = "Intent created", body = CreatePaymentIntentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already registered or event full (ALREADY_REGISTERED, EVENT_FULL)", body = ErrorBody),
        (status = 502, description = "Provider rejected the intent (PAYMENT_PROVIDER)", body = ErrorBody),
        (status = 503, description = "Maintenance mode (MAINTENANCE_MODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id = payload.event_id))]
pub async fn create_payment_intent(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_payment_intent(&payload)?;

    let settings = load_settings(&state.db).await?;
    if settings.maintenance_mode {
        return Err(AppError::Maintenance);
    }
    if !settings.registration_enabled {
        return Err(AppError::Validation(
            "Event registration is currently disabled".into(),
        ));
    }

    let event_model = find_event(&state.db, payload.event_id).await?;
    if event_model.price <= 0 {
        return Err(AppError::Validation(
            "This is a free event; use the registration endpoint".into(),
        ));
    }
    if chrono::Utc::now() >= event_model.start_time {
        return Err(AppError::Validation("Event has already started".into()));
    }

    // Advisory pre-checks so the caller is not charged for a slot they can
    // never get. The authoritative check runs again at settlement under the
    // event row lock.
    let registered = event_participant::Entity::find_by_id((event_model.id, auth_user.user_id))
        .one(&state.db)
        .await?;
    if registered.is_some() {
        return Err(AppError::AlreadyRegistered);
    }
    let count = event_participant::Entity::find()
        .filter(event_participant::Column::EventId.eq(event_model.id))
        .count(&state.db)
        .await?;
    if count >= event_model.capacity as u64 {
        return Err(AppError::EventFull);
    }

    let amount = charge_amount(event_model.price, payload.quantity);
    let now = chrono::Utc::now();
    let pending = payment::ActiveModel {
        user_id: Set(auth_user.user_id),
        event_id: Set(event_model.id),
        amount: Set(amount),
        currency: Set(state.config.payment.currency.clone()),
        quantity: Set(payload.quantity),
        provider_intent_id: Set(None),
        receipt_url: Set(None),
        registration_data: Set(payload.registration_data),
        status: Set(payment::status::PENDING.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let metadata = IntentMetadata {
        payment_id: pending.id,
        event_id: event_model.id,
        user_id: auth_user.user_id,
    };
    let intent = match state
        .payments
        .create_intent(amount, &state.config.payment.currency, metadata)
        .await
    {
        Ok(intent) => intent,
        Err(e) => {
            let mut failed: payment::ActiveModel = pending.into();
            failed.status = Set(payment::status::FAILED.to_string());
            failed.updated_at = Set(chrono::Utc::now());
            failed.update(&state.db).await?;
            return Err(e.into());
        }
    };

    let mut active: payment::ActiveModel = pending.into();
    active.provider_intent_id = Set(Some(intent.id));
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePaymentIntentResponse {
            client_secret: intent.client_secret,
            payment_id: model.id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Payments",
    operation_id = "paymentWebhook",
    summary = "Provider webhook endpoint",
    description = "Authenticated by the `Stripe-Signature` header over the raw request bytes, not a bearer token. Settles or fails payments idempotently; unknown event types are acknowledged and ignored.",
    request_body = String,
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 400, description = "Missing or invalid signature (WEBHOOK_SIGNATURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let header = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::WebhookSignature("Missing Stripe-Signature header".into()))?;

    let event = webhook::verify_and_parse(
        &body,
        header,
        &state.config.payment.webhook_secret,
        state.config.payment.webhook_tolerance_secs,
    )
    .map_err(|e| AppError::WebhookSignature(e.to_string()))?;

    let intent = &event.data.object;
    match event.kind.as_str() {
        "payment_intent.succeeded" => {
            let Some(model) = find_payment_for_intent(&state.db, intent).await? else {
                tracing::warn!(intent_id = %intent.id, "webhook for unknown payment, ignoring");
                return Ok(StatusCode::OK);
            };
            let (settled, newly_settled) = mark_succeeded(&state.db, model.id, None).await?;
            if newly_settled {
                apply_registration(&state, &settled).await;
            }
        }
        "payment_intent.payment_failed" => {
            if let Some(model) = find_payment_for_intent(&state.db, intent).await? {
                mark_failed(&state.db, model.id).await?;
            }
        }
        other => {
            tracing::debug!(kind = other, "ignoring webhook event type");
        }
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/confirm",
    tag = "Payments",
    operation_id = "confirmPayment",
    summary = "Client-side settlement fallback",
    description = "Settles a payment from the client when webhook delivery is delayed or unavailable. Only the paying user may confirm; the result is the same idempotent settlement the webhook performs.",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Payment settled", body = PaymentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the paying user (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown payment intent (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Payment already failed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn confirm_payment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ConfirmPaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let model = payment::Entity::find()
        .filter(payment::Column::ProviderIntentId.eq(payload.payment_intent_id.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

    if model.user_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }

    let (settled, newly_settled) = mark_succeeded(&state.db, model.id, payload.receipt_url).await?;
    if newly_settled {
        apply_registration(&state, &settled).await;
    }

    Ok(Json(PaymentResponse::from(settled)))
}

#[utoipa::path(
    get,
    path = "/mine",
    tag = "Payments",
    operation_id = "listMyPayments",
    summary = "List the caller's payments",
    responses(
        (status = 200, description = "Payments, newest first", body = Vec<PaymentResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn my_payments(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let rows = payment::Entity::find()
        .filter(payment::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(payment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(PaymentResponse::from).collect()))
}

/// Resolve a webhook intent object to a local payment row. The metadata id
/// planted at intent creation is authoritative; the provider intent id is the
/// fallback for intents created before metadata was attached.
async fn find_payment_for_intent<C: ConnectionTrait>(
    db: &C,
    intent: &webhook::IntentObject,
) -> Result<Option<payment::Model>, AppError> {
    if let Some(id) = intent
        .metadata
        .get("payment_id")
        .and_then(|v| v.parse::<i32>().ok())
    {
        let found = payment::Entity::find_by_id(id).one(db).await?;
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(payment::Entity::find()
        .filter(payment::Column::ProviderIntentId.eq(intent.id.as_str()))
        .one(db)
        .await?)
}

/// Transition a payment to `succeeded` exactly once.
///
/// Runs under a `FOR UPDATE` lock on the payment row so concurrent webhook
/// retries and client confirms serialize. Returns the settled model and
/// whether this call performed the transition; a payment that already failed
/// is terminal and yields a conflict.
async fn mark_succeeded(
    db: &DatabaseConnection,
    payment_id: i32,
    receipt_url: Option<String>,
) -> Result<(payment::Model, bool), AppError> {
    let txn = db.begin().await?;
    let model = payment::Entity::find_by_id(payment_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

    match model.status.as_str() {
        payment::status::SUCCEEDED => {
            // A confirm arriving after the webhook still carries the receipt
            // URL the webhook did not have; keep it without re-settling.
            if receipt_url.is_some() && model.receipt_url.is_none() {
                let mut active: payment::ActiveModel = model.into();
                active.receipt_url = Set(receipt_url);
                active.updated_at = Set(chrono::Utc::now());
                let updated = active.update(&txn).await?;
                txn.commit().await?;
                return Ok((updated, false));
            }
            txn.commit().await?;
            Ok((model, false))
        }
        payment::status::FAILED => Err(AppError::Conflict("Payment already failed".into())),
        _ => {
            let mut active: payment::ActiveModel = model.into();
            active.status = Set(payment::status::SUCCEEDED.to_string());
            if receipt_url.is_some() {
                active.receipt_url = Set(receipt_url);
            }
            active.updated_at = Set(chrono::Utc::now());
            let updated = active.update(&txn).await?;
            txn.commit().await?;
            Ok((updated, true))
        }
    }
}

/// Transition a payment to `failed` unless it is already terminal.
async fn mark_failed(db: &DatabaseConnection, payment_id: i32) -> Result<(), AppError> {
    let txn = db.begin().await?;
    let model = payment::Entity::find_by_id(payment_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".into()))?;

    if model.status == payment::status::PENDING {
        let mut active: payment::ActiveModel = model.into();
        active.status = Set(payment::status::FAILED.to_string());
        active.updated_at = Set(chrono::Utc::now());
        active.update(&txn).await?;
    }
    txn.commit().await?;
    Ok(())
}

/// Append the paid user to the event ledger after settlement.
///
/// The money has already been taken, so any ledger failure here (duplicate
/// entry from a webhook retry, a full event, a transient DB error) is logged
/// and swallowed rather than surfaced to the provider.
async fn apply_registration(state: &AppState, settled: &payment::Model) {
    let result = async {
        let caller = user::Entity::find_by_id(settled.user_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let form = settled.registration_data.as_ref();
        let field = |key: &str| {
            form.and_then(|v| v.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let entry = ParticipantEntry {
            user_id: caller.id,
            name: field("name").unwrap_or_else(|| caller.display_name()),
            email: caller.email,
            college: field("college").unwrap_or(caller.college),
        };

        let txn = state.db.begin().await?;
        registration::register(&txn, settled.event_id, entry).await?;
        txn.commit().await?;
        Ok::<_, AppError>(())
    }
    .await;

    match result {
        Ok(()) => {}
        Err(AppError::AlreadyRegistered) => {
            tracing::debug!(payment_id = settled.id, "settlement replay, ledger entry exists");
        }
        Err(e) => {
            tracing::warn!(
                payment_id = settled.id,
                event_id = settled.event_id,
                error = ?e,
                "post-settlement registration failed; payment stays settled"
            );
        }
    }
}
