use serde_json::{Value, json};

use common::payment::webhook::signature_header;

use crate::common::{TestApp, WEBHOOK_SECRET, routes};

fn succeeded_event(intent_id: &str, payment_id: i32) -> Value {
    json!({
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": intent_id,
                "metadata": {
                    "payment_id": payment_id.to_string(),
                },
            },
        },
    })
}

/// Create a paid event and an intent for it; returns (event_id, payment_id,
/// provider intent id, buyer token).
async fn paid_event_with_intent(app: &TestApp, quantity: i32) -> (i32, i32, String, String) {
    let owner = app
        .create_user_with_role("owner@example.com", "securepass", "organizer")
        .await;
    let event_id = app.create_event(&owner, "Paid Gala", 100, 199).await;

    let buyer = app
        .create_authenticated_user("buyer@example.com", "securepass")
        .await;
    let res = app
        .post_with_token(
            routes::PAYMENT_INTENT,
            &json!({"event_id": event_id, "quantity": quantity}),
            &buyer,
        )
        .await;
    assert_eq!(res.status, 201, "create intent failed: {}", res.text);
    let payment_id = res.body["payment_id"].as_i64().unwrap() as i32;

    let recorded = app.payments.recorded();
    let intent_id = recorded
        .iter()
        .find(|r| r.payment_id == payment_id)
        .expect("provider should have been called")
        .intent_id
        .clone();

    (event_id, payment_id, intent_id, buyer)
}

mod intents {
    use super::*;

    #[tokio::test]
    async fn intent_amount_is_price_times_quantity_in_smallest_units() {
        let app = TestApp::spawn().await;
        let (_, payment_id, _, _) = paid_event_with_intent(&app, 2).await;

        let recorded = app.payments.recorded();
        let call = recorded.iter().find(|r| r.payment_id == payment_id).unwrap();
        // 199 whole units x 100 x 2 tickets.
        assert_eq!(call.amount, 39800);
        assert_eq!(call.currency, "inr");
    }

    #[tokio::test]
    async fn free_events_do_not_get_payment_intents() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_user_with_role("owner@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&owner, "Free Meetup", 100, 0).await;
        let buyer = app
            .create_authenticated_user("buyer@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                routes::PAYMENT_INTENT,
                &json!({"event_id": event_id, "quantity": 1}),
                &buyer,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn provider_rejection_fails_the_payment() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_user_with_role("owner@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&owner, "Paid Gala", 100, 199).await;
        let buyer = app
            .create_authenticated_user("buyer@example.com", "securepass")
            .await;

        app.payments.set_failing(true);
        let res = app
            .post_with_token(
                routes::PAYMENT_INTENT,
                &json!({"event_id": event_id, "quantity": 1}),
                &buyer,
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "PAYMENT_PROVIDER");

        let mine = app.get_with_token(routes::MY_PAYMENTS, &buyer).await;
        assert_eq!(mine.status, 200);
        let payments = mine.body.as_array().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0]["status"], "failed");
    }

    #[tokio::test]
    async fn intent_for_an_unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let buyer = app
            .create_authenticated_user("buyer@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                routes::PAYMENT_INTENT,
                &json!({"event_id": 9999, "quantity": 1}),
                &buyer,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod webhook {
    use super::*;

    #[tokio::test]
    async fn a_succeeded_webhook_settles_and_registers() {
        let app = TestApp::spawn().await;
        let (event_id, payment_id, intent_id, buyer) = paid_event_with_intent(&app, 1).await;

        let res = app.post_webhook(&succeeded_event(&intent_id, payment_id)).await;
        assert_eq!(res.status, 200);

        let mine = app.get_with_token(routes::MY_PAYMENTS, &buyer).await;
        assert_eq!(mine.body[0]["status"], "succeeded");

        let participants = app
            .get_with_token(&routes::event_participants(event_id), &buyer)
            .await;
        let list = participants.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["email"], "buyer@example.com");
    }

    #[tokio::test]
    async fn duplicate_webhook_delivery_registers_only_once() {
        let app = TestApp::spawn().await;
        let (event_id, payment_id, intent_id, buyer) = paid_event_with_intent(&app, 1).await;
        let body = succeeded_event(&intent_id, payment_id);

        let first = app.post_webhook(&body).await;
        assert_eq!(first.status, 200);
        let second = app.post_webhook(&body).await;
        assert_eq!(second.status, 200);

        let participants = app
            .get_with_token(&routes::event_participants(event_id), &buyer)
            .await;
        assert_eq!(participants.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn an_invalid_signature_changes_nothing() {
        let app = TestApp::spawn().await;
        let (event_id, payment_id, intent_id, buyer) = paid_event_with_intent(&app, 1).await;

        let raw = serde_json::to_string(&succeeded_event(&intent_id, payment_id)).unwrap();
        let forged = signature_header(chrono::Utc::now().timestamp(), raw.as_bytes(), "whsec_wrong");
        let res = app.post_webhook_raw(raw, &forged).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "WEBHOOK_SIGNATURE");

        let mine = app.get_with_token(routes::MY_PAYMENTS, &buyer).await;
        assert_eq!(mine.body[0]["status"], "pending");
        let participants = app
            .get_with_token(&routes::event_participants(event_id), &buyer)
            .await;
        assert!(participants.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_tampered_body_fails_verification() {
        let app = TestApp::spawn().await;
        let (_, payment_id, intent_id, _) = paid_event_with_intent(&app, 1).await;

        let raw = serde_json::to_string(&succeeded_event(&intent_id, payment_id)).unwrap();
        let header = signature_header(chrono::Utc::now().timestamp(), raw.as_bytes(), WEBHOOK_SECRET);
        let tampered = raw.replace("succeeded", "payment_failed");
        let res = app.post_webhook_raw(tampered, &header).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "WEBHOOK_SIGNATURE");
    }

    #[tokio::test]
    async fn a_failed_webhook_marks_the_payment_failed() {
        let app = TestApp::spawn().await;
        let (_, payment_id, intent_id, buyer) = paid_event_with_intent(&app, 1).await;

        let res = app
            .post_webhook(&json!({
                "type": "payment_intent.payment_failed",
                "data": {
                    "object": {
                        "id": intent_id,
                        "metadata": {"payment_id": payment_id.to_string()},
                    },
                },
            }))
            .await;
        assert_eq!(res.status, 200);

        let mine = app.get_with_token(routes::MY_PAYMENTS, &buyer).await;
        assert_eq!(mine.body[0]["status"], "failed");
    }

    #[tokio::test]
    async fn unknown_event_types_are_acknowledged() {
        let app = TestApp::spawn().await;
        let (_, payment_id, intent_id, _) = paid_event_with_intent(&app, 1).await;

        let res = app
            .post_webhook(&json!({
                "type": "charge.refunded",
                "data": {
                    "object": {
                        "id": intent_id,
                        "metadata": {"payment_id": payment_id.to_string()},
                    },
                },
            }))
            .await;

        assert_eq!(res.status, 200);
    }
}

mod confirm {
    use super::*;

    #[tokio::test]
    async fn the_buyer_can_confirm_their_own_payment() {
        let app = TestApp::spawn().await;
        let (event_id, _, intent_id, buyer) = paid_event_with_intent(&app, 1).await;

        let res = app
            .post_with_token(
                routes::CONFIRM,
                &json!({
                    "payment_intent_id": intent_id,
                    "receipt_url": "https://pay.example.com/receipts/1",
                }),
                &buyer,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "succeeded");
        assert_eq!(res.body["receipt_url"], "https://pay.example.com/receipts/1");

        let participants = app
            .get_with_token(&routes::event_participants(event_id), &buyer)
            .await;
        assert_eq!(participants.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confirm_after_webhook_is_idempotent() {
        let app = TestApp::spawn().await;
        let (event_id, payment_id, intent_id, buyer) = paid_event_with_intent(&app, 1).await;

        let webhook = app.post_webhook(&succeeded_event(&intent_id, payment_id)).await;
        assert_eq!(webhook.status, 200);

        let res = app
            .post_with_token(
                routes::CONFIRM,
                &json!({
                    "payment_intent_id": intent_id,
                    "receipt_url": "https://pay.example.com/receipts/late",
                }),
                &buyer,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "succeeded");
        // The webhook settled without a receipt URL; the late confirm still
        // records it.
        assert_eq!(res.body["receipt_url"], "https://pay.example.com/receipts/late");

        let participants = app
            .get_with_token(&routes::event_participants(event_id), &buyer)
            .await;
        assert_eq!(participants.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_the_paying_user_may_confirm() {
        let app = TestApp::spawn().await;
        let (_, _, intent_id, _) = paid_event_with_intent(&app, 1).await;
        let stranger = app
            .create_authenticated_user("stranger@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                routes::CONFIRM,
                &json!({"payment_intent_id": intent_id}),
                &stranger,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn confirming_an_unknown_intent_is_not_found() {
        let app = TestApp::spawn().await;
        let buyer = app
            .create_authenticated_user("buyer@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                routes::CONFIRM,
                &json!({"payment_intent_id": "pi_does_not_exist"}),
                &buyer,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn registration_data_is_replayed_onto_the_ledger_entry() {
        let app = TestApp::spawn().await;
        let owner = app
            .create_user_with_role("owner@example.com", "securepass", "organizer")
            .await;
        let event_id = app.create_event(&owner, "Paid Gala", 100, 199).await;
        let buyer = app
            .create_authenticated_user("buyer@example.com", "securepass")
            .await;

        let res = app
            .post_with_token(
                routes::PAYMENT_INTENT,
                &json!({
                    "event_id": event_id,
                    "quantity": 1,
                    "registration_data": {"name": "Badge Name", "college": "Other College"},
                }),
                &buyer,
            )
            .await;
        assert_eq!(res.status, 201);
        let payment_id = res.body["payment_id"].as_i64().unwrap() as i32;
        let intent_id = app.payments.recorded()[0].intent_id.clone();

        app.post_webhook(&succeeded_event(&intent_id, payment_id)).await;

        let participants = app
            .get_with_token(&routes::event_participants(event_id), &buyer)
            .await;
        let list = participants.body.as_array().unwrap();
        assert_eq!(list[0]["name"], "Badge Name");
        assert_eq!(list[0]["college"], "Other College");
    }
}
