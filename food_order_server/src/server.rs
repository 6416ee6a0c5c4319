use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_tools::{webhook::DEFAULT_TOLERANCE, CheckoutApi};
use food_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers, HookFuture},
    traits::{FoodOrderDatabase, PaymentProcessor},
    GroupOrderApi,
    OrderCheckoutApi,
    PaymentCallbackApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::{start_expiry_worker, watch_expiry_worker},
    integrations::checkout::ProcessorClient,
    middleware::WebhookSignatureFactory,
    routes::{
        health,
        json_config,
        CheckoutWebhookRoute,
        CreateCheckoutSessionRoute,
        CreateGroupOrderRoute,
        GroupOrderByIdRoute,
        JoinGroupOrderRoute,
        MyGroupOrdersRoute,
        MyOrdersRoute,
        OrderByIdRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = CheckoutApi::new(config.checkout.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let processor = ProcessorClient::new(api);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, notification_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    match config.expiry_sweep_interval {
        Some(interval) => {
            let api = GroupOrderApi::new(db.clone(), processor.clone(), config.order_flow_config());
            let worker = start_expiry_worker(api, interval);
            tokio::spawn(watch_expiry_worker(worker));
        },
        None => info!("🕰️ The group order expiry worker is disabled"),
    }
    let srv = create_server_instance(config, db, processor, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The server's own reactions to engine events. Operator alerts are logged at `error` level.
pub fn notification_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_paid(|ev| -> HookFuture {
            Box::pin(async move {
                info!("📦️ Order {} for {} is paid and ready for {}", ev.order.id, ev.order.total_amount, ev.order.restaurant_id);
            })
        })
        .on_participant_paid(|ev| -> HookFuture {
            Box::pin(async move {
                info!(
                    "🍱️ {} paid their share of group order {}. {}/{} shares paid",
                    ev.participant.email, ev.group_order_id, ev.paid_count, ev.total_participants
                );
            })
        })
        .on_group_order_paid(|ev| -> HookFuture {
            Box::pin(async move {
                info!(
                    "🍱️ Group order {} is complete. Order {} for {} sent to {}",
                    ev.group_order.id, ev.order.id, ev.order.total_amount, ev.order.restaurant_id
                );
            })
        })
        .on_operator_alert(|ev| -> HookFuture {
            Box::pin(async move {
                let id = ev.group_order_id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
                error!("🚨️ [{}] (group order {id}) {}", ev.kind, ev.message);
            })
        });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    processor: ProcessorClient,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow_config = config.order_flow_config();
        let group_api = GroupOrderApi::new(db.clone(), processor.clone(), flow_config.clone());
        let checkout_api = OrderCheckoutApi::new(db.clone(), processor.clone(), flow_config);
        let callback_api = PaymentCallbackApi::new(db.clone(), producers.clone());
        let validator = TokenValidator::new(&config.auth);
        let signature_checks = WebhookSignatureFactory::new(
            config.checkout.webhook_secret.clone(),
            DEFAULT_TOLERANCE,
            config.webhook_signature_checks,
        );
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("fos::access_log"))
            .app_data(web::Data::new(group_api))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(callback_api))
            .app_data(web::Data::new(validator))
            .configure(|cfg| configure_routes::<SqliteDatabase, ProcessorClient>(cfg, signature_checks))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Registers every route. The APIs and the token validator must already be in the app data.
///
/// The webhook scope must be registered before the `/api/order` scope.
pub fn configure_routes<B, P>(cfg: &mut web::ServiceConfig, signature_checks: WebhookSignatureFactory)
where
    B: FoodOrderDatabase + 'static,
    P: PaymentProcessor + 'static,
{
    let webhook_scope = web::scope("/api/order/checkout/webhook")
        .wrap(signature_checks)
        .service(CheckoutWebhookRoute::<B>::new());
    let order_scope = web::scope("/api/order")
        .app_data(json_config())
        .service(MyOrdersRoute::<B, P>::new())
        .service(OrderByIdRoute::<B, P>::new())
        .service(CreateCheckoutSessionRoute::<B, P>::new())
        .service(CreateGroupOrderRoute::<B, P>::new())
        .service(MyGroupOrdersRoute::<B, P>::new())
        .service(GroupOrderByIdRoute::<B, P>::new())
        .service(JoinGroupOrderRoute::<B, P>::new());
    cfg.service(health).service(webhook_scope).service(order_scope);
}
