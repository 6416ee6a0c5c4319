//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, checkout session requests) should
//! be expressed as futures or asynchronous functions. Async handlers get executed concurrently by worker threads and
//! thus don’t block execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use checkout_tools::WebhookEvent;
use food_order_engine::{
    db_types::{GroupOrderId, OrderId},
    traits::{FoodOrderDatabase, PaymentProcessor},
    GroupOrderApi,
    OrderCheckoutApi,
    PaymentCallbackApi,
};
use log::*;
use serde_json::json;

use crate::{
    auth::JwtClaims,
    data_objects::{
        CheckoutUrlResponse,
        CreateCheckoutSessionRequest,
        CreateGroupOrderRequest,
        CreatedGroupOrderResponse,
        JoinGroupOrderRequest,
        JsonResponse,
    },
    errors::ServerError,
    integrations::checkout::confirmation_from_event,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Request bodies that can't be deserialized are reported with the same JSON error body as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not read request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "" impl FoodOrderDatabase, PaymentProcessor);
/// All the orders the caller has placed, including final orders for group orders they started.
pub async fn my_orders<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    api: web::Data<OrderCheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for {}", claims.sub);
    let orders = api.orders_for_user(&claims.participant().id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/by-id/{order_id}" impl FoodOrderDatabase, PaymentProcessor);
pub async fn order_by_id<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderCheckoutApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for {}", claims.sub);
    let order = api.order_for_user(&order_id, &claims.participant().id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(create_checkout_session => Post "/checkout/create-checkout-session" impl FoodOrderDatabase, PaymentProcessor);
/// Starts a checkout for the caller.
///
/// Without a `groupOrderId`, the cart is priced and the caller pays for everything, including delivery. With a
/// `groupOrderId`, the caller is joining that group order, the cart is ignored and the caller pays their share.
///
/// The response is the URL of the hosted checkout page that the browser should be redirected to.
pub async fn create_checkout_session<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    body: web::Json<CreateCheckoutSessionRequest>,
    orders_api: web::Data<OrderCheckoutApi<B, P>>,
    group_api: web::Data<GroupOrderApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let participant = claims.participant();
    let redirect = match request.group_order_id {
        Some(id) => {
            debug!("💻️ {} is checking out a share of group order {id}", participant.id);
            group_api.prepare_join(&id, request.delivery_details, &participant).await?
        },
        None => {
            debug!("💻️ {} is checking out an order from {}", participant.id, request.restaurant_id);
            orders_api
                .create_individual_checkout(
                    &request.restaurant_id,
                    &request.cart_items,
                    request.delivery_details,
                    &participant,
                )
                .await?
        },
    };
    Ok(HttpResponse::Ok().json(CheckoutUrlResponse { url: redirect.url }))
}

//----------------------------------------------   Group orders  ----------------------------------------------------
route!(create_group_order => Post "/group" impl FoodOrderDatabase, PaymentProcessor);
/// Starts a group order. The cart total, including delivery, is split evenly between the participants. The response
/// carries the link that the initiator shares with everyone else.
pub async fn create_group_order<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    body: web::Json<CreateGroupOrderRequest>,
    api: web::Data<GroupOrderApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ {} is starting a group order at {}", claims.sub, request.restaurant_id);
    let created = api.create_group_order(&request.restaurant_id, &request.cart_items, &claims.participant()).await?;
    let response = CreatedGroupOrderResponse {
        group_order_id: created.group_order_id,
        shareable_link: created.shareable_link,
        amount_per_person: created.amount_per_person,
        group_order: created.group_order,
    };
    Ok(HttpResponse::Created().json(response))
}

route!(my_group_orders => Get "/get-group" impl FoodOrderDatabase, PaymentProcessor);
/// The group orders the caller has paid a share of.
pub async fn my_group_orders<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    api: web::Data<GroupOrderApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET group orders for {}", claims.sub);
    let group_orders = api.participant_group_orders(&claims.participant().id).await?;
    Ok(HttpResponse::Ok().json(group_orders))
}

route!(group_order_by_id => Get "/group/{group_order_id}" impl FoodOrderDatabase, PaymentProcessor);
pub async fn group_order_by_id<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    path: web::Path<GroupOrderId>,
    api: web::Data<GroupOrderApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET group order {id} for {}", claims.sub);
    let group_order = api.group_order_with_link(&id).await?;
    Ok(HttpResponse::Ok().json(group_order))
}

route!(join_group_order => Post "/join-group/{group_order_id}" impl FoodOrderDatabase, PaymentProcessor);
/// Starts a checkout for the caller's share of a group order. Participants who have already paid, and group orders
/// that are paid, cancelled or expired, are refused with a 400.
pub async fn join_group_order<B: FoodOrderDatabase, P: PaymentProcessor>(
    claims: JwtClaims,
    path: web::Path<GroupOrderId>,
    body: web::Json<JoinGroupOrderRequest>,
    api: web::Data<GroupOrderApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ {} is joining group order {id}", claims.sub);
    let redirect = api.prepare_join(&id, body.into_inner().delivery_details, &claims.participant()).await?;
    Ok(HttpResponse::Ok().json(CheckoutUrlResponse { url: redirect.url }))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(checkout_webhook => Post "" impl FoodOrderDatabase);
/// Payment processor callbacks. The signature has already been checked by the time this handler runs.
///
/// Every event that has been dealt with, including duplicates, events for records that no longer accept payments and
/// event types we don't act on, is acknowledged with a 200. Only transient failures return a 5xx, so that the
/// processor delivers the event again later.
pub async fn checkout_webhook<B: FoodOrderDatabase>(
    body: web::Bytes,
    api: web::Data<PaymentCallbackApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let event = serde_json::from_slice::<WebhookEvent>(body.as_ref()).map_err(|e| {
        warn!("💻️ Could not deserialize webhook event. {e}");
        ServerError::InvalidWebhookEvent(e.to_string())
    })?;
    trace!("💻️ Received webhook event {} ({})", event.id, event.event_type);
    let Some(confirmation) = confirmation_from_event(&event)? else {
        return Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} events are ignored", event.event_type))));
    };
    let outcome = api.process_checkout_completed(confirmation).await?;
    info!("💻️ Webhook event {} handled: {}", event.id, outcome.label());
    Ok(HttpResponse::Ok().json(json!({ "received": true, "outcome": outcome.label() })))
}
