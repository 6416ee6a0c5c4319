use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    GroupOrderPaidEvent,
    Handler,
    OperatorAlertEvent,
    OrderPaidEvent,
    ParticipantPaidEvent,
};

pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub participant_paid_producer: Vec<EventProducer<ParticipantPaidEvent>>,
    pub group_order_paid_producer: Vec<EventProducer<GroupOrderPaidEvent>>,
    pub operator_alert_producer: Vec<EventProducer<OperatorAlertEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for producer in &self.order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_participant_paid(&self, event: ParticipantPaidEvent) {
        for producer in &self.participant_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_group_order_paid(&self, event: GroupOrderPaidEvent) {
        for producer in &self.group_order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_operator_alert(&self, event: OperatorAlertEvent) {
        for producer in &self.operator_alert_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_participant_paid: Option<EventHandler<ParticipantPaidEvent>>,
    pub on_group_order_paid: Option<EventHandler<GroupOrderPaidEvent>>,
    pub on_operator_alert: Option<EventHandler<OperatorAlertEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_paid: hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_participant_paid: hooks.on_participant_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_group_order_paid: hooks.on_group_order_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_operator_alert: hooks.on_operator_alert.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_participant_paid {
            result.participant_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_group_order_paid {
            result.group_order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_operator_alert {
            result.operator_alert_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for every registered handler. Each task ends once all of its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_participant_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_group_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_operator_alert {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_participant_paid: Option<Handler<ParticipantPaidEvent>>,
    pub on_group_order_paid: Option<Handler<GroupOrderPaidEvent>>,
    pub on_operator_alert: Option<Handler<OperatorAlertEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_participant_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ParticipantPaidEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_participant_paid = Some(Arc::new(f));
        self
    }

    pub fn on_group_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(GroupOrderPaidEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_group_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_operator_alert<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OperatorAlertEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_operator_alert = Some(Arc::new(f));
        self
    }
}
