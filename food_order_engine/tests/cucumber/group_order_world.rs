use cucumber::World;
use food_order_engine::{
    db_types::{GroupOrder, GroupOrderId},
    events::EventProducers,
    order_objects::CallbackOutcome,
    test_utils::{fake_processor::FakePaymentProcessor, fixtures::seeded_database, prepare_env::random_db_path},
    traits::GroupOrderManagement,
    GroupOrderApi,
    OrderFlowConfig,
    OrderFlowError,
    PaymentCallbackApi,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct GroupOrderWorld {
    pub system: Option<FoodOrderSystem>,
}

#[derive(Debug)]
pub struct FoodOrderSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub processor: FakePaymentProcessor,
    pub group_orders: GroupOrderApi<SqliteDatabase, FakePaymentProcessor>,
    pub callbacks: PaymentCallbackApi<SqliteDatabase>,
    pub current: Option<GroupOrderId>,
    pub last_error: Option<OrderFlowError>,
    pub last_outcome: Option<CallbackOutcome>,
}

impl GroupOrderWorld {
    pub fn system(&mut self) -> &mut FoodOrderSystem {
        self.system.as_mut().expect("Food ordering system not initialised")
    }
}

impl FoodOrderSystem {
    pub async fn new(config: OrderFlowConfig) -> Self {
        let db_path = random_db_path();
        let db = seeded_database(&db_path).await;
        debug!("Created database: {db_path}");
        let processor = FakePaymentProcessor::new();
        let group_orders = GroupOrderApi::new(db.clone(), processor.clone(), config);
        let callbacks = PaymentCallbackApi::new(db.clone(), EventProducers::default());
        Self {
            db_path,
            db,
            processor,
            group_orders,
            callbacks,
            current: None,
            last_error: None,
            last_outcome: None,
        }
    }

    pub fn current_id(&self) -> GroupOrderId {
        self.current.clone().expect("No group order has been started")
    }

    pub async fn current_group_order(&self) -> GroupOrder {
        let id = self.current_id();
        self.db.fetch_group_order(&id).await.expect("Error fetching group order").expect("Group order is missing")
    }
}
