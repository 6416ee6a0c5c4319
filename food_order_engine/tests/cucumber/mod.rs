mod group_order_world;
mod setups;
mod steps;

pub use group_order_world::GroupOrderWorld;
