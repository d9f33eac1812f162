pub mod market;
pub mod store;
pub mod alert_monitor;

pub mod auth_service;
pub mod alerts_service;
pub mod stocks_service;
