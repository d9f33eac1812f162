//! Library entrypoint for StockLens.
//!
//! Integration tests under `tests/` build their own `AppState` from the
//! in-memory store and scripted providers, then drive the routers directly.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod events;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

pub mod controllers;
pub mod routes;

use services::{
    market::{Analyst, MarketData, NewsSource, Sources},
    store::{AlertStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub users: Arc<dyn UserStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub market: Arc<dyn MarketData>,
    pub news: Arc<dyn NewsSource>,
    pub analyst: Arc<dyn Analyst>,
    pub events_tx: events::EventSender,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        users: Arc<dyn UserStore>,
        alerts: Arc<dyn AlertStore>,
        sources: &Sources,
    ) -> Self {
        Self {
            settings,
            users,
            alerts,
            market: sources.market.clone(),
            news: sources.news.clone(),
            analyst: sources.analyst.clone(),
            events_tx: events::channel(),
        }
    }
}
