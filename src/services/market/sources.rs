use std::sync::Arc;

use super::{
    AlphaVantageClient, Analyst, DemoData, MarketData, NewsApiClient, NewsSource, OpenAiAnalyst,
    Ranked,
};
use crate::config::Settings;

/// Provider wiring chosen once at start-up.
///
/// The dashboard chains end with demo data so research pages always render.
/// The sweep chains never mix live and demo data: with any live source
/// configured they are live-only, so an outage cannot fire alerts on sample
/// prices.
#[derive(Clone)]
pub struct Sources {
    pub market: Arc<dyn MarketData>,
    pub news: Arc<dyn NewsSource>,
    pub analyst: Arc<dyn Analyst>,
    pub sweep_market: Arc<dyn MarketData>,
    pub sweep_news: Arc<dyn NewsSource>,
}

impl Sources {
    pub fn from_settings(settings: &Settings) -> Self {
        let timeout = settings.provider_timeout();
        let demo = Arc::new(DemoData);

        let live_market: Option<Arc<dyn MarketData>> = settings.has_alpha_vantage_key().then(|| {
            Arc::new(AlphaVantageClient::new(settings.alpha_vantage_api_key.clone(), timeout))
                as Arc<dyn MarketData>
        });
        let live_news: Option<Arc<dyn NewsSource>> = settings.has_news_api_key().then(|| {
            Arc::new(NewsApiClient::new(settings.news_api_key.clone(), timeout)) as Arc<dyn NewsSource>
        });
        let live_analyst: Option<Arc<dyn Analyst>> = settings.has_openai_key().then(|| {
            Arc::new(OpenAiAnalyst::new(
                settings.openai_api_key.clone(),
                settings.openai_model.clone(),
                timeout,
            )) as Arc<dyn Analyst>
        });

        tracing::info!(
            alpha_vantage = live_market.is_some(),
            news_api = live_news.is_some(),
            openai = live_analyst.is_some(),
            "data sources configured"
        );

        let market: Arc<dyn MarketData> = match &live_market {
            Some(live) => Arc::new(Ranked::<dyn MarketData>::new(vec![live.clone(), demo.clone() as Arc<dyn MarketData>])),
            None => demo.clone(),
        };
        let news: Arc<dyn NewsSource> = match &live_news {
            Some(live) => Arc::new(Ranked::<dyn NewsSource>::new(vec![live.clone(), demo.clone() as Arc<dyn NewsSource>])),
            None => demo.clone(),
        };
        let analyst: Arc<dyn Analyst> = match live_analyst {
            Some(live) => Arc::new(Ranked::<dyn Analyst>::new(vec![live, demo.clone() as Arc<dyn Analyst>])),
            None => demo.clone(),
        };

        Self {
            market,
            news,
            analyst,
            sweep_market: live_market.unwrap_or_else(|| demo.clone() as Arc<dyn MarketData>),
            sweep_news: live_news.unwrap_or_else(|| demo as Arc<dyn NewsSource>),
        }
    }

    /// Demo data everywhere.
    pub fn demo() -> Self {
        let demo = Arc::new(DemoData);
        Self {
            market: demo.clone(),
            news: demo.clone(),
            analyst: demo.clone(),
            sweep_market: demo.clone(),
            sweep_news: demo,
        }
    }
}
