pub mod user;
pub mod alert;
pub mod notification;
pub mod market;

pub use user::{CurrentUser, LoginRequest, RegisterRequest, User};
pub use alert::{AlertType, NewsAlert, NewsAlertPatch, PriceAlert, PriceAlertPatch};
pub use notification::{AlertNotification, AlertStats, NotificationKind};
pub use market::{AiAnalysis, CompanyOverview, NewsArticle, Quote, SearchMatch, StockAnalysis};
