use std::{fmt, str::FromStr};

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Above,
    Below,
    ChangePercent,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Above => "above",
            AlertType::Below => "below",
            AlertType::ChangePercent => "change_percent",
        }
    }

    pub fn uses_target_price(&self) -> bool {
        matches!(self, AlertType::Above | AlertType::Below)
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(AlertType::Above),
            "below" => Ok(AlertType::Below),
            "change_percent" => Ok(AlertType::ChangePercent),
            other => Err(AppError::Validation(format!(
                "Unknown alert type '{other}' (expected above, below or change_percent)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub symbol: String,
    pub alert_type: AlertType,

    // set iff alert_type is above/below
    pub target_price: Option<f64>,
    // set iff alert_type is change_percent
    pub change_percent: Option<f64>,

    pub is_active: bool,
    pub triggered: bool,
    pub triggered_at: Option<i64>,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsAlert {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub symbol: String,
    pub keywords: Vec<String>,
    pub is_active: bool,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for a price alert. `updated_at` is always bumped by the store.
#[derive(Debug, Clone, Default)]
pub struct PriceAlertPatch {
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct NewsAlertPatch {
    pub is_active: Option<bool>,
    pub keywords: Option<Vec<String>>,
}

// ---------------- Requests ----------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePriceAlertRequest {
    pub symbol: String,
    pub alert_type: String,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsAlertRequest {
    pub symbol: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceAlertRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsAlertRequest {
    pub is_active: Option<bool>,
    pub keywords: Option<Vec<String>>,
}

/// A price alert request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceAlert {
    pub symbol: String,
    pub alert_type: AlertType,
    pub target_price: Option<f64>,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNewsAlert {
    pub symbol: String,
    pub keywords: Vec<String>,
}

pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let sym = raw.trim().to_uppercase();
    if sym.is_empty() {
        return Err(AppError::Validation("Symbol is required".into()));
    }
    if sym.len() > 10
        || !sym
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(AppError::Validation(format!("Invalid symbol '{sym}'")));
    }
    Ok(sym)
}

fn positive(value: Option<f64>, field: &str) -> Result<f64, AppError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(_) => Err(AppError::Validation(format!("{field} must be a positive number"))),
        None => Err(AppError::Validation(format!("{field} is required"))),
    }
}

impl CreatePriceAlertRequest {
    pub fn validate(self) -> Result<NewPriceAlert, AppError> {
        let symbol = normalize_symbol(&self.symbol)?;
        let alert_type: AlertType = self.alert_type.parse()?;

        let (target_price, change_percent) = if alert_type.uses_target_price() {
            if self.change_percent.is_some() {
                return Err(AppError::Validation(format!(
                    "changePercent is not allowed for '{alert_type}' alerts"
                )));
            }
            (Some(positive(self.target_price, "targetPrice")?), None)
        } else {
            if self.target_price.is_some() {
                return Err(AppError::Validation(
                    "targetPrice is not allowed for 'change_percent' alerts".into(),
                ));
            }
            (None, Some(positive(self.change_percent, "changePercent")?))
        };

        Ok(NewPriceAlert {
            symbol,
            alert_type,
            target_price,
            change_percent,
        })
    }
}

/// Trims keywords and drops blanks; at least one must remain.
pub fn clean_keywords(raw: Vec<String>) -> Result<Vec<String>, AppError> {
    let keywords: Vec<String> = raw
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(AppError::Validation(
            "At least one non-empty keyword is required".into(),
        ));
    }
    Ok(keywords)
}

impl CreateNewsAlertRequest {
    pub fn validate(self) -> Result<NewNewsAlert, AppError> {
        Ok(NewNewsAlert {
            symbol: normalize_symbol(&self.symbol)?,
            keywords: clean_keywords(self.keywords)?,
        })
    }
}

// ---------------- Views ----------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlertView {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub alert_type: AlertType,
    pub target_price: Option<f64>,
    pub change_percent: Option<f64>,
    pub is_active: bool,
    pub triggered: bool,
    pub triggered_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&PriceAlert> for PriceAlertView {
    fn from(a: &PriceAlert) -> Self {
        Self {
            id: a.id.to_hex(),
            user_id: a.user_id.to_hex(),
            symbol: a.symbol.clone(),
            alert_type: a.alert_type,
            target_price: a.target_price,
            change_percent: a.change_percent,
            is_active: a.is_active,
            triggered: a.triggered,
            triggered_at: a.triggered_at,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsAlertView {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub keywords: Vec<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&NewsAlert> for NewsAlertView {
    fn from(a: &NewsAlert) -> Self {
        Self {
            id: a.id.to_hex(),
            user_id: a.user_id.to_hex(),
            symbol: a.symbol.clone(),
            keywords: a.keywords.clone(),
            is_active: a.is_active,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
