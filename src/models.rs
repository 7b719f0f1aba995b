use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

// Currencies the storefront accepts payment in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Eth,
    Matic,
    Usdc,
    Usdt,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Eth, Currency::Matic, Currency::Usdc, Currency::Usdt];

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Eth => "ETH",
            Currency::Matic => "MATIC",
            Currency::Usdc => "USDC",
            Currency::Usdt => "USDT",
        }
    }

    // CoinGecko asset id
    pub fn coingecko_id(self) -> &'static str {
        match self {
            Currency::Eth => "ethereum",
            Currency::Matic => "matic-network",
            Currency::Usdc => "usd-coin",
            Currency::Usdt => "tether",
        }
    }

    fn supported_list() -> String {
        Self::ALL.map(Currency::symbol).join(", ")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Currency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.symbol() == upper)
            .ok_or(())
    }
}

#[derive(Deserialize, Default)]
pub struct PricesQuery {
    #[serde(default)]
    pub force: Option<String>,
}

impl PricesQuery {
    pub fn force_refresh(&self) -> bool {
        self.force.as_deref() == Some("true")
    }
}

// Conversion request body as the client sends it
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub from_currency: Option<Value>,
    #[serde(default)]
    pub to_currency: Option<Value>,
}

// Validated conversion, ready for pricing
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionQuery {
    pub amount: f64,
    pub from: Currency,
}

impl ConvertRequest {
    /// Parses and validates a raw request body. Runs before any cache or
    /// rate limit work.
    pub fn parse(body: &[u8]) -> Result<ConversionQuery, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::BadRequest("Request body is required".to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|_| AppError::BadRequest("Invalid JSON body".to_string()))?;

        // arrays and scalars carry no fields; they fail validation like `{}`
        let raw: ConvertRequest = match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|_| AppError::BadRequest("Invalid JSON body".to_string()))?,
            _ => ConvertRequest::default(),
        };

        raw.validate()
    }

    pub fn validate(self) -> Result<ConversionQuery, AppError> {
        let amount = self.amount.as_ref().and_then(number_from).unwrap_or(f64::NAN);
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::BadRequest(
                "Amount must be a positive number".to_string(),
            ));
        }

        let from = self.from_currency.as_ref().map(text_from).unwrap_or_default();
        if from.is_empty() {
            return Err(AppError::BadRequest("From currency is required".to_string()));
        }

        let to = self
            .to_currency
            .as_ref()
            .map(text_from)
            .unwrap_or_else(|| "USD".to_string())
            .to_uppercase();
        if to != "USD" {
            return Err(AppError::BadRequest(
                "Only USD conversion is currently supported".to_string(),
            ));
        }

        let from = from.parse::<Currency>().map_err(|_| {
            AppError::BadRequest(format!(
                "Unsupported currency: {}. Supported currencies: {}",
                from,
                Currency::supported_list()
            ))
        })?;

        Ok(ConversionQuery { amount, from })
    }
}

// numbers and numeric strings are both accepted
fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// falsy values read as missing
fn text_from(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        other => other.to_string(),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub original_amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub converted_amount: f64,
    pub exchange_rate: f64,
    pub timestamp: String,
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
