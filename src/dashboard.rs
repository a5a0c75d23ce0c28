//! The dashboard configuration document and its loader.
//!
//! Only the raw bytes are cached by the fetcher; the document is decoded
//! afresh on every load. Fields are read leniently: a value of the wrong
//! type falls back to its default instead of rejecting the document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::error::LoadError;
use crate::fetcher::Fetcher;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    #[serde(default)]
    pub active_dashboard_id: Value,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub dashboards: Vec<Dashboard>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Dashboard {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Rss,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Widget {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: WidgetType,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub config: WidgetConfig,
}

/// Settings of a single widget. Flags and the item limit are read leniently,
/// the way loosely typed JSON producers write them.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default)]
    pub url: Value,
    #[serde(default)]
    pub show_description: Value,
    #[serde(default)]
    pub show_date: Value,
    #[serde(default)]
    pub max_items: Value,
}

/// Decodes any JSON value, keeping `T::default()` when it does not fit `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like [`lenient`], element by element. A non-array is an empty list.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        _ => return Ok(Vec::new()),
    };
    Ok(values
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

/// How many items of a feed to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLimit {
    /// Keep the first `n` items.
    First(usize),
    /// Drop the last `n` items.
    AllBut(usize),
}

impl ItemLimit {
    fn from_count(count: i64) -> Self {
        if count < 0 {
            ItemLimit::AllBut(count.unsigned_abs() as usize)
        } else {
            ItemLimit::First(count as usize)
        }
    }

    pub fn apply<T>(self, items: &[T]) -> &[T] {
        match self {
            ItemLimit::First(n) => &items[..n.min(items.len())],
            ItemLimit::AllBut(n) => &items[..items.len().saturating_sub(n)],
        }
    }
}

impl DashboardConfig {
    /// Decodes a configuration document. Anything but a non-empty JSON
    /// object is refused.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        match &value {
            Value::Object(map) if !map.is_empty() => {}
            _ => return Err(LoadError::EmptyConfig),
        }
        Ok(serde_json::from_value(value)?)
    }

    /// First dashboard whose id equals `activeDashboardId`.
    pub fn active_dashboard(&self) -> Option<&Dashboard> {
        if self.active_dashboard_id.is_null() {
            return None;
        }
        self.dashboards
            .iter()
            .find(|dashboard| dashboard.id == self.active_dashboard_id)
    }
}

impl Dashboard {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("Dashboard")
    }
}

impl Widget {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("RSS Feed")
    }
}

impl WidgetConfig {
    /// Configured feed URL, `None` when unset or falsy. Non-string values are
    /// passed on as their JSON text, which never validates as a URL.
    pub fn feed_url(&self) -> Option<String> {
        match &self.url {
            Value::String(url) if !url.is_empty() => Some(url.clone()),
            value if truthy(value) => Some(value.to_string()),
            _ => None,
        }
    }

    pub fn shows_description(&self) -> bool {
        truthy(&self.show_description)
    }

    pub fn shows_date(&self) -> bool {
        truthy(&self.show_date)
    }

    /// `None` means every item is shown, including when `maxItems` is not an integer.
    pub fn item_limit(&self) -> Option<ItemLimit> {
        match &self.max_items {
            Value::Bool(true) => Some(ItemLimit::First(1)),
            Value::Number(number) => match number.as_i64() {
                Some(0) => None,
                Some(count) => Some(ItemLimit::from_count(count)),
                None => number
                    .as_f64()
                    .filter(|f| f.is_finite() && *f != 0.0)
                    .map(|f| ItemLimit::from_count(f.trunc() as i64)),
            },
            Value::String(text) if !text.is_empty() => {
                text.trim().parse::<i64>().ok().map(ItemLimit::from_count)
            }
            _ => None,
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub async fn load_config(fetcher: &Fetcher, url: &str) -> Result<DashboardConfig, LoadError> {
    let bytes = fetcher.fetch(url).await?;
    DashboardConfig::from_slice(&bytes).map_err(|e| {
        warn!("Error parsing JSON from {}: {}", url, e);
        e
    })
}
