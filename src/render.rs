//! Dashboard rendering.
//!
//! The page is built as a list of typed blocks first and turned into markup
//! by askama at the end. Titles, links and dates are escaped by the template;
//! descriptions arrive already sanitized.

use std::sync::Arc;

use askama::Template;

use crate::dashboard::{DashboardConfig, Widget, WidgetConfig, WidgetType};
use crate::feed::{channel_items, load_feed, FeedDocument, FeedItem};
use crate::fetcher::Fetcher;
use crate::sanitize::sanitize;

/// Sanitized description characters kept before the ellipsis.
pub const SUMMARY_LENGTH: usize = 200;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub message: &'static str,
}

pub const CONFIG_MISSING: &str = "Error loading configuration";
pub const DASHBOARD_MISSING: &str = "Active dashboard not found";

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub name: String,
    pub widgets: Vec<WidgetBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetBlock {
    pub title: String,
    pub body: WidgetBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetBody {
    Notice(Notice),
    Items(Vec<ItemBlock>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoUrl,
    LoadFailed,
    InvalidFormat,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::NoUrl => "No RSS URL configured.",
            Notice::LoadFailed => "Failed to load feed.",
            Notice::InvalidFormat => "Invalid RSS feed format.",
        }
    }
}

/// A feed item ready for the template. `summary` already carries the ellipsis.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBlock {
    pub title: String,
    pub link: String,
    pub date: Option<String>,
    pub summary: Option<String>,
}

impl ItemBlock {
    pub fn new(item: &FeedItem, config: &WidgetConfig) -> Self {
        let date = (config.shows_date() && !item.pub_date.is_empty())
            .then(|| item.pub_date.clone());

        let summary = (config.shows_description() && !item.description.is_empty()).then(|| {
            let mut summary: String = sanitize(&item.description)
                .chars()
                .take(SUMMARY_LENGTH)
                .collect();
            summary.push_str("...");
            summary
        });

        Self {
            title: item.title.clone(),
            link: item.link.clone(),
            date,
            summary,
        }
    }
}

/// Builds the body of an RSS widget from a parsed feed document.
pub fn feed_body(doc: &FeedDocument, config: &WidgetConfig) -> WidgetBody {
    let Some(channel) = doc.channel() else {
        return WidgetBody::Notice(Notice::InvalidFormat);
    };

    let items = channel_items(channel);
    let items = match config.item_limit() {
        Some(limit) => limit.apply(&items),
        None => &items[..],
    };

    WidgetBody::Items(items.iter().map(|item| ItemBlock::new(item, config)).collect())
}

pub struct Renderer {
    fetcher: Arc<Fetcher>,
}

impl Renderer {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Renders the active dashboard, fetching each widget's feed in turn.
    pub async fn render(&self, config: Option<&DashboardConfig>) -> Result<String, askama::Error> {
        let Some(config) = config else {
            return ErrorPage {
                message: CONFIG_MISSING,
            }
            .render();
        };

        let Some(dashboard) = config.active_dashboard() else {
            return ErrorPage {
                message: DASHBOARD_MISSING,
            }
            .render();
        };

        let mut widgets = Vec::with_capacity(dashboard.widgets.len());
        for widget in &dashboard.widgets {
            if let Some(block) = self.widget_block(widget).await {
                widgets.push(block);
            }
        }

        DashboardPage {
            name: dashboard.name().to_string(),
            widgets,
        }
        .render()
    }

    /// `None` for widget types without a renderer.
    async fn widget_block(&self, widget: &Widget) -> Option<WidgetBlock> {
        if widget.kind != WidgetType::Rss {
            return None;
        }

        let body = match widget.config.feed_url() {
            None => WidgetBody::Notice(Notice::NoUrl),
            Some(url) => match load_feed(&self.fetcher, &url).await {
                Ok(doc) => feed_body(&doc, &widget.config),
                Err(_) => WidgetBody::Notice(Notice::LoadFailed),
            },
        };

        Some(WidgetBlock {
            title: widget.title().to_string(),
            body,
        })
    }
}
