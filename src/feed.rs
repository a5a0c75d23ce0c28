use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::warn;

use crate::error::LoadError;
use crate::fetcher::{validate_url, Fetcher};

#[derive(Debug, Error)]
pub enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),
    #[error("no element found")]
    Empty,
    #[error("unclosed element <{0}>")]
    Unclosed(String),
    #[error("closing tag without an open element")]
    UnmatchedEnd,
    #[error("content outside the document element")]
    OutsideRoot,
}

/// An element with its leading text and child elements. Attributes and text
/// following child elements are not kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Text of the first `name` child, if it has any.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)?.text.as_deref().filter(|text| !text.is_empty())
    }

    fn push_text(&mut self, text: &str) {
        if self.children.is_empty() {
            self.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

/// A parsed feed document. Nothing about it is cached.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub root: XmlElement,
}

impl FeedDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, XmlError> {
        let mut reader = Reader::from_reader(bytes);
        let mut buf = Vec::new();
        let mut open: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(XmlError::OutsideRoot);
                    }
                    let name = element_name(&reader, start.name().as_ref())?;
                    open.push(XmlElement::named(name));
                }
                Event::Empty(start) => {
                    if root.is_some() {
                        return Err(XmlError::OutsideRoot);
                    }
                    let name = element_name(&reader, start.name().as_ref())?;
                    close_element(&mut open, &mut root, XmlElement::named(name));
                }
                Event::End(_) => {
                    let element = open.pop().ok_or(XmlError::UnmatchedEnd)?;
                    close_element(&mut open, &mut root, element);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(quick_xml::Error::from)?;
                    append_text(&mut open, &text)?;
                }
                Event::CData(cdata) => {
                    let text = reader
                        .decoder()
                        .decode(&cdata)
                        .map_err(quick_xml::Error::from)?;
                    append_text(&mut open, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(element) = open.pop() {
            return Err(XmlError::Unclosed(element.name));
        }
        root.map(|root| Self { root }).ok_or(XmlError::Empty)
    }

    /// The `channel` element directly under the document root.
    pub fn channel(&self) -> Option<&XmlElement> {
        self.root.child("channel")
    }
}

/// Names are decoded with the encoding declared by the document.
fn element_name(reader: &Reader<&[u8]>, raw: &[u8]) -> Result<String, XmlError> {
    let name = reader.decoder().decode(raw).map_err(quick_xml::Error::from)?;
    Ok(name.into_owned())
}

fn close_element(open: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn append_text(open: &mut [XmlElement], text: &str) -> Result<(), XmlError> {
    match open.last_mut() {
        Some(element) => element.push_text(text),
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::OutsideRoot),
    }
    Ok(())
}

/// One `<item>` of a channel, with defaults filled in and the link checked.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

impl FeedItem {
    pub fn from_element(item: &XmlElement) -> Self {
        let link = item
            .child_text("link")
            .filter(|link| validate_url(link))
            .unwrap_or("#");

        Self {
            title: item.child_text("title").unwrap_or("No Title").to_string(),
            link: link.to_string(),
            description: item.child_text("description").unwrap_or_default().to_string(),
            pub_date: item.child_text("pubDate").unwrap_or_default().to_string(),
        }
    }
}

/// Items of a channel in document order.
pub fn channel_items(channel: &XmlElement) -> Vec<FeedItem> {
    channel
        .children_named("item")
        .map(FeedItem::from_element)
        .collect()
}

pub async fn load_feed(fetcher: &Fetcher, url: &str) -> Result<FeedDocument, LoadError> {
    let bytes = fetcher.fetch(url).await?;
    FeedDocument::parse(&bytes).map_err(|e| {
        warn!("Error parsing XML from {}: {}", url, e);
        LoadError::from(e)
    })
}
