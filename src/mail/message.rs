//! Mail message model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::work::WorkType;

/// Type or category of a mail message; a lossless relabeling of [`WorkType`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageType(WorkType);

impl MessageType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(WorkType::new(value))
    }

    /// Every message type; valid for registration, not for publishing
    pub fn all() -> Self {
        Self(WorkType::all())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.is_wildcard()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<WorkType> for MessageType {
    fn from(work_type: WorkType) -> Self {
        Self(work_type)
    }
}

impl From<MessageType> for WorkType {
    fn from(message_type: MessageType) -> Self {
        message_type.0
    }
}

impl From<&str> for MessageType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Additional headers, kept in name order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHeaders(BTreeMap<String, String>);

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for MessageHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub subject: String,
    pub body: Vec<u8>,
}

impl MessageContent {
    pub fn new(subject: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Body as text, replacing invalid UTF-8
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Routing information for a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub additional_headers: MessageHeaders,
}

impl MessageMetadata {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            additional_headers: MessageHeaders::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: MessageHeaders) -> Self {
        self.additional_headers = headers;
        self
    }
}

/// A mail message ready to hand to a [`Mailer`](super::Mailer)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub metadata: MessageMetadata,
    pub content: MessageContent,
}

impl Message {
    pub fn new(metadata: MessageMetadata, content: MessageContent) -> Self {
        Self { metadata, content }
    }

    /// Start a message from `from` to `to`
    pub fn builder(from: impl Into<String>, to: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            metadata: MessageMetadata::new(from, to),
            content: MessageContent::default(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.metadata.from
    }

    pub fn recipient(&self) -> &str {
        &self.metadata.to
    }

    pub fn subject(&self) -> &str {
        &self.content.subject
    }
}

#[derive(Debug, Clone)]
pub struct MessageBuilder {
    metadata: MessageMetadata,
    content: MessageContent,
}

impl MessageBuilder {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.content.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.content.body = body.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.additional_headers.insert(name, value);
        self
    }

    pub fn build(self) -> Message {
        Message::new(self.metadata, self.content)
    }
}
