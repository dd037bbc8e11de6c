//! # Mail
//!
//! Mail message model, the [`Mailer`] delivery contract and the [`MailBus`]
//! façade that queues outgoing mail on a work bus.

pub mod bus;
pub mod mailer;
pub mod message;

pub use bus::MailBus;
pub use mailer::{LogMailer, MailError, Mailer, MailerResult, OutgoingMail};
pub use message::{
    Message, MessageBuilder, MessageContent, MessageHeaders, MessageMetadata, MessageType,
};
