//! # Chat Module
//!
//! Answers free-text questions from SharePoint content.
//!
//! ## Overview
//!
//! A query goes through three steps:
//!
//! 1. A connectivity check and a Graph search ([`DocumentRepository`])
//! 2. Content extraction from the top hits ([`extract`])
//! 3. Answer generation from a prompt ([`TextGenerator`])
//!
//! Failures never escape [`QueryService::process_query`]; every outcome is a
//! [`QueryReply`] with a user-facing text, so a [`Conversation`] stays usable
//! after an error.

pub mod conversation;
pub mod error;
pub mod extract;
pub mod generator;
pub mod repository;
pub mod service;

pub use conversation::{ChatMessage, Conversation, MessageRole, WELCOME_MESSAGE};
pub use error::{ChatError, Result};
pub use generator::{OpenAiTextGenerator, TextGenerator};
pub use repository::DocumentRepository;
pub use service::{QueryReply, QueryService, ReplyKind};
