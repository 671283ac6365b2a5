//! Query processing.
//!
//! `process_query` always produces a reply. Failures are classified into a
//! [`ReplyKind`] with a fixed user-facing text, and reported on the event bus.

use core_runtime::events::{ChatEvent, CoreEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ChatError, Result};
use crate::extract::extract_relevant_content;
use crate::generator::TextGenerator;
use crate::repository::DocumentRepository;

pub const ACCESS_PROBLEM_MESSAGE: &str = "I'm having trouble accessing SharePoint with your current credentials. Please try refreshing the page or signing out and back in.";
pub const NOTHING_FOUND_MESSAGE: &str =
    "I couldn't find any relevant information in SharePoint. Could you try rephrasing your question?";
pub const AUTH_SESSION_PROBLEM_MESSAGE: &str = "I'm having trouble with your authentication session. Please try refreshing the page or signing out and back in.";
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Your authentication token has expired. Please refresh the page to sign in again.";
pub const SERVICE_ERROR_MESSAGE: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again later.";
pub const GENERATION_FAILED_MESSAGE: &str =
    "I'm sorry, I couldn't generate a response based on the SharePoint content.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplyKind {
    Answer,
    NothingFound,
    AccessProblem,
    SessionExpired,
    AuthSessionProblem,
    ServiceError,
}

impl ReplyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::Answer => "Answer",
            ReplyKind::NothingFound => "NothingFound",
            ReplyKind::AccessProblem => "AccessProblem",
            ReplyKind::SessionExpired => "SessionExpired",
            ReplyKind::AuthSessionProblem => "AuthSessionProblem",
            ReplyKind::ServiceError => "ServiceError",
        }
    }

    /// The user must sign in again before asking anything else.
    pub fn needs_sign_in(&self) -> bool {
        matches!(self, ReplyKind::SessionExpired | ReplyKind::AuthSessionProblem)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReply {
    pub kind: ReplyKind,
    pub text: String,
}

impl QueryReply {
    pub fn new(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn from_error(error: &ChatError) -> Self {
        match error {
            ChatError::NoActiveAccount => {
                Self::new(ReplyKind::AuthSessionProblem, AUTH_SESSION_PROBLEM_MESSAGE)
            }
            ChatError::TokenExpired(_) => {
                Self::new(ReplyKind::SessionExpired, SESSION_EXPIRED_MESSAGE)
            }
            _ => Self::new(ReplyKind::ServiceError, SERVICE_ERROR_MESSAGE),
        }
    }
}

/// Search, extract, generate.
pub struct QueryService {
    repository: Arc<dyn DocumentRepository>,
    generator: Arc<dyn TextGenerator>,
    events: EventBus,
}

impl QueryService {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        generator: Arc<dyn TextGenerator>,
        events: EventBus,
    ) -> Self {
        Self {
            repository,
            generator,
            events,
        }
    }

    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn process_query(&self, query: &str, display_name: &str) -> QueryReply {
        let query_id = Uuid::new_v4().to_string();
        self.emit(ChatEvent::QueryStarted {
            query_id: query_id.clone(),
        });

        match self.answer(query, display_name).await {
            Ok((reply, result_count)) => {
                info!(kind = reply.kind.as_str(), result_count, "Query processed");
                self.emit(ChatEvent::QueryCompleted {
                    query_id,
                    reply_kind: reply.kind.as_str().to_string(),
                    result_count,
                });
                reply
            }
            Err(e) => {
                warn!(error = %e, "Query processing failed");
                self.emit(ChatEvent::QueryFailed {
                    query_id,
                    message: e.to_string(),
                });
                QueryReply::from_error(&e)
            }
        }
    }

    async fn answer(&self, query: &str, display_name: &str) -> Result<(QueryReply, usize)> {
        if let Err(e) = self.repository.check_access().await {
            warn!(error = %e, "Resource access check failed");
            return Ok((QueryReply::new(ReplyKind::AccessProblem, ACCESS_PROBLEM_MESSAGE), 0));
        }

        let hits = self.repository.search(query).await?;
        if hits.is_empty() {
            return Ok((QueryReply::new(ReplyKind::NothingFound, NOTHING_FOUND_MESSAGE), 0));
        }

        let content = extract_relevant_content(self.repository.as_ref(), &hits).await;
        let prompt = build_prompt(query, &content, display_name);

        let reply = match self.generator.generate(&prompt).await {
            Ok(text) => QueryReply::new(ReplyKind::Answer, text),
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                QueryReply::new(ReplyKind::ServiceError, GENERATION_FAILED_MESSAGE)
            }
        };
        Ok((reply, hits.len()))
    }

    fn emit(&self, event: ChatEvent) {
        self.events.emit(CoreEvent::Chat(event)).ok();
    }
}

pub fn build_prompt(query: &str, content: &str, display_name: &str) -> String {
    format!(
        "You are a helpful SharePoint assistant for {display_name}.\n\
         Answer the following question based on the SharePoint content provided.\n\
         If the content doesn't contain relevant information to answer the question, say so.\n\
         \n\
         User question: {query}\n\
         \n\
         SharePoint content:\n\
         {content}\n\
         \n\
         Please provide a concise, helpful response based only on the information in the SharePoint content.\n"
    )
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use provider_graph::SiteInfo;
    use serde_json::{json, Value};

    mock! {
        Repository {}

        #[async_trait]
        impl DocumentRepository for Repository {
            async fn check_access(&self) -> Result<()>;
            async fn search(&self, query: &str) -> Result<Vec<Value>>;
            async fn document_content(&self, drive_id: &str, item_id: &str) -> Result<String>;
            async fn site(&self, site_id: &str) -> Result<SiteInfo>;
        }
    }

    mock! {
        Generator {}

        #[async_trait]
        impl TextGenerator for Generator {
            async fn generate(&self, prompt: &str) -> Result<String>;
        }
    }

    fn service(repository: MockRepository, generator: MockGenerator) -> (QueryService, EventBus) {
        let events = EventBus::new(16);
        (
            QueryService::new(Arc::new(repository), Arc::new(generator), events.clone()),
            events,
        )
    }

    fn accessible() -> MockRepository {
        let mut repository = MockRepository::new();
        repository.expect_check_access().returning(|| Ok(()));
        repository
    }

    #[tokio::test]
    async fn answers_from_extracted_content() {
        let mut repository = accessible();
        repository.expect_search().withf(|q| q == "leave policy").returning(|_| {
            Ok(vec![json!({
                "@odata.type": "#microsoft.graph.listItem",
                "name": "Leave policy",
                "description": "25 days per year"
            })])
        });
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| {
                prompt.starts_with("You are a helpful SharePoint assistant for Ada Lovelace.")
                    && prompt.contains("User question: leave policy\n")
                    && prompt.contains("Item: Leave policy\nDescription: 25 days per year\n\n")
            })
            .times(1)
            .returning(|_| Ok("You get 25 days.".to_string()));

        let (service, events) = service(repository, generator);
        let mut rx = events.subscribe();

        let reply = service.process_query("leave policy", "Ada Lovelace").await;

        assert_eq!(reply, QueryReply::new(ReplyKind::Answer, "You get 25 days."));
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoreEvent::Chat(ChatEvent::QueryStarted { .. })
        ));
        match rx.recv().await.unwrap() {
            CoreEvent::Chat(ChatEvent::QueryCompleted {
                reply_kind,
                result_count,
                ..
            }) => {
                assert_eq!(reply_kind, "Answer");
                assert_eq!(result_count, 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_access_check_is_an_access_problem() {
        let mut repository = MockRepository::new();
        repository
            .expect_check_access()
            .returning(|| Err(ChatError::Repository("401".into())));
        repository.expect_search().times(0);

        let (service, _) = service(repository, MockGenerator::new());
        let reply = service.process_query("anything", "User").await;

        assert_eq!(reply.kind, ReplyKind::AccessProblem);
        assert_eq!(reply.text, ACCESS_PROBLEM_MESSAGE);
    }

    #[tokio::test]
    async fn empty_search_finds_nothing() {
        let mut repository = accessible();
        repository.expect_search().returning(|_| Ok(Vec::new()));
        let mut generator = MockGenerator::new();
        generator.expect_generate().times(0);

        let (service, _) = service(repository, generator);
        let reply = service.process_query("unicorns", "User").await;

        assert_eq!(reply, QueryReply::new(ReplyKind::NothingFound, NOTHING_FOUND_MESSAGE));
    }

    #[tokio::test]
    async fn search_failures_are_classified() {
        let cases: Vec<(fn() -> ChatError, ReplyKind, &str)> = vec![
            (
                || ChatError::NoActiveAccount,
                ReplyKind::AuthSessionProblem,
                AUTH_SESSION_PROBLEM_MESSAGE,
            ),
            (
                || ChatError::TokenExpired("interaction_required".into()),
                ReplyKind::SessionExpired,
                SESSION_EXPIRED_MESSAGE,
            ),
            (
                || ChatError::Repository("500".into()),
                ReplyKind::ServiceError,
                SERVICE_ERROR_MESSAGE,
            ),
        ];

        for (make_error, kind, text) in cases {
            let mut repository = accessible();
            repository.expect_search().returning(move |_| Err(make_error()));
            let (service, events) = service(repository, MockGenerator::new());
            let mut rx = events.subscribe();

            let reply = service.process_query("q", "User").await;

            assert_eq!(reply, QueryReply::new(kind, text));
            rx.recv().await.unwrap();
            assert!(matches!(
                rx.recv().await.unwrap(),
                CoreEvent::Chat(ChatEvent::QueryFailed { .. })
            ));
        }
    }

    #[tokio::test]
    async fn generation_failure_has_its_own_text() {
        let mut repository = accessible();
        repository
            .expect_search()
            .returning(|_| Ok(vec![json!({ "name": "Notes" })]));
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(ChatError::Generation("timeout".into())));

        let (service, _) = service(repository, generator);
        let reply = service.process_query("q", "User").await;

        assert_eq!(reply.kind, ReplyKind::ServiceError);
        assert_eq!(reply.text, GENERATION_FAILED_MESSAGE);
    }

    #[test]
    fn sign_in_kinds() {
        assert!(ReplyKind::SessionExpired.needs_sign_in());
        assert!(ReplyKind::AuthSessionProblem.needs_sign_in());
        assert!(!ReplyKind::NothingFound.needs_sign_in());
    }
}
