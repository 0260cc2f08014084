//! Conversation state machine
//!
//! `Conversation` holds everything a view needs to draw: the phase, the busy
//! flag, the messages and the input buffer. It never performs I/O. Flows
//! started by the controller report back through `SessionUpdate`s, which are
//! applied here only if they belong to the current session.

use tracing::{debug, info, warn};

use crate::analyzer::AnalyzerHandle;
use crate::prompts::ANALYSIS_ERROR;
use crate::repo_url::RepoUrl;
use crate::state::{ChatMessage, ChatRole, MessageStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    /// No analyzer yet; waiting for a repository URL.
    #[default]
    Intro,
    /// Analyzer job exists but is not ready; input disabled.
    Analyzing,
    /// Analyzer ready; chat enabled.
    Ready,
}

/// Identifies one conversation between resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    AnalyzerCreated(AnalyzerHandle),
    AnalyzerReady,
    AnalysisFailed(String),
    Welcome(String),
    Answer(String),
}

/// An event tagged with the session whose flow produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub session: Session,
    pub event: ConversationEvent,
}

#[derive(Debug, Default)]
pub struct Conversation {
    phase: ConversationPhase,
    is_loading: bool,
    analyzer: Option<AnalyzerHandle>,
    repo: Option<RepoUrl>,
    messages: MessageStore,
    input: String,
    notice: Option<String>,
    session: Session,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn analyzer(&self) -> Option<&AnalyzerHandle> {
        self.analyzer.as_ref()
    }

    pub fn repo(&self) -> Option<&RepoUrl> {
        self.repo.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.messages.as_slice()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    /// Status line for the intro screen, e.g. why the last analysis failed.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn session(&self) -> Session {
        self.session
    }

    /// Accept a repository URL and mark the conversation busy. Invalid URLs,
    /// and submissions outside the intro phase or while busy, are ignored.
    pub fn begin_analysis(&mut self, url: &str) -> Option<(Session, RepoUrl)> {
        if self.phase != ConversationPhase::Intro || self.is_loading {
            return None;
        }

        let repo = match RepoUrl::parse(url) {
            Ok(repo) => repo,
            Err(e) => {
                debug!(error = %e, "ignoring repository URL");
                return None;
            }
        };

        self.is_loading = true;
        self.notice = None;
        self.input.clear();
        self.repo = Some(repo.clone());
        info!(repo = %repo, "starting analysis");
        Some((self.session, repo))
    }

    /// Accept a question: the user message is appended right away, before
    /// any answer exists. Blank questions and questions without a ready
    /// analyzer are ignored without touching the store.
    pub fn begin_question(&mut self, text: &str) -> Option<(Session, AnalyzerHandle, String)> {
        if text.trim().is_empty() || self.phase != ConversationPhase::Ready || self.is_loading {
            return None;
        }
        let handle = self.analyzer.clone()?;

        self.messages.push(ChatRole::User, text);
        self.input.clear();
        self.is_loading = true;
        Some((self.session, handle, text.to_string()))
    }

    /// Apply a flow's result. Returns false if the update was stale or did
    /// not fit the current phase.
    pub fn apply(&mut self, update: SessionUpdate) -> bool {
        if update.session != self.session {
            debug!(event = ?update.event, "dropping update from abandoned session");
            return false;
        }

        match update.event {
            ConversationEvent::AnalyzerCreated(handle) => {
                if self.phase != ConversationPhase::Intro {
                    return false;
                }
                self.analyzer = Some(handle);
                self.phase = ConversationPhase::Analyzing;
            }
            ConversationEvent::AnalyzerReady => {
                if self.phase != ConversationPhase::Analyzing {
                    return false;
                }
                info!("analyzer ready, chat enabled");
                self.phase = ConversationPhase::Ready;
            }
            ConversationEvent::AnalysisFailed(reason) => {
                warn!(%reason, "analysis failed");
                self.analyzer = None;
                self.repo = None;
                self.phase = ConversationPhase::Intro;
                self.is_loading = false;
                self.notice = Some(ANALYSIS_ERROR.to_string());
            }
            ConversationEvent::Welcome(content) | ConversationEvent::Answer(content) => {
                if self.phase != ConversationPhase::Ready {
                    return false;
                }
                self.messages.push(ChatRole::Assistant, content);
                self.is_loading = false;
            }
        }
        true
    }

    /// Drop everything and go back to the intro phase. Any flow still running
    /// belongs to the old session from here on.
    pub fn reset(&mut self) {
        self.analyzer = None;
        self.repo = None;
        self.messages.clear();
        self.input.clear();
        self.notice = None;
        self.is_loading = false;
        self.phase = ConversationPhase::Intro;
        self.session = Session(self.session.0 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REACT: &str = "https://github.com/facebook/react";

    fn handle() -> AnalyzerHandle {
        AnalyzerHandle {
            analyzer_id: "abc".to_string(),
        }
    }

    fn update(conv: &Conversation, event: ConversationEvent) -> SessionUpdate {
        SessionUpdate {
            session: conv.session(),
            event,
        }
    }

    fn ready_conversation() -> Conversation {
        let mut conv = Conversation::new();
        conv.begin_analysis(REACT).unwrap();
        assert!(conv.apply(update(&conv, ConversationEvent::AnalyzerCreated(handle()))));
        assert!(conv.apply(update(&conv, ConversationEvent::AnalyzerReady)));
        assert!(conv.apply(update(&conv, ConversationEvent::Welcome("hello".to_string()))));
        conv
    }

    #[test]
    fn test_handle_held_only_while_analyzing_or_ready() {
        let mut conv = Conversation::new();
        assert!(conv.analyzer().is_none());

        conv.begin_analysis(REACT).unwrap();
        assert_eq!(conv.phase(), ConversationPhase::Intro);
        assert!(conv.is_loading());
        assert!(conv.analyzer().is_none());

        conv.apply(update(&conv, ConversationEvent::AnalyzerCreated(handle())));
        assert_eq!(conv.phase(), ConversationPhase::Analyzing);
        assert!(conv.analyzer().is_some());

        conv.apply(update(&conv, ConversationEvent::AnalyzerReady));
        assert_eq!(conv.phase(), ConversationPhase::Ready);
        assert!(conv.analyzer().is_some());

        conv.reset();
        assert_eq!(conv.phase(), ConversationPhase::Intro);
        assert!(conv.analyzer().is_none());
    }

    #[test]
    fn test_invalid_url_is_silently_ignored() {
        let mut conv = Conversation::new();
        conv.input_mut().push_str("not a url");

        assert!(conv.begin_analysis("not a url").is_none());
        assert!(conv.begin_analysis("   ").is_none());
        assert!(!conv.is_loading());
        assert!(conv.notice().is_none());
        assert_eq!(conv.input(), "not a url");
    }

    #[test]
    fn test_second_url_while_busy_is_ignored() {
        let mut conv = Conversation::new();
        assert!(conv.begin_analysis(REACT).is_some());
        assert!(conv.begin_analysis(REACT).is_none());
    }

    #[test]
    fn test_blank_question_does_not_touch_store() {
        let mut conv = ready_conversation();
        let before = conv.messages().len();

        assert!(conv.begin_question("").is_none());
        assert!(conv.begin_question("  \n\t ").is_none());
        assert_eq!(conv.messages().len(), before);
        assert!(!conv.is_loading());
    }

    #[test]
    fn test_question_without_analyzer_is_ignored() {
        let mut conv = Conversation::new();
        assert!(conv.begin_question("What is this?").is_none());
        assert!(conv.messages().is_empty());
    }

    #[test]
    fn test_question_appends_user_message_immediately() {
        let mut conv = ready_conversation();
        conv.input_mut().push_str("What languages does this use?");

        let (_, handle, text) = conv.begin_question("What languages does this use?").unwrap();
        assert_eq!(handle.analyzer_id, "abc");
        assert_eq!(text, "What languages does this use?");
        assert!(conv.is_loading());
        assert!(conv.input().is_empty());

        let last = conv.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert_eq!(last.content, "What languages does this use?");
    }

    #[test]
    fn test_answer_clears_loading() {
        let mut conv = ready_conversation();
        conv.begin_question("Why?").unwrap();
        assert!(conv.apply(update(&conv, ConversationEvent::Answer("Because.".to_string()))));

        assert!(!conv.is_loading());
        assert_eq!(conv.messages().len(), 3);
        assert_eq!(conv.messages()[2].role, ChatRole::Assistant);
    }

    #[test]
    fn test_failure_returns_to_intro_with_notice() {
        let mut conv = Conversation::new();
        conv.begin_analysis(REACT).unwrap();
        conv.apply(update(&conv, ConversationEvent::AnalyzerCreated(handle())));
        conv.apply(update(&conv, ConversationEvent::AnalysisFailed("timed out".to_string())));

        assert_eq!(conv.phase(), ConversationPhase::Intro);
        assert!(!conv.is_loading());
        assert!(conv.analyzer().is_none());
        assert_eq!(conv.notice(), Some(ANALYSIS_ERROR));

        // a fresh attempt is accepted and clears the notice
        assert!(conv.begin_analysis(REACT).is_some());
        assert!(conv.notice().is_none());
    }

    #[test]
    fn test_stale_updates_are_dropped() {
        let mut conv = Conversation::new();
        conv.begin_analysis(REACT).unwrap();
        let old = conv.session();
        conv.reset();

        let stale = SessionUpdate {
            session: old,
            event: ConversationEvent::AnalyzerCreated(handle()),
        };
        assert!(!conv.apply(stale));
        assert_eq!(conv.phase(), ConversationPhase::Intro);
        assert!(conv.analyzer().is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut conv = ready_conversation();
        conv.begin_question("pending question").unwrap();
        conv.input_mut().push_str("half typed");

        conv.reset();
        assert!(conv.messages().is_empty());
        assert!(conv.input().is_empty());
        assert!(conv.repo().is_none());
        assert!(!conv.is_loading());
        assert_eq!(conv.phase(), ConversationPhase::Intro);
    }

    #[test]
    fn test_answer_outside_ready_is_rejected() {
        let mut conv = Conversation::new();
        assert!(!conv.apply(update(&conv, ConversationEvent::Answer("x".to_string()))));
        assert!(conv.messages().is_empty());
    }
}
