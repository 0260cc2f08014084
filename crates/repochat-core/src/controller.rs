use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::analyzer::{AnalyzerClient, AnalyzerHandle};
use crate::conversation::{Conversation, ConversationEvent, Session, SessionUpdate};
use crate::prompts::{QUESTION_ERROR, WELCOME_PROMPT};
use crate::repo_url::RepoUrl;

/// Owns the conversation and runs the analysis and question flows against
/// the analyzer service. Flows run as tokio tasks; their results come back
/// over a channel and are applied by `next_update` / `drain_updates`.
pub struct Controller {
    conversation: Conversation,
    client: AnalyzerClient,
    welcome_prompt: String,
    cancel: CancellationToken,
    tx: UnboundedSender<SessionUpdate>,
    rx: UnboundedReceiver<SessionUpdate>,
}

struct FlowContext {
    client: AnalyzerClient,
    session: Session,
    tx: UnboundedSender<SessionUpdate>,
    cancel: CancellationToken,
}

impl FlowContext {
    fn send(&self, event: ConversationEvent) {
        if self.cancel.is_cancelled() {
            debug!(?event, "flow cancelled, not reporting");
            return;
        }
        let _ = self.tx.send(SessionUpdate {
            session: self.session,
            event,
        });
    }
}

impl Controller {
    pub fn new(client: AnalyzerClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            conversation: Conversation::new(),
            client,
            welcome_prompt: WELCOME_PROMPT.to_string(),
            cancel: CancellationToken::new(),
            tx,
            rx,
        }
    }

    pub fn with_welcome_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.welcome_prompt = prompt.into();
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn input_mut(&mut self) -> &mut String {
        self.conversation.input_mut()
    }

    fn flow_context(&self, session: Session) -> FlowContext {
        FlowContext {
            client: self.client.clone(),
            session,
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Start analyzing a repository. Returns false when the URL was ignored.
    pub fn submit_repo_url(&mut self, url: &str) -> bool {
        let Some((session, repo)) = self.conversation.begin_analysis(url) else {
            return false;
        };

        let ctx = self.flow_context(session);
        let prompt = self.welcome_prompt.clone();
        tokio::spawn(async move {
            let flow = AssertUnwindSafe(run_analysis(&ctx, repo, &prompt)).catch_unwind();
            if flow.await.is_err() {
                error!("analysis flow panicked");
                ctx.send(ConversationEvent::AnalysisFailed("analysis flow panicked".to_string()));
            }
        });
        true
    }

    /// Ask a question about the analyzed repository. Returns false when the
    /// question was ignored (blank, no analyzer, or a request in flight).
    pub fn submit_question(&mut self, text: &str) -> bool {
        let Some((session, handle, question)) = self.conversation.begin_question(text) else {
            return false;
        };

        let ctx = self.flow_context(session);
        tokio::spawn(async move {
            let flow = AssertUnwindSafe(ask(&ctx, &handle, &question)).catch_unwind();
            let content = match flow.await {
                Ok(answer) => answer,
                Err(_) => {
                    error!(analyzer_id = %handle.analyzer_id, "question flow panicked");
                    QUESTION_ERROR.to_string()
                }
            };
            ctx.send(ConversationEvent::Answer(content));
        });
        true
    }

    /// Back to the intro phase. Outstanding polls are cancelled and whatever
    /// they still report is discarded.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.conversation.reset();
    }

    /// Wait for the next flow result and apply it. Returns whether the
    /// conversation changed.
    pub async fn next_update(&mut self) -> bool {
        match self.rx.recv().await {
            Some(update) => self.conversation.apply(update),
            None => false,
        }
    }

    /// Apply every result that is already waiting. Returns how many changed
    /// the conversation.
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.rx.try_recv() {
            if self.conversation.apply(update) {
                applied += 1;
            }
        }
        applied
    }
}

async fn run_analysis(ctx: &FlowContext, repo: RepoUrl, welcome_prompt: &str) {
    let handle = match ctx.client.create_analyzer(&repo).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(repo = %repo, error = %e, "could not create analyzer");
            ctx.send(ConversationEvent::AnalysisFailed(e.to_string()));
            return;
        }
    };
    ctx.send(ConversationEvent::AnalyzerCreated(handle.clone()));

    let schedule = ctx.client.analyzer_schedule();
    if !ctx.client.poll_analyzer_ready(&handle, schedule, &ctx.cancel).await {
        error!(analyzer_id = %handle.analyzer_id, "analyzer did not become ready");
        ctx.send(ConversationEvent::AnalysisFailed(format!(
            "analyzer not ready after {} polls",
            schedule.max_attempts
        )));
        return;
    }
    ctx.send(ConversationEvent::AnalyzerReady);

    let welcome = ctx.client.fetch_answer(&handle, welcome_prompt, &ctx.cancel).await;
    ctx.send(ConversationEvent::Welcome(welcome));
}

async fn ask(ctx: &FlowContext, handle: &AnalyzerHandle, question: &str) -> String {
    ctx.client.fetch_answer(handle, question, &ctx.cancel).await
}
