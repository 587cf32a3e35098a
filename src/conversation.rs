use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::{Message, ReplyEvent};
use crate::transport::{ChatTransport, HistoryTurn};

/// Greeting shown before any user interaction
pub const DEFAULT_GREETING: &str = "Hello! I'm your growth assistant.\n\nI can help you qualify leads, research market trends, or draft outreach messages. How can I assist you today?";

/// Synthesized reply when the service is unreachable or errors out
const CONNECTION_FALLBACK: &str = "Connection interruption. Please try again momentarily.";
const CONNECTION_BANNER: &str =
    "Unable to connect to the assistant. Please double-check your connection.";

/// Synthesized reply when a 2xx response carries no usable reply
const GARBLED_FALLBACK: &str = "I didn't quite catch that. Could you rephrase?";
const GARBLED_BANNER: &str = "The service sent back something unexpected. Please try again.";

/// Owns the conversation state and mediates between user input and the
/// chat service.
///
/// At most one request is in flight at a time: `submit` rejects new input
/// while one is pending rather than queueing it. Completions come back to
/// the UI loop as [`ReplyEvent`]s and are applied with [`apply_reply`],
/// which clears the pending flag on every path.
///
/// [`apply_reply`]: ConversationController::apply_reply
pub struct ConversationController {
    transport: ChatTransport,
    reply_tx: mpsc::UnboundedSender<ReplyEvent>,
    greeting: String,
    messages: Vec<Message>,
    pending: bool,
    error: Option<String>,
    generation: u64,
}

impl ConversationController {
    pub fn new(
        transport: ChatTransport,
        reply_tx: mpsc::UnboundedSender<ReplyEvent>,
        greeting: Option<String>,
    ) -> Self {
        let mut controller = Self {
            transport,
            reply_tx,
            greeting: greeting.unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            messages: Vec::new(),
            pending: false,
            error: None,
            generation: 0,
        };
        controller.initialize();
        controller
    }

    /// Reset state to the single seeded greeting with nothing pending.
    fn initialize(&mut self) {
        self.messages = vec![Message::assistant(self.greeting.clone())];
        self.pending = false;
        self.error = None;
    }

    /// Send a user message to the chat service.
    ///
    /// A no-op returning false when the trimmed input is empty or a request
    /// is already pending. Otherwise the user message is appended
    /// immediately, any prior error is cleared, and exactly one request is
    /// issued carrying the new text plus the prior history.
    pub fn submit(&mut self, input: &str) -> bool {
        let text = input.trim();
        if text.is_empty() || self.pending {
            return false;
        }

        // History is everything before this message, seeded greeting
        // included, mapped to the service's role vocabulary.
        let history: Vec<HistoryTurn> = self
            .messages
            .iter()
            .map(|m| HistoryTurn::new(m.sender.wire_role(), m.text.clone()))
            .collect();

        self.messages.push(Message::user(text));
        self.pending = true;
        self.error = None;

        let transport = self.transport.clone();
        let tx = self.reply_tx.clone();
        let generation = self.generation;
        let text = text.to_string();

        tokio::spawn(async move {
            let result = transport.send(&text, &history).await;
            // Receiver only disappears during shutdown
            let _ = tx.send(ReplyEvent { generation, result });
        });

        true
    }

    /// Apply a completed request. Replies from a generation that has since
    /// been reset are dropped without touching state.
    pub fn apply_reply(&mut self, event: ReplyEvent) {
        if event.generation != self.generation {
            debug!("dropping reply from a discarded conversation");
            return;
        }

        match event.result {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply));
            }
            Err(err) => {
                warn!(error = %err, "chat request failed");
                let (banner, fallback) = if err.is_malformed() {
                    (GARBLED_BANNER, GARBLED_FALLBACK)
                } else {
                    (CONNECTION_BANNER, CONNECTION_FALLBACK)
                };
                self.error = Some(banner.to_string());
                self.messages.push(Message::assistant(fallback));
            }
        }

        self.pending = false;
    }

    /// Discard the conversation and restore the seeded greeting. Any
    /// in-flight request keeps running but its completion no longer
    /// matches the generation and is dropped on arrival.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.initialize();
    }

    /// Clear the error banner
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::Sender;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller_for(
        server: &MockServer,
    ) -> (
        ConversationController,
        mpsc::UnboundedReceiver<ReplyEvent>,
    ) {
        let mut config = Config::default();
        config.endpoint = server.uri();
        let transport = ChatTransport::new(&config);
        let (tx, rx) = mpsc::unbounded_channel();
        let controller =
            ConversationController::new(transport, tx, Some("How can I help?".to_string()));
        (controller, rx)
    }

    async fn mock_reply(server: &MockServer, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": reply })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn starts_with_a_single_seeded_greeting() {
        let server = MockServer::start().await;
        let (controller, _rx) = controller_for(&server);

        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].sender, Sender::Assistant);
        assert_eq!(controller.messages()[0].text, "How can I help?");
        assert!(!controller.is_pending());
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let server = MockServer::start().await;
        let (mut controller, _rx) = controller_for(&server);

        assert!(!controller.submit(""));
        assert!(!controller.submit("   \n\t"));
        assert_eq!(controller.messages().len(), 1);
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn submit_appends_user_message_then_reply() {
        let server = MockServer::start().await;
        mock_reply(&server, "Hi there").await;
        let (mut controller, mut rx) = controller_for(&server);

        assert!(controller.submit("hello"));
        assert_eq!(controller.messages().len(), 2);
        assert_eq!(controller.messages()[1].sender, Sender::User);
        assert_eq!(controller.messages()[1].text, "hello");
        assert!(controller.is_pending());

        let event = rx.recv().await.expect("reply event");
        controller.apply_reply(event);

        assert_eq!(controller.messages().len(), 3);
        assert_eq!(controller.messages()[2].sender, Sender::Assistant);
        assert_eq!(controller.messages()[2].text, "Hi there");
        assert!(!controller.is_pending());
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn submit_trims_surrounding_whitespace() {
        let server = MockServer::start().await;
        mock_reply(&server, "ok").await;
        let (mut controller, _rx) = controller_for(&server);

        assert!(controller.submit("  hello  "));
        assert_eq!(controller.messages()[1].text, "hello");
    }

    #[tokio::test]
    async fn submissions_are_rejected_while_pending() {
        let server = MockServer::start().await;
        mock_reply(&server, "first").await;
        let (mut controller, mut rx) = controller_for(&server);

        assert!(controller.submit("one"));
        assert!(!controller.submit("two"));
        assert_eq!(controller.messages().len(), 2);

        let event = rx.recv().await.expect("reply event");
        controller.apply_reply(event);

        // The gate opens again once the reply lands
        assert!(controller.submit("two"));
    }

    #[tokio::test]
    async fn server_error_synthesizes_fallback_and_banner() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let (mut controller, mut rx) = controller_for(&server);

        controller.submit("hello");
        let event = rx.recv().await.expect("reply event");
        controller.apply_reply(event);

        assert_eq!(controller.messages().len(), 3);
        assert_eq!(controller.messages()[2].text, CONNECTION_FALLBACK);
        assert_eq!(controller.error(), Some(CONNECTION_BANNER));
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn garbled_reply_synthesizes_fallback_and_banner() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;
        let (mut controller, mut rx) = controller_for(&server);

        controller.submit("hello");
        let event = rx.recv().await.expect("reply event");
        controller.apply_reply(event);

        assert_eq!(controller.messages()[2].text, GARBLED_FALLBACK);
        assert_eq!(controller.error(), Some(GARBLED_BANNER));
    }

    #[tokio::test]
    async fn a_new_submission_clears_the_previous_banner() {
        let server = MockServer::start().await;
        let (mut controller, mut rx) = controller_for(&server);

        {
            let _failing = Mock::given(method("POST"))
                .and(path("/chat"))
                .respond_with(ResponseTemplate::new(500))
                .expect(1)
                .mount_as_scoped(&server)
                .await;
            controller.submit("one");
            let event = rx.recv().await.expect("reply event");
            controller.apply_reply(event);
            assert!(controller.error().is_some());
        }

        mock_reply(&server, "better now").await;
        controller.submit("two");
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn request_carries_prior_history_with_mapped_roles() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "message": "I need leads",
                "chat_history": [
                    { "role": "model", "parts": [{ "text": "How can I help?" }] }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
            .expect(1)
            .mount(&server)
            .await;
        let (mut controller, mut rx) = controller_for(&server);

        controller.submit("I need leads");
        let event = rx.recv().await.expect("reply event");
        controller.apply_reply(event);
        assert_eq!(controller.messages().last().unwrap().text, "ok");
    }

    #[tokio::test]
    async fn reset_restores_the_seeded_shape() {
        let server = MockServer::start().await;
        mock_reply(&server, "reply").await;
        let (mut controller, mut rx) = controller_for(&server);

        for text in ["one", "two"] {
            controller.submit(text);
            let event = rx.recv().await.expect("reply event");
            controller.apply_reply(event);
        }
        assert_eq!(controller.messages().len(), 5);

        controller.reset();
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].text, "How can I help?");
        assert!(!controller.is_pending());
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn reply_arriving_after_reset_is_dropped() {
        let server = MockServer::start().await;
        mock_reply(&server, "too late").await;
        let (mut controller, mut rx) = controller_for(&server);

        controller.submit("hello");
        controller.reset();

        let event = rx.recv().await.expect("reply event");
        controller.apply_reply(event);

        assert_eq!(controller.messages().len(), 1);
        assert!(!controller.is_pending());
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn reset_while_pending_allows_a_fresh_submission() {
        let server = MockServer::start().await;
        mock_reply(&server, "reply").await;
        let (mut controller, mut rx) = controller_for(&server);

        controller.submit("hello");
        assert!(controller.is_pending());
        controller.reset();
        assert!(controller.submit("fresh start"));

        // Two completions land in whichever order; only the live one counts
        for _ in 0..2 {
            let event = rx.recv().await.expect("reply event");
            controller.apply_reply(event);
        }

        assert_eq!(controller.messages().len(), 3);
        assert_eq!(controller.messages()[2].text, "reply");
    }
}
