use std::time::Instant;

use tracing::{debug, info, warn};

use crate::action_executor::ActionExecutor;
use crate::backend::{Backend, BackendError, EventTopic, SubscriptionId};
use crate::config::{Config, ControllerOptions};
use crate::contract::{HostEvent, SessionView};
use crate::debounce::DebounceScheduler;
use crate::dispatcher::{ActionDispatcher, DispatchOutcome};
use crate::model::{route_query, QueryRoute, SearchResult};
use crate::navigation::{step_down, step_up, InputRouter, KeyCommand, KeyInput};
use crate::overlay_state::OverlayState;
use crate::session::{RequestToken, SessionState, StreamId, StreamIssuer, TokenIssuer};
use crate::settings::SettingsPanel;
use crate::stream::StreamAccumulator;

/// Shown in place of an answer when the AI request could not be started.
pub const AI_FAILURE_TRANSCRIPT: &str =
    "Unable to reach the AI service. Check your API key in Settings (Ctrl+,) and try again.";

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("invalid settings shortcut: {0}")]
    Shortcut(String),
    #[error("failed to subscribe to {topic:?}: {source}")]
    Subscribe {
        topic: EventTopic,
        #[source]
        source: BackendError,
    },
}

/// A search reply that arrived before the minimum loading time elapsed.
#[derive(Debug)]
struct HeldReply {
    token: RequestToken,
    outcome: Result<Vec<SearchResult>, String>,
    apply_at: Instant,
}

/// Owns one launcher session: the query, the state machine and every
/// outstanding request. Time is passed in; the caller drives `poll` at
/// `next_deadline`.
pub struct SessionController<B: Backend, E: ActionExecutor> {
    options: ControllerOptions,
    backend: B,
    executor: E,
    query: String,
    state: SessionState,
    debounce: DebounceScheduler,
    tokens: TokenIssuer,
    streams: StreamIssuer,
    held_reply: Option<HeldReply>,
    router: InputRouter,
    dispatcher: ActionDispatcher,
    settings: SettingsPanel,
    overlay: OverlayState,
    config: Option<Config>,
    subscriptions: Vec<(SubscriptionId, EventTopic)>,
    compact: Option<bool>,
    running: bool,
}

impl<B: Backend, E: ActionExecutor> SessionController<B, E> {
    pub fn new(options: ControllerOptions, backend: B, executor: E) -> Result<Self, ControllerError> {
        let router = InputRouter::new(&options.settings_shortcut).map_err(ControllerError::Shortcut)?;
        Ok(Self {
            debounce: DebounceScheduler::new(options.debounce_interval()),
            options,
            backend,
            executor,
            query: String::new(),
            state: SessionState::Idle,
            tokens: TokenIssuer::default(),
            streams: StreamIssuer::default(),
            held_reply: None,
            router,
            dispatcher: ActionDispatcher,
            settings: SettingsPanel::default(),
            overlay: OverlayState::default(),
            config: None,
            subscriptions: Vec::new(),
            compact: None,
            running: false,
        })
    }

    /// Loads config, subscribes to every push topic and attaches key routing.
    /// A config failure is logged and the session runs without one.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.running {
            return Ok(());
        }

        match self.backend.get_config() {
            Ok(config) => self.config = Some(config),
            Err(error) => warn!(%error, "failed to load config"),
        }

        for topic in EventTopic::ALL {
            match self.backend.subscribe(topic) {
                Ok(id) => self.subscriptions.push((id, topic)),
                Err(source) => {
                    self.release_subscriptions();
                    return Err(ControllerError::Subscribe { topic, source });
                }
            }
        }

        self.router.attach();
        self.running = true;
        self.sync_window_size();
        info!(
            debounce_ms = self.options.debounce_ms,
            min_loading_ms = self.options.min_loading_ms,
            "session started"
        );
        Ok(())
    }

    /// Releases everything `start` acquired. Safe to call more than once.
    pub fn stop(&mut self) {
        self.router.detach();
        self.debounce.cancel();
        self.abandon_search();
        self.streams.invalidate();
        self.release_subscriptions();
        if self.running {
            self.running = false;
            info!("session stopped");
        }
    }

    pub fn handle(&mut self, event: HostEvent, now: Instant) {
        match event {
            HostEvent::QueryChanged { query } => self.on_query_changed(query, now),
            HostEvent::KeyDown(input) => {
                self.route_key(&input);
            }
            HostEvent::SearchReply { token, results } => {
                self.on_search_outcome(token, Ok(results), now)
            }
            HostEvent::SearchFailed { token, message } => {
                self.on_search_outcome(token, Err(message), now)
            }
            HostEvent::AiResponseChunk { stream, text } => self.on_ai_chunk(stream, &text),
            HostEvent::AiResponseComplete { stream } => self.on_ai_complete(stream),
            HostEvent::AiResponseError { stream, message } => self.on_ai_error(stream, message),
            HostEvent::ToggleWindowEvent => self.on_toggle_window(),
            HostEvent::WindowVisibility { visible } => self.overlay.set_visible(visible),
            HostEvent::NewQuery => self.new_query(now),
            HostEvent::ActivateResult { index } => self.activate(index),
            HostEvent::OpenSettings => self.open_settings(),
            HostEvent::CloseSettings => self.close_settings(),
            HostEvent::EditSettings { config } => {
                if !self.settings.edit(config) {
                    debug!("settings edit ignored while closed");
                }
            }
            HostEvent::SaveSettings => self.save_settings(),
            HostEvent::Shutdown => self.stop(),
        }
        self.poll(now);
    }

    /// Routes one key-down. Returns the command it mapped to, if any, so an
    /// in-process host can decide whether to suppress default handling.
    pub fn handle_key(&mut self, input: &KeyInput, now: Instant) -> Option<KeyCommand> {
        let command = self.route_key(input);
        self.poll(now);
        command
    }

    /// Fires the debounce and applies a held reply once their time has come.
    pub fn poll(&mut self, now: Instant) {
        if let Some(query) = self.debounce.poll(now, &self.query).map(str::to_string) {
            self.on_settled(&query, now);
        }

        if self
            .held_reply
            .as_ref()
            .is_some_and(|held| now >= held.apply_at)
        {
            if let Some(held) = self.held_reply.take() {
                self.apply_search_outcome(held.token, held.outcome);
            }
        }

        self.sync_window_size();
    }

    /// Earliest instant at which `poll` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let held = self.held_reply.as_ref().map(|held| held.apply_at);
        match (self.debounce.deadline(), held) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn view(&self) -> SessionView {
        let buffer = self.state.stream_buffer();
        SessionView {
            query: self.query.clone(),
            state: self.state.kind(),
            results: self.state.result_list().to_vec(),
            selected_index: self.state.selected_index(),
            transcript: buffer.map(StreamAccumulator::rendered).unwrap_or_default(),
            stream_complete: buffer.is_some_and(StreamAccumulator::is_complete),
            error: self.state.error_message().map(str::to_string),
            settings_open: self.settings.is_open(),
            settings_draft: self.settings.draft().cloned(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn settings(&self) -> &SettingsPanel {
        &self.settings
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_window_visible(&self) -> bool {
        self.overlay.is_visible()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    fn on_query_changed(&mut self, query: String, now: Instant) {
        self.query = query;
        match route_query(&self.query, self.options.ai_sigil) {
            QueryRoute::Search(_) => {
                // The in-flight reply answers an older query; Loading stays up
                // until the new one settles.
                if self.state.loading_token().is_some() {
                    self.abandon_search();
                }
                self.debounce.schedule(now);
            }
            QueryRoute::Empty | QueryRoute::Ai(_) => {
                self.debounce.cancel();
                self.abandon_search();
                if !self.state.is_streaming() {
                    self.state = SessionState::Idle;
                }
            }
        }
    }

    fn on_settled(&mut self, query: &str, now: Instant) {
        let QueryRoute::Search(term) = route_query(query, self.options.ai_sigil) else {
            return;
        };
        if self.state.is_streaming() {
            debug!("search suppressed while an answer is shown");
            return;
        }

        let token = self.tokens.issue();
        self.held_reply = None;
        self.state = SessionState::Loading { token, since: now };
        debug!(token = token.value(), query = term, "search issued");

        if let Err(error) = self.backend.search(token, term) {
            self.on_search_outcome(token, Err(error.to_string()), now);
        }
    }

    fn on_search_outcome(
        &mut self,
        token: RequestToken,
        outcome: Result<Vec<SearchResult>, String>,
        now: Instant,
    ) {
        let since = match &self.state {
            SessionState::Loading { token: live, since }
                if *live == token && self.tokens.is_current(token) =>
            {
                *since
            }
            _ => {
                debug!(token = token.value(), "stale search reply dropped");
                return;
            }
        };

        let apply_at = since + self.options.min_loading();
        if now >= apply_at {
            self.apply_search_outcome(token, outcome);
        } else {
            self.held_reply = Some(HeldReply {
                token,
                outcome,
                apply_at,
            });
        }
    }

    fn apply_search_outcome(&mut self, token: RequestToken, outcome: Result<Vec<SearchResult>, String>) {
        if self.state.loading_token() != Some(token) || !self.tokens.is_current(token) {
            debug!(token = token.value(), "held search reply dropped");
            return;
        }

        let results = match outcome {
            Ok(results) => results,
            Err(message) => {
                warn!(token = token.value(), error = %message, "search failed");
                Vec::new()
            }
        };
        debug!(token = token.value(), count = results.len(), "search results applied");
        self.state = SessionState::results(results);
    }

    fn route_key(&mut self, input: &KeyInput) -> Option<KeyCommand> {
        let command = self.router.route(input)?;
        match command {
            KeyCommand::Reset => self.escape(),
            KeyCommand::OpenSettings => self.open_settings(),
            _ if self.settings.is_open() => debug!(?command, "key ignored while settings are open"),
            KeyCommand::MoveDown => {
                self.state.move_selection(step_down);
            }
            KeyCommand::MoveUp => {
                self.state.move_selection(step_up);
            }
            KeyCommand::Commit => self.commit(),
        }
        Some(command)
    }

    fn commit(&mut self) {
        if let QueryRoute::Ai(prompt) = route_query(&self.query, self.options.ai_sigil) {
            if prompt.is_empty() {
                return;
            }
            let prompt = prompt.to_string();
            self.begin_stream(&prompt);
            return;
        }

        if let Some(result) = self.state.selected_result().cloned() {
            self.dispatch(&result);
        }
    }

    fn activate(&mut self, index: usize) {
        if self.settings.is_open() {
            debug!(index, "activation ignored while settings are open");
            return;
        }
        let SessionState::Results { results, selected } = &mut self.state else {
            return;
        };
        let Some(result) = results.get(index).cloned() else {
            debug!(index, "activation out of range");
            return;
        };
        *selected = index;
        self.dispatch(&result);
    }

    fn dispatch(&mut self, result: &SearchResult) {
        match self.dispatcher.dispatch(&mut self.executor, result) {
            DispatchOutcome::Completed => self.reset_session(),
            DispatchOutcome::Failed(_) => {}
            DispatchOutcome::StreamRequested { prompt } => self.begin_stream(&prompt),
        }
    }

    fn begin_stream(&mut self, prompt: &str) {
        self.debounce.cancel();
        self.abandon_search();
        self.query.clear();

        let stream = self.streams.issue();
        self.state = SessionState::streaming(stream);
        info!(stream = stream.value(), "ai request issued");

        if let Err(error) = self.backend.ai_request(stream, prompt) {
            warn!(stream = stream.value(), %error, "ai request failed to start");
            self.streams.invalidate();
            if let SessionState::Streaming { buffer, .. } = &mut self.state {
                buffer.push(AI_FAILURE_TRANSCRIPT);
                buffer.complete();
            }
        }
    }

    /// The buffer of the live, still-open stream, if `tag` addresses it.
    fn live_buffer(&mut self, tag: Option<StreamId>) -> Option<&mut StreamAccumulator> {
        let active = self.streams.active()?;
        match &mut self.state {
            SessionState::Streaming { stream, buffer }
                if *stream == active
                    && tag.map_or(true, |tag| tag == active)
                    && !buffer.is_complete() =>
            {
                Some(buffer)
            }
            _ => None,
        }
    }

    fn on_ai_chunk(&mut self, tag: Option<StreamId>, text: &str) {
        if !self.is_subscribed(EventTopic::AiResponseChunk) {
            return;
        }
        match self.live_buffer(tag) {
            Some(buffer) => {
                if !buffer.push(text) {
                    debug!("duplicate ai fragment skipped");
                }
            }
            None => debug!("ai fragment dropped"),
        }
    }

    fn on_ai_complete(&mut self, tag: Option<StreamId>) {
        if !self.is_subscribed(EventTopic::AiResponseComplete) {
            return;
        }
        let Some(buffer) = self.live_buffer(tag) else {
            debug!("ai completion dropped");
            return;
        };
        buffer.complete();
        let length = buffer.transcript().len();
        self.streams.invalidate();
        info!(length, "ai stream complete");
    }

    fn on_ai_error(&mut self, tag: Option<StreamId>, message: String) {
        if !self.running || self.live_buffer(tag).is_none() {
            debug!("ai error dropped");
            return;
        }
        warn!(error = %message, "ai stream failed");
        self.streams.invalidate();
        self.state = SessionState::Error { message };
    }

    fn new_query(&mut self, now: Instant) {
        let finished = match &self.state {
            SessionState::Streaming { buffer, .. } => buffer.is_complete(),
            SessionState::Error { .. } => true,
            _ => false,
        };
        if !finished {
            return;
        }

        self.streams.invalidate();
        self.state = SessionState::Idle;
        if matches!(
            route_query(&self.query, self.options.ai_sigil),
            QueryRoute::Search(_)
        ) {
            self.debounce.schedule(now);
        }
    }

    fn escape(&mut self) {
        self.close_settings();
        self.reset_session();
        info!("session reset");
    }

    fn reset_session(&mut self) {
        self.debounce.cancel();
        self.abandon_search();
        self.streams.invalidate();
        self.query.clear();
        self.state = SessionState::Idle;
    }

    fn abandon_search(&mut self) {
        self.tokens.invalidate();
        self.held_reply = None;
    }

    fn open_settings(&mut self) {
        if !self.settings.open(self.config.as_ref()) {
            return;
        }
        if let Err(error) = self.backend.set_focus_hiding_disabled(true) {
            warn!(%error, "failed to disable focus hiding");
        }
    }

    fn close_settings(&mut self) {
        if !self.settings.close() {
            return;
        }
        if let Err(error) = self.backend.set_focus_hiding_disabled(false) {
            warn!(%error, "failed to restore focus hiding");
        }
    }

    fn save_settings(&mut self) {
        let Some(draft) = self.settings.draft().cloned() else {
            return;
        };
        match self.backend.save_config(&draft) {
            Ok(()) => {
                info!("settings saved");
                self.config = Some(draft);
                self.close_settings();
            }
            Err(error) => warn!(%error, "failed to save settings"),
        }
    }

    fn on_toggle_window(&mut self) {
        if !self.is_subscribed(EventTopic::ToggleWindowEvent) {
            return;
        }
        let action = self.overlay.on_toggle();
        if let Err(error) = self.backend.set_window_visible(action.visible()) {
            warn!(?action, %error, "failed to toggle window");
        }
    }

    fn sync_window_size(&mut self) {
        if !self.running {
            return;
        }
        let compact =
            self.state.is_idle() && self.query.trim().is_empty() && !self.settings.is_open();
        if self.compact == Some(compact) {
            return;
        }
        match self.backend.resize_window(compact) {
            Ok(()) => self.compact = Some(compact),
            Err(error) => warn!(compact, %error, "failed to resize window"),
        }
    }

    fn is_subscribed(&self, topic: EventTopic) -> bool {
        self.subscriptions.iter().any(|(_, live)| *live == topic)
    }

    fn release_subscriptions(&mut self) {
        for (id, topic) in self.subscriptions.drain(..) {
            if let Err(error) = self.backend.unsubscribe(id) {
                warn!(?topic, %error, "failed to unsubscribe");
            }
        }
    }
}

impl<B: Backend, E: ActionExecutor> Drop for SessionController<B, E> {
    fn drop(&mut self) {
        self.stop();
    }
}
