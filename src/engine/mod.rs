//! Interaction engine facade.
//!
//! Wires the store, cycle engine, gesture resolver, merge detector and
//! sync coordinator behind one object that every interactive surface
//! shares. Hosts feed it render requests, taps and raw pointer streams;
//! it answers with outcomes the host can act on and publishes vocabulary
//! events for everything else.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::cycle::{next_status, MenuAction};
use crate::events::{EventBus, MergeProposedPayload, NoticePayload, VocabEvent};
use crate::gesture::{
    clamp_center, Direction, MenuLayout, Point, PressEvent, PressTracker, RadialGestureSession,
    Viewport,
};
use crate::merge::{MergeDetector, MergeOutcome};
use crate::normalize::{normalize_key_min, surrounding_sentence};
use crate::platform::{
    BackendError, NoopBackend, NoopSpeech, NoopTranslator, SpeechOutput, Translator,
    VocabularyBackend,
};
use crate::project;
use crate::sync::SyncCoordinator;
use crate::tokenize::{TextSegmenter, Tokenizer};
use crate::types::{MergeProposal, RenderToken, WordOccurrence, WordStatus};
use crate::vocab::VocabularyStore;

/// Everything the engine needs to know about the word under a press.
///
/// Built by the host from the `RenderToken::Word` the pointer landed on.
#[derive(Debug, Clone, PartialEq)]
pub struct PressTarget {
    pub message_id: String,
    pub raw_segment: String,
    /// Full message text, for sentence recovery.
    pub message_text: String,
    /// Byte offset of the segment in `message_text`.
    pub offset: usize,
    /// Language of the message, for pronunciation.
    pub lang_code: String,
}

/// Result of a tap on a word token.
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    StatusChanged { key: String, status: WordStatus },
    /// A second word landed inside the merge window; nothing mutated yet.
    MergeProposed(MergeProposal),
    /// The segment yields no trackable key.
    Ignored,
}

/// Host-actionable result of a committed radial-menu direction.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuOutcome {
    DetailRequested { key: String },
    SpeechStarted { key: String },
    SpeechUnavailable,
    SentenceSaved { sentence: String },
    EntryReset { key: String },
    ImportantToggled { key: String, important: bool },
}

/// Result of one pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerOutcome {
    Idle,
    /// Movement broke the press before the long-press fired.
    PressCancelled,
    /// The radial menu opened; `center` is already viewport-clamped.
    MenuOpened { center: Point },
    /// The armed direction changed (or cleared) under the drag.
    MenuDirection(Direction),
    /// Released with no armed direction: menu closed, nothing happened.
    MenuCancelled,
    MenuCommitted(MenuOutcome),
    Tapped(TapOutcome),
}

struct ArmedMenu {
    session: RadialGestureSession,
    target: PressTarget,
}

struct SessionState {
    press: PressTracker,
    press_target: Option<PressTarget>,
    viewport: Viewport,
    menu: Option<ArmedMenu>,
    merge: MergeDetector,
    pending_merge: Option<MergeProposal>,
}

pub struct InteractionEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    store: Arc<VocabularyStore>,
    sync: SyncCoordinator,
    events: Arc<EventBus>,
    backend: Arc<dyn VocabularyBackend>,
    translator: Arc<dyn Translator>,
    speech: Arc<dyn SpeechOutput>,
    menu_layout: MenuLayout,
    session: Mutex<SessionState>,
}

impl InteractionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let events = Arc::new(EventBus::with_capacity(config.event_channel_capacity));
        let backend: Arc<dyn VocabularyBackend> = Arc::new(NoopBackend);
        let sync = SyncCoordinator::new(
            Duration::from_millis(config.debounce.sync_ms),
            Arc::clone(&backend),
            Arc::clone(&events),
        );
        let session = SessionState {
            press: PressTracker::new(config.gesture.long_press_ms, config.gesture.press_slop_px),
            press_target: None,
            viewport: Viewport {
                width: f64::MAX,
                height: f64::MAX,
            },
            menu: None,
            merge: MergeDetector::new(config.debounce.merge_window_ms),
            pending_merge: None,
        };
        Self {
            tokenizer: Tokenizer::default(),
            store: Arc::new(VocabularyStore::new(Arc::clone(&events))),
            sync,
            events,
            backend,
            translator: Arc::new(NoopTranslator),
            speech: Arc::new(NoopSpeech),
            menu_layout: MenuLayout::default(),
            session: Mutex::new(session),
            config,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn VocabularyBackend>) -> Self {
        self.sync = SyncCoordinator::new(
            Duration::from_millis(self.config.debounce.sync_ms),
            Arc::clone(&backend),
            Arc::clone(&self.events),
        );
        self.backend = backend;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = speech;
        self
    }

    pub fn with_segmenter(mut self, segmenter: Arc<dyn TextSegmenter>) -> Self {
        self.tokenizer = Tokenizer::new(segmenter);
        self
    }

    pub fn with_menu_layout(mut self, layout: MenuLayout) -> Self {
        self.menu_layout = layout;
        self
    }

    pub fn store(&self) -> Arc<VocabularyStore> {
        Arc::clone(&self.store)
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    // ============================================================
    // Rendering
    // ============================================================

    /// Project one message against the current vocabulary snapshot.
    pub fn render_message(&self, text: &str, message_id: &str) -> Vec<RenderToken> {
        let snapshot = self.store.snapshot();
        let overrides = self.store.overrides();
        project::project(&self.tokenizer, text, message_id, &snapshot, &overrides)
    }

    /// Ephemeral occurrences of the word-like segments in one message.
    pub fn occurrences(&self, text: &str, message_id: &str) -> Vec<WordOccurrence> {
        self.tokenizer
            .tokenize(text)
            .into_iter()
            .filter(|segment| segment.word_like)
            .map(|segment| WordOccurrence {
                raw_segment: segment.text,
                message_id: message_id.to_string(),
                offset_in_text: segment.offset,
            })
            .collect()
    }

    // ============================================================
    // Tap flow
    // ============================================================

    /// Handle a direct tap on a word token.
    pub fn handle_tap(&self, message_id: &str, raw_segment: &str, at_ms: i64) -> TapOutcome {
        let mut session = self.session.lock();
        self.tap_locked(&mut session, message_id, raw_segment, at_ms)
    }

    fn tap_locked(
        &self,
        session: &mut SessionState,
        message_id: &str,
        raw_segment: &str,
        at_ms: i64,
    ) -> TapOutcome {
        let Some(key) = normalize_key_min(raw_segment, self.config.min_key_chars) else {
            return TapOutcome::Ignored;
        };

        match session.merge.observe(&key, at_ms) {
            MergeOutcome::Proposal(proposal) => {
                session.pending_merge = Some(proposal.clone());
                self.events
                    .publish(VocabEvent::MergeProposed(MergeProposedPayload {
                        first: proposal.first.clone(),
                        second: proposal.second.clone(),
                        timestamp: Utc::now(),
                    }));
                TapOutcome::MergeProposed(proposal)
            }
            MergeOutcome::Single => {
                let (current, _) = self.store.resolve_status(message_id, &key);
                let next = next_status(current);
                self.apply_status(message_id, &key, next);
                TapOutcome::StatusChanged { key, status: next }
            }
        }
    }

    /// Optimistic local mutation plus the debounced remote write.
    fn apply_status(&self, message_id: &str, key: &str, status: WordStatus) {
        self.store.set_local_override(message_id, key, status);
        if let Err(err) = self.store.set_status(key, status) {
            warn!(key, error = %err, "status mutation rejected");
            return;
        }
        let important = self
            .store
            .snapshot()
            .get(key)
            .map(|entry| entry.important)
            .unwrap_or(false);
        self.sync.schedule(key, status, important, None);
    }

    // ============================================================
    // Merge flow
    // ============================================================

    /// The user accepted the pending merge proposal: fuse both words into
    /// one compound entry starting at `Red`.
    pub fn confirm_merge(&self) -> Option<String> {
        let proposal = {
            let mut session = self.session.lock();
            session.merge.reset();
            session.pending_merge.take()
        }?;
        let compound = proposal.compound_key();
        if let Err(err) = self.store.set_status(&compound, WordStatus::Red) {
            warn!(key = %compound, error = %err, "compound entry rejected");
            return None;
        }
        self.sync.schedule(&compound, WordStatus::Red, false, None);
        debug!(key = %compound, "compound entry created");
        Some(compound)
    }

    /// The user declined: drop the pairing with no side effects.
    pub fn reject_merge(&self) {
        let mut session = self.session.lock();
        session.pending_merge = None;
    }

    pub fn pending_merge(&self) -> Option<MergeProposal> {
        self.session.lock().pending_merge.clone()
    }

    // ============================================================
    // Pointer flow (tap vs. long-press vs. radial drag)
    // ============================================================

    pub fn pointer_down(&self, target: PressTarget, position: Point, viewport: Viewport, at_ms: i64) {
        let mut session = self.session.lock();
        session.press.pointer_down(position, at_ms);
        session.press_target = Some(target);
        session.viewport = viewport;
    }

    pub fn pointer_move(&self, position: Point, at_ms: i64) -> PointerOutcome {
        let mut session = self.session.lock();

        if let Some(menu) = session.menu.as_mut() {
            return PointerOutcome::MenuDirection(menu.session.pointer_move(position));
        }

        match session.press.pointer_move(position, at_ms) {
            PressEvent::Armed { origin } => self.open_menu(&mut session, origin),
            PressEvent::Cancelled => {
                session.press_target = None;
                PointerOutcome::PressCancelled
            }
            _ => PointerOutcome::Idle,
        }
    }

    /// Arming check for hosts that drive the long-press off a timer tick
    /// rather than pointer movement.
    pub fn pointer_poll(&self, at_ms: i64) -> PointerOutcome {
        let mut session = self.session.lock();
        if session.menu.is_some() {
            return PointerOutcome::Idle;
        }
        match session.press.poll(at_ms) {
            PressEvent::Armed { origin } => self.open_menu(&mut session, origin),
            _ => PointerOutcome::Idle,
        }
    }

    pub fn pointer_up(&self, at_ms: i64) -> PointerOutcome {
        let mut session = self.session.lock();

        if let Some(mut menu) = session.menu.take() {
            session.press.cancel();
            session.press_target = None;
            return match menu.session.release() {
                Some(direction) => match self.menu_layout.action_for(direction) {
                    Some(action) => PointerOutcome::MenuCommitted(
                        self.dispatch_menu_action(action, &menu.target),
                    ),
                    None => PointerOutcome::MenuCancelled,
                },
                // Released inside the deadzone: always a cancel, and the
                // menu always closes.
                None => PointerOutcome::MenuCancelled,
            };
        }

        let target = session.press_target.take();
        match session.press.pointer_up(at_ms) {
            PressEvent::Tap { .. } => match target {
                Some(target) => {
                    let outcome = self.tap_locked(
                        &mut session,
                        &target.message_id,
                        &target.raw_segment,
                        at_ms,
                    );
                    PointerOutcome::Tapped(outcome)
                }
                None => PointerOutcome::Idle,
            },
            // Long-press expired on the same event as the release: armed
            // with no direction, which is a cancel.
            PressEvent::Armed { .. } => PointerOutcome::MenuCancelled,
            _ => PointerOutcome::Idle,
        }
    }

    fn open_menu(&self, session: &mut SessionState, origin: Point) -> PointerOutcome {
        let Some(target) = session.press_target.clone() else {
            session.press.cancel();
            return PointerOutcome::Idle;
        };
        let gesture = &self.config.gesture;
        let center = clamp_center(
            origin,
            session.viewport,
            gesture.menu_radius_px,
            gesture.menu_button_radius_px,
            gesture.menu_edge_padding_px,
        );
        session.menu = Some(ArmedMenu {
            // Directions stay relative to the press point even when the
            // drawn menu is shifted inward.
            session: RadialGestureSession::new(origin, gesture.deadzone_px),
            target,
        });
        debug!("radial menu armed");
        PointerOutcome::MenuOpened { center }
    }

    // ============================================================
    // Menu actions
    // ============================================================

    /// Dispatch a menu action against the word under `target`. Also the
    /// entry point for hosts that trigger actions outside the radial menu
    /// (detail buttons, list swipes).
    pub fn menu_action(&self, action: MenuAction, target: &PressTarget) -> MenuOutcome {
        self.dispatch_menu_action(action, target)
    }

    fn dispatch_menu_action(&self, action: MenuAction, target: &PressTarget) -> MenuOutcome {
        let key = normalize_key_min(&target.raw_segment, self.config.min_key_chars)
            .unwrap_or_else(|| target.raw_segment.trim().to_lowercase());

        match action {
            MenuAction::Detail => MenuOutcome::DetailRequested { key },
            MenuAction::Listen => {
                if !self.speech.available() {
                    self.notice("当前平台不支持发音");
                    return MenuOutcome::SpeechUnavailable;
                }
                self.speech.speak(&key, &target.lang_code);
                MenuOutcome::SpeechStarted { key }
            }
            MenuAction::SaveSentence => {
                let sentence =
                    surrounding_sentence(&target.message_text, target.offset).to_string();
                MenuOutcome::SentenceSaved { sentence }
            }
            MenuAction::Reset => {
                self.store.remove(&key);
                self.sync.schedule(&key, WordStatus::White, false, None);
                MenuOutcome::EntryReset { key }
            }
            MenuAction::MarkImportant => {
                let (status, important) = self
                    .store
                    .snapshot()
                    .get(&key)
                    .map(|entry| (entry.status, entry.important))
                    .unwrap_or((WordStatus::White, false));
                let next = !important;
                if let Err(err) = self.store.set_important(&key, next) {
                    warn!(key = %key, error = %err, "important toggle rejected");
                    return MenuOutcome::ImportantToggled {
                        key,
                        important,
                    };
                }
                self.sync.schedule(&key, status, next, None);
                MenuOutcome::ImportantToggled {
                    key,
                    important: next,
                }
            }
        }
    }

    // ============================================================
    // External collaborators
    // ============================================================

    /// Translate a message for the learner. Failure never blocks the
    /// original text: the caller keeps rendering it and a notice event is
    /// published.
    pub async fn translate_message(
        &self,
        text: &str,
        target_lang: &str,
    ) -> Result<String, BackendError> {
        match self.translator.translate(text, target_lang).await {
            Ok(translated) => Ok(translated),
            Err(err) => {
                warn!(target_lang, error = %err, "translation failed");
                self.notice("翻译暂时不可用");
                Err(err)
            }
        }
    }

    /// Replace the local snapshot with the authoritative one.
    pub async fn refresh_snapshot(&self, user_id: &str) -> Result<(), BackendError> {
        match self.backend.fetch_snapshot(user_id).await {
            Ok(entries) => {
                self.store.replace_snapshot(entries);
                Ok(())
            }
            Err(err) => {
                warn!(user_id, error = %err, "snapshot refresh failed");
                self.notice("词汇同步失败，稍后重试");
                Err(err)
            }
        }
    }

    fn notice(&self, message: &str) {
        self.events.publish(VocabEvent::Notice(NoticePayload {
            message: message.to_string(),
            timestamp: Utc::now(),
        }));
    }

    // ============================================================
    // Teardown
    // ============================================================

    /// Unmount the interactive surface: cancel live press timers and any
    /// armed gesture session, drop pending merge state, abort pending
    /// debounce timers. Fired commits are left to finish.
    pub fn teardown(&self) {
        let mut session = self.session.lock();
        session.press.cancel();
        session.press_target = None;
        session.menu = None;
        session.merge.reset();
        session.pending_merge = None;
        drop(session);
        self.sync.shutdown();
    }

    /// A message left the screen: its occurrence overrides are garbage.
    pub fn message_unmounted(&self, message_id: &str) {
        self.store.clear_message_overrides(message_id);
    }
}
