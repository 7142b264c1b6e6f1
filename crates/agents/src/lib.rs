mod collaborators;
pub mod config;
mod locks;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use bml_core::booking::parse_date;
use bml_core::knowledge::{self, shortcut_query};
use bml_core::render;
use bml_core::{
    accessibility_response, classify_route, detect, normalize_text, Action, ActionInput,
    AwaitingInput, BookingError, BookingEvent, BookingIdGenerator, BookingRecord, BookingSession,
    BookingStep, BookingType, ConciergeReply, ConversationContext, EventInput, IntentMatcher,
    Language, Route, SessionLookup, StartInput, StateError, TextInput, TimeSlot, TranscriptInput,
};
use bml_observability::AppMetrics;
use bml_storage::{BookingRepository, ContextRepository};
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

pub use collaborators::{JsonPayloadQrRenderer, QrRenderer, Transcriber, Transcript};
pub use config::ConciergeConfig;
pub use locks::UserLocks;

pub struct ConciergeAgent<S>
where
    S: ContextRepository + BookingRepository,
{
    matcher: IntentMatcher,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
    config: ConciergeConfig,
    ids: BookingIdGenerator,
    qr_renderer: Arc<dyn QrRenderer>,
    transcriber: Option<Arc<dyn Transcriber>>,
    locks: UserLocks,
}

impl<S> ConciergeAgent<S>
where
    S: ContextRepository + BookingRepository,
{
    pub fn new(store: Arc<S>, metrics: Arc<AppMetrics>, config: ConciergeConfig) -> Self {
        Self {
            matcher: IntentMatcher::default(),
            ids: BookingIdGenerator::new(config.booking_id_prefix.clone()),
            store,
            metrics,
            config,
            qr_renderer: Arc::new(JsonPayloadQrRenderer),
            transcriber: None,
            locks: UserLocks::new(),
        }
    }

    pub fn with_qr_renderer(mut self, renderer: Arc<dyn QrRenderer>) -> Self {
        self.qr_renderer = renderer;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn config(&self) -> &ConciergeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Welcome text and main menu. The transport locale replaces any stored
    /// language preference.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn start(&self, input: StartInput) -> Result<ConciergeReply> {
        let started = self.begin();
        let _guard = self.locks.acquire(&input.user_id).await;

        let mut context = self.load_context(&input.user_id).await?;
        context.language = Language::from_optional_str(input.locale.as_deref());
        context.updated_at = Utc::now();
        self.store.upsert_context(&context).await?;

        let language = context.language;
        info!(language = %language, "conversation started");
        let reply = ConciergeReply::text(render::WELCOME.get(language), language)
            .with_keyboard(render::main_menu_keyboard(language));
        Ok(self.finish(started, reply))
    }

    pub async fn help(&self, user_id: &str) -> Result<ConciergeReply> {
        let started = self.begin();
        let language = self.stored_language(user_id).await?;
        let reply = ConciergeReply::text(render::HELP.get(language), language)
            .with_keyboard(render::main_menu_keyboard(language));
        Ok(self.finish(started, reply))
    }

    pub async fn contact(&self, user_id: &str) -> Result<ConciergeReply> {
        let started = self.begin();
        let language = self.stored_language(user_id).await?;
        Ok(self.finish(started, contact_reply(language)))
    }

    pub async fn accessibility_overview(&self, user_id: &str) -> Result<ConciergeReply> {
        let started = self.begin();
        let language = self.stored_language(user_id).await?;
        let reply = self.accessibility_reply(language);
        Ok(self.finish(started, reply))
    }

    /// FAQ answer for `text` in its detected language; bumps the user's
    /// conversation count.
    #[instrument(skip(self, text))]
    pub async fn get_response(&self, text: &str, user_id: &str) -> Result<ConciergeReply> {
        let started = self.begin();
        let _guard = self.locks.acquire(user_id).await;

        let text = normalize_text(text);
        let mut context = self.load_context(user_id).await?;
        let reply = self.answer_faq(&text, detect(&text), &mut context).await?;
        Ok(self.finish(started, reply))
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn handle_text(&self, input: TextInput) -> Result<ConciergeReply> {
        let started = self.begin();
        let _guard = self.locks.acquire(&input.user_id).await;
        let reply = self.route_text(&input.user_id, &input.text, None).await?;
        Ok(self.finish(started, reply))
    }

    /// Text that a transcription service already resolved, with its language.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, language = %input.language))]
    pub async fn handle_transcript(&self, input: TranscriptInput) -> Result<ConciergeReply> {
        let started = self.begin();
        let _guard = self.locks.acquire(&input.user_id).await;
        let reply = self
            .route_text(&input.user_id, &input.text, Some(input.language))
            .await?;
        Ok(self.finish(started, reply))
    }

    /// Raw audio through the configured transcriber. Without one, or when it
    /// fails, the user gets a localized notice instead.
    #[instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn handle_voice(&self, user_id: &str, audio: &[u8]) -> Result<ConciergeReply> {
        let started = self.begin();
        let _guard = self.locks.acquire(user_id).await;
        let language = self.stored_language(user_id).await?;

        let Some(transcriber) = &self.transcriber else {
            let reply = ConciergeReply::text(render::VOICE_UNAVAILABLE.get(language), language)
                .with_keyboard(render::main_menu_keyboard(language));
            return Ok(self.finish(started, reply));
        };

        let reply = match transcriber.transcribe(audio) {
            Ok(transcript) if !transcript.text.trim().is_empty() => {
                let mut reply = self
                    .route_text(user_id, &transcript.text, Some(transcript.language))
                    .await?;
                reply.text = echo_transcript(transcript.text.trim(), &reply.text);
                reply
            }
            Ok(_) => {
                debug!("transcription came back empty");
                ConciergeReply::text(render::VOICE_FAILED.get(language), language)
            }
            Err(error) => {
                self.metrics.inc_collaborator_failure();
                warn!(error = %format!("{error:#}"), "transcription failed");
                ConciergeReply::text(render::VOICE_FAILED.get(language), language)
            }
        };
        Ok(self.finish(started, reply))
    }

    /// Button presses, identified by callback id.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, action = %input.action))]
    pub async fn handle_action(&self, input: ActionInput) -> Result<ConciergeReply> {
        let started = self.begin();
        let user_id = input.user_id.as_str();
        let _guard = self.locks.acquire(user_id).await;

        let reply = match Action::parse(&input.action) {
            Action::MainMenu => {
                let language = self.stored_language(user_id).await?;
                main_menu_reply(language)
            }
            Action::QaMenu => {
                let language = self.stored_language(user_id).await?;
                ConciergeReply::text(render::QA_MENU.get(language), language)
                    .with_keyboard(render::quick_keyboard(language))
            }
            Action::Qa(shortcut) => match shortcut_query(&shortcut) {
                Some(query) => {
                    let mut context = self.load_context(user_id).await?;
                    let language = context.language;
                    self.answer_faq(query, language, &mut context)
                        .await?
                        .with_keyboard(render::quick_keyboard(language))
                }
                None => self.not_implemented(user_id, &input.action).await?,
            },
            Action::BookingMenu => {
                let language = self.stored_language(user_id).await?;
                self.open_booking(user_id, language, Utc::now()).await?;
                ConciergeReply::text(render::BOOKING_OPTIONS.get(language), language)
                    .with_keyboard(render::booking_types_keyboard(language))
            }
            Action::BookingType(value) => {
                self.apply_booking_event(user_id, BookingEvent::SelectType(value), None)
                    .await?
            }
            Action::Subtype(value) => {
                self.apply_booking_event(user_id, BookingEvent::SelectSubtype(value), None)
                    .await?
            }
            Action::Date(value) => {
                self.apply_booking_event(user_id, BookingEvent::SelectDate(value), None)
                    .await?
            }
            Action::TimeSlot { date, slot } => {
                self.apply_booking_event(user_id, BookingEvent::SelectTimeSlot(slot), parse_date(&date))
                    .await?
            }
            Action::BookingBack => self.step_back(user_id).await?,
            Action::AccessibilityMenu => {
                let language = self.stored_language(user_id).await?;
                self.accessibility_reply(language)
            }
            Action::ContactInfo => contact_reply(self.stored_language(user_id).await?),
            Action::SetLanguage(language) => {
                let mut context = self.load_context(user_id).await?;
                context.language = language;
                context.updated_at = Utc::now();
                self.store.upsert_context(&context).await?;
                info!(language = %language, "language changed");

                let text = format!(
                    "{}\n\n{}",
                    render::LANGUAGE_CHANGED.get(language),
                    render::MAIN_MENU_TITLE.get(language)
                );
                ConciergeReply::text(text, language)
                    .with_keyboard(render::main_menu_keyboard(language))
            }
            Action::Unknown(_) => self.not_implemented(user_id, &input.action).await?,
        };

        Ok(self.finish(started, reply))
    }

    /// Structured booking transitions from a transport that does its own UI.
    #[instrument(skip(self, input), fields(user_id = %input.user_id, event = input.event.name()))]
    pub async fn handle_event(&self, input: EventInput) -> Result<ConciergeReply> {
        let started = self.begin();
        let _guard = self.locks.acquire(&input.user_id).await;
        let reply = self
            .apply_booking_event(&input.user_id, input.event, None)
            .await?;
        Ok(self.finish(started, reply))
    }

    /// The user's live booking session, if any. Stale sessions are dropped.
    pub async fn booking_status(&self, user_id: &str) -> Result<Option<BookingSession>> {
        let _guard = self.locks.acquire(user_id).await;
        Ok(self.lookup_booking(user_id, Utc::now()).await?.into_option())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        self.store
            .purge_expired(Utc::now(), self.config.booking_session_ttl)
            .await
    }

    async fn route_text(
        &self,
        user_id: &str,
        text: &str,
        language: Option<Language>,
    ) -> Result<ConciergeReply> {
        let text = normalize_text(text);
        let now = Utc::now();

        if let SessionLookup::Found(session) = self.lookup_booking(user_id, now).await? {
            if session.awaiting() == AwaitingInput::GroupSize {
                return self
                    .advance_booking(session, BookingEvent::SubmitGroupSize(text), None, now)
                    .await;
            }
        }

        let language = language.unwrap_or_else(|| detect(&text));
        let mut context = self.load_context(user_id).await?;

        match classify_route(&text) {
            Route::Booking => {
                self.remember_language(&mut context, language, now).await?;
                self.open_booking(user_id, language, now).await?;
                Ok(
                    ConciergeReply::text(render::BOOKING_DASHBOARD.get(language), language)
                        .with_keyboard(render::booking_types_keyboard(language)),
                )
            }
            Route::Accessibility => {
                self.remember_language(&mut context, language, now).await?;
                self.metrics.inc_accessibility();
                Ok(
                    ConciergeReply::text(accessibility_response(&text, language), language)
                        .with_keyboard(render::main_menu_keyboard(language)),
                )
            }
            Route::Faq => self.answer_faq(&text, language, &mut context).await,
        }
    }

    async fn answer_faq(
        &self,
        text: &str,
        language: Language,
        context: &mut ConversationContext,
    ) -> Result<ConciergeReply> {
        let answer = self.matcher.respond_in(text, language, context);
        self.store.upsert_context(context).await?;

        match answer.topic {
            Some(topic) => {
                self.metrics.inc_faq_match();
                debug!(topic, count = context.conversation_count, "faq matched");
            }
            None => {
                self.metrics.inc_faq_fallback();
                debug!(count = context.conversation_count, "faq fallback");
            }
        }

        let mut reply = ConciergeReply::text(answer.text, answer.language)
            .with_keyboard(render::main_menu_keyboard(answer.language));
        reply.matched_topic = answer.topic.map(str::to_string);
        Ok(reply)
    }

    /// Starts a fresh flow, replacing whatever the user had in progress.
    async fn open_booking(&self, user_id: &str, language: Language, now: DateTime<Utc>) -> Result<()> {
        let session = BookingSession::new(user_id, language, now);
        self.store.upsert_booking(&session).await?;
        self.metrics.inc_booking_step();
        info!(language = %language, "booking flow opened");
        Ok(())
    }

    async fn apply_booking_event(
        &self,
        user_id: &str,
        event: BookingEvent,
        button_date: Option<NaiveDate>,
    ) -> Result<ConciergeReply> {
        let now = Utc::now();
        let session = match self.lookup_booking(user_id, now).await? {
            SessionLookup::Found(session) => session,
            SessionLookup::NotFound => {
                let language = self.stored_language(user_id).await?;
                if !matches!(event, BookingEvent::SelectType(_)) {
                    self.metrics.inc_state_error();
                    debug!(event = event.name(), "no booking session in progress");
                    return Ok(
                        ConciergeReply::text(render::NO_ACTIVE_BOOKING.get(language), language)
                            .with_keyboard(render::booking_types_keyboard(language)),
                    );
                }
                BookingSession::new(user_id, language, now)
            }
        };

        self.advance_booking(session, event, button_date, now).await
    }

    async fn advance_booking(
        &self,
        mut session: BookingSession,
        event: BookingEvent,
        button_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<ConciergeReply> {
        let language = session.language;
        let today = now.with_timezone(&Local).date_naive();

        if let BookingEvent::SelectType(value) = &event {
            if let Some(booking_type) = BookingType::parse(value) {
                if !self.config.is_enabled(booking_type) {
                    debug!(booking_type = booking_type.as_key(), "booking type not open yet");
                    return Ok(ConciergeReply::text(render::coming_soon(booking_type, language), language)
                        .with_keyboard(render::back_keyboard(Action::BookingMenu, language)));
                }
            }
        }

        if let (Some(expected), BookingStep::SelectingTimeSlot { date, .. }) = (button_date, session.step) {
            if expected != date {
                let error = BookingError::State(StateError {
                    action: "choose_time_slot",
                    step: session.step.name(),
                });
                return Ok(self.reject(&session, &event, &error, today));
            }
        }

        if completes_booking(&session, &event) {
            self.store.remove_booking(&session.user_id).await?;
        }

        match session.apply(&event, today, &self.ids, now) {
            Ok(Some(record)) => self.confirm(&session, record).await,
            Ok(None) => {
                self.store.upsert_booking(&session).await?;
                self.metrics.inc_booking_step();
                debug!(step = session.step.name(), "booking advanced");
                Ok(render_step(&session, today))
            }
            Err(error) => Ok(self.reject(&session, &event, &error, today)),
        }
    }

    async fn confirm(&self, session: &BookingSession, record: BookingRecord) -> Result<ConciergeReply> {
        let language = session.language;
        self.metrics.inc_booking_confirmed();
        info!(
            booking_id = %record.booking_id,
            user_id = %record.user_id,
            price = record.price,
            "booking confirmed"
        );

        let qr = match self.qr_renderer.render(&record) {
            Ok(artifact) => Some(artifact),
            Err(error) => {
                self.metrics.inc_collaborator_failure();
                warn!(
                    booking_id = %record.booking_id,
                    error = %format!("{error:#}"),
                    "qr rendering failed; confirming without it"
                );
                None
            }
        };

        let mut reply = ConciergeReply::text(render::confirmation(&record, language), language)
            .with_keyboard(render::main_menu_keyboard(language));
        reply.booking = Some(record);
        reply.qr = qr;
        Ok(reply)
    }

    /// Re-prompts the current step with the localized error; the session is
    /// left as it was.
    fn reject(
        &self,
        session: &BookingSession,
        event: &BookingEvent,
        error: &BookingError,
        today: NaiveDate,
    ) -> ConciergeReply {
        match error {
            BookingError::Validation(_) => self.metrics.inc_validation_error(),
            BookingError::State(_) => self.metrics.inc_state_error(),
        }
        debug!(event = event.name(), error = %error, "booking event rejected");

        let mut reply = render_step(session, today);
        reply.text = error.localized(session.language);
        reply
    }

    async fn step_back(&self, user_id: &str) -> Result<ConciergeReply> {
        let now = Utc::now();
        let SessionLookup::Found(mut session) = self.lookup_booking(user_id, now).await? else {
            return Ok(main_menu_reply(self.stored_language(user_id).await?));
        };

        if !session.go_back(now) {
            return Ok(main_menu_reply(session.language));
        }
        self.store.upsert_booking(&session).await?;
        self.metrics.inc_booking_step();
        Ok(render_step(&session, now.with_timezone(&Local).date_naive()))
    }

    async fn lookup_booking(&self, user_id: &str, now: DateTime<Utc>) -> Result<SessionLookup> {
        let stored = self.store.load_booking(user_id).await?;
        let had_session = stored.is_some();
        let lookup = SessionLookup::from_stored(stored, now, self.config.booking_session_ttl);

        if had_session && matches!(lookup, SessionLookup::NotFound) {
            self.store.remove_booking(user_id).await?;
            debug!("dropped stale booking session");
        }
        Ok(lookup)
    }

    async fn load_context(&self, user_id: &str) -> Result<ConversationContext> {
        Ok(self
            .store
            .load_context(user_id)
            .await?
            .unwrap_or_else(|| ConversationContext::new(user_id, Language::default())))
    }

    /// Conversation language on record, English when the user is unknown.
    pub async fn stored_language(&self, user_id: &str) -> Result<Language> {
        Ok(self
            .store
            .load_context(user_id)
            .await?
            .map(|context| context.language)
            .unwrap_or_default())
    }

    async fn remember_language(
        &self,
        context: &mut ConversationContext,
        language: Language,
        now: DateTime<Utc>,
    ) -> Result<()> {
        context.language = language;
        context.updated_at = now;
        self.store.upsert_context(context).await
    }

    async fn not_implemented(&self, user_id: &str, action: &str) -> Result<ConciergeReply> {
        warn!(action = %action, "unhandled action");
        let language = self.stored_language(user_id).await?;
        Ok(ConciergeReply::text(render::NOT_IMPLEMENTED.get(language), language))
    }

    fn accessibility_reply(&self, language: Language) -> ConciergeReply {
        self.metrics.inc_accessibility();
        let text = knowledge::topic(knowledge::ACCESSIBILITY)
            .map(|topic| topic.answer(language))
            .unwrap_or_default();
        ConciergeReply::text(text, language)
            .with_keyboard(render::back_keyboard(Action::MainMenu, language))
    }

    fn begin(&self) -> Instant {
        self.metrics.inc_request();
        Instant::now()
    }

    fn finish(&self, started: Instant, reply: ConciergeReply) -> ConciergeReply {
        self.metrics.observe_latency(started.elapsed());
        reply
    }
}

/// Voice replies start with what was recognised.
fn echo_transcript(transcript: &str, answer: &str) -> String {
    format!("🗣️ {transcript}\n\n{answer}")
}

/// A valid slot pick on the last screen ends the flow, so the stored session
/// goes before the record is built.
fn completes_booking(session: &BookingSession, event: &BookingEvent) -> bool {
    matches!(session.step, BookingStep::SelectingTimeSlot { .. })
        && matches!(event, BookingEvent::SelectTimeSlot(value) if TimeSlot::parse(value).is_some())
}

fn render_step(session: &BookingSession, today: NaiveDate) -> ConciergeReply {
    let language = session.language;
    match session.step {
        BookingStep::SelectingType | BookingStep::Confirmed => {
            ConciergeReply::text(render::BOOKING_OPTIONS.get(language), language)
                .with_keyboard(render::booking_types_keyboard(language))
        }
        BookingStep::SelectingSubtype { booking_type } => {
            ConciergeReply::text(render::subtype_prompt(booking_type, language), language)
                .with_keyboard(render::subtype_keyboard(booking_type, language))
        }
        BookingStep::CollectingGroupSize => {
            ConciergeReply::text(render::GROUP_SIZE_PROMPT.get(language), language)
                .with_keyboard(render::back_keyboard(Action::BookingBack, language))
        }
        BookingStep::SelectingDate { .. } => {
            ConciergeReply::text(render::DATE_PROMPT.get(language), language)
                .with_keyboard(render::calendar_keyboard(today, language))
        }
        BookingStep::SelectingTimeSlot { date, .. } => {
            ConciergeReply::text(render::time_slot_prompt(date, language), language)
                .with_keyboard(render::time_slot_keyboard(date, language))
        }
    }
}

fn main_menu_reply(language: Language) -> ConciergeReply {
    ConciergeReply::text(render::MAIN_MENU_TITLE.get(language), language)
        .with_keyboard(render::main_menu_keyboard(language))
}

fn contact_reply(language: Language) -> ConciergeReply {
    ConciergeReply::text(render::CONTACT.get(language), language)
        .with_keyboard(render::back_keyboard(Action::MainMenu, language))
}
