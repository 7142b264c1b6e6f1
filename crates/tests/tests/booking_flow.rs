use std::sync::Arc;

use anyhow::anyhow;
use bml_agents::{ConciergeAgent, ConciergeConfig, Transcriber, Transcript};
use bml_core::render::{self, NO_ACTIVE_BOOKING};
use bml_core::{
    BookingEvent, BookingStep, BookingType, ConciergeReply, EventInput, Language, StartInput,
    ValidationError,
};
use bml_observability::AppMetrics;
use bml_storage::{BookingRepository, MemoryStore};
use chrono::{Duration, Local};

fn agent(config: ConciergeConfig) -> (ConciergeAgent<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let agent = ConciergeAgent::new(store.clone(), AppMetrics::shared(), config);
    (agent, store)
}

fn all_types_open() -> ConciergeConfig {
    ConciergeConfig {
        enabled_booking_types: BookingType::ALL.to_vec(),
        booking_id_prefix: "PARK".to_string(),
        ..ConciergeConfig::default()
    }
}

fn day(offset: i64) -> String {
    (Local::now().date_naive() + Duration::days(offset))
        .format("%Y-%m-%d")
        .to_string()
}

async fn event(agent: &ConciergeAgent<MemoryStore>, user_id: &str, event: BookingEvent) -> ConciergeReply {
    agent
        .handle_event(EventInput {
            user_id: user_id.to_string(),
            event,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn birthday_package_books_through_structured_events() {
    let (agent, store) = agent(all_types_open());
    agent
        .start(StartInput {
            user_id: "mia".to_string(),
            locale: Some("de".to_string()),
        })
        .await
        .unwrap();

    event(&agent, "mia", BookingEvent::SelectType("birthday".to_string())).await;
    event(&agent, "mia", BookingEvent::SelectSubtype("premium".to_string())).await;
    event(&agent, "mia", BookingEvent::SelectDate(day(6))).await;
    let reply = event(&agent, "mia", BookingEvent::SelectTimeSlot("12:00-15:00".to_string())).await;

    let record = reply.booking.expect("confirmed");
    assert_eq!(record.price, 250);
    assert_eq!(record.language, Language::De);
    assert!(record.booking_id.starts_with("PARK"));
    assert!(reply.text.starts_with("✅ **Buchung bestätigt!**"));
    assert!(store.load_booking("mia").await.unwrap().is_none());
}

#[tokio::test]
async fn date_outside_window_keeps_the_step() {
    let (agent, store) = agent(all_types_open());
    event(&agent, "leo", BookingEvent::SelectType("restaurant".to_string())).await;
    event(&agent, "leo", BookingEvent::SelectSubtype("table".to_string())).await;

    let reply = event(&agent, "leo", BookingEvent::SelectDate(day(7))).await;
    let expected = ValidationError::DateOutOfRange(Local::now().date_naive())
        .localized(Language::En);
    assert_eq!(reply.text, expected);

    let session = store.load_booking("leo").await.unwrap().expect("session kept");
    assert!(matches!(session.step, BookingStep::SelectingDate { .. }));
    assert_eq!(agent.metrics().snapshot().validation_errors_total, 1);
}

#[tokio::test]
async fn events_without_a_session_ask_to_start_over() {
    let (agent, _) = agent(ConciergeConfig::default());
    let reply = event(&agent, "zoe", BookingEvent::SelectDate(day(1))).await;

    assert_eq!(reply.text, NO_ACTIVE_BOOKING.en);
    let keyboard = reply.keyboard.expect("types keyboard");
    assert!(keyboard.actions().any(|action| action == "booking_entry"));
    assert_eq!(agent.metrics().snapshot().state_errors_total, 1);
}

#[tokio::test]
async fn closed_types_never_open_a_session() {
    let (agent, store) = agent(ConciergeConfig::default());
    let reply = event(&agent, "max", BookingEvent::SelectType("restaurant".to_string())).await;

    assert_eq!(reply.text, render::coming_soon(BookingType::Restaurant, Language::En));
    assert!(store.load_booking("max").await.unwrap().is_none());
}

struct GermanTranscriber;

impl Transcriber for GermanTranscriber {
    fn transcribe(&self, audio: &[u8]) -> anyhow::Result<Transcript> {
        if audio.is_empty() {
            return Err(anyhow!("no audio"));
        }
        Ok(Transcript {
            text: "Wann habt ihr geöffnet?".to_string(),
            language: Language::De,
        })
    }
}

#[tokio::test]
async fn voice_notes_route_like_text() {
    let (agent, _) = agent(ConciergeConfig::default());
    let agent = agent.with_transcriber(Arc::new(GermanTranscriber));

    let reply = agent.handle_voice("ida", b"ogg").await.unwrap();
    assert_eq!(reply.language, Language::De);
    assert_eq!(reply.matched_topic.as_deref(), Some("opening_hours"));

    let reply = agent.handle_voice("ida", b"").await.unwrap();
    assert_eq!(reply.text, render::VOICE_FAILED.de);
    assert_eq!(agent.metrics().snapshot().collaborator_failures_total, 1);
}

#[tokio::test]
async fn users_book_concurrently_without_interference() {
    let (agent, _) = agent(ConciergeConfig::default());
    let agent = Arc::new(agent);

    let handles = (0..8)
        .map(|index| {
            let agent = agent.clone();
            tokio::spawn(async move {
                let user = format!("guest-{index}");
                event(&agent, &user, BookingEvent::SelectType("entry".to_string())).await;
                event(&agent, &user, BookingEvent::SelectSubtype("individual".to_string())).await;
                event(&agent, &user, BookingEvent::SelectDate(day(0))).await;
                event(&agent, &user, BookingEvent::SelectTimeSlot("18:00-20:00".to_string()))
                    .await
                    .booking
                    .expect("each user confirms")
                    .booking_id
            })
        })
        .collect::<Vec<_>>();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(agent.metrics().snapshot().bookings_confirmed_total, 8);
}
