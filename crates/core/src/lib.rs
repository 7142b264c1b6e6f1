pub mod actions;
pub mod booking;
pub mod intent;
pub mod knowledge;
pub mod language;
pub mod models;
pub mod render;

pub use actions::Action;
pub use booking::{
    available_dates, AwaitingInput, BookingError, BookingEvent, BookingIdGenerator, BookingRecord,
    BookingSession, BookingStep, BookingType, Product, SessionLookup, StateError, TimeSlot,
    ValidationError,
};
pub use intent::{
    accessibility_response, accessibility_topic, classify_route, normalize_text, FaqAnswer,
    IntentMatcher, Route, TopicMatch,
};
pub use language::{detect, detect_batch, detect_with_confidence, language_info, Detection, LanguageInfo};
pub use models::*;
