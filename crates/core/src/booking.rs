//! Multi-step booking flow.
//!
//! `SelectingType -> SelectingSubtype -> (CollectingGroupSize ->) SelectingDate
//! -> SelectingTimeSlot -> Confirmed`. A rejected transition never mutates the
//! session.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Language;

pub const MIN_GROUP_SIZE: u32 = 10;
pub const MAX_GROUP_SIZE: u32 = 500;
pub const BOOKING_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_ID_PREFIX: &str = "BML";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Entry,
    Gift,
    Restaurant,
    Birthday,
}

impl BookingType {
    pub const ALL: [BookingType; 4] = [
        BookingType::Entry,
        BookingType::Gift,
        BookingType::Restaurant,
        BookingType::Birthday,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "entry" => Some(Self::Entry),
            "gift" => Some(Self::Gift),
            "restaurant" => Some(Self::Restaurant),
            "birthday" => Some(Self::Birthday),
            _ => None,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Gift => "gift",
            Self::Restaurant => "restaurant",
            Self::Birthday => "birthday",
        }
    }

    /// Subtype keys this type accepts, in display order.
    pub fn subtype_keys(self) -> &'static [&'static str] {
        match self {
            Self::Entry => &["individual", "family", "group"],
            Self::Gift => &["small", "medium", "large"],
            Self::Restaurant => &["table"],
            Self::Birthday => &["basic", "premium", "deluxe"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "ticket")]
pub enum EntryTicket {
    Individual,
    Family,
    Group { size: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftVoucher {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantOption {
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthdayPackage {
    Basic,
    Premium,
    Deluxe,
}

/// A fully specified (type, subtype) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "option")]
pub enum Product {
    Entry(EntryTicket),
    Gift(GiftVoucher),
    Restaurant(RestaurantOption),
    Birthday(BirthdayPackage),
}

impl Product {
    pub fn booking_type(&self) -> BookingType {
        match self {
            Self::Entry(_) => BookingType::Entry,
            Self::Gift(_) => BookingType::Gift,
            Self::Restaurant(_) => BookingType::Restaurant,
            Self::Birthday(_) => BookingType::Birthday,
        }
    }

    pub fn subtype_key(&self) -> &'static str {
        match self {
            Self::Entry(EntryTicket::Individual) => "individual",
            Self::Entry(EntryTicket::Family) => "family",
            Self::Entry(EntryTicket::Group { .. }) => "group",
            Self::Gift(GiftVoucher::Small) => "small",
            Self::Gift(GiftVoucher::Medium) => "medium",
            Self::Gift(GiftVoucher::Large) => "large",
            Self::Restaurant(RestaurantOption::Table) => "table",
            Self::Birthday(BirthdayPackage::Basic) => "basic",
            Self::Birthday(BirthdayPackage::Premium) => "premium",
            Self::Birthday(BirthdayPackage::Deluxe) => "deluxe",
        }
    }

    pub fn group_size(&self) -> Option<u32> {
        match self {
            Self::Entry(EntryTicket::Group { size }) => Some(*size),
            _ => None,
        }
    }

    /// Price in whole euros. Restaurant reservations carry no charge.
    pub fn price(&self) -> u32 {
        match self {
            Self::Entry(EntryTicket::Individual) => 12,
            Self::Entry(EntryTicket::Family) => 35,
            Self::Entry(EntryTicket::Group { size }) => size.saturating_mul(8),
            Self::Gift(GiftVoucher::Small) => 25,
            Self::Gift(GiftVoucher::Medium) => 50,
            Self::Gift(GiftVoucher::Large) => 100,
            Self::Restaurant(RestaurantOption::Table) => 0,
            Self::Birthday(BirthdayPackage::Basic) => 150,
            Self::Birthday(BirthdayPackage::Premium) => 250,
            Self::Birthday(BirthdayPackage::Deluxe) => 350,
        }
    }
}

/// What a subtype key resolves to once the type is known. Group entry still
/// needs a head count before it becomes a `Product`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtypeChoice {
    Ready(Product),
    NeedsGroupSize,
}

fn parse_subtype(booking_type: BookingType, key: &str) -> Option<SubtypeChoice> {
    let key = key.trim().to_lowercase();
    let choice = match (booking_type, key.as_str()) {
        (BookingType::Entry, "individual") => SubtypeChoice::Ready(Product::Entry(EntryTicket::Individual)),
        (BookingType::Entry, "family") => SubtypeChoice::Ready(Product::Entry(EntryTicket::Family)),
        (BookingType::Entry, "group") => SubtypeChoice::NeedsGroupSize,
        (BookingType::Gift, "small") => SubtypeChoice::Ready(Product::Gift(GiftVoucher::Small)),
        (BookingType::Gift, "medium") => SubtypeChoice::Ready(Product::Gift(GiftVoucher::Medium)),
        (BookingType::Gift, "large") => SubtypeChoice::Ready(Product::Gift(GiftVoucher::Large)),
        (BookingType::Restaurant, "table") => {
            SubtypeChoice::Ready(Product::Restaurant(RestaurantOption::Table))
        }
        (BookingType::Birthday, "basic") => SubtypeChoice::Ready(Product::Birthday(BirthdayPackage::Basic)),
        (BookingType::Birthday, "premium") => {
            SubtypeChoice::Ready(Product::Birthday(BirthdayPackage::Premium))
        }
        (BookingType::Birthday, "deluxe") => {
            SubtypeChoice::Ready(Product::Birthday(BirthdayPackage::Deluxe))
        }
        _ => return None,
    };
    Some(choice)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "09:00-12:00")]
    Morning,
    #[serde(rename = "12:00-15:00")]
    Midday,
    #[serde(rename = "15:00-18:00")]
    Afternoon,
    #[serde(rename = "18:00-20:00")]
    Evening,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Morning,
        TimeSlot::Midday,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "09:00-12:00",
            Self::Midday => "12:00-15:00",
            Self::Afternoon => "15:00-18:00",
            Self::Evening => "18:00-20:00",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|slot| slot.label() == value)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The seven bookable days, today first.
pub fn available_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..BOOKING_WINDOW_DAYS)
        .map(|offset| today + Duration::days(offset))
        .collect()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum BookingStep {
    SelectingType,
    SelectingSubtype {
        booking_type: BookingType,
    },
    CollectingGroupSize,
    SelectingDate {
        product: Product,
    },
    SelectingTimeSlot {
        product: Product,
        date: NaiveDate,
    },
    Confirmed,
}

impl BookingStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectingType => "selecting_type",
            Self::SelectingSubtype { .. } => "selecting_subtype",
            Self::CollectingGroupSize => "collecting_group_size",
            Self::SelectingDate { .. } => "selecting_date",
            Self::SelectingTimeSlot { .. } => "selecting_time_slot",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Free-text input the session is waiting for, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwaitingInput {
    None,
    GroupSize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BookingEvent {
    SelectType(String),
    SelectSubtype(String),
    SelectDate(String),
    SelectTimeSlot(String),
    SubmitGroupSize(String),
}

impl BookingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectType(_) => "select_type",
            Self::SelectSubtype(_) => "select_subtype",
            Self::SelectDate(_) => "select_date",
            Self::SelectTimeSlot(_) => "select_time_slot",
            Self::SubmitGroupSize(_) => "submit_group_size",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown booking type: {0}")]
    UnknownBookingType(String),
    #[error("subtype {subtype} is not offered for {booking_type:?}")]
    UnknownSubtype {
        booking_type: BookingType,
        subtype: String,
    },
    #[error("group size is not a number: {0}")]
    NotANumber(String),
    #[error("group size {given} is below the minimum of {min}")]
    GroupTooSmall { min: u32, given: u32 },
    #[error("group size {given} is above the maximum of {max}")]
    GroupTooLarge { max: u32, given: u32 },
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("date {0} is outside the booking window")]
    DateOutOfRange(NaiveDate),
    #[error("unknown time slot: {0}")]
    UnknownTimeSlot(String),
}

impl ValidationError {
    pub fn localized(&self, language: Language) -> String {
        match self {
            Self::UnknownBookingType(_) => language
                .pick(
                    "❌ This booking option is not available.",
                    "❌ Diese Buchungsoption ist nicht verfügbar.",
                )
                .to_string(),
            Self::UnknownSubtype { .. } => language
                .pick(
                    "❌ Please choose one of the listed options.",
                    "❌ Bitte wählen Sie eine der angezeigten Optionen.",
                )
                .to_string(),
            Self::NotANumber(_) => language
                .pick(
                    "❌ Please enter a valid number",
                    "❌ Bitte geben Sie eine gültige Zahl ein",
                )
                .to_string(),
            Self::GroupTooSmall { min, .. } => match language {
                Language::En => format!("❌ Minimum {min} people required"),
                Language::De => format!("❌ Mindestens {min} Personen erforderlich"),
            },
            Self::GroupTooLarge { max, .. } => match language {
                Language::En => format!("❌ Group bookings take at most {max} people"),
                Language::De => format!("❌ Gruppenbuchungen sind auf {max} Personen begrenzt"),
            },
            Self::InvalidDate(_) | Self::DateOutOfRange(_) => language
                .pick(
                    "❌ Please choose one of the next 7 days.",
                    "❌ Bitte wählen Sie einen der nächsten 7 Tage.",
                )
                .to_string(),
            Self::UnknownTimeSlot(_) => language
                .pick(
                    "❌ Please choose one of the listed time slots.",
                    "❌ Bitte wählen Sie einen der angezeigten Zeitslots.",
                )
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action} is not allowed while {step}")]
pub struct StateError {
    pub action: &'static str,
    pub step: &'static str,
}

impl StateError {
    pub fn localized(&self, language: Language) -> String {
        language
            .pick(
                "⚠️ That option is no longer available. Please continue from the current step.",
                "⚠️ Diese Auswahl ist nicht mehr verfügbar. Bitte machen Sie beim aktuellen Schritt weiter.",
            )
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
}

impl BookingError {
    pub fn localized(&self, language: Language) -> String {
        match self {
            Self::Validation(error) => error.localized(language),
            Self::State(error) => error.localized(language),
        }
    }
}

/// Immutable record emitted once per completed flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub booking_type: BookingType,
    pub subtype: String,
    pub group_size: Option<u32>,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub price: u32,
    pub user_id: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Flat key/value view handed to the QR collaborator.
    pub fn qr_payload(&self) -> BTreeMap<String, String> {
        let mut payload = BTreeMap::new();
        payload.insert("booking_id".to_string(), self.booking_id.clone());
        payload.insert(
            "type".to_string(),
            format!("{}_{}", self.booking_type.as_key(), self.subtype),
        );
        payload.insert("date".to_string(), self.date.format("%Y-%m-%d").to_string());
        payload.insert("time".to_string(), self.time_slot.label().to_string());
        payload.insert("price".to_string(), self.price.to_string());
        payload.insert("user_id".to_string(), self.user_id.clone());
        payload.insert("created_at".to_string(), self.created_at.to_rfc3339());
        if let Some(size) = self.group_size {
            payload.insert("group_size".to_string(), size.to_string());
        }
        payload
    }

    pub fn qr_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.qr_payload())
    }
}

/// Issues booking ids of the form `<prefix><yyyyMMddHHmmss>-<seq><rand>`.
/// The per-process sequence keeps ids unique within a second; the random
/// suffix keeps separate processes apart.
#[derive(Debug)]
pub struct BookingIdGenerator {
    prefix: String,
    sequence: AtomicU32,
}

impl Default for BookingIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX)
    }
}

impl BookingIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sequence: AtomicU32::new(0),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) % 10_000;
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "{}{}-{:04}{}",
            self.prefix,
            now.with_timezone(&Local).format("%Y%m%d%H%M%S"),
            sequence,
            random[..4].to_uppercase()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSession {
    pub user_id: String,
    pub language: Language,
    pub step: BookingStep,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new(user_id: impl Into<String>, language: Language, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            language,
            step: BookingStep::SelectingType,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn awaiting(&self) -> AwaitingInput {
        match self.step {
            BookingStep::CollectingGroupSize => AwaitingInput::GroupSize,
            _ => AwaitingInput::None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.step, BookingStep::Confirmed)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.updated_at > ttl
    }

    pub fn choose_type(&mut self, value: &str, now: DateTime<Utc>) -> Result<BookingType, BookingError> {
        self.ensure(
            matches!(
                self.step,
                BookingStep::SelectingType | BookingStep::SelectingSubtype { .. }
            ),
            "choose_type",
        )?;
        let booking_type = BookingType::parse(value)
            .ok_or_else(|| ValidationError::UnknownBookingType(value.trim().to_string()))?;

        self.transition(BookingStep::SelectingSubtype { booking_type }, now);
        Ok(booking_type)
    }

    pub fn choose_subtype(&mut self, value: &str, now: DateTime<Utc>) -> Result<(), BookingError> {
        let BookingStep::SelectingSubtype { booking_type } = self.step else {
            return Err(self.state_error("choose_subtype"));
        };
        let choice = parse_subtype(booking_type, value).ok_or_else(|| ValidationError::UnknownSubtype {
            booking_type,
            subtype: value.trim().to_string(),
        })?;

        let next = match choice {
            SubtypeChoice::Ready(product) => BookingStep::SelectingDate { product },
            SubtypeChoice::NeedsGroupSize => BookingStep::CollectingGroupSize,
        };
        self.transition(next, now);
        Ok(())
    }

    pub fn submit_group_size(&mut self, value: &str, now: DateTime<Utc>) -> Result<u32, BookingError> {
        self.ensure(
            matches!(self.step, BookingStep::CollectingGroupSize),
            "submit_group_size",
        )?;
        let trimmed = value.trim();
        let size = trimmed
            .parse::<u32>()
            .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
        if size < MIN_GROUP_SIZE {
            return Err(ValidationError::GroupTooSmall {
                min: MIN_GROUP_SIZE,
                given: size,
            }
            .into());
        }
        if size > MAX_GROUP_SIZE {
            return Err(ValidationError::GroupTooLarge {
                max: MAX_GROUP_SIZE,
                given: size,
            }
            .into());
        }

        self.transition(
            BookingStep::SelectingDate {
                product: Product::Entry(EntryTicket::Group { size }),
            },
            now,
        );
        Ok(size)
    }

    pub fn choose_date(
        &mut self,
        value: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<NaiveDate, BookingError> {
        let BookingStep::SelectingDate { product } = self.step else {
            return Err(self.state_error("choose_date"));
        };
        let date = parse_date(value).ok_or_else(|| ValidationError::InvalidDate(value.trim().to_string()))?;
        if !available_dates(today).contains(&date) {
            return Err(ValidationError::DateOutOfRange(date).into());
        }

        self.transition(BookingStep::SelectingTimeSlot { product, date }, now);
        Ok(date)
    }

    /// Final step: emits the record and marks the session confirmed. The
    /// caller is expected to drop the session afterwards.
    pub fn choose_time_slot(
        &mut self,
        value: &str,
        ids: &BookingIdGenerator,
        now: DateTime<Utc>,
    ) -> Result<BookingRecord, BookingError> {
        let BookingStep::SelectingTimeSlot { product, date } = self.step else {
            return Err(self.state_error("choose_time_slot"));
        };
        let time_slot =
            TimeSlot::parse(value).ok_or_else(|| ValidationError::UnknownTimeSlot(value.trim().to_string()))?;

        let record = BookingRecord {
            booking_id: ids.next_id(now),
            booking_type: product.booking_type(),
            subtype: product.subtype_key().to_string(),
            group_size: product.group_size(),
            date,
            time_slot,
            price: product.price(),
            user_id: self.user_id.clone(),
            language: self.language,
            created_at: now,
        };

        self.transition(BookingStep::Confirmed, now);
        Ok(record)
    }

    /// Steps back one screen. Returns `false` when there is nowhere to go.
    pub fn go_back(&mut self, now: DateTime<Utc>) -> bool {
        let previous = match self.step {
            BookingStep::SelectingType | BookingStep::Confirmed => return false,
            BookingStep::SelectingSubtype { .. } => BookingStep::SelectingType,
            BookingStep::CollectingGroupSize => BookingStep::SelectingSubtype {
                booking_type: BookingType::Entry,
            },
            BookingStep::SelectingDate { product } => BookingStep::SelectingSubtype {
                booking_type: product.booking_type(),
            },
            BookingStep::SelectingTimeSlot { product, .. } => BookingStep::SelectingDate { product },
        };
        self.transition(previous, now);
        true
    }

    /// Applies a structured transport event.
    pub fn apply(
        &mut self,
        event: &BookingEvent,
        today: NaiveDate,
        ids: &BookingIdGenerator,
        now: DateTime<Utc>,
    ) -> Result<Option<BookingRecord>, BookingError> {
        match event {
            BookingEvent::SelectType(value) => self.choose_type(value, now).map(|_| None),
            BookingEvent::SelectSubtype(value) => self.choose_subtype(value, now).map(|_| None),
            BookingEvent::SubmitGroupSize(value) => self.submit_group_size(value, now).map(|_| None),
            BookingEvent::SelectDate(value) => self.choose_date(value, today, now).map(|_| None),
            BookingEvent::SelectTimeSlot(value) => self.choose_time_slot(value, ids, now).map(Some),
        }
    }

    fn transition(&mut self, next: BookingStep, now: DateTime<Utc>) {
        self.step = next;
        self.updated_at = now;
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), BookingError> {
        if allowed {
            Ok(())
        } else {
            Err(self.state_error(action))
        }
    }

    fn state_error(&self, action: &'static str) -> BookingError {
        BookingError::State(StateError {
            action,
            step: self.step.name(),
        })
    }
}

/// Result of looking a user's session up in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Found(BookingSession),
    NotFound,
}

impl SessionLookup {
    pub fn from_stored(session: Option<BookingSession>, now: DateTime<Utc>, ttl: Duration) -> Self {
        match session {
            Some(session) if !session.is_expired(now, ttl) && !session.is_confirmed() => {
                Self::Found(session)
            }
            _ => Self::NotFound,
        }
    }

    pub fn into_option(self) -> Option<BookingSession> {
        match self {
            Self::Found(session) => Some(session),
            Self::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 10, 30, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn session() -> BookingSession {
        BookingSession::new("user-7", Language::En, now())
    }

    #[test]
    fn individual_entry_round_trip() {
        let ids = BookingIdGenerator::default();
        let mut session = session();
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("individual", now()).unwrap();
        session.choose_date("2026-10-16", today(), now()).unwrap();
        let record = session.choose_time_slot("09:00-12:00", &ids, now()).unwrap();

        assert_eq!(record.price, 12);
        assert_eq!(record.booking_type, BookingType::Entry);
        assert_eq!(record.subtype, "individual");
        assert_eq!(record.time_slot, TimeSlot::Morning);
        assert_eq!(record.user_id, "user-7");
        assert!(session.is_confirmed());
        assert_eq!(
            SessionLookup::from_stored(Some(session), now(), Duration::minutes(30)),
            SessionLookup::NotFound
        );
    }

    #[test]
    fn group_entry_is_priced_per_head() {
        let ids = BookingIdGenerator::default();
        let mut session = session();
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("group", now()).unwrap();
        assert_eq!(session.awaiting(), AwaitingInput::GroupSize);

        assert_eq!(session.submit_group_size(" 15 ", now()).unwrap(), 15);
        assert_eq!(session.awaiting(), AwaitingInput::None);
        session.choose_date("2026-10-20", today(), now()).unwrap();
        let record = session.choose_time_slot("15:00-18:00", &ids, now()).unwrap();

        assert_eq!(record.price, 120);
        assert_eq!(record.group_size, Some(15));
        assert_eq!(record.qr_payload()["group_size"], "15");
    }

    #[test]
    fn small_or_malformed_groups_are_rejected_in_place() {
        let mut session = session();
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("group", now()).unwrap();
        let before = session.clone();

        let err = session.submit_group_size("5", now()).unwrap_err();
        assert_eq!(
            err,
            BookingError::Validation(ValidationError::GroupTooSmall { min: 10, given: 5 })
        );
        assert_eq!(session, before);

        let err = session.submit_group_size("abc", now()).unwrap_err();
        assert!(matches!(err, BookingError::Validation(ValidationError::NotANumber(_))));
        assert_eq!(session.step, BookingStep::CollectingGroupSize);

        let err = session.submit_group_size("-12", now()).unwrap_err();
        assert!(matches!(err, BookingError::Validation(ValidationError::NotANumber(_))));
    }

    #[test]
    fn oversized_groups_are_rejected_before_pricing() {
        let mut session = session();
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("group", now()).unwrap();
        let before = session.clone();

        let err = session.submit_group_size("600000000", now()).unwrap_err();
        assert_eq!(
            err,
            BookingError::Validation(ValidationError::GroupTooLarge {
                max: MAX_GROUP_SIZE,
                given: 600_000_000
            })
        );
        assert_eq!(session, before);
        assert_eq!(
            err.localized(Language::De),
            "❌ Gruppenbuchungen sind auf 500 Personen begrenzt"
        );

        assert_eq!(session.submit_group_size("500", now()).unwrap(), 500);
    }

    #[test]
    fn out_of_order_actions_are_state_errors() {
        let ids = BookingIdGenerator::default();
        let mut session = session();
        let before = session.clone();

        let err = session.choose_date("2026-10-16", today(), now()).unwrap_err();
        assert_eq!(
            err,
            BookingError::State(StateError {
                action: "choose_date",
                step: "selecting_type"
            })
        );
        assert!(session.choose_time_slot("09:00-12:00", &ids, now()).is_err());
        assert!(session.submit_group_size("12", now()).is_err());
        assert!(session.choose_subtype("family", now()).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn subtypes_must_belong_to_the_chosen_type() {
        let mut session = session();
        session.choose_type("gift", now()).unwrap();
        let err = session.choose_subtype("family", now()).unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::UnknownSubtype { .. })
        ));

        session.choose_subtype("large", now()).unwrap();
        assert_eq!(
            session.step,
            BookingStep::SelectingDate {
                product: Product::Gift(GiftVoucher::Large)
            }
        );
    }

    #[test]
    fn dates_are_limited_to_the_next_seven_days() {
        let dates = available_dates(today());
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], today());
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));

        let mut session = session();
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("family", now()).unwrap();

        assert!(matches!(
            session.choose_date("2026-10-23", today(), now()),
            Err(BookingError::Validation(ValidationError::DateOutOfRange(_)))
        ));
        assert!(matches!(
            session.choose_date("2026-10-15", today(), now()),
            Err(BookingError::Validation(ValidationError::DateOutOfRange(_)))
        ));
        assert!(matches!(
            session.choose_date("16.10.2026", today(), now()),
            Err(BookingError::Validation(ValidationError::InvalidDate(_)))
        ));
        assert_eq!(
            session.choose_date("2026-10-22", today(), now()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 22).unwrap()
        );
    }

    #[test]
    fn unknown_time_slot_keeps_the_session_open() {
        let ids = BookingIdGenerator::default();
        let mut session = session();
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("family", now()).unwrap();
        session.choose_date("2026-10-17", today(), now()).unwrap();

        assert!(session.choose_time_slot("20:00-22:00", &ids, now()).is_err());
        assert!(matches!(session.step, BookingStep::SelectingTimeSlot { .. }));

        let record = session.choose_time_slot("18:00-20:00", &ids, now()).unwrap();
        assert_eq!(record.price, 35);
    }

    #[test]
    fn price_table() {
        let cases = [
            (Product::Entry(EntryTicket::Individual), 12),
            (Product::Entry(EntryTicket::Family), 35),
            (Product::Entry(EntryTicket::Group { size: 10 }), 80),
            (Product::Gift(GiftVoucher::Small), 25),
            (Product::Gift(GiftVoucher::Medium), 50),
            (Product::Gift(GiftVoucher::Large), 100),
            (Product::Restaurant(RestaurantOption::Table), 0),
            (Product::Birthday(BirthdayPackage::Basic), 150),
            (Product::Birthday(BirthdayPackage::Premium), 250),
            (Product::Birthday(BirthdayPackage::Deluxe), 350),
        ];
        for (product, price) in cases {
            assert_eq!(product.price(), price, "{product:?}");
        }

        let huge = Product::Entry(EntryTicket::Group { size: 600_000_000 });
        assert_eq!(huge.price(), u32::MAX);
    }

    #[test]
    fn every_declared_subtype_key_parses() {
        for booking_type in BookingType::ALL {
            for key in booking_type.subtype_keys() {
                assert!(parse_subtype(booking_type, key).is_some(), "{key}");
            }
        }
    }

    #[test]
    fn going_back_retraces_the_flow() {
        let mut session = session();
        assert!(!session.go_back(now()));
        session.choose_type("entry", now()).unwrap();
        session.choose_subtype("group", now()).unwrap();
        assert!(session.go_back(now()));
        assert_eq!(
            session.step,
            BookingStep::SelectingSubtype {
                booking_type: BookingType::Entry
            }
        );
        session.choose_subtype("individual", now()).unwrap();
        session.choose_date("2026-10-18", today(), now()).unwrap();
        assert!(session.go_back(now()));
        assert!(matches!(session.step, BookingStep::SelectingDate { .. }));
    }

    #[test]
    fn ids_do_not_collide_within_a_second() {
        let ids = BookingIdGenerator::default();
        let first = ids.next_id(now());
        let second = ids.next_id(now());
        assert_ne!(first, second);
        assert!(first.starts_with("BML"));
        // prefix + 14-digit stamp + '-' + 4-digit sequence + 4 random chars
        assert_eq!(first.len(), 3 + 14 + 1 + 4 + 4);
    }

    #[test]
    fn stale_sessions_are_not_found() {
        let session = session();
        let later = now() + Duration::minutes(31);
        assert_eq!(
            SessionLookup::from_stored(Some(session.clone()), later, Duration::minutes(30)),
            SessionLookup::NotFound
        );
        assert_eq!(
            SessionLookup::from_stored(Some(session.clone()), now(), Duration::minutes(30)),
            SessionLookup::Found(session)
        );
    }

    #[test]
    fn events_drive_the_same_transitions() {
        let ids = BookingIdGenerator::new("TST");
        let mut session = session();
        let events = [
            BookingEvent::SelectType("birthday".into()),
            BookingEvent::SelectSubtype("premium".into()),
            BookingEvent::SelectDate("2026-10-19".into()),
        ];
        for event in &events {
            assert_eq!(session.apply(event, today(), &ids, now()).unwrap(), None);
        }
        let record = session
            .apply(&BookingEvent::SelectTimeSlot("12:00-15:00".into()), today(), &ids, now())
            .unwrap()
            .unwrap();
        assert_eq!(record.price, 250);
        assert!(record.booking_id.starts_with("TST"));
        assert_eq!(record.qr_payload()["type"], "birthday_premium");
    }

    #[test]
    fn errors_are_localized() {
        let error = ValidationError::GroupTooSmall { min: 10, given: 3 };
        assert_eq!(error.localized(Language::En), "❌ Minimum 10 people required");
        assert_eq!(error.localized(Language::De), "❌ Mindestens 10 Personen erforderlich");
    }
}
