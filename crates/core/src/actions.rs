//! Button callback identifiers.
//!
//! Every keyboard the concierge renders is built from `Action` values, and
//! every incoming callback id is parsed back into one, so the two directions
//! cannot drift apart.

use crate::models::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MainMenu,
    QaMenu,
    Qa(String),
    BookingMenu,
    BookingType(String),
    Subtype(String),
    Date(String),
    TimeSlot { date: String, slot: String },
    BookingBack,
    AccessibilityMenu,
    ContactInfo,
    SetLanguage(Language),
    Unknown(String),
}

impl Action {
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        match id {
            "main_menu" => return Self::MainMenu,
            "qa_menu" => return Self::QaMenu,
            "booking_menu" | "booking_main" => return Self::BookingMenu,
            "booking_back" | "select_date" => return Self::BookingBack,
            "accessibility_menu" => return Self::AccessibilityMenu,
            "contact_info" => return Self::ContactInfo,
            "lang_en" => return Self::SetLanguage(Language::En),
            "lang_de" => return Self::SetLanguage(Language::De),
            _ => {}
        }

        if let Some(shortcut) = non_empty_suffix(id, "qa_") {
            Self::Qa(shortcut.to_string())
        } else if let Some(booking_type) = non_empty_suffix(id, "booking_") {
            Self::BookingType(booking_type.to_string())
        } else if let Some(subtype) =
            non_empty_suffix(id, "entry_").or_else(|| non_empty_suffix(id, "sub_"))
        {
            Self::Subtype(subtype.to_string())
        } else if let Some(date) = non_empty_suffix(id, "date_") {
            Self::Date(date.to_string())
        } else if let Some(rest) = non_empty_suffix(id, "time_") {
            match rest.split_once('_') {
                Some((date, slot)) if !date.is_empty() && !slot.is_empty() => Self::TimeSlot {
                    date: date.to_string(),
                    slot: slot.to_string(),
                },
                _ => Self::Unknown(id.to_string()),
            }
        } else {
            Self::Unknown(id.to_string())
        }
    }

    pub fn id(&self) -> String {
        match self {
            Self::MainMenu => "main_menu".to_string(),
            Self::QaMenu => "qa_menu".to_string(),
            Self::Qa(shortcut) => format!("qa_{shortcut}"),
            Self::BookingMenu => "booking_menu".to_string(),
            Self::BookingType(booking_type) => format!("booking_{booking_type}"),
            Self::Subtype(subtype) => format!("sub_{subtype}"),
            Self::Date(date) => format!("date_{date}"),
            Self::TimeSlot { date, slot } => format!("time_{date}_{slot}"),
            Self::BookingBack => "booking_back".to_string(),
            Self::AccessibilityMenu => "accessibility_menu".to_string(),
            Self::ContactInfo => "contact_info".to_string(),
            Self::SetLanguage(language) => format!("lang_{}", language.as_code()),
            Self::Unknown(id) => id.clone(),
        }
    }
}

fn non_empty_suffix<'a>(id: &'a str, prefix: &str) -> Option<&'a str> {
    id.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_menu_ids() {
        assert_eq!(Action::parse("main_menu"), Action::MainMenu);
        assert_eq!(Action::parse("booking_main"), Action::BookingMenu);
        assert_eq!(Action::parse("booking_back"), Action::BookingBack);
        assert_eq!(Action::parse("select_date"), Action::BookingBack);
        assert_eq!(Action::parse("lang_de"), Action::SetLanguage(Language::De));
    }

    #[test]
    fn parses_parameterised_ids() {
        assert_eq!(Action::parse("qa_hours"), Action::Qa("hours".into()));
        assert_eq!(Action::parse("booking_gift"), Action::BookingType("gift".into()));
        assert_eq!(Action::parse("entry_group"), Action::Subtype("group".into()));
        assert_eq!(Action::parse("sub_deluxe"), Action::Subtype("deluxe".into()));
        assert_eq!(Action::parse("date_2026-10-16"), Action::Date("2026-10-16".into()));
        assert_eq!(
            Action::parse("time_2026-10-16_09:00-12:00"),
            Action::TimeSlot {
                date: "2026-10-16".into(),
                slot: "09:00-12:00".into()
            }
        );
    }

    #[test]
    fn malformed_ids_are_unknown() {
        for id in ["navigation_menu", "qa_", "time_2026-10-16", "time__09:00-12:00", ""] {
            assert!(matches!(Action::parse(id), Action::Unknown(_)), "{id}");
        }
    }

    #[test]
    fn ids_survive_a_round_trip() {
        let actions = [
            Action::MainMenu,
            Action::Qa("cafe".into()),
            Action::BookingType("entry".into()),
            Action::Subtype("family".into()),
            Action::TimeSlot {
                date: "2026-10-17".into(),
                slot: "15:00-18:00".into(),
            },
            Action::SetLanguage(Language::En),
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.id()), action);
        }
    }
}
