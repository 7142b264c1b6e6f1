//! Localized texts and keyboards.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::actions::Action;
use crate::booking::{available_dates, BookingRecord, BookingType, TimeSlot};
use crate::models::{Button, Keyboard, Language, Localized};

pub const WELCOME: Localized = Localized::new(
    "🎉 **Welcome to the Bamboolino Playground Bot!**\n\n🤖 I'm your intelligent assistant and can help you with:\n\n🎫 **Bookings**\n• Entry tickets and family packages\n• Birthday party reservations\n• Restaurant bookings\n\n❓ **Information**\n• Opening hours and facilities\n• Safety and accessibility\n• Café and food options\n\n🗺️ **Services**\n• Navigation to playground\n• Accessibility consultation\n\n💬 Choose an option from the menu or ask me a question directly!",
    "🎉 **Willkommen beim Bamboolino Spielplatz Bot!**\n\n🤖 Ich bin Ihr intelligenter Assistent und kann Ihnen helfen mit:\n\n🎫 **Buchungen**\n• Eintrittskarten und Familienpakete\n• Geburtstagsfeier-Reservierungen\n• Restaurantbuchungen\n\n❓ **Informationen**\n• Öffnungszeiten und Einrichtungen\n• Sicherheit und Barrierefreiheit\n• Café und Speiseoptionen\n\n🗺️ **Services**\n• Navigation zum Spielplatz\n• Barrierefreiheits-Beratung\n\n💬 Wählen Sie eine Option aus dem Menü oder stellen Sie mir direkt eine Frage!",
);

pub const HELP: Localized = Localized::new(
    "🆘 **Help - Bamboolino Bot**\n\n📝 **Available Commands:**\n• `/start` - Start the bot\n• `/help` - Show this help\n• `/accessibility` - Accessibility info\n\n💬 **Features:**\n• Ask questions in natural language\n• Book tickets and reservations\n• Get facility information\n• Plan your visit\n\n✨ **Example Questions:**\n• \"What are your opening hours?\"\n• \"I want to book two tickets\"\n• \"Do you have wheelchair access?\"\n• \"Do you have vegetarian food?\"\n\n🔄 Use the menu buttons for quick navigation!",
    "🆘 **Hilfe - Bamboolino Bot**\n\n📝 **Verfügbare Befehle:**\n• `/start` - Bot starten\n• `/help` - Diese Hilfe anzeigen\n• `/accessibility` - Barrierefreiheit-Info\n\n💬 **Funktionen:**\n• Stellen Sie Fragen in natürlicher Sprache\n• Buchen Sie Tickets und Reservierungen\n• Erhalten Sie Informationen über Einrichtungen\n• Planen Sie Ihre Anreise\n\n✨ **Beispielfragen:**\n• \"Wann habt ihr geöffnet?\"\n• \"Ich möchte zwei Tickets buchen\"\n• \"Gibt es rollstuhlgerechte Zugänge?\"\n• \"Habt ihr vegetarisches Essen?\"\n\n🔄 Verwenden Sie die Menü-Buttons für schnelle Navigation!",
);

pub const CONTACT: Localized = Localized::new(
    "📞 **Contact Information**\n\n🏢 **Bamboolino Playground**\n📧 Email: info@bamboolino.de\n🌐 Website: www.bamboolino.de\n\n🕘 **Opening Hours:**\nMonday-Friday: 9:00-18:00\nSaturday-Sunday: 8:00-20:00\n\n🚗 **Getting Here:**\nFree parking available",
    "📞 **Kontakt Information**\n\n🏢 **Bamboolino Spielplatz**\n📧 Email: info@bamboolino.de\n🌐 Website: www.bamboolino.de\n\n🕘 **Öffnungszeiten:**\nMontag-Freitag: 9:00-18:00\nSamstag-Sonntag: 8:00-20:00\n\n🚗 **Anfahrt:**\nKostenlose Parkplätze verfügbar",
);

pub const BOOKING_DASHBOARD: Localized = Localized::new(
    "🎫 Bamboolino Booking System\n\nPlease select what you would like to book:\n\n🎫 **Entry Tickets**\n• Individual ticket: €12\n• Family package: €35 (up to 2 adults + 3 children)\n• Group ticket: €8 per person (10+ people)\n\n🎁 **Gift Vouchers**\n• Perfect as gifts for family and friends\n\n🍽️ **Restaurant Reservation**\n• Reserve your table at Bamboolino Café\n\n🎂 **Birthday Party**\n• Complete birthday packages for unforgettable celebrations",
    "🎫 Bamboolino Buchungssystem\n\nWählen Sie bitte aus, was Sie buchen möchten:\n\n🎫 **Eintrittskarten**\n• Einzelticket: €12\n• Familienticket: €35 (bis zu 2 Erwachsene + 3 Kinder)\n• Gruppenticket: €8 pro Person (ab 10 Personen)\n\n🎁 **Gutscheine**\n• Perfekt als Geschenk für Familie und Freunde\n\n🍽️ **Restaurantreservierung**\n• Reservieren Sie Ihren Tisch im Bamboolino Café\n\n🎂 **Geburtstagsfeier**\n• Komplette Geburtstagspakete für unvergessliche Feiern",
);

pub const BOOKING_OPTIONS: Localized = Localized::new("🎫 Booking Options", "🎫 Buchungsoptionen");
pub const MAIN_MENU_TITLE: Localized = Localized::new("🏠 Main Menu", "🏠 Hauptmenü");
pub const QA_MENU: Localized = Localized::new(
    "❓ Q&A\n\nChoose a topic:",
    "❓ Fragen & Antworten\n\nWählen Sie ein Thema:",
);
pub const GROUP_SIZE_PROMPT: Localized = Localized::new(
    "👥 How many people? (Minimum 10)",
    "👥 Wie viele Personen? (Mindestens 10)",
);
pub const DATE_PROMPT: Localized = Localized::new("📅 Choose Date:", "📅 Datum wählen:");
pub const NO_ACTIVE_BOOKING: Localized = Localized::new(
    "⌛ Your booking session has expired. Please start again.",
    "⌛ Ihre Buchungssitzung ist abgelaufen. Bitte beginnen Sie erneut.",
);
pub const VOICE_UNAVAILABLE: Localized = Localized::new(
    "🎤 Voice message received!\n\nThis function is on the way.\n\nPlanned features:\n• 🗣️ Speech recognition\n• 🔊 Voice responses\n• 🎯 Voice-controlled bookings",
    "🎤 Sprachnachricht empfangen!\n\nDiese Funktion ist in Arbeit.\n\nGeplante Features:\n• 🗣️ Spracherkennung\n• 🔊 Sprachantworten\n• 🎯 Sprachgesteuerte Buchungen",
);
pub const VOICE_FAILED: Localized = Localized::new(
    "❌ Voice recognition failed",
    "❌ Spracherkennung fehlgeschlagen",
);
pub const GENERIC_ERROR: Localized = Localized::new(
    "❌ An error occurred. Please try again.",
    "❌ Ein Fehler ist aufgetreten. Bitte versuchen Sie es erneut.",
);
pub const NOT_IMPLEMENTED: Localized = Localized::new(
    "This function is not yet implemented.",
    "Diese Funktion ist noch nicht verfügbar.",
);
pub const LANGUAGE_CHANGED: Localized = Localized::new("Language changed!", "Sprache geändert!");

const BACK: Localized = Localized::new("🔙 Back", "🔙 Zurück");
const MAIN_MENU: Localized = Localized::new("🔙 Main Menu", "🔙 Hauptmenü");

pub fn booking_type_name(booking_type: BookingType, language: Language) -> &'static str {
    let name = match booking_type {
        BookingType::Entry => Localized::new("Entry Tickets", "Eintrittskarten"),
        BookingType::Gift => Localized::new("Gift Vouchers", "Gutscheine"),
        BookingType::Restaurant => Localized::new("Restaurant Reservation", "Restaurantreservierung"),
        BookingType::Birthday => Localized::new("Birthday Party", "Geburtstagsfeier"),
    };
    name.get(language)
}

pub fn coming_soon(booking_type: BookingType, language: Language) -> String {
    let name = booking_type_name(booking_type, language);
    match language {
        Language::En => format!("🚧 {name} coming soon!"),
        Language::De => format!("🚧 {name} wird bald verfügbar sein!"),
    }
}

pub fn subtype_prompt(booking_type: BookingType, language: Language) -> String {
    let name = booking_type_name(booking_type, language);
    match language {
        Language::En => format!("🎫 Choose {name}:"),
        Language::De => format!("🎫 {name} wählen:"),
    }
}

pub fn time_slot_prompt(date: NaiveDate, language: Language) -> String {
    let date = date.format("%Y-%m-%d");
    match language {
        Language::En => format!("🕐 Choose Time Slot for {date}:"),
        Language::De => format!("🕐 Zeitslot für {date} wählen:"),
    }
}

pub fn confirmation(record: &BookingRecord, language: Language) -> String {
    let booking_type = title_case(record.booking_type.as_key());
    let subtype = title_case(&record.subtype);
    let date = record.date.format("%Y-%m-%d");
    let slot = record.time_slot.label();
    let price = record.price;
    let id = &record.booking_id;

    let group = match (record.group_size, language) {
        (Some(size), Language::En) => format!("\n• Group size: {size}"),
        (Some(size), Language::De) => format!("\n• Gruppengröße: {size}"),
        (None, _) => String::new(),
    };

    match language {
        Language::En => format!(
            "✅ **Booking Confirmed!**\n\n🎫 **Booking Details:**\n• Booking ID: `{id}`\n• Type: {booking_type} - {subtype}{group}\n• Date: {date}\n• Time: {slot}\n• Price: €{price}\n\n📱 Show this QR code at the entrance.\n🎯 Your booking is now secured!"
        ),
        Language::De => format!(
            "✅ **Buchung bestätigt!**\n\n🎫 **Buchungsdetails:**\n• Buchungs-ID: `{id}`\n• Typ: {booking_type} - {subtype}{group}\n• Datum: {date}\n• Zeit: {slot}\n• Preis: €{price}\n\n📱 Zeigen Sie diesen QR-Code am Eingang vor.\n🎯 Ihre Buchung ist jetzt gesichert!"
        ),
    }
}

pub fn main_menu_keyboard(language: Language) -> Keyboard {
    let (qa, bookings, accessibility, contact) = match language {
        Language::En => ("❓ Q&A", "🎫 Bookings", "♿ Accessibility", "📞 Contact"),
        Language::De => (
            "❓ Fragen & Antworten",
            "🎫 Buchungen",
            "♿ Barrierefreiheit",
            "📞 Kontakt",
        ),
    };
    let switch = match language {
        Language::En => button("🇩🇪 Deutsch", Action::SetLanguage(Language::De)),
        Language::De => button("🇬🇧 English", Action::SetLanguage(Language::En)),
    };

    Keyboard::new(vec![
        vec![button(qa, Action::QaMenu), button(bookings, Action::BookingMenu)],
        vec![
            button(accessibility, Action::AccessibilityMenu),
            button("🗺️ Navigation", Action::Unknown("navigation_menu".to_string())),
        ],
        vec![button(contact, Action::ContactInfo), switch],
    ])
}

/// Quick-reply FAQ shortcuts.
pub fn quick_keyboard(language: Language) -> Keyboard {
    let label = |en: &'static str, de: &'static str| language.pick(en, de);
    let qa = |shortcut: &str| Action::Qa(shortcut.to_string());

    Keyboard::new(vec![
        vec![
            button(label("🕘 Opening Hours", "🕘 Öffnungszeiten"), qa("hours")),
            button(label("🎢 Facilities", "🎢 Einrichtungen"), qa("facilities")),
        ],
        vec![
            button("☕ Café", qa("cafe")),
            button(label("🛡️ Safety", "🛡️ Sicherheit"), qa("safety")),
        ],
        vec![
            button(label("🥗 Vegetarian", "🥗 Vegetarisch"), qa("vegetarian")),
            button(MAIN_MENU.get(language), Action::MainMenu),
        ],
    ])
}

pub fn booking_types_keyboard(language: Language) -> Keyboard {
    let icons = ["🎫", "🎁", "🍽️", "🎂"];
    let mut buttons: Vec<Button> = BookingType::ALL
        .iter()
        .zip(icons)
        .map(|(booking_type, icon)| {
            button(
                &format!("{icon} {}", booking_type_name(*booking_type, language)),
                Action::BookingType(booking_type.as_key().to_string()),
            )
        })
        .collect();
    buttons.push(button(MAIN_MENU.get(language), Action::MainMenu));
    Keyboard::single_column(buttons)
}

pub fn subtype_keyboard(booking_type: BookingType, language: Language) -> Keyboard {
    let options: &[(&str, &str, &str)] = match booking_type {
        BookingType::Entry => &[
            ("individual", "👤 Individual Ticket (€12)", "👤 Einzelticket (€12)"),
            ("family", "👨‍👩‍👧‍👦 Family Package (€35)", "👨‍👩‍👧‍👦 Familienticket (€35)"),
            ("group", "👥 Group Ticket (€8/person)", "👥 Gruppenticket (€8/Person)"),
        ],
        BookingType::Gift => &[
            ("small", "🎁 Voucher €25", "🎁 Gutschein €25"),
            ("medium", "🎁 Voucher €50", "🎁 Gutschein €50"),
            ("large", "🎁 Voucher €100", "🎁 Gutschein €100"),
        ],
        BookingType::Restaurant => &[("table", "🍽️ Reserve a table", "🍽️ Tisch reservieren")],
        BookingType::Birthday => &[
            ("basic", "🎂 Basic (€150)", "🎂 Basis (€150)"),
            ("premium", "🎂 Premium (€250)", "🎂 Premium (€250)"),
            ("deluxe", "🎂 Deluxe (€350)", "🎂 Deluxe (€350)"),
        ],
    };

    let mut buttons: Vec<Button> = options
        .iter()
        .map(|(key, en, de)| button(language.pick(en, de), Action::Subtype(key.to_string())))
        .collect();
    buttons.push(button(BACK.get(language), Action::BookingBack));
    Keyboard::single_column(buttons)
}

/// One button per bookable day, labelled `Fri 10/16` or `Fr 16.10`.
pub fn calendar_keyboard(today: NaiveDate, language: Language) -> Keyboard {
    let mut buttons: Vec<Button> = available_dates(today)
        .into_iter()
        .map(|date| {
            button(
                &calendar_label(date, language),
                Action::Date(date.format("%Y-%m-%d").to_string()),
            )
        })
        .collect();
    buttons.push(button(BACK.get(language), Action::BookingBack));
    Keyboard::single_column(buttons)
}

pub fn calendar_label(date: NaiveDate, language: Language) -> String {
    match language {
        Language::En => date.format("%a %m/%d").to_string(),
        Language::De => format!("{} {}", german_weekday(date.weekday()), date.format("%d.%m")),
    }
}

pub fn time_slot_keyboard(date: NaiveDate, language: Language) -> Keyboard {
    let date = date.format("%Y-%m-%d").to_string();
    let mut buttons: Vec<Button> = TimeSlot::ALL
        .iter()
        .map(|slot| {
            button(
                &format!("🕐 {slot}"),
                Action::TimeSlot {
                    date: date.clone(),
                    slot: slot.label().to_string(),
                },
            )
        })
        .collect();
    buttons.push(button(BACK.get(language), Action::BookingBack));
    Keyboard::single_column(buttons)
}

pub fn back_keyboard(target: Action, language: Language) -> Keyboard {
    Keyboard::single_column(vec![button(BACK.get(language), target)])
}

fn button(label: &str, action: Action) -> Button {
    Button::new(label, action.id())
}

fn german_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Di",
        Weekday::Wed => "Mi",
        Weekday::Thu => "Do",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "So",
    }
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
