//! Static FAQ knowledge base for the venue.

use crate::models::{Language, Localized};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub id: &'static str,
    pub keywords: &'static [&'static str],
    pub answer: Localized,
}

impl Topic {
    pub fn answer(&self, language: Language) -> &'static str {
        self.answer.get(language)
    }
}

pub const OPENING_HOURS: &str = "opening_hours";
pub const FACILITIES: &str = "facilities";
pub const CAFE: &str = "cafe";
pub const VEGETARIAN: &str = "vegetarian";
pub const SAFETY: &str = "safety";
pub const ACCESSIBILITY: &str = "accessibility";
pub const WHEELCHAIR_ACCESS: &str = "wheelchair_access";
pub const SENSORY_FRIENDLY: &str = "sensory_friendly";

/// Insertion order matters: the matcher keeps the first topic on equal scores.
pub static TOPICS: &[Topic] = &[
    Topic {
        id: OPENING_HOURS,
        keywords: &[
            "opening hours",
            "business hours",
            "öffnungszeiten",
            "geschäftszeiten",
            "open",
            "geöffnet",
        ],
        answer: Localized::new(
            "🕘 Bamboolino Playground is open:\n📅 Monday to Friday: 9:00-18:00\n📅 Saturday to Sunday: 8:00-20:00",
            "🕘 Bamboolino Spielplatz ist geöffnet:\n📅 Montag bis Freitag: 9:00-18:00\n📅 Samstag bis Sonntag: 8:00-20:00",
        ),
    },
    Topic {
        id: FACILITIES,
        keywords: &[
            "facilities",
            "equipment",
            "playground",
            "einrichtungen",
            "spielgeräte",
            "spielplatz",
            "slides",
            "swings",
            "rutschen",
            "schaukeln",
        ],
        answer: Localized::new(
            "🎢 We offer exciting facilities:\n• 🛝 Slides and climbing frames\n• 🎠 Swings and roundabouts\n• 🏖️ Sand pits\n• 🏠 Indoor play area\n• 🎯 Suitable for children aged 2–12",
            "🎢 Wir bieten aufregende Einrichtungen:\n• 🛝 Rutschen und Klettergerüste\n• 🎠 Schaukeln und Karussells\n• 🏖️ Sandkästen\n• 🏠 Innenspielbereich\n• 🎯 Geeignet für Kinder von 2–12 Jahren",
        ),
    },
    Topic {
        id: CAFE,
        keywords: &[
            "café",
            "cafe",
            "coffee",
            "food",
            "drinks",
            "kaffee",
            "essen",
            "getränke",
            "restaurant",
        ],
        answer: Localized::new(
            "☕ Our café offers:\n• ☕ Coffee, tea, and fresh juices\n• 🍰 Delicious cakes and pastries\n• 🥪 Fresh sandwiches\n• 🕘 Open during playground hours",
            "☕ Unser Café bietet:\n• ☕ Kaffee, Tee und frische Säfte\n• 🍰 Leckere Kuchen und Gebäck\n• 🥪 Frische Sandwiches\n• 🕘 Geöffnet während der Spielplatz-Öffnungszeiten",
        ),
    },
    Topic {
        id: VEGETARIAN,
        keywords: &[
            "vegetarian",
            "vegan",
            "menu",
            "vegetarisch",
            "speisekarte",
            "dietary",
            "ernährung",
        ],
        answer: Localized::new(
            "🥗 Vegetarian Options:\n• 🥪 Vegetarian sandwiches\n• 🥗 Fresh salads\n• 🍰 Vegetarian cakes\n• 🌱 Vegan options available\n📞 Please inform us of dietary needs in advance!",
            "🥗 Vegetarische Optionen:\n• 🥪 Vegetarische Sandwiches\n• 🥗 Frische Salate\n• 🍰 Vegetarische Kuchen\n• 🌱 Vegane Optionen verfügbar\n📞 Bitte teilen Sie uns Ihre Ernährungsbedürfnisse im Voraus mit!",
        ),
    },
    Topic {
        id: SAFETY,
        keywords: &[
            "safety",
            "equipment safety",
            "sicherheit",
            "gerätesicherheit",
            "safe",
            "sicher",
            "inspection",
            "inspektion",
        ],
        answer: Localized::new(
            "🛡️ Safety First:\n• ✅ All equipment meets international safety standards\n• 🔍 Weekly safety inspections\n• 👨‍🔧 Professional maintenance team\n• 📋 Certified safety protocols",
            "🛡️ Sicherheit zuerst:\n• ✅ Alle Geräte entsprechen internationalen Sicherheitsstandards\n• 🔍 Wöchentliche Sicherheitsinspektionen\n• 👨‍🔧 Professionelles Wartungsteam\n• 📋 Zertifizierte Sicherheitsprotokolle",
        ),
    },
    Topic {
        id: ACCESSIBILITY,
        keywords: &[
            "accessibility",
            "disabled",
            "wheelchair",
            "barrierefreiheit",
            "behindert",
            "rollstuhl",
            "accessible",
            "barrierefrei",
        ],
        answer: Localized::new(
            "♿ Accessibility Features:\n• 🚪 Wheelchair-accessible entrances\n• 🎢 Adapted playground equipment\n• 🔇 Sensory-friendly quiet zones\n• 🗺️ Visual accessibility guides\n• 🚻 Accessible restrooms\n• 🅿️ Disabled parking spaces",
            "♿ Barrierefreiheit:\n• 🚪 Rollstuhlgerechte Eingänge\n• 🎢 Angepasste Spielgeräte\n• 🔇 Sensorfreundliche ruhige Bereiche\n• 🗺️ Visuelle Barrierefreiheits-Leitfäden\n• 🚻 Barrierefreie Toiletten\n• 🅿️ Behindertenparkplätze",
        ),
    },
    Topic {
        id: WHEELCHAIR_ACCESS,
        keywords: &[
            "wheelchair",
            "rollstuhl",
            "access",
            "zugang",
            "entrance",
            "eingang",
            "pathway",
            "weg",
        ],
        answer: Localized::new(
            "♿ Wheelchair Access:\n• 🚪 3 wheelchair-accessible entrances\n• 🛤️ Smooth pathways throughout the facility\n• 🎢 Ground-level play equipment\n• 🎯 Easy-reach activity stations\n• 🚻 Fully accessible restrooms",
            "♿ Rollstuhlzugang:\n• 🚪 3 rollstuhlgerechte Eingänge\n• 🛤️ Glatte Wege durch die gesamte Anlage\n• 🎢 Ebenerdige Spielgeräte\n• 🎯 Leicht erreichbare Aktivitätsstationen\n• 🚻 Vollständig barrierefreie Toiletten",
        ),
    },
    Topic {
        id: SENSORY_FRIENDLY,
        keywords: &[
            "sensory",
            "quiet",
            "noise",
            "sensorisch",
            "ruhig",
            "lärm",
            "autism",
            "autismus",
            "sensitive",
            "empfindlich",
        ],
        answer: Localized::new(
            "🔇 Sensory-Friendly Zones:\n• 🤫 Quiet areas with reduced noise\n• 💡 Adjustable lighting\n• 🎨 Calming sensory activities\n• 🕰️ Designated quiet hours: 9-11 AM\n• 👂 Noise-canceling headphones available",
            "🔇 Sensorfreundliche Bereiche:\n• 🤫 Ruhige Bereiche mit reduziertem Lärm\n• 💡 Anpassbare Beleuchtung\n• 🎨 Beruhigende sensorische Aktivitäten\n• 🕰️ Festgelegte ruhige Stunden: 9-11 Uhr\n• 👂 Geräuschunterdrückende Kopfhörer verfügbar",
        ),
    },
];

pub const WELCOME_BACK: Localized = Localized::new("Welcome back! 👋", "Willkommen zurück! 👋");

pub const FALLBACK: Localized = Localized::new(
    "🤔 I didn't quite understand your question.\n\n💬 I can help you with:\n• 🕘 Opening hours\n• 🎢 Facilities and equipment\n• ☕ Café and food options\n• ♿ Accessibility features\n• 🛡️ Safety information\n\n✨ Try asking: 'What are your opening hours?' or 'Do you have wheelchair access?'",
    "🤔 Ich habe Ihre Frage nicht ganz verstanden.\n\n💬 Ich kann Ihnen helfen mit:\n• 🕘 Öffnungszeiten\n• 🎢 Einrichtungen und Geräte\n• ☕ Café und Speiseoptionen\n• ♿ Barrierefreiheit\n• 🛡️ Sicherheitsinformationen\n\n✨ Versuchen Sie zu fragen: 'Wie sind Ihre Öffnungszeiten?' oder 'Haben Sie Rollstuhlzugang?'",
);

pub fn topic(id: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|topic| topic.id == id)
}

/// Resolves quick-reply shortcuts (`hours`, `cafe`, ...) to the canned query
/// the matcher should see.
pub fn shortcut_query(shortcut: &str) -> Option<&'static str> {
    match shortcut {
        "hours" => Some("opening hours"),
        "facilities" => Some("facilities"),
        "cafe" => Some("café"),
        "safety" => Some("safety"),
        "vegetarian" => Some("vegetarian"),
        "accessibility" => Some("accessibility"),
        _ => None,
    }
}
