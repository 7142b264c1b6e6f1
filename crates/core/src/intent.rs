use serde::{Deserialize, Serialize};

use crate::knowledge::{self, Topic, FALLBACK, TOPICS, WELCOME_BACK};
use crate::language;
use crate::models::{ConversationContext, Language};

const BOOKING_KEYWORDS: &[&str] = &[
    "book",
    "booking",
    "reserve",
    "reservation",
    "ticket",
    "buchen",
    "buchung",
    "reservierung",
    "eintrittskarte",
];

const ACCESSIBILITY_KEYWORDS: &[&str] = &[
    "accessibility",
    "disabled",
    "wheelchair",
    "barrierefreiheit",
    "behindert",
    "rollstuhl",
    "autism",
    "autismus",
    "sensory",
    "sensorisch",
];

const WHEELCHAIR_KEYWORDS: &[&str] = &["wheelchair", "rollstuhl"];

const SENSORY_KEYWORDS: &[&str] = &[
    "sensory",
    "quiet",
    "noise",
    "autism",
    "sensorisch",
    "ruhig",
    "autismus",
];

/// Where a free-text message should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Booking,
    Accessibility,
    Faq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicMatch {
    pub topic: Option<&'static Topic>,
    pub score: usize,
}

impl TopicMatch {
    pub fn topic_id(&self) -> Option<&'static str> {
        self.topic.map(|topic| topic.id)
    }

    pub fn is_miss(&self) -> bool {
        self.topic.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqAnswer {
    pub text: String,
    pub topic: Option<&'static str>,
    pub language: Language,
}

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn classify_route(text: &str) -> Route {
    let lower = text.to_lowercase();

    if contains_any(&lower, BOOKING_KEYWORDS) {
        Route::Booking
    } else if contains_any(&lower, ACCESSIBILITY_KEYWORDS) {
        Route::Accessibility
    } else {
        Route::Faq
    }
}

/// Keyword matcher over a fixed topic list.
#[derive(Debug, Clone, Copy)]
pub struct IntentMatcher {
    topics: &'static [Topic],
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::new(TOPICS)
    }
}

impl IntentMatcher {
    pub fn new(topics: &'static [Topic]) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &'static [Topic] {
        self.topics
    }

    /// Counts keyword substrings per topic; the strictly highest score wins,
    /// so the earliest topic keeps a tie.
    pub fn match_topic(&self, text: &str) -> TopicMatch {
        let lower = text.to_lowercase();
        let mut best = TopicMatch {
            topic: None,
            score: 0,
        };

        for topic in self.topics {
            let score = topic
                .keywords
                .iter()
                .filter(|keyword| lower.contains(*keyword))
                .count();

            if score > best.score {
                best = TopicMatch {
                    topic: Some(topic),
                    score,
                };
            }
        }

        best
    }

    /// Detects the language of `text`, then answers in it.
    pub fn respond(&self, text: &str, context: &mut ConversationContext) -> FaqAnswer {
        let language = language::detect(text);
        self.respond_in(text, language, context)
    }

    /// Answers in a language that was already resolved (e.g. by a transcriber).
    pub fn respond_in(
        &self,
        text: &str,
        language: Language,
        context: &mut ConversationContext,
    ) -> FaqAnswer {
        let count = context.record_query(language);
        let matched = self.match_topic(text);

        let Some(topic) = matched.topic else {
            return FaqAnswer {
                text: FALLBACK.get(language).to_string(),
                topic: None,
                language,
            };
        };

        let answer = topic.answer(language);
        let text = if count > 1 {
            format!("{}\n\n{}", WELCOME_BACK.get(language), answer)
        } else {
            answer.to_string()
        };

        FaqAnswer {
            text,
            topic: Some(topic.id),
            language,
        }
    }
}

/// Most specific accessibility answer for `query`: wheelchair, then sensory,
/// then the general overview.
pub fn accessibility_topic(query: &str) -> &'static Topic {
    let lower = query.to_lowercase();

    let id = if contains_any(&lower, WHEELCHAIR_KEYWORDS) {
        knowledge::WHEELCHAIR_ACCESS
    } else if contains_any(&lower, SENSORY_KEYWORDS) {
        knowledge::SENSORY_FRIENDLY
    } else {
        knowledge::ACCESSIBILITY
    };

    knowledge::topic(id).unwrap_or(&TOPICS[0])
}

pub fn accessibility_response(query: &str, language: Language) -> &'static str {
    accessibility_topic(query).answer(language)
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::*;

    fn context() -> ConversationContext {
        ConversationContext::new("user-1", Language::En)
    }

    #[test]
    fn opening_hours_question_in_english() {
        let matcher = IntentMatcher::default();
        let matched = matcher.match_topic("What are your opening hours?");
        assert_eq!(matched.topic_id(), Some(OPENING_HOURS));
        assert_eq!(matched.score, 2);

        let mut ctx = context();
        let answer = matcher.respond("What are your opening hours?", &mut ctx);
        assert_eq!(answer.language, Language::En);
        assert_eq!(answer.text, topic(OPENING_HOURS).unwrap().answer.en);
    }

    #[test]
    fn each_topic_answers_its_keyword_in_each_language() {
        let cases = [
            (OPENING_HOURS, "business hours", Language::En),
            (OPENING_HOURS, "öffnungszeiten", Language::De),
            (FACILITIES, "facilities", Language::En),
            (FACILITIES, "spielgeräte", Language::De),
            (CAFE, "coffee", Language::En),
            (CAFE, "kaffee", Language::De),
            (VEGETARIAN, "vegetarian", Language::En),
            (VEGETARIAN, "vegetarisch", Language::De),
            (SAFETY, "safety", Language::En),
            (SAFETY, "sicherheit", Language::De),
            (ACCESSIBILITY, "accessibility", Language::En),
            (ACCESSIBILITY, "barrierefreiheit", Language::De),
            (WHEELCHAIR_ACCESS, "entrance", Language::En),
            (WHEELCHAIR_ACCESS, "der eingang", Language::De),
            (SENSORY_FRIENDLY, "sensory", Language::En),
            (SENSORY_FRIENDLY, "lärm", Language::De),
        ];
        let matcher = IntentMatcher::default();

        for (id, keyword, language) in cases {
            let matched = matcher.match_topic(keyword);
            assert_eq!(matched.topic_id(), Some(id), "{keyword}");
            assert!(matched.score >= 1);

            let mut ctx = context();
            let answer = matcher.respond(keyword, &mut ctx);
            assert_eq!(answer.language, language, "{keyword}");
            assert_eq!(answer.text, topic(id).unwrap().answer(language), "{keyword}");
        }
    }

    #[test]
    fn ties_keep_the_first_topic() {
        // "wheelchair" is a keyword of both accessibility and wheelchair_access.
        let matched = IntentMatcher::default().match_topic("wheelchair");
        assert_eq!(matched.topic_id(), Some(ACCESSIBILITY));
        assert_eq!(matched.score, 1);
    }

    #[test]
    fn keywords_match_inside_larger_tokens() {
        let matched = IntentMatcher::default().match_topic("reopened?");
        assert_eq!(matched.topic_id(), Some(OPENING_HOURS));
    }

    #[test]
    fn unmatched_text_returns_fallback_without_greeting() {
        let matcher = IntentMatcher::default();
        let mut ctx = context();
        matcher.respond("What are your opening hours?", &mut ctx);

        let miss = matcher.match_topic("xyz");
        assert!(miss.is_miss());
        assert_eq!(miss.score, 0);

        let answer = matcher.respond("xyz", &mut ctx);
        assert_eq!(answer.topic, None);
        assert_eq!(answer.text, FALLBACK.en);
        assert_eq!(ctx.conversation_count, 2);
    }

    #[test]
    fn german_miss_falls_back_in_german() {
        let matcher = IntentMatcher::default();
        let mut ctx = context();
        let answer = matcher.respond("und xyz", &mut ctx);
        assert_eq!(answer.topic, None);
        assert_eq!(answer.language, Language::De);
        assert_eq!(answer.text, FALLBACK.de);
    }

    #[test]
    fn repeat_visitors_get_welcome_back() {
        let matcher = IntentMatcher::default();
        let mut ctx = context();
        let first = matcher.respond("kaffee", &mut ctx);
        assert_eq!(first.text, cafe_de());

        let second = matcher.respond("kaffee", &mut ctx);
        assert_eq!(second.text, format!("Willkommen zurück! 👋\n\n{}", cafe_de()));
        assert_eq!(ctx.language, Language::De);
    }

    fn cafe_de() -> &'static str {
        topic(CAFE).unwrap().answer.de
    }

    #[test]
    fn respond_in_uses_given_language() {
        let matcher = IntentMatcher::default();
        let mut ctx = context();
        let answer = matcher.respond_in("coffee", Language::De, &mut ctx);
        assert_eq!(answer.text, cafe_de());
    }

    #[test]
    fn wheelchair_question_in_german_is_specific() {
        let query = "Habt ihr Rollstuhlzugang?";
        assert_eq!(language::detect(query), Language::De);
        assert_eq!(classify_route(query), Route::Accessibility);
        assert_eq!(
            accessibility_response(query, Language::De),
            topic(WHEELCHAIR_ACCESS).unwrap().answer.de
        );
    }

    #[test]
    fn accessibility_priority_order() {
        assert_eq!(accessibility_topic("quiet wheelchair").id, WHEELCHAIR_ACCESS);
        assert_eq!(accessibility_topic("autism support").id, SENSORY_FRIENDLY);
        assert_eq!(accessibility_topic("general accessibility").id, ACCESSIBILITY);
    }

    #[test]
    fn booking_keywords_take_the_booking_route() {
        assert_eq!(classify_route("I want to book a ticket"), Route::Booking);
        assert_eq!(
            classify_route("Reservierung für Rollstuhl"),
            Route::Booking
        );
        assert_eq!(classify_route("is it sensory friendly"), Route::Accessibility);
        assert_eq!(classify_route("do you sell coffee"), Route::Faq);
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_text("  opening \n hours "), "opening hours");
    }
}
