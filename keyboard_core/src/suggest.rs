//! Canned sentence suggestions keyed on substrings of the typed text.

use serde::{Deserialize, Serialize};

use crate::error::KeyboardError;

/// Suggestions shown when the typed text contains `trigger`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRule {
    pub trigger:     String,
    pub suggestions: Vec<String>,
}

/// Ordered rules; the first rule whose trigger occurs in the text wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionTable {
    #[serde(default)]
    pub rules:    Vec<SuggestionRule>,
    #[serde(default)]
    pub fallback: Vec<String>,
}

const HII_INTRO: &str = "Hii my name is Ishu-Parul and we are from IGDTUW";
const HELLO_HOW: &str = "Hello, how are you?";

impl Default for SuggestionTable {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        SuggestionTable {
            rules: vec![
                SuggestionRule {
                    trigger:     "Hii".into(),
                    suggestions: owned(&[
                        HII_INTRO,
                        "Hii my name is Ishu-Parul and I love programming",
                        "Hii my name is Ishu-Parul and I study at IGDTUW",
                    ]),
                },
                SuggestionRule {
                    trigger:     "Hello".into(),
                    suggestions: owned(&[
                        HELLO_HOW,
                        "Hello, what are you doing?",
                        "Hello, where are you from?",
                    ]),
                },
            ],
            fallback: owned(&[HII_INTRO, HELLO_HOW, "How can I help you today?"]),
        }
    }
}

impl SuggestionTable {
    /// Pick the suggestion set for `text`.  Matching is case-sensitive.
    pub fn pick(&self, text: &str) -> &[String] {
        self.rules
            .iter()
            .find(|r| text.contains(r.trigger.as_str()))
            .map(|r| r.suggestions.as_slice())
            .unwrap_or(&self.fallback)
    }

    pub fn validate(&self) -> Result<(), KeyboardError> {
        match self.rules.iter().position(|r| r.trigger.is_empty()) {
            Some(i) => Err(KeyboardError::EmptyTrigger(i)),
            None    => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_for_plain_text() {
        let t = SuggestionTable::default();
        assert_eq!(t.pick("abc"), &t.fallback[..]);
        assert_eq!(t.pick("")[2], "How can I help you today?");
    }

    #[test]
    fn hello_templates() {
        let t = SuggestionTable::default();
        let s = t.pick("xxHelloyy");
        assert_eq!(s.len(), 3);
        assert!(s.iter().all(|x| x.starts_with("Hello, ")));
    }

    #[test]
    fn hii_templates() {
        let t = SuggestionTable::default();
        assert!(t.pick("Hii").iter().all(|x| x.starts_with("Hii my name is")));
    }

    #[test]
    fn hii_wins_over_hello() {
        let t = SuggestionTable::default();
        assert!(t.pick("Hello Hii")[1].contains("love programming"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let t = SuggestionTable::default();
        assert_eq!(t.pick("hello"), &t.fallback[..]);
        assert_eq!(t.pick("HII"), &t.fallback[..]);
    }

    #[test]
    fn empty_trigger_rejected() {
        let mut t = SuggestionTable::default();
        t.rules.push(SuggestionRule { trigger: String::new(), suggestions: vec![] });
        assert_eq!(t.validate(), Err(KeyboardError::EmptyTrigger(2)));
    }
}
