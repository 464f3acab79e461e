// Content rules applied to user-submitted text

use std::collections::HashSet;

use crate::config::ModerationConfig;

pub const FORBIDDEN_WORD: &str = "Forbidden word!";

pub trait ContentRule: Send + Sync {
    /// `Err(message)` rejects the text.
    fn check(&self, text: &str) -> Result<(), String>;

    fn name(&self) -> &str;
}

/// Rejects text containing a listed word as a whole whitespace-separated
/// token, compared case-insensitively. Punctuation glued to a word keeps the
/// token distinct.
pub struct DenylistRule {
    words: HashSet<String>,
}

impl DenylistRule {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_uppercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }
}

impl ContentRule for DenylistRule {
    fn check(&self, text: &str) -> Result<(), String> {
        let hit = text
            .split_whitespace()
            .any(|token| self.words.contains(&token.to_uppercase()));
        if hit {
            Err(FORBIDDEN_WORD.to_string())
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &str {
        "denylist"
    }
}

#[derive(Default)]
pub struct ContentPolicy {
    rules: Vec<Box<dyn ContentRule>>,
}

impl ContentPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ModerationConfig) -> Self {
        let mut policy = Self::new();
        if !config.comment_denylist.is_empty() {
            policy.add_rule(Box::new(DenylistRule::new(&config.comment_denylist)));
        }
        policy
    }

    pub fn add_rule(&mut self, rule: Box<dyn ContentRule>) {
        self.rules.push(rule);
    }

    /// Messages of every rule that rejected the text, in registration order.
    pub fn violations(&self, text: &str) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| match rule.check(text) {
                Ok(()) => None,
                Err(message) => {
                    tracing::info!(rule = rule.name(), "content rejected");
                    Some(message)
                }
            })
            .collect()
    }
}
