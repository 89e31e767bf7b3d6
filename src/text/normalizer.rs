use std::{fmt, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::lexicon::Lexicon;

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid url regex"));
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+").expect("valid email regex"));
static MONEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\d+\.?\d*|\d+\.?\d*\s*dollars?").expect("valid money regex")
});
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{3}-\d{3}-\d{4}|\(\d{3}\)\s*\d{3}-\d{4}").expect("valid phone regex")
});
static DIGITS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));
static NOISE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s!]").expect("valid noise regex"));
static EMPHASIS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!{2,}").expect("valid emphasis regex"));
static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|!+").expect("valid token regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalText(String);

impl CanonicalText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }
}

impl fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    lexicon: Arc<Lexicon>,
}

impl Normalizer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn english() -> Self {
        Self::new(Arc::new(Lexicon::english()))
    }

    pub fn normalize(&self, raw: &str) -> CanonicalText {
        let cleaned = clean_text(raw);
        if cleaned.is_empty() {
            return CanonicalText::default();
        }

        let tokens: Vec<String> = TOKEN_REGEX
            .find_iter(&cleaned)
            .map(|m| m.as_str())
            .filter(|token| !self.lexicon.is_stop_word(token))
            .map(|token| self.lexicon.lemmatize(token).into_owned())
            .filter(|token| token.chars().count() > 1 || Lexicon::is_placeholder(token))
            .collect();

        CanonicalText(tokens.join(" "))
    }
}

// Email, money and phone patterns must run before the bare digit pass.
fn clean_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let text = raw.to_lowercase();
    let text = URL_REGEX.replace_all(&text, "url");
    let text = EMAIL_REGEX.replace_all(&text, "emailaddr");
    let text = MONEY_REGEX.replace_all(&text, "money");
    let text = PHONE_REGEX.replace_all(&text, "phonenumber");
    let text = DIGITS_REGEX.replace_all(&text, "number");
    let text = NOISE_REGEX.replace_all(&text, " ");
    let text = EMPHASIS_REGEX.replace_all(&text, " !!");
    let text = WHITESPACE_REGEX.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn tokens(text: &CanonicalText) -> Vec<&str> {
        text.tokens().collect()
    }

    #[test]
    fn empty_input_is_empty_output() {
        let normalizer = Normalizer::english();
        assert!(normalizer.normalize("").is_empty());
        assert!(normalizer.normalize("   \n\t").is_empty());
        assert!(normalizer.normalize("the and of").is_empty());
    }

    #[test]
    fn phone_and_money_win_over_bare_numbers() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize("call 555-123-4567 or pay $20");
        let toks = tokens(&text);
        assert!(toks.contains(&"phonenumber"));
        assert!(toks.contains(&"money"));
        assert!(!toks.contains(&"number"));
        assert_eq!(text.as_str(), "call phonenumber pay money");
    }

    #[test]
    fn replaces_urls_and_addresses() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize(
            "Visit https://example.com/win?id=7 or www.prizes.biz, mail winner@lotto.example",
        );
        assert_eq!(text.as_str(), "visit url url mail emailaddr");
    }

    #[test]
    fn parenthesised_phone_and_dollar_words() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize("Ring (800) 555-0199 to get 100 dollars");
        assert_eq!(text.as_str(), "ring phonenumber get money");
    }

    #[test]
    fn remaining_digits_become_number_tokens() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize("Order 66 shipped in 3 boxes");
        assert_eq!(text.as_str(), "order number shipped number box");
    }

    #[test]
    fn emphasis_is_collapsed_and_kept() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize("WIN FREE MONEY NOW!!!");
        assert_eq!(text.as_str(), "win free money !!");
        let single = normalizer.normalize("hello there!");
        assert_eq!(single.as_str(), "hello");
    }

    #[test]
    fn strips_punctuation_and_mail_noise() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize("Re: Fwd: Subject: the quarterly REPORTS; see attached.");
        assert_eq!(text.as_str(), "quarterly report see attached");
    }

    #[test]
    fn short_tokens_dropped_but_placeholders_kept() {
        let normalizer = Normalizer::english();
        let text = normalizer.normalize("x 7 b url");
        assert_eq!(text.as_str(), "number url");
    }

    #[test]
    fn plural_and_singular_share_features() {
        let normalizer = Normalizer::english();
        assert_eq!(normalizer.normalize("claim prizes"), normalizer.normalize("claim prize"));
        assert_eq!(normalizer.normalize("claim prizes").as_str(), "claim prize");
        assert_eq!(
            normalizer.normalize("free movies and cookies"),
            normalizer.normalize("free movie and cookie")
        );
    }

    #[test]
    fn normalizing_canonical_text_is_a_no_op() {
        let normalizer = Normalizer::english();
        let samples = [
            "URGENT: claim your $1000 prize now!!!",
            "Meeting at 3pm tomorrow",
            "Contact me at bob@example.org or (555) 010-2000, visit http://x.io",
            "Thanks, see you then",
        ];
        for sample in samples {
            let once = normalizer.normalize(sample);
            let twice = normalizer.normalize(once.as_str());
            assert_eq!(once, twice, "sample: {sample}");
        }
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[ -~]{0,80}") {
            let normalizer = Normalizer::english();
            let once = normalizer.normalize(&raw);
            let twice = normalizer.normalize(once.as_str());
            prop_assert_eq!(once, twice);
        }
    }
}
