use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
};

const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

const EMAIL_NOISE_WORDS: &[&str] = &[
    "subject", "re", "fw", "fwd", "cc", "bcc", "to", "from", "date", "sent", "message", "http",
    "https", "www", "com", "org", "net",
];

const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("wolves", "wolf"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("theses", "thesis"),
    ("quizzes", "quiz"),
];

/// Nouns ending in `ie`, whose plural is not a `-y` plural.
const IE_NOUNS: &[&str] = &[
    "movie", "cookie", "freebie", "tie", "pie", "lie", "die", "hippie", "zombie", "rookie",
    "calorie", "selfie", "genie", "goalie", "brownie", "smoothie", "sweetie", "prairie", "pixie",
    "newbie", "techie", "birdie", "lingerie", "auntie", "boogie", "hoodie", "junkie", "magpie",
    "walkie", "talkie", "veggie", "groupie", "indie", "yuppie",
];

/// Nouns ending in `che`/`she`, whose plural only adds `s`.
const E_FINAL_NOUNS: &[&str] = &[
    "cache", "niche", "moustache", "mustache", "headache", "toothache", "backache", "earache",
    "stomachache", "avalanche", "quiche", "cliche", "creche", "psyche", "microfiche", "panache",
    "attache", "douche", "gouache", "barouche",
];

const UNINFLECTED: &[&str] = &[
    "always", "perhaps", "sometimes", "towards", "afterwards", "besides", "unless", "whereas",
    "thanks", "news", "series", "species", "means", "mathematics", "physics", "economics",
    "politics", "ethics", "lens", "chaos", "canvas", "atlas", "alias",
];

pub const PLACEHOLDERS: &[&str] = &["url", "money", "number", "emailaddr", "phonenumber"];

#[derive(Debug, Clone)]
pub struct Lexicon {
    stop_words: HashSet<String>,
    irregular: HashMap<String, String>,
    uninflected: HashSet<String>,
}

impl Lexicon {
    pub fn english() -> Self {
        let stop_words = ENGLISH_STOP_WORDS
            .iter()
            .chain(EMAIL_NOISE_WORDS)
            .map(|word| word.to_string())
            .collect();
        let irregular = IRREGULAR_NOUNS
            .iter()
            .map(|(form, lemma)| (form.to_string(), lemma.to_string()))
            .collect();
        let uninflected = UNINFLECTED.iter().map(|word| word.to_string()).collect();
        Self {
            stop_words,
            irregular,
            uninflected,
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    pub fn is_placeholder(token: &str) -> bool {
        PLACEHOLDERS.contains(&token)
    }

    /// The result is a fixed point: lemmatizing it again returns it unchanged.
    /// A reduction that would land on a stop word is not taken.
    pub fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        let mut current = token.to_string();
        loop {
            let next = match self.reduce_once(&current) {
                Some(next) if !self.is_stop_word(&next) => next,
                _ => break,
            };
            current = next;
        }
        if current == token {
            Cow::Borrowed(token)
        } else {
            Cow::Owned(current)
        }
    }

    fn reduce_once(&self, token: &str) -> Option<String> {
        if let Some(lemma) = self.irregular.get(token) {
            return Some(lemma.clone());
        }
        if token.chars().count() <= 3
            || self.uninflected.contains(token)
            || Self::is_placeholder(token)
        {
            return None;
        }
        if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
            return None;
        }
        let singular = token.strip_suffix('s')?;
        if let Some(stem) = token.strip_suffix("ies") {
            if stem.chars().count() > 2 && !IE_NOUNS.contains(&singular) {
                return Some(format!("{stem}y"));
            }
            return Some(singular.to_string());
        }
        let sibilant = token.ends_with("sses")
            || token.ends_with("xes")
            || token.ends_with("zzes")
            || ((token.ends_with("ches") || token.ends_with("shes"))
                && !E_FINAL_NOUNS.contains(&singular));
        if sibilant {
            return token.strip_suffix("es").map(str::to_string);
        }
        Some(singular.to_string())
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::english()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_regular_and_irregular_plurals() {
        let lexicon = Lexicon::english();
        assert_eq!(lexicon.lemmatize("prizes"), "prize");
        assert_eq!(lexicon.lemmatize("offers"), "offer");
        assert_eq!(lexicon.lemmatize("parties"), "party");
        assert_eq!(lexicon.lemmatize("classes"), "class");
        assert_eq!(lexicon.lemmatize("boxes"), "box");
        assert_eq!(lexicon.lemmatize("children"), "child");
        assert_eq!(lexicon.lemmatize("wives"), "wife");
        assert_eq!(lexicon.lemmatize("churches"), "church");
        assert_eq!(lexicon.lemmatize("wishes"), "wish");
        assert_eq!(lexicon.lemmatize("buzzes"), "buzz");
        assert_eq!(lexicon.lemmatize("quizzes"), "quiz");
    }

    #[test]
    fn silent_e_plurals_keep_their_e() {
        let lexicon = Lexicon::english();
        let cases = [
            ("prizes", "prize"),
            ("sizes", "size"),
            ("caches", "cache"),
            ("niches", "niche"),
            ("movies", "movie"),
            ("cookies", "cookie"),
            ("freebies", "freebie"),
            ("ties", "tie"),
            ("pies", "pie"),
            ("lies", "lie"),
        ];
        for (plural, lemma) in cases {
            assert_eq!(lexicon.lemmatize(plural), lemma, "{plural}");
        }
    }

    #[test]
    fn leaves_base_forms_alone() {
        let lexicon = Lexicon::english();
        for word in ["bonus", "class", "analysis", "news", "thanks", "meeting", "money", "url"] {
            assert_eq!(lexicon.lemmatize(word), word);
        }
    }

    #[test]
    fn lemma_is_a_fixed_point() {
        let lexicon = Lexicon::english();
        for word in ["prizes", "feets", "parties", "dollars", "crises", "wills"] {
            let once = lexicon.lemmatize(word).into_owned();
            assert_eq!(lexicon.lemmatize(&once), once.as_str());
        }
    }

    #[test]
    fn never_reduces_onto_a_stop_word() {
        let lexicon = Lexicon::english();
        assert_eq!(lexicon.lemmatize("wills"), "wills");
    }

    #[test]
    fn mail_noise_is_stopped() {
        let lexicon = Lexicon::english();
        for word in ["subject", "fwd", "bcc", "https", "com", "the", "your"] {
            assert!(lexicon.is_stop_word(word), "{word}");
        }
        assert!(!lexicon.is_stop_word("prize"));
    }
}
