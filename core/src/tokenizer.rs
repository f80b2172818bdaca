use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref IRREGULAR_NOUNS: HashMap<&'static str, &'static str> = {
        let pairs: &[(&str, &str)] = &[
            ("children", "child"), ("feet", "foot"), ("geese", "goose"), ("mice", "mouse"),
            ("people", "person"), ("teeth", "tooth"), ("women", "woman"), ("men", "man"),
            ("oxen", "ox"), ("lice", "louse"), ("data", "datum"), ("criteria", "criterion"),
            ("phenomena", "phenomenon"), ("analyses", "analysis"), ("theses", "thesis"),
            ("crises", "crisis"), ("indices", "index"), ("matrices", "matrix"),
        ];
        pairs.iter().copied().collect()
    };
    /// Words ending like plurals that are already in base form.
    static ref NOT_PLURAL: HashSet<&'static str> = {
        let words: &[&str] = &[
            "news","series","species","means","lens","bias","atlas","canvas","alias","chaos","cosmos",
            "always","perhaps","whereas","sometimes","afterwards","towards","besides","nevertheless",
            "headquarters","crossroads","barracks","diabetes","measles","mumps","rabies","herpes",
            "thanks","scissors","trousers","clothes","physics","mathematics","economics","politics",
            "ethics","athletics","statistics","linguistics","genetics","electronics","graphics",
        ];
        words.iter().copied().collect()
    };
}

/// Suffix detachment rules for plural nouns, tried in order.
const NOUN_SUFFIXES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("sses", "ss"),
    ("xes", "x"),
    ("zes", "z"),
    ("s", ""),
];

/// Maps raw text to the ordered token sequence the index consumes.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// The supported text processing pipelines. Each one builds on the previous:
/// stopword removal runs after basic splitting, stemming and lemmatization run
/// after stopword removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextProcessor {
    Basic,
    #[serde(rename = "stopwords")]
    StopwordRemoval,
    Stem,
    #[default]
    Lemmatize,
}

impl Tokenizer for TextProcessor {
    fn tokenize(&self, text: &str) -> Vec<String> {
        match self {
            TextProcessor::Basic => basic_tokenize(text),
            TextProcessor::StopwordRemoval => remove_stopwords(basic_tokenize(text)),
            TextProcessor::Stem => remove_stopwords(basic_tokenize(text))
                .into_iter()
                .map(|t| STEMMER.stem(&t).into_owned())
                .collect(),
            TextProcessor::Lemmatize => remove_stopwords(basic_tokenize(text))
                .into_iter()
                .map(|t| lemmatize(&t))
                .collect(),
        }
    }
}

impl TextProcessor {
    pub fn name(&self) -> &'static str {
        match self {
            TextProcessor::Basic => "basic",
            TextProcessor::StopwordRemoval => "stopwords",
            TextProcessor::Stem => "stem",
            TextProcessor::Lemmatize => "lemmatize",
        }
    }
}

impl fmt::Display for TextProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextProcessor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(TextProcessor::Basic),
            "stopwords" | "stopword_removal" => Ok(TextProcessor::StopwordRemoval),
            "stem" => Ok(TextProcessor::Stem),
            "lemmatize" => Ok(TextProcessor::Lemmatize),
            other => Err(format!("unknown tokenizer '{other}', expected basic|stopwords|stem|lemmatize")),
        }
    }
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// NFKC normalize, lowercase, split hyphenated words, and keep letter runs.
/// Digits and punctuation never make it into a token.
pub fn basic_tokenize(text: &str) -> Vec<String> {
    let normalized = text
        .nfkc()
        .map(|c| if matches!(c, '-' | '–' | '—') { ' ' } else { c })
        .collect::<String>()
        .to_lowercase();
    RE.find_iter(&normalized)
        .map(|m| m.as_str().trim_end_matches('\'').to_string())
        .collect()
}

fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().filter(|t| !is_stopword(t)).collect()
}

/// Reduce a plural noun to its base form without a dictionary.
pub fn lemmatize(word: &str) -> String {
    if let Some(base) = IRREGULAR_NOUNS.get(word) {
        return (*base).to_string();
    }
    if NOT_PLURAL.contains(word) || word.ends_with("ics") {
        return word.to_string();
    }
    if word.len() <= 3 || word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") || word.contains('\'') {
        return word.to_string();
    }
    for (suffix, replacement) in NOUN_SUFFIXES {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.chars().count() >= 2 {
                return format!("{stem}{replacement}");
            }
        }
    }
    word.to_string()
}
