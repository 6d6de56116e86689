//! English noun inflection for collection names.
//!
//! Rules are tried in order and the first matching one wins. Irregular and
//! uncountable words are checked before the rules, and the override table
//! before everything else.

use once_cell::sync::Lazy;
use regex::Regex;

/// Domain words whose forms the general rules get wrong.
const OVERRIDES: &[(&str, &str)] = &[("photo", "photos"), ("sms", "sms")];

const IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

const UNCOUNTABLES: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

const PLURAL_RULES: &[(&str, &str)] = &[
    (r"(quiz)$", "${1}zes"),
    (r"^(oxen)$", "${1}"),
    (r"^(ox)$", "${1}en"),
    (r"^(m|l)ice$", "${1}ice"),
    (r"^(m|l)ouse$", "${1}ice"),
    (r"(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
    (r"(x|ch|ss|sh)$", "${1}es"),
    (r"([^aeiouy]|qu)y$", "${1}ies"),
    (r"(hive)$", "${1}s"),
    (r"(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
    (r"sis$", "ses"),
    (r"([ti])a$", "${1}a"),
    (r"([ti])um$", "${1}a"),
    (r"(buffal|tomat)o$", "${1}oes"),
    (r"(bu)s$", "${1}ses"),
    (r"(alias|status)$", "${1}es"),
    (r"(octop|vir)i$", "${1}i"),
    (r"(octop|vir)us$", "${1}i"),
    (r"^(ax|test)is$", "${1}es"),
    (r"s$", "s"),
    (r"$", "s"),
];

const SINGULAR_RULES: &[(&str, &str)] = &[
    (r"(database)s$", "${1}"),
    (r"(quiz)zes$", "${1}"),
    (r"(matr)ices$", "${1}ix"),
    (r"(vert|ind)ices$", "${1}ex"),
    (r"^(ox)en", "${1}"),
    (r"(alias|status)(es)?$", "${1}"),
    (r"(octop|vir)(us|i)$", "${1}us"),
    (r"^(a)x[ie]s$", "${1}xis"),
    (r"(cris|test)(is|es)$", "${1}is"),
    (r"(shoe)s$", "${1}"),
    (r"(o)es$", "${1}"),
    (r"(bus)(es)?$", "${1}"),
    (r"^(m|l)ice$", "${1}ouse"),
    (r"(x|ch|ss|sh)es$", "${1}"),
    (r"(m)ovies$", "${1}ovie"),
    (r"(s)eries$", "${1}eries"),
    (r"([^aeiouy]|qu)ies$", "${1}y"),
    (r"([lr])ves$", "${1}f"),
    (r"(tive)s$", "${1}"),
    (r"(hive)s$", "${1}"),
    (r"([^f])ves$", "${1}fe"),
    (r"(^analy)(sis|ses)$", "${1}sis"),
    (
        r"((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)(sis|ses)$",
        "${1}sis",
    ),
    (r"([ti])a$", "${1}um"),
    (r"(n)ews$", "${1}ews"),
    (r"(ss)$", "${1}"),
    (r"s$", ""),
];

static PLURALS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| compile(PLURAL_RULES));
static SINGULARS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| compile(SINGULAR_RULES));

// The tables are constant; a pattern that fails to compile is dropped.
fn compile(rules: &[(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(&format!("(?i){pattern}"))
                .ok()
                .map(|regex| (regex, *replacement))
        })
        .collect()
}

fn is_uncountable(word: &str) -> bool {
    let lower = word.to_lowercase();
    UNCOUNTABLES.iter().any(|u| *u == lower)
}

fn apply(word: &str, rules: &[(Regex, &'static str)]) -> String {
    rules
        .iter()
        .find(|(regex, _)| regex.is_match(word))
        .map(|(regex, replacement)| regex.replace(word, *replacement).into_owned())
        .unwrap_or_else(|| word.to_string())
}

// Keeps the capitalization of the first letter of `original`.
fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Returns the plural form of `word`.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if let Some((_, plural)) = OVERRIDES.iter().find(|(s, _)| *s == word) {
        return plural.to_string();
    }
    if is_uncountable(word) {
        return word.to_string();
    }
    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULARS {
        if lower == *singular || lower == *plural {
            return match_case(word, plural);
        }
    }
    apply(word, &PLURALS)
}

/// Returns the singular form of `word`.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if let Some((singular, _)) = OVERRIDES.iter().find(|(_, p)| *p == word) {
        return singular.to_string();
    }
    if is_uncountable(word) {
        return word.to_string();
    }
    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULARS {
        if lower == *singular || lower == *plural {
            return match_case(word, singular);
        }
    }
    apply(word, &SINGULARS)
}

/// True if `word` reads as singular. Uncountable words count as both.
pub fn is_singular(word: &str) -> bool {
    if OVERRIDES.iter().any(|(s, _)| *s == word) {
        return true;
    }
    is_uncountable(word) || pluralize(word) != word
}

/// True if `word` reads as plural. Uncountable words count as both.
pub fn is_plural(word: &str) -> bool {
    if OVERRIDES.iter().any(|(_, p)| *p == word) {
        return true;
    }
    is_uncountable(word) || singularize(word) != word
}
