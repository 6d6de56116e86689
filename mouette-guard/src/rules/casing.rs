//! Identifier case detection and conversion.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// The case an identifier is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Case {
    /// `flowerBed`, `userID`
    Camel,
    /// `flower_bed`
    Snake,
    /// `FlowerBed`
    Pascal,
    /// `FLOWER_BED`
    Constant,
    /// `flower-bed`
    Kebab,
    /// `flower`, `flower2`
    Lower,
    /// `FLOWER`
    Upper,
    Unknown,
}

impl Case {
    pub fn as_str(&self) -> &'static str {
        match self {
            Case::Camel => "camel",
            Case::Snake => "snake",
            Case::Pascal => "pascal",
            Case::Constant => "constant",
            Case::Kebab => "kebab",
            Case::Lower => "lower",
            Case::Upper => "upper",
            Case::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A case rules can require names to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetCase {
    Camel,
    Snake,
}

impl TargetCase {
    /// Option values accepted for a target case.
    pub const VALUES: &'static [&'static str] = &["camel", "snake"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "camel" => Some(TargetCase::Camel),
            "snake" => Some(TargetCase::Snake),
            _ => None,
        }
    }

    pub fn as_case(&self) -> Case {
        match self {
            TargetCase::Camel => Case::Camel,
            TargetCase::Snake => Case::Snake,
        }
    }

    /// True if `name` is acceptable. Single words, digits included, have no
    /// case to violate, and neither does a name conversion leaves unchanged.
    pub fn accepts(&self, name: &str) -> bool {
        is_single_word(name) || detect_case(name) == self.as_case() || self.convert(name) == name
    }

    pub fn convert(&self, name: &str) -> String {
        match self {
            TargetCase::Camel => to_camel(name),
            TargetCase::Snake => to_snake(name),
        }
    }
}

impl fmt::Display for TargetCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_case().fmt(f)
    }
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Option<Regex>> = Lazy::new(|| Regex::new($re).ok());
    };
}

pattern!(CAMEL, r"^_*[a-z][a-z0-9]*(?:[A-Z][a-z0-9]*)+$");
pattern!(SNAKE, r"^_*[a-z][a-z0-9]*(?:_[a-z0-9]+)+$");
pattern!(CONSTANT, r"^_*[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+$");
pattern!(KEBAB, r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)+$");
pattern!(UPPER, r"^_*[A-Z][A-Z0-9]*$");
pattern!(PASCAL, r"^_*[A-Z][a-z0-9]*(?:[A-Z][a-z0-9]*)*$");
pattern!(LOWER, r"^_*[a-z][a-z0-9]*$");

fn is(pattern: &Lazy<Option<Regex>>, name: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(name))
}

/// True for names with no case to violate: a lowercase word, possibly with
/// digits, optionally after leading underscores.
pub fn is_single_word(name: &str) -> bool {
    is(&LOWER, name)
}

static CHECKS: [(&Lazy<Option<Regex>>, Case); 7] = [
    (&CAMEL, Case::Camel),
    (&SNAKE, Case::Snake),
    (&CONSTANT, Case::Constant),
    (&KEBAB, Case::Kebab),
    (&UPPER, Case::Upper),
    (&PASCAL, Case::Pascal),
    (&LOWER, Case::Lower),
];

/// Classifies the case of `name`.
pub fn detect_case(name: &str) -> Case {
    CHECKS
        .iter()
        .find(|(pattern, _)| is(pattern, name))
        .map_or(Case::Unknown, |(_, case)| *case)
}

/// Splits an identifier into lowercase words at separators and case changes.
fn words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // `userID` splits before `I`; `HTMLParser` splits before `P`
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.into_iter().map(|w| w.to_lowercase()).collect()
}

fn split_leading_underscores(name: &str) -> (&str, &str) {
    let rest = name.trim_start_matches('_');
    name.split_at(name.len() - rest.len())
}

/// Converts `name` to camel case, keeping leading underscores.
pub fn to_camel(name: &str) -> String {
    let (prefix, rest) = split_leading_underscores(name);
    let mut out = prefix.to_string();
    for (i, word) in words(rest).iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

/// Converts `name` to snake case, keeping leading underscores.
pub fn to_snake(name: &str) -> String {
    let (prefix, rest) = split_leading_underscores(name);
    format!("{prefix}{}", words(rest).join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_case() {
        assert_eq!(detect_case("flowerBed"), Case::Camel);
        assert_eq!(detect_case("userID"), Case::Camel);
        assert_eq!(detect_case("flower_bed"), Case::Snake);
        assert_eq!(detect_case("_flower_bed"), Case::Snake);
        assert_eq!(detect_case("FlowerBed"), Case::Pascal);
        assert_eq!(detect_case("FLOWER_BED"), Case::Constant);
        assert_eq!(detect_case("flower-bed"), Case::Kebab);
        assert_eq!(detect_case("flower"), Case::Lower);
        assert_eq!(detect_case("line1"), Case::Lower);
        assert_eq!(detect_case("ID"), Case::Upper);
        assert_eq!(detect_case("my_flowerBed"), Case::Unknown);
        assert_eq!(detect_case(""), Case::Unknown);
        assert_eq!(detect_case("123"), Case::Unknown);
    }

    #[test]
    fn test_single_words() {
        assert!(is_single_word("flower"));
        assert!(is_single_word("_id"));
        assert!(is_single_word("address2"));
        assert!(!is_single_word("_123"));
        assert!(!is_single_word(""));
        assert!(!is_single_word("flowerBed"));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_camel("flower_bed"), "flowerBed");
        assert_eq!(to_camel("my_flowerBed"), "myFlowerBed");
        assert_eq!(to_camel("_private_key"), "_privateKey");
        assert_eq!(to_snake("flowerBed"), "flower_bed");
        assert_eq!(to_snake("userID"), "user_id");
        assert_eq!(to_snake("HTMLParser"), "html_parser");
        assert_eq!(to_snake("my_flowerBed"), "my_flower_bed");
    }

    #[test]
    fn test_target_case() {
        let camel = TargetCase::parse("camel").unwrap();
        assert!(camel.accepts("flowerBed"));
        assert!(camel.accepts("flower"));
        assert!(!camel.accepts("flower_bed"));
        assert_eq!(camel.convert("flower_bed"), "flowerBed");

        let snake = TargetCase::parse("snake").unwrap();
        assert!(snake.accepts("_id"));
        assert!(!snake.accepts("FlowerBed"));
        assert_eq!(snake.to_string(), "snake");
        assert!(TargetCase::parse("kebab").is_none());
    }

    #[test]
    fn test_lowercase_words_with_digits_are_accepted() {
        for name in ["address2", "line1", "v2", "_v2"] {
            assert!(TargetCase::Camel.accepts(name), "{name} rejected as camel");
            assert!(TargetCase::Snake.accepts(name), "{name} rejected as snake");
            assert_eq!(TargetCase::Camel.convert(name), name);
        }
    }

    #[test]
    fn test_case_patterns_compile() {
        assert!(CHECKS.iter().all(|(pattern, _)| pattern.is_some()));
    }
}
