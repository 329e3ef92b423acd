//! Random-value corpus for the dummy-values mode.
//!
//! The synthesizer only needs "a plausible literal of this kind for a
//! parameter called X".  [`ValueCorpus`] is that contract;
//! [`LoremCorpus`] implements it with small embedded word lists and a
//! seedable RNG so tests can make the output reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of dummy literal values, keyed by a guessed field name.
pub trait ValueCorpus {
    /// A random integer; parameter names containing "year" get a
    /// plausible year, everything else a four-digit number.
    fn int_for(&mut self, parameter_name: &str) -> i64;
    /// A random word or phrase matching the semantic hint in the name.
    fn string_for(&mut self, parameter_name: &str) -> String;
    /// A random uppercase ASCII letter.
    fn uppercase_letter(&mut self) -> char;
    /// The next value of an incrementing counter.
    fn next_number(&mut self) -> u64;
}

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "dolore", "magna", "aliqua", "enim", "minim",
    "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi", "aliquip",
    "commodo", "consequat", "duis", "aute", "irure", "voluptate", "velit", "esse", "cillum",
    "fugiat", "nulla", "pariatur", "excepteur", "sint", "occaecat", "cupidatat", "proident",
];

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Taylor", "Moore", "Jackson", "O'Neil",
];

const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Fairview", "Madison", "Georgetown", "Salem", "Franklin",
    "Greenville", "Bristol", "Clinton", "Arlington", "Ashland", "Dover", "Oxford", "Milton",
    "Coeur d'Alene", "San Jose", "New Haven",
];

const COUNTRIES: &[&str] = &[
    "Argentina", "Australia", "Austria", "Belgium", "Brazil", "Canada", "Chile", "Denmark",
    "Finland", "France", "Germany", "Iceland", "Ireland", "Italy", "Japan", "Kenya", "Mexico",
    "Norway", "Portugal", "Spain", "Sweden", "United Kingdom",
];

const STATES: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "California", "Colorado", "Delaware", "Florida", "Georgia",
    "Idaho", "Illinois", "Kansas", "Maine", "Montana", "Nevada", "New York", "North Carolina",
    "Oregon", "Texas", "Utah", "Vermont", "Washington", "Wyoming",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

/// Corpus backed by embedded word lists.
pub struct LoremCorpus {
    rng: StdRng,
    counter: u64,
}

impl LoremCorpus {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            counter: 0,
        }
    }

    /// A deterministic corpus for reproducible output.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            counter: 0,
        }
    }

    fn pick(&mut self, list: &[&'static str]) -> &'static str {
        list.choose(&mut self.rng).copied().unwrap_or("lorem")
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect()
    }

    fn url(&mut self) -> String {
        let host = self.pick(WORDS);
        let path = self.pick(WORDS);
        format!("https://www.{}.com/{}", host, path)
    }

    fn email(&mut self) -> String {
        let first = self.pick(FIRST_NAMES).to_lowercase();
        let last = self.pick(LAST_NAMES).to_lowercase().replace('\'', "");
        let domain = self.pick(DOMAINS);
        format!("{}.{}@{}", first, last, domain)
    }

    fn phone(&mut self) -> String {
        let area = self.rng.gen_range(200..1000);
        let exchange = self.rng.gen_range(200..1000);
        format!("({}) {}-{}", area, exchange, self.digits(4))
    }

    fn full_name(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        format!("{} {}", first, last)
    }
}

impl Default for LoremCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueCorpus for LoremCorpus {
    fn int_for(&mut self, parameter_name: &str) -> i64 {
        if parameter_name.to_lowercase().contains("year") {
            self.rng.gen_range(1980..=2023)
        } else {
            self.rng.gen_range(1111..=9999)
        }
    }

    fn string_for(&mut self, parameter_name: &str) -> String {
        let name = parameter_name.to_lowercase();
        if name.contains("url") {
            self.url()
        } else if name.contains("city") {
            self.pick(CITIES).to_string()
        } else if name.contains("country") {
            self.pick(COUNTRIES).to_string()
        } else if name.contains("email") {
            self.email()
        } else if name.contains("phone") {
            self.phone()
        } else if name.contains("state") {
            self.pick(STATES).to_string()
        } else if name.contains("zip") {
            self.digits(5)
        } else if name.contains("name") {
            self.full_name()
        } else {
            self.pick(WORDS).to_string()
        }
    }

    fn uppercase_letter(&mut self) -> char {
        char::from(self.rng.gen_range(b'A'..=b'Z'))
    }

    fn next_number(&mut self) -> u64 {
        let n = self.counter;
        self.counter += 1;
        n
    }
}

/// Escape text for use inside a Kotlin string literal.
pub fn escape_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> LoremCorpus {
        LoremCorpus::seeded(42)
    }

    #[test]
    fn ints_are_four_digit_numbers() {
        let mut c = corpus();
        for _ in 0..1000 {
            let n = c.int_for("count");
            assert!((1111..=9999).contains(&n), "{} out of range", n);
        }
    }

    #[test]
    fn year_like_ints() {
        let mut c = corpus();
        for _ in 0..1000 {
            let n = c.int_for("birthYear");
            assert!((1980..=2023).contains(&n), "{} is not a plausible year", n);
        }
    }

    #[test]
    fn generic_strings_are_single_words() {
        let mut c = corpus();
        for _ in 0..200 {
            let s = c.string_for("");
            assert!(!s.is_empty() && s.chars().all(|ch| ch.is_ascii_alphanumeric()), "{}", s);
        }
    }

    #[test]
    fn url_strings() {
        let mut c = corpus();
        for _ in 0..200 {
            let s = c.string_for("homepageUrl");
            assert!(s.starts_with("https://") && s[8..].contains('/'), "{}", s);
        }
    }

    #[test]
    fn email_strings() {
        let mut c = corpus();
        for _ in 0..200 {
            let s = c.string_for("email");
            let (local, domain) = s.split_once('@').expect("missing @");
            assert!(!local.is_empty() && domain.contains('.'), "{}", s);
            assert_eq!(s, s.to_lowercase());
        }
    }

    #[test]
    fn phone_strings() {
        let mut c = corpus();
        for _ in 0..200 {
            let s = c.string_for("phone");
            assert!(s.starts_with('('), "{}", s);
            let (area, rest) = s[1..].split_once(") ").expect("missing area code");
            let (exchange, line) = rest.split_once('-').expect("missing dash");
            for part in [area, exchange, line] {
                assert!(part.chars().all(|ch| ch.is_ascii_digit()), "{}", s);
            }
        }
    }

    #[test]
    fn zip_codes_have_five_digits() {
        let mut c = corpus();
        for _ in 0..200 {
            let s = c.string_for("zipCode");
            assert_eq!(s.len(), 5);
            assert!(s.chars().all(|ch| ch.is_ascii_digit()));
        }
    }

    #[test]
    fn names_have_first_and_last_part() {
        let mut c = corpus();
        for _ in 0..200 {
            let s = c.string_for("name");
            assert!(s.contains(' '), "{}", s);
        }
    }

    #[test]
    fn capitalized_places() {
        let mut c = corpus();
        for hint in ["city", "country", "state"] {
            for _ in 0..50 {
                let s = c.string_for(hint);
                assert!(s.chars().next().is_some_and(|ch| ch.is_ascii_uppercase()), "{}", s);
            }
        }
    }

    #[test]
    fn letters_are_uppercase() {
        let mut c = corpus();
        for _ in 0..1000 {
            assert!(c.uppercase_letter().is_ascii_uppercase());
        }
    }

    #[test]
    fn counter_increments() {
        let mut c = corpus();
        assert_eq!(c.next_number(), 0);
        assert_eq!(c.next_number(), 1);
        assert_eq!(c.next_number(), 2);
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(escape_string_literal("O'Neil"), "O'Neil");
        assert_eq!(escape_string_literal("a\"b$c\\"), "a\\\"b\\$c\\\\");
    }
}
