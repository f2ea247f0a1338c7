//! Number-word to digit conversion.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Words converted by [`convert_number_words`], in application order.
pub const NUMBER_WORDS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
    ("thirty", "30"),
    ("forty", "40"),
    ("fifty", "50"),
    ("sixty", "60"),
    ("seventy", "70"),
    ("eighty", "80"),
    ("ninety", "90"),
    ("hundred", "100"),
    ("thousand", "1000"),
];

static NUMBER_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    NUMBER_WORDS
        .iter()
        .map(|(word, digits)| (Regex::new(&format!(r"(?i)\b{word}\b")).unwrap(), *digits))
        .collect()
});

/// Replace whole-word number words with digits, ignoring case.
///
/// Each word maps independently: "twenty one" becomes "20 1".
pub fn convert_number_words(text: &str) -> String {
    let mut out = text.to_string();
    for (re, digits) in NUMBER_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *digits).into_owned();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_words_only() {
        assert_eq!(
            convert_number_words("One of the ten often wrote twelve lines"),
            "1 of the 10 often wrote 12 lines"
        );
        assert_eq!(convert_number_words("someone tone"), "someone tone");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(convert_number_words("FIVE Hundred"), "5 100");
    }

    #[test]
    fn test_compound_words_map_separately() {
        assert_eq!(convert_number_words("twenty one, thousand."), "20 1, 1000.");
    }
}
