//! Maps a letter answer key onto the option text it denotes.
//!
//! Resolution is total: any letter outside `A`-`D`, or one pointing past the
//! end of a short option list, yields [`UNKNOWN_ANSWER`] instead of an error.

use crate::models::Question;

/// Sentinel returned when an answer key cannot be resolved
pub const UNKNOWN_ANSWER: &str = "Unknown";

pub fn normalize_letter(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Zero-based option index for a valid answer letter
pub fn letter_index(raw: &str) -> Option<usize> {
    match normalize_letter(raw).as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

/// Option text for `letter`, or `None` when the key is invalid or out of range
pub fn resolve_option<'a>(question: &'a Question, letter: &str) -> Option<&'a str> {
    letter_index(letter)
        .and_then(|index| question.options.get(index))
        .map(String::as_str)
}

pub fn resolve_answer<'a>(question: &'a Question, letter: &str) -> &'a str {
    resolve_option(question, letter).unwrap_or(UNKNOWN_ANSWER)
}

/// Whether `selected` is the option the question's answer key points at.
///
/// An unresolvable key never matches, even if some option literally reads
/// "Unknown".
pub fn is_correct(question: &Question, selected: Option<&str>) -> bool {
    match (resolve_option(question, &question.answer_letter), selected) {
        (Some(correct), Some(selected)) => correct == selected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats_question(answer: &str) -> Question {
        Question::new(
            "What is popular?",
            vec![
                "Cats".to_string(),
                "Dogs".to_string(),
                "Birds".to_string(),
                "Fish".to_string(),
            ],
            answer,
        )
    }

    #[test]
    fn test_resolves_each_letter_by_position() {
        let question = cats_question("A");
        assert_eq!(resolve_answer(&question, "A"), "Cats");
        assert_eq!(resolve_answer(&question, "B"), "Dogs");
        assert_eq!(resolve_answer(&question, "C"), "Birds");
        assert_eq!(resolve_answer(&question, "D"), "Fish");
    }

    #[test]
    fn test_letter_is_trimmed_and_case_normalized() {
        let question = cats_question("A");
        assert_eq!(resolve_answer(&question, "  b "), "Dogs");
        assert_eq!(resolve_answer(&question, "d\n"), "Fish");
    }

    #[test]
    fn test_invalid_letters_resolve_to_sentinel() {
        let question = cats_question("A");
        for junk in ["E", "", "   ", "AB", "A)", "1", "Answer: A", "ä"] {
            assert_eq!(
                resolve_answer(&question, junk),
                UNKNOWN_ANSWER,
                "letter {:?} should not resolve",
                junk
            );
        }
    }

    #[test]
    fn test_out_of_range_index_resolves_to_sentinel() {
        let question = Question::new("Short?", vec!["Only".to_string(), "Two".to_string()], "C");
        assert_eq!(resolve_answer(&question, "C"), UNKNOWN_ANSWER);
        assert_eq!(resolve_answer(&question, "B"), "Two");
        assert_eq!(question.correct_answer(), UNKNOWN_ANSWER);
    }

    #[test]
    fn test_invalid_key_is_never_correct() {
        let question = cats_question("E");
        assert_eq!(question.correct_answer(), "Unknown");
        for option in &question.options {
            assert!(!is_correct(&question, Some(option)));
        }
        assert!(!is_correct(&question, Some("Unknown")));
        assert!(!is_correct(&question, None));
    }

    #[test]
    fn test_literal_unknown_option_cannot_match_sentinel() {
        let question = Question::new("Trick?", vec!["Unknown".to_string()], "Z");
        assert!(!is_correct(&question, Some("Unknown")));
    }

    #[test]
    fn test_correct_selection_matches() {
        let question = cats_question(" a ");
        assert!(is_correct(&question, Some("Cats")));
        assert!(!is_correct(&question, Some("Dogs")));
    }
}
