// src/generators/password.rs
use rand::Rng;

use crate::models::{GenerationPolicy, StrengthLabel};

pub const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
pub const NUMBERS: &[u8] = b"0123456789";
pub const SYMBOLS: &[u8] = b"!@#$%^&*()_+-={}[]|:;<>,.?/~";

// Requested lengths below this are silently raised, never rejected.
const MIN_LENGTH: usize = 8;

/// Generate a random password from a character-class policy.
///
/// The output always contains at least one character from every enabled
/// class. A policy with every class disabled falls back to
/// lowercase+numbers, and lengths below 8 are raised to 8; neither case
/// is an error.
pub fn generate(policy: &GenerationPolicy) -> String {
    let mut rng = rand::thread_rng();

    // Active alphabet, classes in fixed order
    let mut alphabet = Vec::new();
    if policy.include_uppercase {
        alphabet.extend_from_slice(UPPERCASE);
    }
    if policy.include_lowercase {
        alphabet.extend_from_slice(LOWERCASE);
    }
    if policy.include_numbers {
        alphabet.extend_from_slice(NUMBERS);
    }
    if policy.include_symbols {
        alphabet.extend_from_slice(SYMBOLS);
    }

    if alphabet.is_empty() {
        alphabet.extend_from_slice(LOWERCASE);
        alphabet.extend_from_slice(NUMBERS);
    }

    let length = policy.length.max(MIN_LENGTH);

    // One character per enabled class, so coverage is guaranteed
    let mut out: Vec<u8> = Vec::with_capacity(length);
    if policy.include_uppercase {
        out.push(UPPERCASE[rng.gen_range(0..UPPERCASE.len())]);
    }
    if policy.include_lowercase {
        out.push(LOWERCASE[rng.gen_range(0..LOWERCASE.len())]);
    }
    if policy.include_numbers {
        out.push(NUMBERS[rng.gen_range(0..NUMBERS.len())]);
    }
    if policy.include_symbols {
        out.push(SYMBOLS[rng.gen_range(0..SYMBOLS.len())]);
    }

    while out.len() < length {
        out.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }

    // Fisher-Yates shuffle so the seeded class characters aren't
    // clustered at the front
    for i in (1..out.len()).rev() {
        let j = rng.gen_range(0..=i);
        out.swap(i, j);
    }

    out.iter().map(|&b| b as char).collect()
}

/// Score a candidate password: one point per satisfied check, 7 max.
pub fn strength_score(candidate: &str) -> u8 {
    if candidate.is_empty() {
        return 0;
    }

    let length = candidate.chars().count();
    let mut score = 0u8;

    if length >= 8 {
        score += 1;
    }
    if length >= 12 {
        score += 1;
    }
    if length >= 16 {
        score += 1;
    }
    if candidate.chars().any(|c| c.is_ascii_uppercase()) {
        score += 1;
    }
    if candidate.chars().any(|c| c.is_ascii_lowercase()) {
        score += 1;
    }
    if candidate.chars().any(|c| c.is_ascii_digit()) {
        score += 1;
    }
    if candidate.chars().any(|c| !c.is_ascii_alphanumeric()) {
        score += 1;
    }

    score
}

/// Classify a candidate password into a coarse three-tier label.
///
/// Empty input is weak without scoring; otherwise score < 4 is weak,
/// 4..=5 medium, 6+ strong.
pub fn classify(candidate: &str) -> StrengthLabel {
    if candidate.is_empty() {
        return StrengthLabel::Weak;
    }

    let score = strength_score(candidate);
    if score < 4 {
        StrengthLabel::Weak
    } else if score < 6 {
        StrengthLabel::Medium
    } else {
        StrengthLabel::Strong
    }
}

/// The unmet checks behind a score, phrased as suggestions. Display
/// only; never feeds back into the label.
pub fn improvement_hints(candidate: &str) -> Vec<String> {
    let mut hints = Vec::new();

    let length = candidate.chars().count();
    if length < 8 {
        hints.push("Use at least 8 characters".to_string());
    } else if length < 12 {
        hints.push("Use 12 or more characters".to_string());
    } else if length < 16 {
        hints.push("Use 16 or more characters for the best score".to_string());
    }

    if !candidate.chars().any(|c| c.is_ascii_uppercase()) {
        hints.push("Add uppercase letters".to_string());
    }
    if !candidate.chars().any(|c| c.is_ascii_lowercase()) {
        hints.push("Add lowercase letters".to_string());
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        hints.push("Add numbers".to_string());
    }
    if !candidate.chars().any(|c| !c.is_ascii_alphanumeric()) {
        hints.push("Add symbols".to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(
        length: usize,
        upper: bool,
        lower: bool,
        numbers: bool,
        symbols: bool,
    ) -> GenerationPolicy {
        GenerationPolicy {
            length,
            include_uppercase: upper,
            include_lowercase: lower,
            include_numbers: numbers,
            include_symbols: symbols,
        }
    }

    #[test]
    fn length_matches_request() {
        for len in [8, 12, 16, 24, 64] {
            let generated = generate(&policy(len, true, true, true, true));
            assert_eq!(generated.chars().count(), len);
        }
    }

    #[test]
    fn short_requests_are_raised_to_eight() {
        for len in [0, 1, 3, 7] {
            let generated = generate(&policy(len, true, true, true, true));
            assert_eq!(generated.chars().count(), 8, "requested {}", len);
        }
    }

    #[test]
    fn contains_every_requested_class() {
        for _ in 0..50 {
            let generated = generate(&policy(8, true, true, true, true));
            assert!(generated.chars().any(|c| c.is_ascii_uppercase()));
            assert!(generated.chars().any(|c| c.is_ascii_lowercase()));
            assert!(generated.chars().any(|c| c.is_ascii_digit()));
            assert!(generated.chars().any(|c| !c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn single_class_policy_draws_only_from_that_class() {
        for _ in 0..20 {
            let generated = generate(&policy(12, false, false, true, false));
            assert!(generated.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn all_flags_off_falls_back_to_lowercase_and_digits() {
        for _ in 0..50 {
            let generated = generate(&policy(16, false, false, false, false));
            assert_eq!(generated.chars().count(), 16);
            assert!(generated
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn output_stays_inside_active_alphabet() {
        for _ in 0..20 {
            let generated = generate(&policy(20, true, false, false, true));
            assert!(generated.chars().all(|c| {
                UPPERCASE.contains(&(c as u8)) || SYMBOLS.contains(&(c as u8))
            }));
        }
    }

    #[test]
    fn default_policy_is_sixteen_with_all_classes() {
        let p = GenerationPolicy::default();
        assert_eq!(p.length, 16);
        assert!(p.include_uppercase && p.include_lowercase);
        assert!(p.include_numbers && p.include_symbols);
        let generated = generate(&p);
        assert_eq!(generated.chars().count(), 16);
    }

    #[test]
    fn empty_string_is_weak() {
        assert_eq!(classify(""), StrengthLabel::Weak);
        assert_eq!(strength_score(""), 0);
    }

    #[test]
    fn lowercase_only_is_weak() {
        // len>=8 and lowercase: two points
        assert_eq!(strength_score("abcdefgh"), 2);
        assert_eq!(classify("abcdefgh"), StrengthLabel::Weak);
    }

    #[test]
    fn three_classes_at_eleven_chars_is_medium() {
        // len>=8, upper, lower, digit: four points
        assert_eq!(strength_score("Abcdefgh123"), 4);
        assert_eq!(classify("Abcdefgh123"), StrengthLabel::Medium);
    }

    #[test]
    fn four_classes_at_fourteen_chars_is_strong() {
        // len>=8, len>=12, upper, lower, digit, symbol: six points
        assert_eq!(strength_score("Abcdefgh123!@#"), 6);
        assert_eq!(classify("Abcdefgh123!@#"), StrengthLabel::Strong);
    }

    #[test]
    fn maximum_score_needs_sixteen_chars_and_all_classes() {
        assert_eq!(strength_score("Abcdefghij123!@#"), 7);
        assert_eq!(classify("Abcdefghij123!@#"), StrengthLabel::Strong);
    }

    #[test]
    fn classification_is_deterministic() {
        for candidate in ["", "abc", "Abcdefgh123", "correct horse battery staple"] {
            assert_eq!(classify(candidate), classify(candidate));
        }
    }

    #[test]
    fn hints_name_the_unmet_checks() {
        let hints = improvement_hints("abc");
        assert!(hints.iter().any(|h| h.contains("8 characters")));
        assert!(hints.iter().any(|h| h.contains("uppercase")));
        assert!(hints.iter().any(|h| h.contains("numbers")));
        assert!(hints.iter().any(|h| h.contains("symbols")));

        assert!(improvement_hints("Abcdefghij123!@#").is_empty());
    }

    #[test]
    fn generated_passwords_classify_strong_at_default_policy() {
        // 16 chars, all classes: score 7
        for _ in 0..20 {
            let generated = generate(&GenerationPolicy::default());
            assert_eq!(classify(&generated), StrengthLabel::Strong);
        }
    }
}
