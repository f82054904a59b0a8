//! Universal and domain-routed validation checks
//!
//! Universal checks apply to every claim regardless of domain; domain-routed
//! checks are extra heuristics the pipeline dispatches by knowledge domain.
//! All are pure functions over the claim text plus explicit parameters, so
//! each is testable in isolation.

use crucible_domain::{DisplayId, ValidationResult};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Words carrying no content, excluded from token-overlap comparisons
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in", "on",
    "at", "for", "with", "and", "or", "but", "that", "this", "these", "those", "it", "its", "as",
    "by", "from", "which", "we", "our", "their", "there", "then", "than", "so", "if", "will",
    "would", "can", "could", "has", "have", "had", "do", "does", "not",
];

/// Words that invert the polarity of a statement
pub const NEGATION_WORDS: &[&str] = &["not", "no", "never", "cannot", "impossible"];

/// Transition words that count as implicit reasoning steps
const TRANSITION_WORDS: &[&str] = &[
    "first",
    "second",
    "third",
    "then",
    "therefore",
    "thus",
    "hence",
    "because",
    "consequently",
    "finally",
];

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|percent\b)").expect("percent pattern"))
}

fn step_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*step\s+\d+\s*:").expect("step pattern"))
}

/// Lowercased alphanumeric tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Token set with stop words removed
pub fn content_tokens(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Content of a labeled line such as `POSITION: ...`
///
/// Single-line sections are enough here; the normalizer owns the full
/// multi-line grammar.
pub fn labeled_line<'a>(text: &'a str, labels: &[&str]) -> Option<&'a str> {
    for line in text.lines() {
        let trimmed = line.trim_start();
        for label in labels {
            if let Some(rest) = trimmed.strip_prefix(label) {
                if let Some(content) = rest.trim_start().strip_prefix(':') {
                    let content = content.trim();
                    if !content.is_empty() {
                        return Some(content);
                    }
                }
            }
        }
    }
    None
}

/// Every cited id must exist in the archive
///
/// An unknown citation is a structural violation, not a plausibility
/// question, so it flags.
pub fn check_citation_validity(
    cited: &[DisplayId],
    known: &BTreeSet<DisplayId>,
) -> ValidationResult {
    let unknown: Vec<String> = cited
        .iter()
        .filter(|id| !known.contains(id))
        .map(|id| id.to_string())
        .collect();

    if unknown.is_empty() {
        ValidationResult::pass()
    } else {
        ValidationResult::flag(format!(
            "citation of non-existent entries: {}",
            unknown.join(", ")
        ))
    }
}

/// Position and conclusion must not disagree in negation polarity
///
/// Fires only when the two sections share more than `min_shared_tokens`
/// content tokens, i.e. when they talk about the same thing.
pub fn check_self_contradiction(text: &str, min_shared_tokens: usize) -> ValidationResult {
    let (Some(position), Some(conclusion)) = (
        labeled_line(text, &["POSITION", "HYPOTHESIS"]),
        labeled_line(text, &["CONCLUSION"]),
    ) else {
        return ValidationResult::pass();
    };

    let position_tokens = content_tokens(position);
    let conclusion_tokens = content_tokens(conclusion);
    let shared = position_tokens.intersection(&conclusion_tokens).count();
    if shared <= min_shared_tokens {
        return ValidationResult::pass();
    }

    let negated = |tokens: &[String]| tokens.iter().any(|t| NEGATION_WORDS.contains(&t.as_str()));
    if negated(&tokenize(position)) != negated(&tokenize(conclusion)) {
        ValidationResult::flag(
            "position and conclusion share their subject but disagree in negation polarity",
        )
    } else {
        ValidationResult::pass()
    }
}

/// The conclusion must add something beyond the position
///
/// Overlap ratio is `|intersection| / min(|position|, |conclusion|)` over
/// content tokens. Above `flag_threshold` the conclusion merely restates the
/// position; above `warning_threshold` it is suspiciously close.
pub fn check_circular_reasoning(
    text: &str,
    flag_threshold: f64,
    warning_threshold: f64,
) -> ValidationResult {
    let (Some(position), Some(conclusion)) = (
        labeled_line(text, &["POSITION", "HYPOTHESIS"]),
        labeled_line(text, &["CONCLUSION"]),
    ) else {
        return ValidationResult::info("no labeled position/conclusion to compare");
    };

    let position_tokens = content_tokens(position);
    let conclusion_tokens = content_tokens(conclusion);
    let smaller = position_tokens.len().min(conclusion_tokens.len());
    if smaller == 0 {
        return ValidationResult::pass();
    }

    let overlap = position_tokens.intersection(&conclusion_tokens).count() as f64 / smaller as f64;
    if overlap > flag_threshold {
        ValidationResult::flag(format!(
            "conclusion restates the position without new reasoning (overlap {:.2})",
            overlap
        ))
    } else if overlap > warning_threshold {
        ValidationResult::warning(format!(
            "conclusion overlaps heavily with the position (overlap {:.2})",
            overlap
        ))
    } else {
        ValidationResult::info(format!("position/conclusion overlap {:.2}", overlap))
    }
}

/// Percentages must be internally coherent
///
/// Any single percentage above 100 flags. When the claim talks about a total
/// and its parts sum close to, but not exactly, 100, that is a warning.
pub fn check_numeric_consistency(text: &str, sum_window: (f64, f64)) -> ValidationResult {
    let percents: Vec<f64> = percent_re()
        .captures_iter(text)
        .filter_map(|c| c[1].parse().ok())
        .collect();

    for value in &percents {
        if *value > 100.0 {
            return ValidationResult::flag(format!("percentage exceeds 100: {}%", value));
        }
    }

    let lower = text.to_lowercase();
    let totalling = ["total", "combined", "sum", "altogether", "add up"]
        .iter()
        .any(|w| lower.contains(w));
    if totalling && percents.len() >= 2 {
        let sum: f64 = percents.iter().sum();
        if sum > sum_window.0 && sum < sum_window.1 && (sum - 100.0).abs() > f64::EPSILON {
            return ValidationResult::warning(format!(
                "percentages presented as parts of a whole sum to {:.1}%, not 100%",
                sum
            ));
        }
    }

    ValidationResult::pass()
}

/// The reasoning chain must meet the tier's minimum depth
///
/// Depth counts explicit `STEP n:` markers plus transition words; this is a
/// structural floor, never a quality judgment, so it warns rather than flags.
pub fn check_reasoning_depth(text: &str, min_steps: usize) -> ValidationResult {
    let markers = step_marker_re().find_iter(text).count();
    let transitions = tokenize(text)
        .iter()
        .filter(|t| TRANSITION_WORDS.contains(&t.as_str()))
        .count();
    let depth = markers + transitions;

    if depth < min_steps {
        ValidationResult::warning(format!(
            "reasoning depth {} is below the tier minimum of {}",
            depth, min_steps
        ))
    } else {
        ValidationResult::pass()
    }
}

/// Minimum reasoning steps for a state at the given archive tier
pub fn min_steps_for_tier(tier: u8, table: &[usize; 6]) -> usize {
    table[usize::from(tier).min(table.len() - 1)]
}

// ---------------------------------------------------------------------------
// Domain-routed checks
// ---------------------------------------------------------------------------

/// Empirical domains: the claim should offer a way to test it
pub fn check_empirical_testability(text: &str) -> ValidationResult {
    let lower = text.to_lowercase();
    let signals = [
        "testable",
        "falsifiable",
        "measur",
        "predict",
        "experiment",
        "observ",
        "verif",
    ];
    if signals.iter().any(|s| lower.contains(s)) {
        ValidationResult::pass()
    } else {
        ValidationResult::warning("claim offers no empirical test or measurable prediction")
    }
}

/// Finance/economics: universal statements about winners ignore the failures
pub fn check_survivorship_bias(text: &str) -> ValidationResult {
    let lower = text.to_lowercase();
    let about_winners = ["successful", "winners", "top performers", "best companies"]
        .iter()
        .any(|s| lower.contains(s));
    let universal = ["all ", "every ", "always "].iter().any(|s| lower.contains(s));
    if about_winners && universal {
        ValidationResult::warning(
            "universal claim about successful cases; check for survivorship bias",
        )
    } else {
        ValidationResult::pass()
    }
}

/// History: complex outcomes rarely have exactly one cause
pub fn check_monocausality(text: &str) -> ValidationResult {
    let lower = text.to_lowercase();
    let signals = [
        "solely",
        "the only cause",
        "single cause",
        "entirely due to",
        "only because",
        "the sole reason",
    ];
    if signals.iter().any(|s| lower.contains(s)) {
        ValidationResult::warning("attributes a complex historical outcome to a single cause")
    } else {
        ValidationResult::pass()
    }
}

/// History: factual claims should name where the fact comes from
pub fn check_source_attribution(text: &str) -> ValidationResult {
    let lower = text.to_lowercase();
    let signals = [
        "according to",
        "recorded",
        "documented",
        "source",
        "archive",
        "chronicle",
        "census",
    ];
    if signals.iter().any(|s| lower.contains(s)) {
        ValidationResult::pass()
    } else {
        ValidationResult::warning("historical claim cites no source or record")
    }
}

/// Mathematics: universal quantification needs a stated proof technique
pub fn check_theorem_scope(text: &str) -> ValidationResult {
    let lower = text.to_lowercase();
    let universal = ["for all", "for every", "all integers", "all numbers", "any number"]
        .iter()
        .any(|s| lower.contains(s));
    let proof = ["proof", "induction", "by contradiction", "lemma", "theorem", "qed"]
        .iter()
        .any(|s| lower.contains(s));
    if universal && !proof {
        ValidationResult::warning("universal mathematical claim without a stated proof technique")
    } else {
        ValidationResult::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(seqs: &[u32]) -> Vec<DisplayId> {
        seqs.iter().map(|s| DisplayId::from_seq(*s).unwrap()).collect()
    }

    #[test]
    fn test_tokenize_and_stop_words() {
        let tokens = content_tokens("The cat is on the mat, obviously.");
        assert!(tokens.contains("cat"));
        assert!(tokens.contains("mat"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("is"));
    }

    #[test]
    fn test_citation_validity() {
        let known: BTreeSet<DisplayId> = ids(&[1, 2, 3]).into_iter().collect();

        assert!(check_citation_validity(&ids(&[1, 3]), &known).passed);

        let result = check_citation_validity(&ids(&[2, 9]), &known);
        assert!(!result.passed);
        assert!(result.notes[0].contains("#009"));
    }

    #[test]
    fn test_self_contradiction_polarity_flip() {
        let text = "POSITION: Interest rates drive housing prices upward in coastal markets.\n\
                    CONCLUSION: Interest rates never drive housing prices upward in coastal markets.";
        let result = check_self_contradiction(text, 3);
        assert!(!result.passed);
    }

    #[test]
    fn test_self_contradiction_needs_shared_subject() {
        // Different subjects: polarity difference alone is no contradiction
        let text = "POSITION: Rainfall increases crop yields measurably.\n\
                    CONCLUSION: Volcanic soil is not common in the region.";
        assert!(check_self_contradiction(text, 3).passed);
    }

    #[test]
    fn test_circular_reasoning_thresholds() {
        let circular = "POSITION: Quantum effects dominate microtubule dynamics in neurons.\n\
                        CONCLUSION: Quantum effects dominate microtubule dynamics in neurons.";
        let result = check_circular_reasoning(circular, 0.80, 0.60);
        assert!(!result.passed);

        let fresh = "POSITION: Quantum effects dominate microtubule dynamics in neurons.\n\
                     CONCLUSION: Anesthetic binding experiments could falsify this within a decade.";
        assert!(check_circular_reasoning(fresh, 0.80, 0.60).passed);
    }

    #[test]
    fn test_circular_reasoning_warning_band() {
        // Conclusion reuses most of the position but adds a little
        let text = "POSITION: Tidal forces heat the moon Enceladus internally.\n\
                    CONCLUSION: Tidal forces heat Enceladus internally, explaining its plumes.";
        let result = check_circular_reasoning(text, 0.95, 0.50);
        assert!(result.passed);
        assert_eq!(result.severity, crucible_domain::Severity::Warning);
    }

    #[test]
    fn test_percentage_over_100_flags() {
        let result = check_numeric_consistency("Adoption grew by 140% of the market.", (95.0, 105.0));
        assert!(!result.passed);
    }

    #[test]
    fn test_percentage_sum_near_100_warns() {
        let text = "The total splits as 40% hydro, 35% wind, and 22% solar.";
        let result = check_numeric_consistency(text, (95.0, 105.0));
        assert!(result.passed);
        assert_eq!(result.severity, crucible_domain::Severity::Warning);

        // Exactly 100 is fine
        let exact = "The total splits as 40% hydro, 35% wind, and 25% solar.";
        assert_eq!(check_numeric_consistency(exact, (95.0, 105.0)), ValidationResult::pass());
    }

    #[test]
    fn test_percentage_sum_outside_window_ignored() {
        // 40 + 15 = 55: obviously not meant to cover the whole, no warning
        let text = "In total, 40% use rail and 15% cycle.";
        assert_eq!(check_numeric_consistency(text, (95.0, 105.0)), ValidationResult::pass());
    }

    #[test]
    fn test_reasoning_depth() {
        let shallow = "POSITION: X.\nCONCLUSION: X holds.";
        let result = check_reasoning_depth(shallow, 3);
        assert_eq!(result.severity, crucible_domain::Severity::Warning);

        let deep = "STEP 1: measure.\nSTEP 2: compare.\nSTEP 3: therefore conclude.";
        assert!(check_reasoning_depth(deep, 3).passed);
    }

    #[test]
    fn test_min_steps_for_tier_clamps() {
        let table = [2, 2, 3, 4, 5, 5];
        assert_eq!(min_steps_for_tier(0, &table), 2);
        assert_eq!(min_steps_for_tier(3, &table), 4);
        assert_eq!(min_steps_for_tier(9, &table), 5);
    }

    #[test]
    fn test_empirical_testability() {
        assert!(check_empirical_testability("This is measurable via spectroscopy.").passed);
        let result = check_empirical_testability("Crystals resonate with intention.");
        assert_eq!(result.severity, crucible_domain::Severity::Warning);
    }

    #[test]
    fn test_survivorship_bias() {
        let result =
            check_survivorship_bias("All successful founders wake before five in the morning.");
        assert_eq!(result.severity, crucible_domain::Severity::Warning);
        assert!(check_survivorship_bias("Some funds outperform in bull markets.").passed);
    }

    #[test]
    fn test_monocausality() {
        let result = check_monocausality("The empire fell solely because of lead pipes.");
        assert_eq!(result.severity, crucible_domain::Severity::Warning);
        assert!(check_monocausality("Several pressures combined to end the empire.").passed);
    }

    #[test]
    fn test_theorem_scope() {
        let result = check_theorem_scope("For all integers n, n squared is even.");
        assert_eq!(result.severity, crucible_domain::Severity::Warning);
        assert!(check_theorem_scope("For all integers n, proof by induction on n shows it.").passed);
    }
}
