//! Anchor checks: concrete computation and fact lookup
//!
//! Anchors go beyond pattern heuristics: they recompute arithmetic, compare
//! quoted physical constants against reference values, check dated events
//! against a fact table, and recompute financial formulas. Rule tables are
//! data-driven so adding an anchor means adding a row, not a function.
//!
//! Two severities come out of here. Objective falsity (wrong arithmetic,
//! a constant off by more than the ratio band, an anachronism) flags;
//! plausibility findings warn, and a hedged claim ("approximately",
//! "roughly") downgrades a plausibility warning to info because the author
//! already conceded imprecision.

use crucible_domain::ValidationResult;
use regex::Regex;

/// Version tag recorded in every anchor finding, so archived validation
/// notes stay interpretable after the rule tables change
pub const ANCHOR_VERSION: &str = "1.0";

/// Relative tolerance for recomputed arithmetic
const ARITHMETIC_TOLERANCE: f64 = 1e-3;

/// Acceptable ratio band for quoted physical constants
const CONSTANT_RATIO_BAND: (f64, f64) = (0.9, 1.1);

/// Relative tolerance for recomputed compound interest
const COMPOUND_INTEREST_TOLERANCE: f64 = 0.05;

/// Acceptable relative error for Earth measurement claims
const EARTH_FACT_TOLERANCE: f64 = 0.2;

/// Smallest study sample size that escapes the generalizability warning
const SAMPLE_SIZE_MINIMUM: u32 = 30;

/// Hedge words that concede imprecision and soften plausibility findings
const HEDGE_WORDS: &[&str] = &["approximately", "roughly", "about", "around", "estimated", "circa"];

/// Reference physical constants: trigger phrase, display name, expected value
const PHYSICS_CONSTANTS: &[(&str, &str, f64)] = &[
    (r"planck'?s? constant", "Planck's constant", 6.626e-34),
    (r"boltzmann'?s? constant", "Boltzmann's constant", 1.381e-23),
    (r"gravitational constant", "the gravitational constant", 6.674e-11),
    (r"speed of light", "the speed of light", 2.998e8),
];

/// Earth measurements in kilometres: trigger phrase, display name, expected value
const EARTH_FACTS: &[(&str, &str, f64)] = &[
    (
        r"(?:circumference of (?:the )?earth|earth'?s? circumference|equator(?:ial)? circumference)",
        "Earth's circumference",
        40_075.0,
    ),
    (r"(?:radius of (?:the )?earth|earth'?s? radius)", "Earth's radius", 6_371.0),
    (r"(?:diameter of (?:the )?earth|earth'?s? diameter)", "Earth's diameter", 12_742.0),
];

/// Approximate populations: name pattern, display name, expected value
const POPULATIONS: &[(&str, &str, f64)] = &[
    (r"china", "China", 1.4e9),
    (r"india", "India", 1.4e9),
    (r"(?:united states|the usa?\b)", "the United States", 3.3e8),
    (r"(?:the )?world", "the world", 8.0e9),
];

/// Dated events: trigger phrase, display name, expected year, tolerance in years
const DATED_EVENTS: &[(&str, &str, i32, i32)] = &[
    (r"world war (?:ii|2|two) ended", "the end of World War II", 1945, 0),
    (
        r"world war (?:i|1|one) (?:began|started|broke out)",
        "the start of World War I",
        1914,
        0,
    ),
    (r"(?:moon landing|first landed on the moon|apollo 11)", "the Apollo 11 landing", 1969, 0),
    (
        r"french revolution (?:began|started|broke out)",
        "the start of the French Revolution",
        1789,
        1,
    ),
    (r"declaration of independence", "the Declaration of Independence", 1776, 0),
    (
        r"(?:fall of the (?:western )?roman empire|western roman empire fell)",
        "the fall of the western Roman empire",
        476,
        25,
    ),
    (r"(?:gutenberg|movable.type printing press)", "the movable-type printing press", 1440, 15),
];

/// Anachronisms: era pattern, technology pattern, technology name
const ANACHRONISMS: &[(&str, &str, &str)] = &[
    (r"(?:medieval|middle ages)", r"(?:internet|telephone|television|computer)", "electronic technology"),
    (r"ancient (?:rome|greece|egypt)", r"(?:internet|telephone|electricity|airplane|firearm)", "modern technology"),
    (r"roman (?:empire|legions?)", r"(?:gunpowder|cannon|musket)", "gunpowder weaponry"),
];

/// Known impossibility claims in computing
const TECH_IMPOSSIBILITIES: &[(&str, &str)] = &[
    (
        r"(?:proved?|proven|shown|demonstrated)[^.]*\bp\s*(?:=|equals)\s*np\b",
        "P = NP has not been proven",
    ),
    (
        r"solv(?:es?|ed|ing) the halting problem",
        "the halting problem is undecidable",
    ),
    (
        r"comparison sort[^.]*(?:o\(1\)|o\(n\)|faster than n\s*log\s*n)",
        "comparison sorting cannot beat n log n",
    ),
];

/// Treatments with settled negative evidence: claim pattern, note
const DEBUNKED_TREATMENTS: &[(&str, &str)] = &[
    (
        r"vaccines?\s+(?:cause|lead|linked)\s+(?:to\s+)?autism",
        "vaccines causing autism has been thoroughly debunked (the originating study was retracted)",
    ),
    (
        r"homeopathy\s+(?:cures?|treats?|heals?|is effective)",
        "homeopathy shows no efficacy beyond placebo for any condition",
    ),
    (
        r"blood.?letting\s+(?:cures?|treats?|is (?:effective|therapeutic))",
        "bloodletting was abandoned as treatment on clinical evidence",
    ),
];

/// Logical fallacy patterns for philosophy claims
const FALLACY_PATTERNS: &[(&str, &str)] = &[
    (
        r"\beither\b[^.]*\bor\b[^.]*(?:no (?:other|third) (?:option|alternative|possibility)|only two)",
        "false dilemma: more than two alternatives may exist",
    ),
    (
        r"\bnatural\b[^.]*\btherefore\b[^.]*\b(?:good|right|moral|better)\b",
        "naturalistic fallacy: natural does not entail good",
    ),
    (
        r"which (?:in turn )?requires[^.]*which (?:in turn )?requires",
        "unacknowledged infinite regress",
    ),
    (
        r"if\s+[^.]+\bthen\b[^.]+\.[^.]*\b(?:observed|is true|did happen|occurred)\b[^.]*\btherefore\b",
        "affirming the consequent: the observed effect may have other causes",
    ),
];

struct ConstantRule {
    matcher: Regex,
    expected: f64,
    name: &'static str,
}

struct DateRule {
    matcher: Regex,
    expected: i32,
    tolerance: i32,
    name: &'static str,
}

struct PatternRule {
    matcher: Regex,
    note: &'static str,
}

/// Compiled anchor rule tables, routed by domain
///
/// Construction compiles every table once; `run` borrows immutably and is
/// safe to share across claims.
pub struct AnchorSet {
    arithmetic: Regex,
    derivative: Regex,
    simplification: Regex,
    constants: Vec<ConstantRule>,
    absolute_zero: Regex,
    faster_than_light: Regex,
    base_pairing: Regex,
    photosynthesis_inverted: Regex,
    compound_interest: Regex,
    earth_facts: Vec<ConstantRule>,
    populations: Vec<ConstantRule>,
    dated_events: Vec<DateRule>,
    anachronisms: Vec<(Regex, Regex, &'static str)>,
    tech_impossibilities: Vec<PatternRule>,
    gdp_exclusion: Regex,
    sustained_growth: Regex,
    fallacies: Vec<PatternRule>,
    correlation: Regex,
    causation_leap: Regex,
    causation_caveat: Regex,
    debunked_treatments: Vec<PatternRule>,
    debunked_caveat: Regex,
    small_sample: Regex,
}

impl AnchorSet {
    /// Compile all rule tables
    pub fn new() -> Self {
        let sci_number = r"(\d+(?:\.\d+)?)\s*(?:[x×]\s*10\^?\s*|[eE])(-?\d+)";

        let compile = |pattern: &str| Regex::new(pattern).expect("anchor pattern is valid");
        let constant_rule = |&(pattern, name, expected): &(&str, &'static str, f64)| ConstantRule {
            matcher: compile(&format!(r"(?i){}[^.]*?{}", pattern, sci_number)),
            expected,
            name,
        };
        let plain_number_rule =
            |&(pattern, name, expected): &(&str, &'static str, f64)| ConstantRule {
                matcher: compile(&format!(
                    r"(?i){}[^.]*?(\d{{1,3}}(?:,\d{{3}})*(?:\.\d+)?)\s*(?:km|kilomet)",
                    pattern
                )),
                expected,
                name,
            };

        Self {
            arithmetic: compile(
                r"(?i)(\d+(?:\.\d+)?)\s*([-+*/×÷])\s*(\d+(?:\.\d+)?)\s*(?:=|equals|is)\s*(-?\d+(?:\.\d+)?)",
            ),
            derivative: compile(
                r"(?i)derivative of\s+([0-9x^+*/(). -]+?)\s*(?:is|=|equals)\s*([0-9x^+*/(). -]+)",
            ),
            simplification: compile(
                r"(?i)([0-9x^+*/(). -]+?)\s*simplifies to\s*([0-9x^+*/(). -]+)",
            ),
            constants: PHYSICS_CONSTANTS.iter().map(constant_rule).collect(),
            absolute_zero: compile(r"(?i)(-\d+(?:\.\d+)?)\s*(?:°\s*c|degrees? celsius)"),
            faster_than_light: compile(
                r"(?i)(?:travel(?:s|led|ing)?|mov(?:es|ed|ing)|signals?)[^.]*faster than (?:the speed of )?light",
            ),
            base_pairing: compile(
                r"(?i)(adenine|thymine|guanine|cytosine)\s+(?:pairs?|bonds?|binds?)\s+with\s+(\w+)",
            ),
            photosynthesis_inverted: compile(
                r"(?i)photosynthesis[^.]*?(?:produces|releases|emits)[^.]*?carbon dioxide|photosynthesis[^.]*?consumes[^.]*?oxygen",
            ),
            compound_interest: compile(
                r"(?i)\$?\s*(\d{1,3}(?:,\d{3})*(?:\.\d+)?)\s*(?:dollars\s*)?(?:invested\s*)?at\s+(\d+(?:\.\d+)?)\s*%[^.]*?(?:for|over|after)\s+(\d+)\s+years?[^.]*?(?:yields?|grows? to|becomes?|results? in|is worth)\s*\$?\s*(\d{1,3}(?:,\d{3})*(?:\.\d+)?)",
            ),
            earth_facts: EARTH_FACTS.iter().map(plain_number_rule).collect(),
            populations: POPULATIONS
                .iter()
                .map(|&(pattern, name, expected)| ConstantRule {
                    matcher: compile(&format!(
                        r"(?i)population of {}[^.]*?(\d+(?:\.\d+)?)\s*(million|billion)|{}[^.]*?population[^.]*?(\d+(?:\.\d+)?)\s*(million|billion)",
                        pattern, pattern
                    )),
                    expected,
                    name,
                })
                .collect(),
            dated_events: DATED_EVENTS
                .iter()
                .map(|&(pattern, name, expected, tolerance)| DateRule {
                    matcher: compile(&format!(r"(?i){}[^.]*?\b(\d{{3,4}})\b", pattern)),
                    expected,
                    tolerance,
                    name,
                })
                .collect(),
            anachronisms: ANACHRONISMS
                .iter()
                .map(|(era, tech, name)| {
                    (compile(&format!(r"(?i){}", era)), compile(&format!(r"(?i){}", tech)), *name)
                })
                .collect(),
            tech_impossibilities: TECH_IMPOSSIBILITIES
                .iter()
                .map(|&(pattern, note)| PatternRule {
                    matcher: compile(&format!(r"(?i){}", pattern)),
                    note,
                })
                .collect(),
            gdp_exclusion: compile(
                r"(?i)gdp[^.]*?(?:excludes|does not include|ignores|leaves out)[^.]*?(government spending|investment|net exports|consumption)",
            ),
            sustained_growth: compile(
                r"(?i)(\d+(?:\.\d+)?)\s*%[^.]*?growth[^.]*?(?:sustained|indefinitely|forever|every year for|for (?:a )?centur)",
            ),
            fallacies: FALLACY_PATTERNS
                .iter()
                .map(|&(pattern, note)| PatternRule {
                    matcher: compile(&format!(r"(?i){}", pattern)),
                    note,
                })
                .collect(),
            correlation: compile(r"(?i)\b(?:correlat|associat)\w*"),
            causation_leap: compile(
                r"(?i)\b(?:therefore|thus|proves?|causes?|leads? to|results? in)\b",
            ),
            causation_caveat: compile(
                r"(?i)\b(?:caution|caveat|confound\w*|observational)\b|correlation[^.]*not[^.]*causation",
            ),
            debunked_treatments: DEBUNKED_TREATMENTS
                .iter()
                .map(|&(pattern, note)| PatternRule {
                    matcher: compile(&format!(r"(?i){}", pattern)),
                    note,
                })
                .collect(),
            debunked_caveat: compile(
                r"(?i)\b(?:debunked|disproven|false|incorrect|historical|was believed)\b",
            ),
            small_sample: compile(
                r"(?i)(?:(?:study|trial|sample)(?:\s+size)?\s+of|n\s*=)\s*(\d+)\s+(?:patients?|participants?|subjects?|people)",
            ),
        }
    }

    /// Run the anchors for `domain` against the claim text
    pub fn run(&self, domain: &str, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        match domain.to_lowercase().as_str() {
            "mathematics" | "math" => {
                results.extend(self.check_arithmetic(text));
                results.extend(self.check_derivatives(text));
                results.extend(self.check_simplifications(text));
            }
            "physics" => {
                results.extend(self.check_physics_constants(text));
                results.extend(self.check_absolute_zero(text));
                results.extend(self.check_faster_than_light(text));
            }
            "biology" => {
                results.extend(self.check_base_pairing(text));
                results.extend(self.check_photosynthesis(text));
            }
            "finance" => {
                results.extend(self.check_compound_interest(text));
            }
            "technology" => {
                results.extend(self.check_tech_impossibilities(text));
            }
            "geography" => {
                results.extend(self.check_earth_facts(text));
                results.extend(self.check_populations(text));
            }
            "history" => {
                results.extend(self.check_dated_events(text));
                results.extend(self.check_anachronisms(text));
            }
            "economics" => {
                results.extend(self.check_compound_interest(text));
                results.extend(self.check_gdp_identity(text));
                results.extend(self.check_sustained_growth(text));
            }
            "medicine" => {
                results.extend(self.check_debunked_treatments(text));
                results.extend(self.check_correlation_causation(text));
                results.extend(self.check_sample_size(text));
            }
            "philosophy" => {
                results.extend(self.check_fallacies(text));
            }
            _ => {}
        }
        results
    }

    fn check_arithmetic(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for captures in self.arithmetic.captures_iter(text) {
            let (Ok(lhs), Ok(rhs), Ok(claimed)) = (
                captures[1].parse::<f64>(),
                captures[3].parse::<f64>(),
                captures[4].parse::<f64>(),
            ) else {
                continue;
            };
            let computed = match &captures[2] {
                "+" => lhs + rhs,
                "-" => lhs - rhs,
                "*" | "×" => lhs * rhs,
                "/" | "÷" if rhs != 0.0 => lhs / rhs,
                _ => continue,
            };
            if (computed - claimed).abs() > ARITHMETIC_TOLERANCE * computed.abs().max(1.0) {
                results.push(flag(format!(
                    "arithmetic recomputes to {}, claim says {}",
                    computed, claimed
                )));
            }
        }
        results
    }

    fn check_derivatives(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for captures in self.derivative.captures_iter(text) {
            let function = trim_expr(&captures[1]);
            let claimed = trim_expr(&captures[2]);
            // Numeric differentiation of the claimed function at the sample
            // points, compared against the stated expression
            let step = 1e-5;
            let disagrees = compare_at_samples(|x| {
                let upper = eval_expr(&function, x + step)?;
                let lower = eval_expr(&function, x - step)?;
                let stated = eval_expr(&claimed, x)?;
                Some(((upper - lower) / (2.0 * step), stated))
            });
            if disagrees == Some(true) {
                results.push(flag(format!(
                    "the derivative of {} is not {}",
                    function, claimed
                )));
            }
        }
        results
    }

    fn check_simplifications(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for captures in self.simplification.captures_iter(text) {
            let original = trim_expr(&captures[1]);
            let simplified = trim_expr(&captures[2]);
            let disagrees = compare_at_samples(|x| {
                Some((eval_expr(&original, x)?, eval_expr(&simplified, x)?))
            });
            if disagrees == Some(true) {
                results.push(flag(format!(
                    "{} does not simplify to {}",
                    original, simplified
                )));
            }
        }
        results
    }

    fn check_physics_constants(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for rule in &self.constants {
            let Some(captures) = rule.matcher.captures(text) else {
                continue;
            };
            let Some(quoted) = parse_scientific(&captures[1], &captures[2]) else {
                continue;
            };
            let ratio = quoted / rule.expected;
            if ratio < CONSTANT_RATIO_BAND.0 || ratio > CONSTANT_RATIO_BAND.1 {
                results.push(flag(format!(
                    "{} is {:e}, claim quotes {:e}",
                    rule.name, rule.expected, quoted
                )));
            }
        }
        results
    }

    fn check_absolute_zero(&self, text: &str) -> Vec<ValidationResult> {
        self.absolute_zero
            .captures_iter(text)
            .filter_map(|c| c[1].parse::<f64>().ok())
            .filter(|t| *t < -273.15)
            .map(|t| flag(format!("{}°C is below absolute zero (-273.15°C)", t)))
            .collect()
    }

    fn check_faster_than_light(&self, text: &str) -> Vec<ValidationResult> {
        if self.faster_than_light.is_match(text) {
            vec![flag("nothing carrying information travels faster than light")]
        } else {
            Vec::new()
        }
    }

    fn check_base_pairing(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for captures in self.base_pairing.captures_iter(text) {
            let base = captures[1].to_lowercase();
            let partner = captures[2].to_lowercase();
            let expected = match base.as_str() {
                "adenine" => &["thymine", "uracil"][..],
                "thymine" => &["adenine"][..],
                "guanine" => &["cytosine"][..],
                "cytosine" => &["guanine"][..],
                _ => continue,
            };
            if !expected.contains(&partner.as_str()) {
                results.push(flag(format!(
                    "base pairing: {} pairs with {}, not {}",
                    base, expected[0], partner
                )));
            }
        }
        results
    }

    fn check_photosynthesis(&self, text: &str) -> Vec<ValidationResult> {
        if self.photosynthesis_inverted.is_match(text) {
            vec![flag("photosynthesis consumes carbon dioxide and releases oxygen")]
        } else {
            Vec::new()
        }
    }

    fn check_compound_interest(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for captures in self.compound_interest.captures_iter(text) {
            let (Some(principal), Ok(rate), Ok(years), Some(claimed)) = (
                parse_grouped(&captures[1]),
                captures[2].parse::<f64>(),
                captures[3].parse::<u32>(),
                parse_grouped(&captures[4]),
            ) else {
                continue;
            };
            let computed = principal * (1.0 + rate / 100.0).powi(years as i32);
            if (computed - claimed).abs() > COMPOUND_INTEREST_TOLERANCE * computed {
                results.push(flag(format!(
                    "compound interest recomputes to {:.2}, claim says {:.2}",
                    computed, claimed
                )));
            }
        }
        results
    }

    fn check_tech_impossibilities(&self, text: &str) -> Vec<ValidationResult> {
        self.tech_impossibilities
            .iter()
            .filter(|rule| rule.matcher.is_match(text))
            .map(|rule| flag(rule.note))
            .collect()
    }

    fn check_earth_facts(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for rule in &self.earth_facts {
            let Some(captures) = rule.matcher.captures(text) else {
                continue;
            };
            let Some(quoted) = parse_grouped(&captures[1]) else {
                continue;
            };
            if (quoted - rule.expected).abs() > EARTH_FACT_TOLERANCE * rule.expected {
                results.push(flag(format!(
                    "{} is roughly {:.0} km, claim says {:.0} km",
                    rule.name, rule.expected, quoted
                )));
            }
        }
        results
    }

    fn check_populations(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for rule in &self.populations {
            let Some(captures) = rule.matcher.captures(text) else {
                continue;
            };
            // The pattern has two alternatives; take whichever side matched
            let (value, unit) = match (captures.get(1), captures.get(3)) {
                (Some(v), _) => (v.as_str(), &captures[2]),
                (None, Some(v)) => (v.as_str(), &captures[4]),
                _ => continue,
            };
            let Ok(value) = value.parse::<f64>() else {
                continue;
            };
            let quoted = match unit.to_lowercase().as_str() {
                "million" => value * 1e6,
                "billion" => value * 1e9,
                _ => continue,
            };
            let factor = quoted / rule.expected;
            if !(0.5..=2.0).contains(&factor) {
                results.push(flag(format!(
                    "population of {} is off by more than a factor of two (near {:.1e}, claim says {:.1e})",
                    rule.name, rule.expected, quoted
                )));
            }
        }
        results
    }

    fn check_dated_events(&self, text: &str) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        for rule in &self.dated_events {
            let Some(captures) = rule.matcher.captures(text) else {
                continue;
            };
            let Ok(year) = captures[1].parse::<i32>() else {
                continue;
            };
            if (year - rule.expected).abs() > rule.tolerance {
                results.push(flag(format!(
                    "{} places the year at {}, record says {}",
                    rule.name, year, rule.expected
                )));
            }
        }
        results
    }

    fn check_anachronisms(&self, text: &str) -> Vec<ValidationResult> {
        self.anachronisms
            .iter()
            .filter(|(era, tech, _)| era.is_match(text) && tech.is_match(text))
            .map(|(_, _, name)| flag(format!("anachronism: {} postdates the era described", name)))
            .collect()
    }

    fn check_gdp_identity(&self, text: &str) -> Vec<ValidationResult> {
        if let Some(captures) = self.gdp_exclusion.captures(text) {
            vec![flag(format!(
                "GDP by expenditure includes {}; the identity is C + I + G + NX",
                &captures[1]
            ))]
        } else {
            Vec::new()
        }
    }

    fn check_sustained_growth(&self, text: &str) -> Vec<ValidationResult> {
        let Some(captures) = self.sustained_growth.captures(text) else {
            return Vec::new();
        };
        let Ok(rate) = captures[1].parse::<f64>() else {
            return Vec::new();
        };
        if rate > 10.0 {
            vec![plausibility(
                text,
                format!("sustained {}% growth compounds implausibly over long horizons", rate),
            )]
        } else {
            Vec::new()
        }
    }

    fn check_fallacies(&self, text: &str) -> Vec<ValidationResult> {
        self.fallacies
            .iter()
            .filter(|rule| rule.matcher.is_match(text))
            .map(|rule| plausibility(text, rule.note))
            .collect()
    }

    fn check_debunked_treatments(&self, text: &str) -> Vec<ValidationResult> {
        // A claim describing the debunking itself is not asserting the
        // treatment works
        if self.debunked_caveat.is_match(text) {
            return Vec::new();
        }
        self.debunked_treatments
            .iter()
            .filter(|rule| rule.matcher.is_match(text))
            .map(|rule| flag(rule.note))
            .collect()
    }

    fn check_correlation_causation(&self, text: &str) -> Vec<ValidationResult> {
        if self.correlation.is_match(text)
            && self.causation_leap.is_match(text)
            && !self.causation_caveat.is_match(text)
        {
            vec![plausibility(
                text,
                "jumps from correlation to causation without acknowledging confounders",
            )]
        } else {
            Vec::new()
        }
    }

    fn check_sample_size(&self, text: &str) -> Vec<ValidationResult> {
        let Some(captures) = self.small_sample.captures(text) else {
            return Vec::new();
        };
        let Ok(n) = captures[1].parse::<u32>() else {
            return Vec::new();
        };
        if n < SAMPLE_SIZE_MINIMUM {
            vec![plausibility(
                text,
                format!("a sample of {} is too small to generalize from", n),
            )]
        } else {
            Vec::new()
        }
    }
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A flag finding tagged with the anchor version
fn flag(note: impl Into<String>) -> ValidationResult {
    ValidationResult::flag(format!("[anchor v{}] {}", ANCHOR_VERSION, note.into()))
}

/// A plausibility finding: warning by default, info when the claim hedges
fn plausibility(text: &str, note: impl Into<String>) -> ValidationResult {
    let tagged = format!("[anchor v{}] {}", ANCHOR_VERSION, note.into());
    let lower = text.to_lowercase();
    if HEDGE_WORDS.iter().any(|w| lower.contains(w)) {
        ValidationResult::info(tagged)
    } else {
        ValidationResult::warning(tagged)
    }
}

/// Sample points for comparing expressions in `x`
///
/// Chosen away from the common singularities and roots of textbook examples;
/// points where either side is non-finite are skipped.
const EXPR_SAMPLE_POINTS: [f64; 5] = [2.0, 3.0, 5.5, 7.25, -1.5];

/// Strip the whitespace and sentence punctuation around a captured expression
fn trim_expr(raw: &str) -> String {
    raw.trim().trim_end_matches('.').trim().to_string()
}

/// Evaluate a pair of expression values at every sample point
///
/// `Some(true)` when any valid point disagrees, `Some(false)` when at least
/// two valid points all agree, `None` when the expressions cannot be
/// evaluated (no verdict: anchors never guess).
fn compare_at_samples<F>(eval_pair: F) -> Option<bool>
where
    F: Fn(f64) -> Option<(f64, f64)>,
{
    let mut agreements = 0;
    for &x in &EXPR_SAMPLE_POINTS {
        let (lhs, rhs) = eval_pair(x)?;
        if !lhs.is_finite() || !rhs.is_finite() {
            continue;
        }
        if (lhs - rhs).abs() > ARITHMETIC_TOLERANCE * lhs.abs().max(1.0) {
            return Some(true);
        }
        agreements += 1;
    }
    if agreements >= 2 {
        Some(false)
    } else {
        None
    }
}

/// Evaluate an expression in one variable `x`
///
/// Grammar: `+ - * /`, right-side `^` exponents, parentheses, unary minus,
/// and implicit multiplication (`2x`, `3(x + 1)`). `None` on anything else.
fn eval_expr(input: &str, x: f64) -> Option<f64> {
    ExprParser::evaluate(input, x)
}

struct ExprParser<'a> {
    bytes: &'a [u8],
    pos: usize,
    x: f64,
}

impl<'a> ExprParser<'a> {
    fn evaluate(input: &'a str, x: f64) -> Option<f64> {
        let mut parser = Self {
            bytes: input.as_bytes(),
            pos: 0,
            x,
        };
        let value = parser.sum()?;
        parser.skip_spaces();
        if parser.pos == parser.bytes.len() {
            Some(value)
        } else {
            None
        }
    }

    fn skip_spaces(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_spaces();
        self.bytes.get(self.pos).copied()
    }

    fn sum(&mut self) -> Option<f64> {
        let mut value = self.product()?;
        loop {
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.product()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.product()?;
                }
                _ => return Some(value),
            }
        }
    }

    fn product(&mut self) -> Option<f64> {
        let mut value = self.power()?;
        loop {
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.power()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    value /= self.power()?;
                }
                // Implicit multiplication: 2x, 3(x + 1), x(x - 1)
                Some(b'x') | Some(b'X') | Some(b'(') => {
                    value *= self.power()?;
                }
                _ => return Some(value),
            }
        }
    }

    fn power(&mut self) -> Option<f64> {
        let base = self.atom()?;
        if self.peek() == Some(b'^') {
            self.pos += 1;
            let exponent = self.atom()?;
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    fn atom(&mut self) -> Option<f64> {
        match self.peek()? {
            b'-' => {
                self.pos += 1;
                Some(-self.atom()?)
            }
            b'(' => {
                self.pos += 1;
                let value = self.sum()?;
                if self.peek() == Some(b')') {
                    self.pos += 1;
                    Some(value)
                } else {
                    None
                }
            }
            b'x' | b'X' => {
                self.pos += 1;
                Some(self.x)
            }
            byte if byte.is_ascii_digit() || byte == b'.' => {
                let start = self.pos;
                while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9' | b'.')) {
                    self.pos += 1;
                }
                std::str::from_utf8(&self.bytes[start..self.pos])
                    .ok()?
                    .parse()
                    .ok()
            }
            _ => None,
        }
    }
}

/// Parse `mantissa` × 10^`exponent`
fn parse_scientific(mantissa: &str, exponent: &str) -> Option<f64> {
    let mantissa: f64 = mantissa.parse().ok()?;
    let exponent: i32 = exponent.parse().ok()?;
    Some(mantissa * 10f64.powi(exponent))
}

/// Parse a number with optional thousands separators
fn parse_grouped(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_domain::Severity;

    fn anchors() -> AnchorSet {
        AnchorSet::new()
    }

    fn first(results: Vec<ValidationResult>) -> ValidationResult {
        results.into_iter().next().expect("a finding")
    }

    #[test]
    fn test_arithmetic_wrong_flags() {
        let result = first(anchors().run("mathematics", "Note that 17 * 23 = 400 in this model."));
        assert!(!result.passed);
        assert!(result.notes[0].contains("391"));
    }

    #[test]
    fn test_arithmetic_correct_passes() {
        assert!(anchors().run("mathematics", "Since 17 * 23 = 391, the count follows.").is_empty());
    }

    #[test]
    fn test_arithmetic_tolerance_for_division() {
        // 10 / 3 = 3.333 is within relative tolerance
        assert!(anchors().run("mathematics", "Observe 10 / 3 = 3.333 here.").is_empty());
    }

    #[test]
    fn test_wrong_derivative_flags() {
        let result =
            first(anchors().run("mathematics", "The derivative of x^2 is 3x, so the slope triples."));
        assert!(!result.passed);
        assert!(result.notes[0].contains("derivative"));
    }

    #[test]
    fn test_correct_derivative_passes() {
        assert!(anchors()
            .run("mathematics", "The derivative of x^3 is 3x^2, giving the growth rate.")
            .is_empty());
    }

    #[test]
    fn test_wrong_simplification_flags() {
        let text = "The ratio (x^2 - 1)/(x - 1) simplifies to x - 1 for all x.";
        let result = first(anchors().run("mathematics", text));
        assert!(!result.passed);
        assert!(result.notes[0].contains("does not simplify"));
    }

    #[test]
    fn test_correct_simplification_passes() {
        let text = "The ratio (x^2 - 1)/(x - 1) simplifies to x + 1 away from x = 1.";
        assert!(anchors().run("mathematics", text).is_empty());
    }

    #[test]
    fn test_planck_constant_off_flags() {
        let text = "Planck's constant is 9.9 x 10^-34 joule-seconds.";
        let result = first(anchors().run("physics", text));
        assert!(!result.passed);
    }

    #[test]
    fn test_planck_constant_close_passes() {
        let text = "Planck's constant is 6.6 x 10^-34 joule-seconds.";
        assert!(anchors().run("physics", text).is_empty());
    }

    #[test]
    fn test_below_absolute_zero_flags() {
        let result = first(anchors().run("physics", "The sample was cooled to -300°C."));
        assert!(!result.passed);
    }

    #[test]
    fn test_faster_than_light_flags() {
        let result =
            first(anchors().run("physics", "The signals travel faster than light in this medium."));
        assert!(!result.passed);
    }

    #[test]
    fn test_wrong_base_pairing_flags() {
        let result = first(anchors().run("biology", "In DNA, adenine pairs with guanine."));
        assert!(!result.passed);
        assert!(result.notes[0].contains("thymine"));
    }

    #[test]
    fn test_correct_base_pairing_passes() {
        assert!(anchors().run("biology", "In DNA, adenine pairs with thymine.").is_empty());
    }

    #[test]
    fn test_photosynthesis_inversion_flags() {
        let result =
            first(anchors().run("biology", "Photosynthesis releases carbon dioxide at night."));
        assert!(!result.passed);
    }

    #[test]
    fn test_compound_interest_wrong_flags() {
        // 1000 at 7% for 10 years is 1967.15, not 5000
        let text = "Investing $1,000 at 7% for 10 years grows to $5,000.";
        let result = first(anchors().run("finance", text));
        assert!(!result.passed);
        assert!(result.notes[0].contains("1967"));
    }

    #[test]
    fn test_compound_interest_close_passes() {
        let text = "Investing $1,000 at 7% for 10 years grows to $1,967.";
        assert!(anchors().run("finance", text).is_empty());
    }

    #[test]
    fn test_halting_problem_flags() {
        let result =
            first(anchors().run("technology", "Our analyzer solves the halting problem for any program."));
        assert!(!result.passed);
    }

    #[test]
    fn test_earth_circumference_off_flags() {
        let result =
            first(anchors().run("geography", "The circumference of the Earth is 60,000 km."));
        assert!(!result.passed);
    }

    #[test]
    fn test_earth_circumference_in_band_passes() {
        assert!(anchors()
            .run("geography", "The circumference of the Earth is 40,000 km.")
            .is_empty());
    }

    #[test]
    fn test_population_off_by_factor_flags() {
        let result =
            first(anchors().run("geography", "The population of China is 100 million people."));
        assert!(!result.passed);
    }

    #[test]
    fn test_dated_event_wrong_year_flags() {
        let result = first(anchors().run("history", "World War II ended in 1952."));
        assert!(!result.passed);
        assert!(result.notes[0].contains("1945"));
    }

    #[test]
    fn test_dated_event_within_tolerance_passes() {
        // The fall of the western Roman empire carries a wide tolerance
        assert!(anchors()
            .run("history", "The western Roman empire fell around 490.")
            .is_empty());
    }

    #[test]
    fn test_anachronism_flags() {
        let result = first(
            anchors().run("history", "Medieval merchants coordinated prices by telephone."),
        );
        assert!(!result.passed);
    }

    #[test]
    fn test_vaccine_autism_claim_flags() {
        let result =
            first(anchors().run("medicine", "Vaccines cause autism in a fraction of recipients."));
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::Flag);
    }

    #[test]
    fn test_debunked_treatment_acknowledged_passes() {
        let text = "The idea that vaccines cause autism was debunked when the study was retracted.";
        assert!(anchors().run("medicine", text).is_empty());
    }

    #[test]
    fn test_homeopathy_cure_claim_flags() {
        let result =
            first(anchors().run("medicine", "Homeopathy cures chronic migraines reliably."));
        assert!(!result.passed);
    }

    #[test]
    fn test_correlation_causation_leap_warns() {
        let text = "Coffee intake correlates with longevity and therefore causes longer life.";
        let result = first(anchors().run("medicine", text));
        assert!(result.passed);
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn test_correlation_with_confounder_caveat_passes() {
        let text = "Coffee intake correlates with longevity and thus may extend life, though \
                    confounding by income remains possible.";
        assert!(anchors().run("medicine", text).is_empty());
    }

    #[test]
    fn test_small_sample_warns() {
        let result =
            first(anchors().run("medicine", "A trial of 12 patients showed full remission."));
        assert_eq!(result.severity, Severity::Warning);
        assert!(result.notes[0].contains("12"));
    }

    #[test]
    fn test_adequate_sample_passes() {
        assert!(anchors()
            .run("medicine", "A trial of 480 patients showed a significant effect.")
            .is_empty());
    }

    #[test]
    fn test_gdp_exclusion_flags() {
        let result =
            first(anchors().run("economics", "GDP excludes government spending by definition."));
        assert!(!result.passed);
    }

    #[test]
    fn test_sustained_growth_warns() {
        let result = first(
            anchors().run("economics", "A 15% growth rate sustained forever doubles output every five years."),
        );
        assert_eq!(result.severity, Severity::Warning);
        assert!(result.passed);
    }

    #[test]
    fn test_hedge_downgrades_plausibility() {
        let text = "Roughly 15% growth sustained forever is the scenario's upper bound.";
        let result = first(anchors().run("economics", text));
        assert_eq!(result.severity, Severity::Info);
    }

    #[test]
    fn test_naturalistic_fallacy_warns() {
        let result = first(
            anchors().run("philosophy", "Competition is natural and therefore good for society."),
        );
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn test_infinite_regress_warns() {
        let text = "Every belief requires a justification, which in turn requires a justification, \
                    which in turn requires another.";
        let result = first(anchors().run("philosophy", text));
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn test_unrouted_domain_yields_nothing() {
        assert!(anchors().run("literature", "2 + 2 = 5 in this novel's logic.").is_empty());
    }

    #[test]
    fn test_findings_carry_version_tag() {
        let result = first(anchors().run("history", "World War II ended in 1952."));
        assert!(result.notes[0].starts_with("[anchor v1.0]"));
    }
}
