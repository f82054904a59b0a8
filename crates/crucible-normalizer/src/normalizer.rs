//! Core normalizer implementation

use crucible_domain::traits::{CompletionProvider, CompletionRequest};
use crucible_domain::{ClaimType, DisplayId, StructuredClaim};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

const EXTRACTION_SYSTEM_PROMPT: &str = "You convert free-form research claims into JSON. \
Respond with a single JSON object with keys: claim_type, position, reasoning_chain \
(array of strings), conclusion, citations (array of '#NNN' strings), keywords \
(array of strings). No prose outside the JSON.";

/// Minimum length for a sentence to count as substantial in the fallback
const SUBSTANTIAL_SENTENCE_LEN: usize = 20;

/// Converts raw claim text into a best-effort structured record
///
/// All patterns are compiled once at construction.
pub struct Normalizer {
    label_re: Regex,
    step_re: Regex,
    citation_re: Regex,
}

impl Normalizer {
    /// Create a normalizer
    pub fn new() -> Self {
        Self {
            // An uppercase label at the start of a line, e.g. "POSITION:"
            label_re: Regex::new(r"(?m)^\s*([A-Z][A-Z0-9 ]{1,30}?)\s*:\s*(.*)$")
                .expect("label pattern is valid"),
            step_re: Regex::new(r"(?m)^\s*STEP\s+(\d+)\s*:\s*(.+)$")
                .expect("step pattern is valid"),
            citation_re: Regex::new(r"#(\d+)").expect("citation pattern is valid"),
        }
    }

    /// Structure raw claim text; never fails
    ///
    /// Labeled sections win; missing pieces degrade to the sentence
    /// heuristic (first substantial sentence as position, last as
    /// conclusion, zero reasoning steps).
    pub fn normalize(&self, raw_text: &str) -> StructuredClaim {
        let mut claim = StructuredClaim::default();

        if let Some(kind) = self.labeled_section(raw_text, &["CLAIM TYPE", "RESEARCH TYPE"]) {
            claim.claim_type = ClaimType::parse(kind.trim());
        }
        if let Some(position) = self.labeled_section(raw_text, &["POSITION", "HYPOTHESIS"]) {
            claim.position = position;
        }
        if let Some(conclusion) = self.labeled_section(raw_text, &["CONCLUSION"]) {
            claim.conclusion = conclusion;
        }

        for captures in self.step_re.captures_iter(raw_text) {
            claim.reasoning_chain.push(captures[2].trim().to_string());
        }

        // Citations come from the CITATIONS section when declared, otherwise
        // from a whole-text scan
        let citation_source = self
            .labeled_section(raw_text, &["CITATIONS", "DEPENDS ON"])
            .unwrap_or_else(|| raw_text.to_string());
        claim.citations = self.scan_citations(&citation_source);

        if let Some(keywords) = self.labeled_section(raw_text, &["KEYWORDS"]) {
            claim.keywords = keywords
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }

        if claim.position.is_empty() || claim.conclusion.is_empty() {
            self.apply_sentence_fallback(raw_text, &mut claim);
        }

        claim
    }

    /// Structure raw claim text with LLM assistance
    ///
    /// Any provider or parse failure falls back to [`Normalizer::normalize`];
    /// the result is always a usable structure.
    pub fn normalize_with<P>(&self, provider: &P, raw_text: &str) -> StructuredClaim
    where
        P: CompletionProvider,
        P::Error: std::fmt::Display,
    {
        let request = CompletionRequest::extraction(EXTRACTION_SYSTEM_PROMPT, raw_text);
        match provider.complete(&request) {
            Ok(response) => match self.parse_structured_response(&response.content) {
                Some(claim) => claim,
                None => {
                    warn!("structured extraction returned unusable JSON, using heuristics");
                    self.normalize(raw_text)
                }
            },
            Err(e) => {
                warn!(error = %e, "structured extraction call failed, using heuristics");
                self.normalize(raw_text)
            }
        }
    }

    /// Parse the provider's JSON into a claim; None when unusable
    fn parse_structured_response(&self, content: &str) -> Option<StructuredClaim> {
        let json_str = extract_json(content)?;
        let value: Value = serde_json::from_str(&json_str).ok()?;
        let obj = value.as_object()?;

        let position = obj.get("position")?.as_str()?.trim().to_string();
        if position.is_empty() {
            return None;
        }

        let claim_type = obj
            .get("claim_type")
            .and_then(Value::as_str)
            .map(ClaimType::parse)
            .unwrap_or(ClaimType::Discovery);
        let conclusion = obj
            .get("conclusion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let reasoning_chain = string_array(obj.get("reasoning_chain"));
        let keywords = string_array(obj.get("keywords"));
        let citations = string_array(obj.get("citations"))
            .iter()
            .flat_map(|s| self.scan_citations(s))
            .collect();

        debug!(steps = reasoning_chain.len(), "structured extraction succeeded");
        Some(StructuredClaim {
            claim_type,
            position,
            reasoning_chain,
            conclusion,
            citations,
            keywords,
        })
    }

    /// Content of the first matching labeled section
    ///
    /// A section runs from its label to the next label or end of text.
    fn labeled_section(&self, text: &str, labels: &[&str]) -> Option<String> {
        let matches: Vec<(usize, usize, String, String)> = self
            .label_re
            .captures_iter(text)
            .filter_map(|c| {
                let whole = c.get(0)?;
                Some((
                    whole.start(),
                    whole.end(),
                    c[1].trim().to_string(),
                    c[2].trim().to_string(),
                ))
            })
            .collect();

        for (i, (_, end, label, first_line)) in matches.iter().enumerate() {
            if !labels.contains(&label.as_str()) {
                continue;
            }
            let section_end = matches
                .get(i + 1)
                .map(|(next_start, ..)| *next_start)
                .unwrap_or(text.len());
            let rest = text[*end..section_end].trim();
            let content = if rest.is_empty() {
                first_line.clone()
            } else if first_line.is_empty() {
                rest.to_string()
            } else {
                format!("{} {}", first_line, rest)
            };
            let content = content.trim().to_string();
            if !content.is_empty() {
                return Some(content);
            }
        }
        None
    }

    /// All `#NNN` references in the text, deduplicated, in first-seen order
    fn scan_citations(&self, text: &str) -> Vec<DisplayId> {
        let mut seen = Vec::new();
        for captures in self.citation_re.captures_iter(text) {
            if let Some(id) = captures[1].parse::<u32>().ok().and_then(DisplayId::from_seq) {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        seen
    }

    /// First substantial sentence as position, last as conclusion
    fn apply_sentence_fallback(&self, raw_text: &str, claim: &mut StructuredClaim) {
        let sentences: Vec<&str> = raw_text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| s.len() >= SUBSTANTIAL_SENTENCE_LEN)
            .collect();

        let (position, conclusion) = match sentences.as_slice() {
            [] => {
                let whole = raw_text.trim();
                (whole.to_string(), whole.to_string())
            }
            [only] => (only.to_string(), only.to_string()),
            [first, .., last] => (first.to_string(), last.to_string()),
        };

        if claim.position.is_empty() {
            claim.position = position;
        }
        if claim.conclusion.is_empty() {
            claim.conclusion = conclusion;
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the first balanced JSON object from a response
///
/// Tolerates markdown code fences and prose around the object; tracks brace
/// depth while respecting string literals and escapes.
fn extract_json(response: &str) -> Option<String> {
    let start = response.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in response[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
