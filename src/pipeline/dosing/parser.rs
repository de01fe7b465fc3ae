use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::types::DoseRecommendation;
use super::DosingError;

static DOSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)dose[:\s]*([0-9.]+\s*(?:mg|g|ml|units?))").expect("valid dose regex")
});

static FREQUENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)frequency[:\s]*([0-9]+\s*times?\s*per\s*day)").expect("valid frequency regex")
});

/// Outcome of scanning response text for an embedded JSON object.
#[derive(Debug)]
enum JsonScan {
    /// First balanced `{...}` span that decodes to an object.
    Found(Map<String, Value>),
    /// Balanced spans exist but none decodes; carries the first decode error.
    Undecodable(String),
    /// No balanced `{...}` span anywhere in the text.
    Absent,
}

/// Parse the generation service's answer into a recommendation.
///
/// - Embedded JSON object → its values, with missing keys back-filled.
/// - Braces present but no decodable object → `JsonParsing` error.
/// - No braces at all → heuristic extraction, which never fails.
pub fn parse_dose_response(response: &str) -> Result<DoseRecommendation, DosingError> {
    match scan_json_object(response) {
        JsonScan::Found(map) => Ok(recommendation_from_map(&map, response)),
        JsonScan::Undecodable(e) => Err(DosingError::JsonParsing(e)),
        JsonScan::Absent => Ok(parse_unstructured_response(response)),
    }
}

/// Best-effort extraction from free text: defaults plus dose/frequency regex hits.
pub fn parse_unstructured_response(response: &str) -> DoseRecommendation {
    let mut rec = DoseRecommendation::with_defaults(response);

    if let Some(dose) = DOSE_PATTERN.captures(response).and_then(|c| c.get(1)) {
        rec.calculated_dose = dose.as_str().to_string();
    }
    if let Some(freq) = FREQUENCY_PATTERN.captures(response).and_then(|c| c.get(1)) {
        rec.frequency = freq.as_str().to_string();
    }

    rec
}

/// Find the first syntactically complete JSON object in free text.
/// String literals are tracked so braces inside quoted values don't count.
fn scan_json_object(text: &str) -> JsonScan {
    let mut first_error: Option<String> = None;
    let mut resolved: HashMap<usize, Option<usize>> = HashMap::new();

    for (start, _) in text.char_indices().filter(|(_, c)| *c == '{') {
        if !resolved.contains_key(&start) {
            resolve_braces(text, start, &mut resolved);
        }
        let Some(Some(end)) = resolved.get(&start).copied() else {
            continue;
        };
        let candidate = &text[start..end];
        match serde_json::from_str::<Map<String, Value>>(candidate) {
            Ok(map) => return JsonScan::Found(map),
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    match first_error {
        Some(e) => JsonScan::Undecodable(e),
        None => JsonScan::Absent,
    }
}

/// Match braces from `text[start] == '{'` until that brace closes or the text ends.
///
/// Every brace opened outside a string literal along the way gets its end
/// offset recorded (`None` if it never closes), so each of those positions is
/// scanned once. Braces seen inside a string literal are left unrecorded and
/// get their own scan when reached.
fn resolve_braces(text: &str, start: usize, resolved: &mut HashMap<usize, Option<usize>>) {
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push(start + offset),
            '}' => {
                if let Some(opened) = open.pop() {
                    resolved.entry(opened).or_insert(Some(start + offset + 1));
                }
                if open.is_empty() {
                    return;
                }
            }
            _ => {}
        }
    }

    for opened in open {
        resolved.entry(opened).or_insert(None);
    }
}

/// Build a full recommendation from a decoded object.
/// Absent or null keys take the same defaults as the heuristic path.
fn recommendation_from_map(map: &Map<String, Value>, response: &str) -> DoseRecommendation {
    let defaults = DoseRecommendation::with_defaults(response);
    DoseRecommendation {
        calculated_dose: text_field(map, "calculated_dose", defaults.calculated_dose),
        dose_form: text_field(map, "dose_form", defaults.dose_form),
        frequency: text_field(map, "frequency", defaults.frequency),
        duration: text_field(map, "duration", defaults.duration),
        instructions: text_field(map, "instructions", defaults.instructions),
        warnings: text_field(map, "warnings", defaults.warnings),
        market_formulations: list_field(map, "market_formulations"),
        alternatives: list_field(map, "alternatives"),
        calculation_breakdown: text_field(
            map,
            "calculation_breakdown",
            defaults.calculation_breakdown,
        ),
    }
}

fn text_field(map: &Map<String, Value>, key: &str, default: String) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(value_as_text)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(_)) | Some(Value::Null) | None => default,
    }
}

fn list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(value_as_text).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        Some(v @ (Value::Number(_) | Value::Bool(_))) => vec![v.to_string()],
        _ => Vec::new(),
    }
}

fn value_as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
