use regex::Regex;
use scraper::{Html, Node, Selector};
use serde_json::{Map, Value};
use url::Url;

use crate::domain::{
    CandidateDomain, ExtractionError, RawResponse, ResponseBody, ResultElement,
    UpstreamLimitWarning,
};

use super::ResponseShape;

pub const DOMAIN_FIELDS: [&str; 7] = ["domain", "fqdn", "full", "url", "name", "label", "id"];
pub const LABEL_FIELDS: [&str; 5] = ["name", "label", "id", "base", "word"];

const TLD_FIELDS: [&str; 4] = ["tld", "tlds", "available", "availability"];
const TLD_NAME_FIELDS: [&str; 2] = ["tld", "tlds"];
const AVAILABILITY_FLAGS: [&str; 2] = ["available", "availability"];
const MASK_FLAGS: [&str; 2] = ["mask", "masked"];
const UNAVAILABLE_FLAGS: [&str; 3] = ["unavailable", "taken", "registered"];
const UNAVAILABLE_MARKERS: [&str; 6] = ["taken", "unavailable", "registered", "masked", "✗", "✘"];
const AVAILABLE_WORDS: [&str; 7] = ["available", "free", "open", "yes", "true", "✓", "✔"];

const DOMAIN_PATTERN: &str = r"\b[a-zA-Z0-9][a-zA-Z0-9.-]*\.com\b";
const BARE_NAME_PATTERN: &str = r"^[a-zA-Z0-9][a-zA-Z0-9.-]*$";

pub struct Extractor {
    domain_regex: Regex,
    bare_name_regex: Regex,
    result_selector: String,
}

impl Extractor {
    pub fn new(result_selector: &str) -> Result<Self, ExtractionError> {
        Selector::parse(result_selector)
            .map_err(|e| ExtractionError::Setup(format!("bad result selector: {}", e)))?;

        Ok(Extractor {
            domain_regex: Regex::new(DOMAIN_PATTERN)
                .map_err(|e| ExtractionError::Setup(e.to_string()))?,
            bare_name_regex: Regex::new(BARE_NAME_PATTERN)
                .map_err(|e| ExtractionError::Setup(e.to_string()))?,
            result_selector: result_selector.to_string(),
        })
    }

    pub fn extract(
        &self,
        response: &RawResponse,
        shape: &ResponseShape,
    ) -> Result<Vec<CandidateDomain>, ExtractionError> {
        match shape {
            ResponseShape::StringList(items) => Ok(items
                .iter()
                .filter_map(|item| com_string(item))
                .collect()),
            ResponseShape::Records(items) => Ok(items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => com_string(s),
                    Value::Object(record) => candidate_from_record(record),
                    _ => None,
                })
                .collect()),
            ResponseShape::SingleRecord(record) => Ok(record
                .as_object()
                .and_then(candidate_from_record)
                .into_iter()
                .collect()),
            ResponseShape::ResultElements => match &response.body {
                ResponseBody::Elements(elements) => Ok(self.candidates_from_elements(elements)),
                _ => Ok(vec![]),
            },
            ResponseShape::Markup => match response.text() {
                Some(text) => self.candidates_from_markup(text),
                None => Ok(vec![]),
            },
            ResponseShape::UnknownJson(keys) => {
                Err(ExtractionError::UnknownJsonShape(keys.join(", ")))
            }
            ResponseShape::Empty => Err(ExtractionError::EmptyBody),
        }
    }

    pub fn scan_text(&self, text: &str) -> Vec<CandidateDomain> {
        self.domain_regex
            .find_iter(text)
            .map(|m| CandidateDomain::full(m.as_str()))
            .collect()
    }

    pub fn candidates_from_elements(&self, elements: &[ResultElement]) -> Vec<CandidateDomain> {
        elements
            .iter()
            .filter(|element| !element_masked(element))
            .flat_map(|element| self.candidates_from_element(element))
            .collect()
    }

    fn candidates_from_element(&self, element: &ResultElement) -> Vec<CandidateDomain> {
        let text = element.text.trim();
        let first_line = text.lines().next().unwrap_or_default().trim();

        if self.bare_name_regex.is_match(first_line) {
            let lower = first_line.to_lowercase();
            if lower.ends_with(".com") {
                return vec![CandidateDomain::full(&lower)];
            }
            if !lower.contains('.') {
                return vec![CandidateDomain::from_label(&lower)];
            }
        }

        self.scan_text(text)
    }

    fn candidates_from_markup(&self, markup: &str) -> Result<Vec<CandidateDomain>, ExtractionError> {
        let selector = Selector::parse(&self.result_selector)
            .map_err(|e| ExtractionError::Setup(format!("bad result selector: {}", e)))?;
        let document = Html::parse_document(markup);

        let elements: Vec<ResultElement> = document
            .select(&selector)
            .map(|element| ResultElement {
                text: element.text().collect::<Vec<_>>().join("\n"),
                classes: element.value().classes().map(|c| c.to_string()).collect(),
            })
            .collect();

        match elements.is_empty() {
            false => Ok(self.candidates_from_elements(&elements)),
            true => Ok(visible_text(&document)
                .iter()
                .flat_map(|text| self.scan_text(text))
                .collect()),
        }
    }
}

pub fn visible_text(document: &Html) -> Vec<String> {
    document
        .tree
        .nodes()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .is_some_and(|name| matches!(name, "script" | "style" | "noscript"));
            let text = text.trim();
            match hidden || text.is_empty() {
                true => None,
                false => Some(text.to_string()),
            }
        })
        .collect()
}

pub fn detect_limit_warning(text: &str, markers: &[String]) -> Option<UpstreamLimitWarning> {
    let lowered_markers: Vec<String> = markers.iter().map(|m| m.to_lowercase()).collect();

    text.lines()
        .map(str::trim)
        .find(|line| {
            let line = line.to_lowercase();
            lowered_markers
                .iter()
                .any(|marker| !marker.is_empty() && line.contains(marker.as_str()))
        })
        .map(|line| UpstreamLimitWarning {
            message: line.chars().take(200).collect(),
        })
}

pub fn detect_limit_warning_in_markup(
    markup: &str,
    markers: &[String],
) -> Option<UpstreamLimitWarning> {
    let document = Html::parse_document(markup);
    detect_limit_warning(&visible_text(&document).join("\n"), markers)
}

pub fn detect_limit_warning_in_body(
    response: &RawResponse,
    markers: &[String],
) -> Option<UpstreamLimitWarning> {
    match &response.body {
        ResponseBody::Markup(markup) => detect_limit_warning_in_markup(markup, markers),
        ResponseBody::Json(text) => detect_limit_warning(text, markers),
        ResponseBody::Elements(_) => None,
    }
}

fn com_string(item: &str) -> Option<CandidateDomain> {
    let trimmed = item.trim();
    match trimmed.to_lowercase().ends_with(".com") {
        true => Some(CandidateDomain::full(trimmed)),
        false => None,
    }
}

fn candidate_from_record(record: &Map<String, Value>) -> Option<CandidateDomain> {
    if record_masked(record) {
        return None;
    }

    if let Some(full) = DOMAIN_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .find(|value| value.contains('.'))
    {
        let host = host_of(full);
        return match host.to_lowercase().ends_with(".com") {
            true => Some(CandidateDomain::full(&host)),
            false => None,
        };
    }

    let label = LABEL_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())?;

    match com_availability(record) {
        Some(false) => None,
        _ => Some(CandidateDomain::from_label(label)),
    }
}

fn host_of(value: &str) -> String {
    match Url::parse(value) {
        Ok(url) => url
            .host_str()
            .map(|h| h.to_string())
            .unwrap_or_else(|| value.to_string()),
        Err(_) => value.trim().to_string(),
    }
}

// `None` when the record carries no TLD indicator at all, which counts as
// available. Only `tld`/`tlds` strings name a TLD; a string under
// `available`/`availability` is an availability word, read by `record_masked`.
fn com_availability(record: &Map<String, Value>) -> Option<bool> {
    TLD_FIELDS.iter().find_map(|field| {
        let value = record.get(*field)?;
        match value {
            Value::String(tld) if TLD_NAME_FIELDS.contains(field) => Some(is_com(tld)),
            Value::Array(tlds) => Some(
                tlds.iter()
                    .filter_map(Value::as_str)
                    .any(is_com),
            ),
            Value::Object(map) => Some(
                map.iter()
                    .find(|(tld, _)| is_com(tld))
                    .is_some_and(|(_, status)| status_available(status)),
            ),
            _ => None,
        }
    })
}

fn is_com(tld: &str) -> bool {
    tld.trim().trim_start_matches('.').eq_ignore_ascii_case("com")
}

fn status_available(status: &Value) -> bool {
    match status {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            AVAILABLE_WORDS.iter().any(|word| s == *word)
        }
        _ => false,
    }
}

fn flag_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

// Word markers match whole words only ("unregistered" is not "registered");
// symbol markers match anywhere.
fn has_marker(text: &str, markers: &[&str]) -> bool {
    let text = text.to_lowercase();
    markers.iter().any(|marker| {
        match marker.chars().all(char::is_alphanumeric) {
            true => text
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *marker),
            false => text.contains(marker),
        }
    })
}

fn record_masked(record: &Map<String, Value>) -> bool {
    let flagged = MASK_FLAGS
        .iter()
        .chain(UNAVAILABLE_FLAGS.iter())
        .filter_map(|field| record.get(*field))
        .any(flag_set);

    let status_taken = record
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| has_marker(status, &UNAVAILABLE_FLAGS));

    // Scalar availability flags; maps and lists under these keys are TLD
    // indicators and belong to `com_availability`.
    let marked_unavailable = AVAILABILITY_FLAGS
        .iter()
        .filter_map(|field| record.get(*field))
        .any(|value| match value {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => !status_available(value),
            _ => false,
        });

    flagged || status_taken || marked_unavailable
}

// The first line is the label itself.
fn element_masked(element: &ResultElement) -> bool {
    let class_masked = element.classes.iter().any(|class| {
        let class = class.to_lowercase();
        UNAVAILABLE_MARKERS.iter().any(|marker| class == *marker)
    });

    let text_masked = element
        .text
        .trim()
        .lines()
        .skip(1)
        .any(|line| has_marker(line, &UNAVAILABLE_MARKERS));

    class_masked || text_masked
}
