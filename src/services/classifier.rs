use serde_json::Value;

use crate::domain::{RawResponse, ResponseBody};

pub const LIST_FIELDS: [&str; 6] = ["domains", "results", "data", "names", "items", "matches"];

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    StringList(Vec<String>),
    Records(Vec<Value>),
    SingleRecord(Value),
    Markup,
    ResultElements,
    UnknownJson(Vec<String>),
    Empty,
}

pub fn classify(response: &RawResponse) -> ResponseShape {
    let text = match &response.body {
        ResponseBody::Elements(_) => return ResponseShape::ResultElements,
        ResponseBody::Json(text) | ResponseBody::Markup(text) => text.trim(),
    };

    if text.is_empty() {
        return ResponseShape::Empty;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(json) => classify_json(json),
        Err(e) => {
            if let ResponseBody::Json(_) = response.body {
                log::warn!(
                    "Body from {} was labelled json but failed to parse: {}",
                    response.strategy,
                    e
                );
            }
            ResponseShape::Markup
        }
    }
}

fn classify_json(json: Value) -> ResponseShape {
    match json {
        Value::Array(items) => classify_list(items),
        Value::Object(mut map) => {
            let list_field = LIST_FIELDS
                .iter()
                .find(|field| map.get(**field).is_some_and(Value::is_array));
            if let Some(Value::Array(items)) = list_field.and_then(|field| map.remove(*field)) {
                return classify_list(items);
            }

            let record = Value::Object(map);
            match looks_like_record(&record) {
                true => ResponseShape::SingleRecord(record),
                false => ResponseShape::UnknownJson(
                    record
                        .as_object()
                        .map(|m| m.keys().cloned().collect())
                        .unwrap_or_default(),
                ),
            }
        }
        // A bare JSON string or number; treat it as text so the domain regex can
        // still find something in it.
        Value::String(_) => ResponseShape::Markup,
        _ => ResponseShape::UnknownJson(vec![]),
    }
}

fn classify_list(items: Vec<Value>) -> ResponseShape {
    match items.iter().all(Value::is_string) {
        true => ResponseShape::StringList(
            items
                .into_iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect(),
        ),
        false => ResponseShape::Records(items),
    }
}

fn looks_like_record(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    super::extractor::DOMAIN_FIELDS
        .iter()
        .chain(super::extractor::LABEL_FIELDS.iter())
        .any(|field| map.get(*field).is_some_and(Value::is_string))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{classify, ResponseShape};
    use crate::domain::{RawResponse, ResponseBody, ResultElement, StrategyId};

    fn json_response(body: &str) -> RawResponse {
        RawResponse::new(
            StrategyId::DirectHttp,
            Some(200),
            ResponseBody::Json(body.to_string()),
        )
    }

    fn markup_response(body: &str) -> RawResponse {
        RawResponse::new(
            StrategyId::DirectHttp,
            Some(200),
            ResponseBody::Markup(body.to_string()),
        )
    }

    #[test]
    fn classify_root_string_array() {
        let shape = classify(&json_response(r#"["foo.com","bar.org"]"#));
        assert_eq!(
            shape,
            ResponseShape::StringList(vec!["foo.com".to_string(), "bar.org".to_string()])
        );
    }

    #[test]
    fn classify_nested_record_list() {
        for field in ["domains", "results", "data"] {
            let body = format!(r#"{{"{}":[{{"id":"shopify","mask":0}}]}}"#, field);
            let shape = classify(&json_response(&body));
            assert_eq!(
                shape,
                ResponseShape::Records(vec![json!({"id": "shopify", "mask": 0})])
            );
        }
    }

    #[test]
    fn classify_single_record() {
        let shape = classify(&json_response(r#"{"name":"alpha","tlds":["com"]}"#));
        assert!(matches!(shape, ResponseShape::SingleRecord(_)));
    }

    #[test]
    fn classify_unknown_json() {
        let shape = classify(&json_response(r#"{"status":"ok","total":3}"#));
        match shape {
            ResponseShape::UnknownJson(mut keys) => {
                keys.sort();
                assert_eq!(keys, vec!["status", "total"]);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn classify_html_falls_back_to_markup() {
        let shape = classify(&markup_response("<html><body>alpha.com</body></html>"));
        assert_eq!(shape, ResponseShape::Markup);

        // Mislabelled content type still falls back.
        let shape = classify(&json_response("<div class=\"domain\">alpha</div>"));
        assert_eq!(shape, ResponseShape::Markup);
    }

    #[test]
    fn classify_markup_that_is_really_json() {
        let shape = classify(&markup_response(r#"{"results":["a.com"]}"#));
        assert_eq!(shape, ResponseShape::StringList(vec!["a.com".to_string()]));
    }

    #[test]
    fn classify_elements_and_empty() {
        let elements = RawResponse::new(
            StrategyId::WaitAndScrape,
            None,
            ResponseBody::Elements(vec![ResultElement::new("alpha")]),
        );
        assert_eq!(classify(&elements), ResponseShape::ResultElements);
        assert_eq!(classify(&markup_response("   ")), ResponseShape::Empty);
    }
}
