use itertools::Itertools;
use regex::Regex;

use crate::{configuration::SanitizeSettings, domain::CandidateDomain};

// Every label starts and ends alphanumeric.
const COM_DOMAIN_PATTERN: &str = r"^([a-z0-9]([a-z0-9-]*[a-z0-9])?\.)+com$";

pub struct Sanitizer {
    settings: SanitizeSettings,
    deny_list: Vec<String>,
    shape: Regex,
}

impl Sanitizer {
    pub fn new(settings: SanitizeSettings) -> Result<Self, regex::Error> {
        let deny_list = settings
            .deny_list
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Ok(Sanitizer {
            settings,
            deny_list,
            shape: Regex::new(COM_DOMAIN_PATTERN)?,
        })
    }

    pub fn sanitize<I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = CandidateDomain>,
    {
        candidates
            .into_iter()
            .map(|candidate| candidate.0.trim().to_lowercase())
            .filter(|domain| self.accepts(domain))
            .unique()
            .sorted()
            .collect()
    }

    pub fn accepts(&self, domain: &str) -> bool {
        let length = domain.chars().count();
        if length < self.settings.min_length || length >= self.settings.max_length {
            log::debug!("Dropping {}: length {} out of bounds", domain, length);
            return false;
        }

        if !self.shape.is_match(domain) {
            log::debug!("Dropping {}: not a .com domain", domain);
            return false;
        }

        match self
            .deny_list
            .iter()
            .find(|denied| domain.contains(denied.as_str()))
        {
            Some(denied) => {
                log::debug!("Dropping {}: matches deny-list entry {}", domain, denied);
                false
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Sanitizer;
    use crate::{configuration::SanitizeSettings, domain::CandidateDomain};

    fn sanitizer() -> Sanitizer {
        Sanitizer::new(SanitizeSettings::default()).unwrap()
    }

    fn candidates(raw: &[&str]) -> Vec<CandidateDomain> {
        raw.iter().map(|d| CandidateDomain::full(d)).collect()
    }

    #[test]
    fn sanitize_lowercases_and_dedups() {
        let result = sanitizer().sanitize(candidates(&["Zulu.com", "alpha.com", "ZULU.COM", "alpha.com"]));
        assert_eq!(result, vec!["alpha.com", "zulu.com"]);
    }

    #[test]
    fn sanitize_length_bounds() {
        let long = format!("{}.com", "a".repeat(46));
        let just_under = format!("{}.com", "b".repeat(45));
        let result = sanitizer().sanitize(candidates(&["a.com", ".com", "ab.com", &long, &just_under]));
        assert_eq!(result, vec!["a.com".to_string(), "ab.com".to_string(), just_under]);
    }

    #[test]
    fn sanitize_deny_list() {
        let result = sanitizer().sanitize(candidates(&[
            "namegrep.com",
            "code.jquery.com",
            "www.google.com",
            "keeper.com",
            "api.github.com",
        ]));
        assert_eq!(result, vec!["keeper.com"]);
    }

    #[test]
    fn sanitize_non_com_rejected() {
        let result = sanitizer().sanitize(candidates(&[
            "shop.net",
            "bad domain.com",
            "-dash.com",
            "ok-dash.com",
            "abc-.com",
            "a..b.com",
            "sub.-x.com",
            "sub.ok.com",
        ]));
        assert_eq!(result, vec!["ok-dash.com", "sub.ok.com"]);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let first = sanitizer().sanitize(candidates(&[
            "Mike.com",
            "november.com",
            "mike.com",
            "amazon.com",
            "x.com",
        ]));
        let second = sanitizer().sanitize(first.iter().map(|d| CandidateDomain::full(d)));
        assert_eq!(first, second);
    }

    #[test]
    fn sanitize_output_properties_hold() {
        let raw = [
            "Alpha.com", "alpha.COM", "b.com", "namegrep.com", "charlie.org", "delta.com",
            "google.com", "echo.example.com", "foxtrot.com",
        ];
        let result = sanitizer().sanitize(candidates(&raw));

        for domain in &result {
            assert!(domain.ends_with(".com"));
            assert!(domain.len() >= 5 && domain.len() < 50);
            assert_eq!(domain, &domain.to_lowercase());
            assert!(!domain.contains("namegrep.com"));
            assert!(!domain.contains("google.com"));
        }
        let mut deduped = result.clone();
        deduped.dedup();
        assert_eq!(deduped, result);
        assert_eq!(result, vec!["alpha.com", "b.com", "delta.com", "foxtrot.com"]);
    }

    #[test]
    fn sanitize_custom_bounds() {
        let settings = SanitizeSettings {
            min_length: 8,
            max_length: 12,
            deny_list: vec![],
        };
        let result = Sanitizer::new(settings)
            .unwrap()
            .sanitize(candidates(&["abc.com", "abcde.com", "abcdefgh.com"]));
        assert_eq!(result, vec!["abcde.com"]);
    }
}
