use crate::{
    configuration::SanitizeSettings,
    domain::{ExtractionError, RawResponse},
};

use super::{classify, Extractor, Sanitizer, SearchPhase, SearchTrace};

pub struct ResponseProcessor {
    extractor: Extractor,
    sanitizer: Sanitizer,
}

impl ResponseProcessor {
    pub fn new(
        result_selector: &str,
        sanitize: SanitizeSettings,
    ) -> Result<Self, ExtractionError> {
        Ok(ResponseProcessor {
            extractor: Extractor::new(result_selector)?,
            sanitizer: Sanitizer::new(sanitize)
                .map_err(|e| ExtractionError::Setup(format!("bad domain shape: {}", e)))?,
        })
    }

    pub fn process(&self, response: &RawResponse, trace: &mut SearchTrace) -> Vec<String> {
        trace.enter(SearchPhase::Classifying);
        let shape = classify(response);

        trace.enter(SearchPhase::Extracting);
        let candidates = match self.extractor.extract(response, &shape) {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!(
                    "[{}] Could not extract domains from {} response: {}",
                    trace.id,
                    response.strategy,
                    e
                );
                vec![]
            }
        };

        trace.enter(SearchPhase::Sanitizing);
        let candidate_count = candidates.len();
        let domains = self.sanitizer.sanitize(candidates);
        log::info!(
            "[{}] {} response: {} candidates, {} kept",
            trace.id,
            response.strategy,
            candidate_count,
            domains.len()
        );

        domains
    }
}
