//! In-band response validation
//!
//! The gateway signals some failures inside an HTTP 200 body rather than via
//! status codes. Detection is pluggable so the contract can be formalized
//! later without touching callers; the default scans for failure keywords,
//! which is what the gateway actually emits today.

/// Decides whether an otherwise-successful response body reports a failure
pub trait ResponseValidator: Send + Sync {
    /// `Err` carries a short description of the in-band failure
    fn check(&self, body: &str) -> Result<(), String>;
}

/// Case-insensitive keyword scan over the whole body
#[derive(Debug, Clone)]
pub struct KeywordValidator {
    keywords: Vec<String>,
}

impl KeywordValidator {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for KeywordValidator {
    fn default() -> Self {
        Self::new(["error", "failed", "fail"])
    }
}

impl ResponseValidator for KeywordValidator {
    fn check(&self, body: &str) -> Result<(), String> {
        let lowered = body.to_lowercase();
        for keyword in &self.keywords {
            if lowered.contains(keyword.as_str()) {
                return Err(format!("response body contains '{}'", keyword));
            }
        }
        Ok(())
    }
}
