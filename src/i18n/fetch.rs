//! Retrieval of authoritative dictionaries from the backend.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::i18n::dictionary::Dictionary;
use crate::i18n::error::TranslationError;
use crate::i18n::language::Language;

/// Source of fresh dictionaries. The store makes at most one attempt per
/// bootstrap, switch or reload; implementations should not retry.
pub trait DictionarySource: Send + Sync + 'static {
    /// What: Fetch the dictionary for `language`.
    ///
    /// # Errors
    /// - `Network` on transport failures or non-success responses
    /// - `Decode` when the payload is not a JSON object
    fn fetch_dictionary(
        &self,
        language: Language,
    ) -> impl Future<Output = Result<Dictionary, TranslationError>> + Send;
}

/// `GET {base}/api/language-contents/{lang}/{namespace}` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDictionarySource {
    client: reqwest::Client,
    base_url: String,
    namespace: String,
}

impl HttpDictionarySource {
    /// What: Build a source with its own pooled HTTP client.
    ///
    /// Inputs:
    /// - `base_url`: Backend origin, e.g. `https://api.example.com`
    /// - `namespace`: Dictionary namespace, usually `translation`
    /// - `connect_timeout` / `request_timeout`: transport limits
    ///
    /// # Errors
    /// - Returns `Network` when the HTTP client cannot be constructed (e.g. TLS backend failure)
    pub fn new(
        base_url: &str,
        namespace: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(format!("langsync/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| TranslationError::network(base_url, e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
        })
    }

    /// Endpoint serving `language`'s dictionary.
    #[must_use]
    pub fn endpoint(&self, language: Language) -> String {
        format!(
            "{}/api/language-contents/{}/{}",
            self.base_url,
            language.code(),
            self.namespace
        )
    }
}

impl DictionarySource for HttpDictionarySource {
    async fn fetch_dictionary(&self, language: Language) -> Result<Dictionary, TranslationError> {
        let url = self.endpoint(language);
        tracing::debug!(url = %url, "fetching dictionary");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TranslationError::network(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::network(&url, format!("HTTP {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| TranslationError::network(&url, e))?;
        let dictionary = Dictionary::from_json_str(&body, &url)?;
        tracing::debug!(url = %url, keys = dictionary.len(), "dictionary fetched");
        Ok(dictionary)
    }
}
