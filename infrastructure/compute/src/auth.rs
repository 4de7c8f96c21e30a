use std::fmt;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    Method,
};
use sha2::Sha256;
use url::Url;

/// Account name, endpoint and decoded shared key of a batch account.
#[derive(Clone)]
pub struct BatchCredential {
    account_name: String,
    account_url: Url,
    key: Vec<u8>,
}

impl fmt::Debug for BatchCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchCredential")
            .field("account_name", &self.account_name)
            .field("account_url", &self.account_url.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

impl BatchCredential {
    /// `account_key` is the base64 key shown on the account's keys page.
    pub fn new(account_name: &str, account_url: &str, account_key: &str) -> anyhow::Result<Self> {
        let account_url = Url::parse(account_url)
            .with_context(|| format!("Batch account url {account_url} is not a valid url"))?;
        let key = STANDARD
            .decode(account_key.trim())
            .context("Batch account key is not valid base64")?;
        Ok(Self {
            account_name: account_name.to_string(),
            account_url,
            key,
        })
    }

    pub fn account_url(&self) -> &Url {
        &self.account_url
    }

    /// Value of the `Authorization` header for `request`.
    pub(crate) fn authorization(&self, request: &CanonicalRequest) -> anyhow::Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .context("Batch account key can't be used as a signing key")?;
        mac.update(request.string_to_sign(&self.account_name).as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{signature}", self.account_name))
    }
}

/// The parts of an outgoing request covered by the shared key signature.
pub(crate) struct CanonicalRequest<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub headers: &'a HeaderMap,
    pub content_length: usize,
}

impl CanonicalRequest<'_> {
    pub fn string_to_sign(&self, account_name: &str) -> String {
        let content_type = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let content_length = match self.content_length {
            0 => String::new(),
            n => n.to_string(),
        };
        // Content-Encoding, Content-Language, Content-MD5, Date and the conditional
        // headers are never sent, `ocp-date` stands in for Date.
        let mut lines = vec![
            self.method.as_str().to_string(),
            String::new(),
            String::new(),
            content_length,
            String::new(),
            content_type.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ];
        lines.extend(self.canonicalized_headers());
        lines.push(self.canonicalized_resource(account_name));
        lines.join("\n")
    }

    fn canonicalized_headers(&self) -> Vec<String> {
        let mut headers = self
            .headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("ocp-"))
            .map(|(name, value)| {
                format!(
                    "{}:{}",
                    name.as_str(),
                    value.to_str().unwrap_or_default().trim()
                )
            })
            .collect::<Vec<_>>();
        headers.sort();
        headers
    }

    fn canonicalized_resource(&self, account_name: &str) -> String {
        let mut resource = format!("/{account_name}{}", self.url.path());
        let mut params = Vec::<(String, Vec<String>)>::new();
        for (name, value) in self.url.query_pairs() {
            let name = name.to_lowercase();
            match params.iter_mut().find(|(n, _)| *n == name) {
                Some((_, values)) => values.push(value.into_owned()),
                None => params.push((name, vec![value.into_owned()])),
            }
        }
        params.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, mut values) in params {
            values.sort();
            resource.push_str(&format!("\n{name}:{}", values.join(",")));
        }
        resource
    }
}
