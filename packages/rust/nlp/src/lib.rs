//! Clients for the external NLP services qagraph depends on.
//!
//! Tokenization, tagging, dependency parsing and coreference resolution are
//! delegated to model servers reached over JSON/HTTP. Each service is a trait
//! so pipelines can run against the HTTP clients in production and against
//! in-memory fakes in tests.

mod coref;
mod parser;
mod tagger;
pub mod tokenize;

use std::time::Duration;

use qagraph_shared::{QaGraphError, Result, ServiceEndpoints};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

pub use coref::{CorefPrediction, CorefResolver, HttpCorefResolver, TokenSpan};
pub use parser::{DependencyParser, HttpDependencyParser, ParsedDoc, ParsedToken};
pub use tagger::{HttpTagger, TaggedDoc, TaggedToken, Tagger};

/// User-Agent string for service requests.
const USER_AGENT: &str = concat!("qagraph/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body echoed back in error messages.
const ERROR_BODY_PREVIEW: usize = 200;

// ---------------------------------------------------------------------------
// Client bundle
// ---------------------------------------------------------------------------

/// HTTP clients for all three services, sharing one connection pool.
#[derive(Debug, Clone)]
pub struct NlpClients {
    pub coref: HttpCorefResolver,
    pub parser: HttpDependencyParser,
    pub tagger: HttpTagger,
}

impl NlpClients {
    /// Build clients for the configured endpoints.
    pub fn new(endpoints: &ServiceEndpoints) -> Result<Self> {
        let client = build_client(endpoints.timeout_secs)?;
        Ok(Self {
            coref: HttpCorefResolver::new(client.clone(), endpoints.coref.clone()),
            parser: HttpDependencyParser::new(client.clone(), endpoints.parser.clone()),
            tagger: HttpTagger::new(client, endpoints.tagger.clone()),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| QaGraphError::Network(format!("failed to build HTTP client: {e}")))
}

/// POST `body` as JSON and decode the JSON response.
async fn post_json<Req, Resp>(
    client: &Client,
    service: &'static str,
    url: &Url,
    body: &Req,
) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    debug!(service, %url, "calling NLP service");

    let response = client
        .post(url.clone())
        .json(body)
        .send()
        .await
        .map_err(|e| QaGraphError::Network(format!("{service} {url}: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| QaGraphError::Network(format!("{service} {url}: failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(QaGraphError::service(
            service,
            format!("HTTP {status}: {}", preview(&text)),
        ));
    }

    serde_json::from_str(&text).map_err(|e| {
        QaGraphError::service(
            service,
            format!("invalid response: {e} (got: {})", preview(&text)),
        )
    })
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
