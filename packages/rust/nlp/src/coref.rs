//! Coreference resolution service.

use std::future::Future;

use qagraph_shared::{QaGraphError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const SERVICE: &str = "coref";

/// An inclusive `[start, end]` token span, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpan(pub usize, pub usize);

impl TokenSpan {
    pub fn start(&self) -> usize {
        self.0
    }

    pub fn end(&self) -> usize {
        self.1
    }

    /// Number of tokens covered.
    pub fn width(&self) -> usize {
        self.1 + 1 - self.0
    }

    pub fn is_single(&self) -> bool {
        self.0 == self.1
    }
}

/// Resolver output: the tokens it worked on and the clusters over them.
///
/// The first span of each cluster is the representative, the rest are mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorefPrediction {
    pub document: Vec<String>,
    pub clusters: Vec<Vec<TokenSpan>>,
}

impl CorefPrediction {
    /// Check that every span is ordered and inside `document`.
    pub fn validate(&self) -> Result<()> {
        let len = self.document.len();
        for (ci, cluster) in self.clusters.iter().enumerate() {
            for span in cluster {
                if span.start() > span.end() || span.end() >= len {
                    return Err(QaGraphError::validation(format!(
                        "coref cluster {ci} has span [{}, {}] outside a {len}-token document",
                        span.start(),
                        span.end()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Space-joined text of `span`.
    pub fn span_text(&self, span: TokenSpan) -> String {
        self.document[span.start()..=span.end()].join(" ")
    }
}

/// Something that clusters coreferent mentions in a text.
pub trait CorefResolver {
    fn resolve(&self, text: &str) -> impl Future<Output = Result<CorefPrediction>> + Send;
}

#[derive(Serialize)]
struct CorefRequest<'a> {
    document: &'a str,
}

/// Coreference resolver behind an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpCorefResolver {
    client: Client,
    endpoint: Url,
}

impl HttpCorefResolver {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl CorefResolver for HttpCorefResolver {
    async fn resolve(&self, text: &str) -> Result<CorefPrediction> {
        let prediction: CorefPrediction = crate::post_json(
            &self.client,
            SERVICE,
            &self.endpoint,
            &CorefRequest { document: text },
        )
        .await?;
        prediction.validate()?;
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> HttpCorefResolver {
        let url = Url::parse(&format!("{}/coref", server.uri())).unwrap();
        HttpCorefResolver::new(Client::new(), url)
    }

    #[test]
    fn span_helpers() {
        let span = TokenSpan(3, 5);
        assert_eq!(span.width(), 3);
        assert!(!span.is_single());
        assert!(TokenSpan(2, 2).is_single());
    }

    #[test]
    fn validate_rejects_out_of_range_span() {
        let prediction = CorefPrediction {
            document: vec!["a".into(), "b".into()],
            clusters: vec![vec![TokenSpan(0, 0), TokenSpan(1, 2)]],
        };
        let err = prediction.validate().unwrap_err();
        assert!(matches!(err, QaGraphError::Validation { .. }));
        assert!(err.to_string().contains("[1, 2]"));
    }

    #[tokio::test]
    async fn resolve_against_mock_server() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/coref"))
            .and(body_json(serde_json::json!({"document": "John loves Mary . She left ."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "document": ["John", "loves", "Mary", ".", "She", "left", "."],
                "clusters": [[[2, 2], [4, 4]]],
                "top_spans": [[0, 0], [2, 2], [4, 4]]
            })))
            .mount(&server)
            .await;

        let prediction = resolver_for(&server)
            .resolve("John loves Mary . She left .")
            .await
            .unwrap();

        assert_eq!(prediction.document.len(), 7);
        assert_eq!(prediction.clusters, vec![vec![TokenSpan(2, 2), TokenSpan(4, 4)]]);
        assert_eq!(prediction.span_text(TokenSpan(0, 2)), "John loves Mary");
    }

    #[tokio::test]
    async fn resolve_surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/coref"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let err = resolver_for(&server).resolve("text").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("coref"));
        assert!(msg.contains("503"));
        assert!(msg.contains("model loading"));
    }

    #[tokio::test]
    async fn resolve_rejects_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/coref"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"clusters\": 3}"))
            .mount(&server)
            .await;

        let err = resolver_for(&server).resolve("text").await.unwrap_err();
        assert!(err.to_string().contains("invalid response"));
    }
}
