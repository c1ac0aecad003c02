//! Dependency parsing service.

use std::future::Future;

use qagraph_shared::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const SERVICE: &str = "parser";

/// One parsed token. `head` is the document-level index of its governor;
/// a sentence root is its own head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    pub text: String,
    pub head: usize,
    pub dep: String,
}

/// Parser output, split into sentences. Token indices run across the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDoc {
    pub sentences: Vec<Vec<ParsedToken>>,
}

impl ParsedDoc {
    /// Total number of tokens across sentences.
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }

    /// Sentences paired with the document index of their first token.
    pub fn sentences_with_offsets(&self) -> impl Iterator<Item = (usize, &[ParsedToken])> {
        self.sentences.iter().scan(0usize, |offset, sent| {
            let start = *offset;
            *offset += sent.len();
            Some((start, sent.as_slice()))
        })
    }

    /// Root index of every sentence, `None` where a sentence has no self-governing token.
    pub fn sentence_roots(&self) -> Vec<Option<usize>> {
        self.sentences_with_offsets()
            .map(|(offset, sent)| sentence_root(offset, sent))
            .collect()
    }

    /// Document index of the first token in the first sentence that governs itself.
    pub fn first_root(&self) -> Option<usize> {
        self.sentences_with_offsets()
            .find_map(|(offset, sent)| sentence_root(offset, sent))
    }
}

/// Document index of the root of a sentence starting at `offset`.
fn sentence_root(offset: usize, sentence: &[ParsedToken]) -> Option<usize> {
    sentence
        .iter()
        .enumerate()
        .map(|(i, tok)| (offset + i, tok))
        .find(|(idx, tok)| tok.head == *idx)
        .map(|(idx, _)| idx)
}

/// Something that produces dependency trees over pre-tokenized words.
///
/// Words are parsed exactly as given; the parser must not re-tokenize them.
pub trait DependencyParser {
    fn parse(&self, words: &[String]) -> impl Future<Output = Result<ParsedDoc>> + Send;
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    words: &'a [String],
}

/// Dependency parser behind an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpDependencyParser {
    client: Client,
    endpoint: Url,
}

impl HttpDependencyParser {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl DependencyParser for HttpDependencyParser {
    async fn parse(&self, words: &[String]) -> Result<ParsedDoc> {
        crate::post_json(&self.client, SERVICE, &self.endpoint, &ParseRequest { words }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tok(text: &str, head: usize, dep: &str) -> ParsedToken {
        ParsedToken {
            text: text.into(),
            head,
            dep: dep.into(),
        }
    }

    fn two_sentences() -> ParsedDoc {
        ParsedDoc {
            sentences: vec![
                vec![tok("John", 1, "nsubj"), tok("loves", 1, "ROOT"), tok("Mary", 1, "dobj")],
                vec![tok("She", 4, "nsubj"), tok("left", 4, "ROOT")],
            ],
        }
    }

    #[test]
    fn offsets_run_across_sentences() {
        let doc = two_sentences();
        let offsets: Vec<usize> = doc.sentences_with_offsets().map(|(o, _)| o).collect();
        assert_eq!(offsets, vec![0, 3]);
        assert_eq!(doc.token_count(), 5);
    }

    #[test]
    fn roots_are_self_governing_tokens() {
        let doc = two_sentences();
        assert_eq!(sentence_root(3, &doc.sentences[1]), Some(4));
        assert_eq!(doc.first_root(), Some(1));
        assert_eq!(doc.sentence_roots(), vec![Some(1), Some(4)]);
    }

    #[test]
    fn rootless_doc_has_no_first_root() {
        let doc = ParsedDoc {
            sentences: vec![vec![tok("a", 1, "det"), tok("b", 0, "dep")]],
        };
        assert_eq!(doc.first_root(), None);
    }

    #[tokio::test]
    async fn parse_against_mock_server() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse"))
            .and(body_json(serde_json::json!({"words": ["the", "old", "man"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sentences": [[
                    {"text": "the", "head": 2, "dep": "det"},
                    {"text": "old", "head": 2, "dep": "amod"},
                    {"text": "man", "head": 2, "dep": "ROOT"}
                ]]
            })))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/parse", server.uri())).unwrap();
        let parser = HttpDependencyParser::new(Client::new(), url);
        let words: Vec<String> = ["the", "old", "man"].iter().map(|s| s.to_string()).collect();
        let doc = parser.parse(&words).await.unwrap();

        assert_eq!(doc.token_count(), 3);
        assert_eq!(doc.first_root(), Some(2));
        assert_eq!(doc.sentences[0][1].dep, "amod");
    }
}
