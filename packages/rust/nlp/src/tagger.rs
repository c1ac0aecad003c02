//! Tokenize + POS + NER tagging service.

use std::future::Future;

use qagraph_shared::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const SERVICE: &str = "tagger";

/// One tagged token. Character offsets are into the submitted text, when the tagger reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub text: String,
    #[serde(default = "unknown_upos")]
    pub upos: String,
    #[serde(default = "outside_ner")]
    pub ner: String,
    #[serde(default)]
    pub start_char: Option<usize>,
    #[serde(default)]
    pub end_char: Option<usize>,
}

fn unknown_upos() -> String {
    "X".into()
}
fn outside_ner() -> String {
    "O".into()
}

/// Tagger output, split into sentences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedDoc {
    pub sentences: Vec<Vec<TaggedToken>>,
}

impl TaggedDoc {
    /// All tokens in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &TaggedToken> {
        self.sentences.iter().flatten()
    }

    /// Token texts joined by single spaces.
    pub fn joined_text(&self) -> String {
        self.join(|t| t.text.as_str())
    }

    /// UPOS tags joined by single spaces.
    pub fn joined_upos(&self) -> String {
        self.join(|t| t.upos.as_str())
    }

    /// NER tags joined by single spaces.
    pub fn joined_ner(&self) -> String {
        self.join(|t| t.ner.as_str())
    }

    fn join<'a>(&'a self, field: impl Fn(&'a TaggedToken) -> &'a str) -> String {
        self.tokens().map(field).collect::<Vec<_>>().join(" ")
    }
}

/// Something that tokenizes text and tags each token with UPOS and NER labels.
pub trait Tagger {
    fn tag(&self, text: &str) -> impl Future<Output = Result<TaggedDoc>> + Send;
}

#[derive(Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

/// Tagger behind an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTagger {
    client: Client,
    endpoint: Url,
}

impl HttpTagger {
    pub fn new(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Tagger for HttpTagger {
    async fn tag(&self, text: &str) -> Result<TaggedDoc> {
        crate::post_json(&self.client, SERVICE, &self.endpoint, &TagRequest { text }).await
    }
}
