//! In-memory stand-ins for the NLP services.

use std::collections::HashMap;
use std::sync::Mutex;

use qagraph_nlp::{
    CorefPrediction, CorefResolver, DependencyParser, ParsedDoc, ParsedToken, TaggedDoc,
    TaggedToken, Tagger, TokenSpan,
};
use qagraph_shared::{QaGraphError, Result};

/// Records every text it is asked about.
#[derive(Default)]
pub struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn push(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Coref resolver that splits on spaces and returns canned clusters per text.
#[derive(Default)]
pub struct FakeCoref {
    clusters: HashMap<String, Vec<Vec<TokenSpan>>>,
    pub log: CallLog,
}

impl FakeCoref {
    pub fn with_clusters(mut self, text: &str, clusters: Vec<Vec<TokenSpan>>) -> Self {
        self.clusters.insert(text.to_string(), clusters);
        self
    }
}

impl CorefResolver for FakeCoref {
    async fn resolve(&self, text: &str) -> Result<CorefPrediction> {
        self.log.push(text);
        Ok(CorefPrediction {
            document: text.split(' ').map(str::to_string).collect(),
            clusters: self.clusters.get(text).cloned().unwrap_or_default(),
        })
    }
}

/// Parser with canned parses per word sequence.
///
/// Unknown input is parsed as one head-final sentence: every word depends on
/// the last one, which is the root.
#[derive(Default)]
pub struct FakeParser {
    parses: HashMap<String, ParsedDoc>,
    pub log: CallLog,
}

impl FakeParser {
    /// Register a parse given as `(text, head, dep)` per sentence, heads document-absolute.
    /// The parse is returned for the words it contains.
    pub fn with_parse(self, sentences: &[&[(&str, usize, &str)]]) -> Self {
        let key = sentences
            .iter()
            .flat_map(|sent| sent.iter().map(|(text, _, _)| *text))
            .collect::<Vec<_>>()
            .join(" ");
        self.with_parse_for(&key, sentences)
    }

    /// Register a parse returned when the words joined by spaces equal `words`.
    pub fn with_parse_for(mut self, words: &str, sentences: &[&[(&str, usize, &str)]]) -> Self {
        let doc = ParsedDoc {
            sentences: sentences
                .iter()
                .map(|sent| {
                    sent.iter()
                        .map(|(text, head, dep)| ParsedToken {
                            text: text.to_string(),
                            head: *head,
                            dep: dep.to_string(),
                        })
                        .collect()
                })
                .collect(),
        };
        self.parses.insert(words.to_string(), doc);
        self
    }
}

impl DependencyParser for FakeParser {
    async fn parse(&self, words: &[String]) -> Result<ParsedDoc> {
        let key = words.join(" ");
        self.log.push(&key);
        if let Some(doc) = self.parses.get(&key) {
            return Ok(doc.clone());
        }
        if words.is_empty() {
            return Err(QaGraphError::service("parser", "no words"));
        }
        let root = words.len() - 1;
        Ok(ParsedDoc {
            sentences: vec![
                words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| ParsedToken {
                        text: w.clone(),
                        head: root,
                        dep: if i == root { "ROOT".into() } else { "dep".into() },
                    })
                    .collect(),
            ],
        })
    }
}

/// Tagger that splits on spaces, one sentence, with character offsets.
///
/// Capitalised words are tagged `PROPN`/`B-MISC`, everything else `NOUN`/`O`.
#[derive(Default)]
pub struct FakeTagger {
    pub log: CallLog,
}

impl Tagger for FakeTagger {
    async fn tag(&self, text: &str) -> Result<TaggedDoc> {
        self.log.push(text);
        let mut tokens = Vec::new();
        let mut offset = 0;
        for word in text.split(' ') {
            let width = word.chars().count();
            if width > 0 {
                let capitalised = word.chars().next().is_some_and(char::is_uppercase);
                tokens.push(TaggedToken {
                    text: word.to_string(),
                    upos: if capitalised { "PROPN" } else { "NOUN" }.into(),
                    ner: if capitalised { "B-MISC" } else { "O" }.into(),
                    start_char: Some(offset),
                    end_char: Some(offset + width),
                });
            }
            offset += width + 1;
        }
        Ok(TaggedDoc {
            sentences: vec![tokens],
        })
    }
}
