//! Fusion of dependency trees, sentence links and coreference into one graph.
//!
//! Per document:
//! 1. Resolve coreference once per distinct text (single-entry cache).
//! 2. Reduce every cluster span to a head token and link each mention head
//!    to its cluster's representative head with a `coref` edge.
//! 3. Parse the resolver's token sequence and add `head -> dependent` edges.
//! 4. Link the roots of adjacent sentences with `neigh` edges both ways.

use qagraph_nlp::{CorefPrediction, CorefResolver, DependencyParser, TokenSpan, tokenize};
use qagraph_shared::{COREF_EDGE, FusedGraph, NEIGH_EDGE, QaGraphError, Result};
use tracing::{debug, warn};

use crate::cache::SingleEntryCache;

/// Builds [`FusedGraph`]s, memoizing the last coreference response.
pub struct GraphBuilder<C, P> {
    coref: C,
    parser: P,
    cache: SingleEntryCache<String, CorefPrediction>,
}

impl<C, P> GraphBuilder<C, P>
where
    C: CorefResolver,
    P: DependencyParser,
{
    pub fn new(coref: C, parser: P) -> Self {
        Self {
            coref,
            parser,
            cache: SingleEntryCache::new(),
        }
    }

    /// Forget the cached coreference response.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &SingleEntryCache<String, CorefPrediction> {
        &self.cache
    }

    /// Build the fused graph for a space-separated text.
    pub async fn build(&mut self, text: &str) -> Result<FusedGraph> {
        if text.is_empty() {
            return Ok(FusedGraph::default());
        }

        let prediction = self.coref_prediction(text).await?;
        let coref_links = self.coref_links(&prediction).await?;

        let parse = self.parser.parse(&prediction.document).await?;
        let token_count = parse.token_count();

        let sentence_roots = parse.sentence_roots();

        let mut graph = FusedGraph::default();
        let mut roots = Vec::with_capacity(sentence_roots.len());

        for (sent_idx, (offset, sentence)) in parse.sentences_with_offsets().enumerate() {
            if sentence.is_empty() {
                continue;
            }
            for (i, token) in sentence.iter().enumerate() {
                let idx = offset + i;
                graph.g_features.push(token.text.clone());
                if token.head >= token_count {
                    return Err(QaGraphError::service(
                        "parser",
                        format!(
                            "token {idx} ({:?}) has head {} outside a {token_count}-token parse",
                            token.text, token.head
                        ),
                    ));
                }
                if token.head != idx {
                    graph.add_edge(token.head, idx, token.dep.as_str());
                }
            }
            let root = sentence_roots[sent_idx].ok_or_else(|| {
                QaGraphError::service("parser", format!("sentence {sent_idx} has no root"))
            })?;
            roots.push(root);
        }

        for pair in roots.windows(2) {
            graph.add_edge(pair[0], pair[1], NEIGH_EDGE);
            graph.add_edge(pair[1], pair[0], NEIGH_EDGE);
        }

        for (mention_head, cluster_head) in coref_links {
            graph.add_edge(mention_head, cluster_head, COREF_EDGE);
        }

        debug!(
            tokens = graph.g_features.len(),
            sentences = roots.len(),
            edges = graph.num_edges,
            "graph built"
        );

        Ok(graph)
    }

    async fn coref_prediction(&mut self, text: &str) -> Result<CorefPrediction> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(hit.clone());
        }
        let prediction = self.coref.resolve(text).await?;
        prediction.validate()?;
        Ok(self.cache.insert(text.to_string(), prediction).clone())
    }

    /// `(mention head, representative head)` for every mention of every cluster.
    async fn coref_links(&self, prediction: &CorefPrediction) -> Result<Vec<(usize, usize)>> {
        let mut links = Vec::new();
        for cluster in &prediction.clusters {
            let Some((representative, mentions)) = cluster.split_first() else {
                continue;
            };
            let cluster_head = self.span_head(prediction, *representative).await?;
            for mention in mentions {
                let mention_head = self.span_head(prediction, *mention).await?;
                links.push((mention_head, cluster_head));
            }
        }
        Ok(links)
    }

    /// Document index of the token that best represents `span`.
    ///
    /// Multi-token spans are re-tokenized and parsed on their own; the root of
    /// that parse, clamped into the span, is the head.
    async fn span_head(&self, prediction: &CorefPrediction, span: TokenSpan) -> Result<usize> {
        if span.is_single() {
            return Ok(span.start());
        }

        let span_text = prediction.span_text(span);
        let words = tokenize::regex_tokens(&span_text);
        if words.is_empty() {
            warn!(span = %span_text, "span has no word tokens, using its first token as head");
            return Ok(span.start());
        }

        let parse = self.parser.parse(&words).await?;
        let relative = parse.first_root().unwrap_or_else(|| {
            warn!(span = %span_text, "span parse has no root, using its first token as head");
            0
        });

        Ok(span.start() + relative.min(span.width() - 1))
    }
}
