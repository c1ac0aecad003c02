//! Dataset record types and the fused graph shape.
//!
//! Field names follow the JSON files exactly (including the capitalised
//! `POSs`/`NERs` keys of the split format), so renames live here and nowhere else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Edge label linking the head tokens of adjacent sentences.
pub const NEIGH_EDGE: &str = "neigh";

/// Edge label linking a mention head to its cluster's representative head.
pub const COREF_EDGE: &str = "coref";

// ---------------------------------------------------------------------------
// Nested (SQuAD-style) input
// ---------------------------------------------------------------------------

/// A character-offset answer as stored in the nested dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadAnswer {
    pub text: String,
    pub answer_start: u64,
}

/// One question with its answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadQa {
    pub question: String,
    pub id: String,
    #[serde(default)]
    pub is_impossible: bool,
    #[serde(default)]
    pub answers: Vec<SquadAnswer>,
    #[serde(default)]
    pub plausible_answers: Vec<SquadAnswer>,
}

/// A context paragraph and the questions asked about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadParagraph {
    pub context: String,
    pub qas: Vec<SquadQa>,
}

/// A titled topic (article).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadTopic {
    pub title: String,
    pub paragraphs: Vec<SquadParagraph>,
}

/// The nested dataset file: either the `{version, data}` wrapper or the bare topic list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SquadDataset {
    Wrapped {
        #[serde(default)]
        version: Option<String>,
        data: Vec<SquadTopic>,
    },
    Topics(Vec<SquadTopic>),
}

impl SquadDataset {
    /// The topics regardless of wrapping.
    pub fn topics(&self) -> &[SquadTopic] {
        match self {
            Self::Wrapped { data, .. } => data,
            Self::Topics(topics) => topics,
        }
    }
}

// ---------------------------------------------------------------------------
// Flat ("simple") records
// ---------------------------------------------------------------------------

/// One (title, context, question, answer) tuple.
///
/// `answer`/`answer_start` are `None` when the source QA had no usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub title: String,
    pub context: String,
    pub question: String,
    pub answer: Option<String>,
    pub answer_start: Option<u64>,
    pub id: String,
}

// ---------------------------------------------------------------------------
// Split records
// ---------------------------------------------------------------------------

/// A record in the split format: context, question and answer annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRecord {
    pub id: String,
    pub annotation1: ContextAnnotation,
    pub annotation2: TextAnnotation,
    pub annotation3: TextAnnotation,
    /// Fields this tool does not know about, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Context annotation (`annotation1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAnnotation {
    #[serde(default)]
    pub raw_text: String,
    /// Space-joined context tokens.
    pub toks: String,
    /// Space-joined universal POS tags, one per token.
    #[serde(rename = "POSs", default)]
    pub poss: String,
    /// Space-joined NER tags, one per token.
    #[serde(rename = "NERs", default)]
    pub ners: String,
    /// `"<start> <end>"` answer token span, inclusive.
    #[serde(rename = "AnswerStartAndEndPosition", default)]
    pub answer_start_and_end_position: Option<String>,
    /// Character offset of the answer in `raw_text`.
    #[serde(rename = "AnswerStartCharIndex", default)]
    pub answer_start_char_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<FusedGraph>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Question or answer annotation (`annotation2` / `annotation3`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub toks: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Fused graph
// ---------------------------------------------------------------------------

/// One outgoing edge in the fused graph adjacency map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Target token index.
    pub node: usize,
    /// Dependency relation, `neigh` or `coref`.
    pub edge: String,
}

/// Dependency tree, sentence links and coreference edges of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusedGraph {
    /// Token texts in document order.
    pub g_features: Vec<String>,
    /// Source token index to outgoing edges. Keys serialize as JSON strings.
    pub g_adj: BTreeMap<usize, Vec<GraphEdge>>,
    pub num_edges: usize,
}

impl FusedGraph {
    /// Append an edge and bump the edge count.
    pub fn add_edge(&mut self, from: usize, to: usize, label: impl Into<String>) {
        self.g_adj.entry(from).or_default().push(GraphEdge {
            node: to,
            edge: label.into(),
        });
        self.num_edges += 1;
    }

    /// Iterate `(from, edge)` pairs in source order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, &GraphEdge)> {
        self.g_adj
            .iter()
            .flat_map(|(from, edges)| edges.iter().map(move |e| (*from, e)))
    }

    /// Number of edges carrying `label`.
    pub fn count_label(&self, label: &str) -> usize {
        self.edges().filter(|(_, e)| e.edge == label).count()
    }
}
