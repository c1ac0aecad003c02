//! Nested QA dataset -> flat records -> annotated split records.

use qagraph_nlp::{TaggedDoc, Tagger};
use qagraph_shared::{
    ContextAnnotation, FlatRecord, Result, SplitRecord, SquadAnswer, SquadDataset, SquadQa,
    TextAnnotation,
};
use tracing::{debug, error};

use crate::cache::SingleEntryCache;

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// Flatten topics -> paragraphs -> QAs into one record per question.
///
/// Unanswerable questions take their first plausible answer. A question with
/// no usable answer is logged and still emitted, with `None` answer fields.
pub fn flatten(dataset: &SquadDataset) -> Vec<FlatRecord> {
    let mut records = Vec::new();

    for topic in dataset.topics() {
        for para in &topic.paragraphs {
            for qa in &para.qas {
                let answer = first_answer(qa);
                if answer.is_none() {
                    error!(
                        id = %qa.id,
                        is_impossible = qa.is_impossible,
                        context = %para.context,
                        question = %qa.question,
                        "QA has no answer to extract"
                    );
                }

                records.push(FlatRecord {
                    title: topic.title.clone(),
                    context: para.context.clone(),
                    question: qa.question.clone(),
                    answer: answer.map(|a| a.text.clone()),
                    answer_start: answer.map(|a| a.answer_start),
                    id: qa.id.clone(),
                });
            }
        }
    }

    records
}

fn first_answer(qa: &SquadQa) -> Option<&SquadAnswer> {
    if qa.is_impossible {
        qa.plausible_answers.first()
    } else {
        qa.answers.first()
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// Tags flat records into the split format, caching the last context's tags.
pub struct Annotator<T> {
    tagger: T,
    context_cache: SingleEntryCache<String, TaggedDoc>,
}

impl<T: Tagger> Annotator<T> {
    pub fn new(tagger: T) -> Self {
        Self {
            tagger,
            context_cache: SingleEntryCache::new(),
        }
    }

    /// Forget the cached context tags.
    pub fn clear_cache(&mut self) {
        self.context_cache.clear();
    }

    pub fn cache(&self) -> &SingleEntryCache<String, TaggedDoc> {
        &self.context_cache
    }

    /// Tag question, answer and context of one record.
    pub async fn annotate(&mut self, record: &FlatRecord) -> Result<SplitRecord> {
        let question = self.tagger.tag(&record.question).await?;
        let answer_toks = match record.answer.as_deref() {
            Some(answer) if !answer.trim().is_empty() => {
                self.tagger.tag(answer).await?.joined_text()
            }
            _ => String::new(),
        };
        let context = self.context_tags(&record.context).await?;

        let answer_span = match (record.answer.as_deref(), record.answer_start) {
            (Some(answer), Some(start)) => {
                answer_token_span(&context, start, answer.chars().count())
            }
            _ => None,
        };
        if answer_span.is_none() && record.answer.is_some() {
            debug!(id = %record.id, "answer could not be located in context tokens");
        }

        Ok(SplitRecord {
            id: record.id.clone(),
            annotation1: ContextAnnotation {
                raw_text: record.context.clone(),
                toks: context.joined_text(),
                poss: context.joined_upos(),
                ners: context.joined_ner(),
                answer_start_and_end_position: answer_span
                    .map(|(start, end)| format!("{start} {end}")),
                answer_start_char_index: record.answer_start,
                graph: None,
                extra: Default::default(),
            },
            annotation2: TextAnnotation {
                raw_text: Some(record.question.clone()),
                toks: question.joined_text(),
                extra: Default::default(),
            },
            annotation3: TextAnnotation {
                raw_text: record.answer.clone(),
                toks: answer_toks,
                extra: Default::default(),
            },
            extra: Default::default(),
        })
    }

    async fn context_tags(&mut self, context: &str) -> Result<TaggedDoc> {
        if let Some(hit) = self.context_cache.get(context) {
            return Ok(hit.clone());
        }
        let tags = self.tagger.tag(context).await?;
        Ok(self.context_cache.insert(context.to_string(), tags).clone())
    }
}

/// Inclusive token span covering characters `[start, start + len)` of the context.
///
/// Tokens without character offsets never match but still count toward indices.
pub fn answer_token_span(context: &TaggedDoc, start: u64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let start = usize::try_from(start).ok()?;
    let end = start.checked_add(len)?;

    let mut first = None;
    let mut last = None;
    for (idx, token) in context.tokens().enumerate() {
        let (Some(tok_start), Some(tok_end)) = (token.start_char, token.end_char) else {
            continue;
        };
        if tok_start < end && tok_end > start {
            first.get_or_insert(idx);
            last = Some(idx);
        }
    }

    Some((first?, last?))
}
