//! Interpolated Kneser-Ney n-gram language model
//!
//! The model is fitted once from token sequences and is read-only afterwards.
//! Probabilities are computed by recursive interpolation down to the unigram
//! continuation distribution:
//!
//! ```text
//! P(w | ctx) = max(c(ctx w) - D, 0) / c(ctx)  +  λ(ctx) · P(w | ctx[1..])
//! λ(ctx)     = D · N1+(ctx •) / c(ctx)            (1 if ctx unseen)
//! P(w)       = N1+(• w) / N1+(• •)                (1/|V| if no bigrams)
//! ```
//!
//! Both per-(context, token) probabilities and per-context rankings are
//! memoized behind `RwLock`s. Cached values are pure functions of the
//! immutable counts, so a racing insert can only duplicate work.

use super::vocab::{is_special, TokenId, Vocabulary};
use crate::analysis::traits::SequenceModel;
use crate::error::{ChordSuggestError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type Gram = Vec<TokenId>;
type Ranking = Arc<Vec<(String, f64)>>;

/// Hyperparameters of an n-gram model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NGramConfig {
    /// Longest n-gram used for prediction (context length is `order - 1`)
    pub order: usize,
    /// Absolute discount D, strictly between 0 and 1
    pub discount: f64,
    /// Tokens seen this many times or fewer become `<unk>`
    pub unk_threshold: u64,
}

impl Default for NGramConfig {
    fn default() -> Self {
        Self {
            order: 3,
            discount: 0.75,
            unk_threshold: 1,
        }
    }
}

impl NGramConfig {
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(ChordSuggestError::ConfigError(
                "n-gram order must be at least 1".to_string(),
            ));
        }
        if !(self.discount > 0.0 && self.discount < 1.0) {
            return Err(ChordSuggestError::ConfigError(format!(
                "discount must be in (0, 1), got {}",
                self.discount
            )));
        }
        Ok(())
    }

    /// Highest order actually counted
    ///
    /// Bigrams are always counted since the unigram continuation
    /// distribution is derived from them, even for a unigram model.
    fn counted_order(&self) -> usize {
        self.order.max(2)
    }
}

#[derive(Debug)]
pub struct NGramModel {
    config: NGramConfig,
    vocab: Vocabulary,
    sequence_count: usize,
    /// `counts[n - 1]` holds n-gram counts for n in 1..=counted_order
    counts: Vec<HashMap<Gram, u64>>,
    /// c(ctx), indexed by context length
    context_totals: Vec<HashMap<Gram, u64>>,
    /// N1+(ctx •), indexed by context length
    continuation_types: Vec<HashMap<Gram, u64>>,
    /// N1+(• w), indexed by token id
    left_continuations: Vec<u64>,
    /// N1+(• •)
    distinct_bigrams: u64,
    prob_cache: RwLock<HashMap<(Gram, TokenId), f64>>,
    rank_cache: RwLock<HashMap<Gram, Ranking>>,
}

impl NGramModel {
    /// Fit a model on token sequences
    ///
    /// Each sequence is padded with `order - 1` start symbols and one end
    /// symbol. N-grams ending in the start symbol only occur inside the
    /// padding and are not counted.
    pub fn fit<S: AsRef<str>>(config: NGramConfig, sequences: &[Vec<S>]) -> Result<Self> {
        config.validate()?;

        let vocab = Vocabulary::from_sequences(sequences, config.unk_threshold);
        let counted_order = config.counted_order();
        let mut counts: Vec<HashMap<Gram, u64>> = vec![HashMap::new(); counted_order];

        for sequence in sequences {
            let mut padded: Gram = vec![vocab.bos(); config.order - 1];
            padded.extend(sequence.iter().map(|t| vocab.id_or_unk(t.as_ref())));
            padded.push(vocab.eos());

            for end in 0..padded.len() {
                if padded[end] == vocab.bos() {
                    continue;
                }
                for n in 1..=counted_order.min(end + 1) {
                    let gram = padded[end + 1 - n..=end].to_vec();
                    *counts[n - 1].entry(gram).or_default() += 1;
                }
            }
        }

        let model = Self::from_parts(config, vocab, counts, sequences.len());

        info!(
            "Fitted {}-gram model on {} sequences ({} tokens in vocabulary, {} distinct bigrams)",
            config.order,
            sequences.len(),
            model.vocab.len(),
            model.distinct_bigrams
        );

        Ok(model)
    }

    /// Rebuild a model from a vocabulary and raw n-gram counts
    ///
    /// Aggregate statistics are re-derived from the counts. Fails if an
    /// n-gram is empty, longer than the counted order, or uses a token that
    /// is not in `vocabulary`.
    pub fn from_counts<I>(
        config: NGramConfig,
        vocabulary: Vec<String>,
        ngrams: I,
        sequence_count: usize,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (Vec<String>, u64)>,
    {
        config.validate()?;

        let vocab = Vocabulary::from_tokens(vocabulary);
        let counted_order = config.counted_order();
        let mut counts: Vec<HashMap<Gram, u64>> = vec![HashMap::new(); counted_order];

        for (tokens, count) in ngrams {
            if tokens.is_empty() || tokens.len() > counted_order {
                return Err(ChordSuggestError::InvalidModel(format!(
                    "{}-gram in a model of order {}",
                    tokens.len(),
                    config.order
                )));
            }

            let gram = tokens
                .iter()
                .map(|token| {
                    vocab.id(token).ok_or_else(|| {
                        ChordSuggestError::InvalidModel(format!(
                            "n-gram token '{}' is not in the vocabulary",
                            token
                        ))
                    })
                })
                .collect::<Result<Gram>>()?;

            *counts[gram.len() - 1].entry(gram).or_default() += count;
        }

        Ok(Self::from_parts(config, vocab, counts, sequence_count))
    }

    fn from_parts(
        config: NGramConfig,
        vocab: Vocabulary,
        counts: Vec<HashMap<Gram, u64>>,
        sequence_count: usize,
    ) -> Self {
        let counted_order = config.counted_order();
        let mut context_totals: Vec<HashMap<Gram, u64>> = vec![HashMap::new(); counted_order];
        let mut continuation_types: Vec<HashMap<Gram, u64>> = vec![HashMap::new(); counted_order];

        for table in counts.iter().skip(1) {
            for (gram, count) in table {
                let context = &gram[..gram.len() - 1];
                let m = context.len();
                *context_totals[m].entry(context.to_vec()).or_default() += count;
                *continuation_types[m].entry(context.to_vec()).or_default() += 1;
            }
        }

        let mut left_continuations = vec![0u64; vocab.len()];
        for bigram in counts[1].keys() {
            if let Some(slot) = left_continuations.get_mut(bigram[1] as usize) {
                *slot += 1;
            }
        }
        let distinct_bigrams = counts[1].len() as u64;

        Self {
            config,
            vocab,
            sequence_count,
            counts,
            context_totals,
            continuation_types,
            left_continuations,
            distinct_bigrams,
            prob_cache: RwLock::new(HashMap::new()),
            rank_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &NGramConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Number of sequences the model was fitted on
    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }

    /// Every counted n-gram as tokens, ordered by length then token ids
    pub fn ngrams(&self) -> Vec<(Vec<String>, u64)> {
        let mut grams: Vec<(&Gram, u64)> = self
            .counts
            .iter()
            .flat_map(|table| table.iter().map(|(gram, count)| (gram, *count)))
            .collect();
        grams.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));

        grams
            .into_iter()
            .map(|(gram, count)| {
                let tokens = gram.iter().map(|&id| self.vocab.token(id).to_string()).collect();
                (tokens, count)
            })
            .collect()
    }

    /// Raw count of an n-gram (0 if unseen or out of vocabulary)
    pub fn count<S: AsRef<str>>(&self, tokens: &[S]) -> u64 {
        let gram: Option<Gram> = tokens.iter().map(|t| self.vocab.id(t.as_ref())).collect();
        match gram {
            Some(gram) if !gram.is_empty() && gram.len() <= self.counts.len() => self.counts
                [gram.len() - 1]
                .get(&gram)
                .copied()
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// P(w | ctx) for string tokens
    ///
    /// Out-of-vocabulary tokens are read as `<unk>`; only the last
    /// `order - 1` context tokens are used.
    pub fn prob<S: AsRef<str>>(&self, context: &[S], token: &str) -> f64 {
        let keep = self.config.order - 1;
        let context: Gram = context[context.len().saturating_sub(keep)..]
            .iter()
            .map(|t| self.vocab.id_or_unk(t.as_ref()))
            .collect();
        self.prob_ids(&context, self.vocab.id_or_unk(token))
    }

    fn prob_ids(&self, context: &[TokenId], token: TokenId) -> f64 {
        if context.is_empty() {
            return self.continuation_prob(token);
        }

        let key = (context.to_vec(), token);
        if let Some(p) = self.prob_cache.read().get(&key) {
            return *p;
        }

        let p = self.discounted(context, token)
            + self.backoff_weight(context) * self.prob_ids(&context[1..], token);

        self.prob_cache.write().insert(key, p);
        p
    }

    /// Unigram continuation probability N1+(• w) / N1+(• •)
    fn continuation_prob(&self, token: TokenId) -> f64 {
        if self.distinct_bigrams == 0 {
            return 1.0 / self.vocab.len().max(1) as f64;
        }
        let left = self
            .left_continuations
            .get(token as usize)
            .copied()
            .unwrap_or(0);
        left as f64 / self.distinct_bigrams as f64
    }

    fn context_total(&self, context: &[TokenId]) -> u64 {
        self.context_totals
            .get(context.len())
            .and_then(|table| table.get(context))
            .copied()
            .unwrap_or(0)
    }

    fn discounted(&self, context: &[TokenId], token: TokenId) -> f64 {
        let total = self.context_total(context);
        if total == 0 {
            return 0.0;
        }

        let mut gram = context.to_vec();
        gram.push(token);
        let count = self
            .counts
            .get(gram.len() - 1)
            .and_then(|table| table.get(&gram))
            .copied()
            .unwrap_or(0);

        (count as f64 - self.config.discount).max(0.0) / total as f64
    }

    /// Interpolation weight λ(ctx); full backoff for unseen contexts
    fn backoff_weight(&self, context: &[TokenId]) -> f64 {
        let total = self.context_total(context);
        if total == 0 {
            return 1.0;
        }
        let types = self
            .continuation_types
            .get(context.len())
            .and_then(|table| table.get(context))
            .copied()
            .unwrap_or(0);
        self.config.discount * types as f64 / total as f64
    }

    /// Prediction context for a history: start-padded, OOV mapped to `<unk>`,
    /// last `order - 1` tokens
    fn history_context<S: AsRef<str>>(&self, history: &[S]) -> Gram {
        let keep = self.config.order - 1;
        let mut padded: Gram = vec![self.vocab.bos(); keep];
        padded.extend(history.iter().map(|t| self.vocab.id_or_unk(t.as_ref())));
        padded.split_off(padded.len() - keep)
    }

    /// Every token except `<s>` scored against `history`, best first
    ///
    /// Ties keep vocabulary (sorted token) order. Rankings are cached per
    /// context.
    pub fn ranking<S: AsRef<str>>(&self, history: &[S]) -> Ranking {
        let context = self.history_context(history);

        if let Some(ranking) = self.rank_cache.read().get(&context) {
            return Arc::clone(ranking);
        }

        let bos = self.vocab.bos();
        let mut scored: Vec<(String, f64)> = self
            .vocab
            .ids()
            .filter(|&id| id != bos)
            .map(|id| {
                (
                    self.vocab.token(id).to_string(),
                    self.prob_ids(&context, id),
                )
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        debug!(
            "Ranked {} candidates for context {:?}",
            scored.len(),
            context
                .iter()
                .map(|&id| self.vocab.token(id))
                .collect::<Vec<_>>()
        );

        let ranking = Arc::new(scored);
        self.rank_cache
            .write()
            .insert(context, Arc::clone(&ranking));
        ranking
    }

    /// Best `k` real tokens (no `<s>`, `</s>` or `<unk>`) after `history`
    pub fn top_k<S: AsRef<str>>(&self, history: &[S], k: usize) -> Vec<(String, f64)> {
        self.ranking(history)
            .iter()
            .filter(|(token, _)| !is_special(token))
            .take(k)
            .cloned()
            .collect()
    }
}

impl SequenceModel for NGramModel {
    fn predict_ranking(&self, history: &[String]) -> Vec<(String, f64)> {
        (*self.ranking(history)).clone()
    }

    fn name(&self) -> &'static str {
        "kneser-ney"
    }
}
