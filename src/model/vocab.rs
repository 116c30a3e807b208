//! Closed token vocabulary
//!
//! Tokens are stored in sorted order and addressed by dense integer ids, so
//! iteration order (and therefore ranking tie order) is reproducible.

use std::collections::HashMap;

/// Sequence start padding
pub const BOS: &str = "<s>";
/// Sequence end marker
pub const EOS: &str = "</s>";
/// Replacement for out-of-vocabulary tokens
pub const UNK: &str = "<unk>";

/// Tokens every vocabulary contains
pub const SPECIAL_TOKENS: [&str; 3] = [BOS, EOS, UNK];

/// Dense token identifier (index into the sorted vocabulary)
pub type TokenId = u32;

/// Whether a token is one of the padding/unknown markers
pub fn is_special(token: &str) -> bool {
    SPECIAL_TOKENS.contains(&token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, TokenId>,
    bos: TokenId,
    eos: TokenId,
    unk: TokenId,
}

impl Vocabulary {
    /// Build a vocabulary from arbitrary tokens; special tokens are always added
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::<String>::into)
            .chain(SPECIAL_TOKENS.iter().map(|t| t.to_string()))
            .collect();
        tokens.sort();
        tokens.dedup();

        let index: HashMap<String, TokenId> = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as TokenId))
            .collect();

        let special = |token: &str| index.get(token).copied().unwrap_or_default();
        let (bos, eos, unk) = (special(BOS), special(EOS), special(UNK));

        Self {
            tokens,
            index,
            bos,
            eos,
            unk,
        }
    }

    /// Keep tokens seen strictly more than `unk_threshold` times
    pub fn from_sequences<S: AsRef<str>>(sequences: &[Vec<S>], unk_threshold: u64) -> Self {
        let mut frequencies: HashMap<&str, u64> = HashMap::new();
        for token in sequences.iter().flatten() {
            *frequencies.entry(token.as_ref()).or_default() += 1;
        }

        Self::from_tokens(
            frequencies
                .into_iter()
                .filter(|(_, count)| *count > unk_threshold)
                .map(|(token, _)| token),
        )
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.index.get(token).copied()
    }

    /// Id of `token`, or of `<unk>` when out of vocabulary
    pub fn id_or_unk(&self, token: &str) -> TokenId {
        self.id(token).unwrap_or(self.unk)
    }

    /// Token text for an id produced by this vocabulary
    pub fn token(&self, id: TokenId) -> &str {
        self.tokens.get(id as usize).map(String::as_str).unwrap_or(UNK)
    }

    pub fn bos(&self) -> TokenId {
        self.bos
    }

    pub fn eos(&self) -> TokenId {
        self.eos
    }

    pub fn unk(&self) -> TokenId {
        self.unk
    }

    /// All token ids in sorted-token order
    pub fn ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        (0..self.tokens.len()).map(|id| id as TokenId)
    }

    /// All tokens in sorted order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
