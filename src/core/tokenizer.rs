//! Token estimates for a collected document
//!
//! BPE counts come from tiktoken (cl100k_base by default, o200k_base on request). The
//! heuristic model needs no encoding data and is used as the fallback when an encoding
//! fails to load.

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};
use tracing::warn;

/// Supported encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenModel {
    /// cl100k_base (GPT-4, GPT-3.5-turbo)
    #[default]
    Cl100k,
    /// o200k_base (GPT-4o)
    O200k,
    /// Character-class estimate, no BPE
    Heuristic,
}

impl TokenModel {
    pub fn available_models() -> &'static [&'static str] {
        &["cl100k", "o200k", "heuristic"]
    }

    fn bpe(self) -> Option<&'static CoreBPE> {
        let loaded = match self {
            TokenModel::Cl100k => &*CL100K_BPE,
            TokenModel::O200k => &*O200K_BPE,
            TokenModel::Heuristic => return None,
        };
        match loaded {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!(model = %self, error = %e, "encoding unavailable, using heuristic");
                None
            }
        }
    }
}

impl fmt::Display for TokenModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenModel::Cl100k => "cl100k",
            TokenModel::O200k => "o200k",
            TokenModel::Heuristic => "heuristic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TokenModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "gpt4" | "gpt-4" | "default" => Ok(TokenModel::Cl100k),
            "o200k" | "o200k_base" | "gpt4o" | "gpt-4o" => Ok(TokenModel::O200k),
            "heuristic" | "fast" => Ok(TokenModel::Heuristic),
            _ => Err(format!(
                "Unknown model: {}. Available: {}",
                s,
                TokenModel::available_models().join(", ")
            )),
        }
    }
}

static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| format!("Failed to load cl100k_base: {}", e)));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| format!("Failed to load o200k_base: {}", e)));

/// Count tokens in `text` with the given model
pub fn count_tokens(text: &str, model: TokenModel) -> usize {
    if text.is_empty() {
        return 0;
    }

    match model.bpe() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens_heuristic(text),
    }
}

/// Rough token estimate from character classes
///
/// Word characters and spaces average four per token, punctuation two, CJK about
/// two tokens per three characters, other non-ASCII two per token.
pub fn estimate_tokens_heuristic(text: &str) -> usize {
    let (mut word, mut punct, mut cjk, mut other) = (0usize, 0usize, 0usize, 0usize);

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || c == '_' {
            word += 1;
        } else if c.is_ascii() {
            punct += 1;
        } else if is_cjk(c) {
            cjk += 1;
        } else {
            other += 1;
        }
    }

    word.div_ceil(4) + punct.div_ceil(2) + (cjk * 2).div_ceil(3) + other.div_ceil(2)
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x30FF     // punctuation, kana
        | 0x3400..=0x4DBF   // extension A
        | 0x4E00..=0x9FFF   // unified ideographs
        | 0xAC00..=0xD7AF   // hangul
        | 0xFF00..=0xFFEF)  // fullwidth forms
}
