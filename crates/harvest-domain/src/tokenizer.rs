//! Tokenizer seam and the positional token adapter

use serde::{Deserialize, Serialize};

/// An opaque tokenizer producing a finite sequence of tokens from a paragraph
///
/// Implementations must be deterministic and restartable: calling
/// `tokenize` twice on the same paragraph yields the same tokens.
pub trait Tokenizer {
    /// Lazily tokenize one paragraph
    fn tokenize<'a>(&'a self, paragraph: &'a str) -> Box<dyn Iterator<Item = String> + 'a>;
}

/// Default tokenizer splitting words from punctuation
///
/// A word is a maximal run of alphanumeric characters, where a single `-`
/// or `'` between two alphanumerics joins the run. Every other
/// non-whitespace character is a token on its own.
///
/// # Examples
///
/// ```
/// use harvest_domain::{Tokenizer, WordTokenizer};
///
/// let tokens: Vec<String> = WordTokenizer.tokenize("Hei, verden!").collect();
/// assert_eq!(tokens, vec!["Hei", ",", "verden", "!"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&'a self, paragraph: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(WordIter {
            chars: paragraph.char_indices().peekable(),
            source: paragraph,
        })
    }
}

struct WordIter<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
}

impl Iterator for WordIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }

        let (start, first) = self.chars.next()?;
        if !first.is_alphanumeric() {
            return Some(first.to_string());
        }

        let mut end = start + first.len_utf8();
        while let Some(&(idx, c)) = self.chars.peek() {
            if c.is_alphanumeric() {
                self.chars.next();
                end = idx + c.len_utf8();
                continue;
            }
            if c == '-' || c == '\'' {
                let joins = self.source[idx + c.len_utf8()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphanumeric);
                if joins {
                    self.chars.next();
                    end = idx + c.len_utf8();
                    continue;
                }
            }
            break;
        }

        Some(self.source[start..end].to_string())
    }
}

/// A token tagged with its position in the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token text
    pub token: String,

    /// Global 0-based sequence number within the text
    pub sequence: u64,

    /// 0-based paragraph number from newline-delimited splitting
    pub paragraph: u64,
}

/// Tokenize a text into a positionally-addressed token stream
///
/// The text is split on `\n` into paragraphs. Sequence numbers continue
/// across paragraph boundaries; empty paragraphs yield no tokens but still
/// advance the paragraph counter.
///
/// # Examples
///
/// ```
/// use harvest_domain::{tokenize_text, WordTokenizer};
///
/// let tokens = tokenize_text(&WordTokenizer, "ab cd\n\nef");
/// let paragraphs: Vec<u64> = tokens.iter().map(|t| t.paragraph).collect();
/// let sequences: Vec<u64> = tokens.iter().map(|t| t.sequence).collect();
/// assert_eq!(paragraphs, vec![0, 0, 2]);
/// assert_eq!(sequences, vec![0, 1, 2]);
/// ```
pub fn tokenize_text<T: Tokenizer + ?Sized>(tokenizer: &T, text: &str) -> Vec<TokenRecord> {
    let mut records = Vec::new();
    let mut sequence = 0u64;

    for (paragraph, line) in text.split('\n').enumerate() {
        for token in tokenizer.tokenize(line) {
            records.push(TokenRecord {
                token,
                sequence,
                paragraph: paragraph as u64,
            });
            sequence += 1;
        }
    }

    records
}
