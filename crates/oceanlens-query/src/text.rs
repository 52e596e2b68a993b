//! Keyword matching over normalized query text.

/// Keywords this long or longer also match words they prefix ("current" matches "currents")
const PREFIX_MATCH_LEN: usize = 4;

/// Lowercased, tokenized query text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText {
    tokens: Vec<String>,
    word_count: usize,
}

impl QueryText {
    pub fn new(text: &str) -> Self {
        let tokens = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { tokens, word_count: text.split_whitespace().count() }
    }

    /// Whitespace-separated word count of the original text
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether a keyword or multi-word phrase occurs in the text
    pub fn contains(&self, keyword: &str) -> bool {
        let words: Vec<&str> = keyword.split_whitespace().collect();
        match words.as_slice() {
            [] => false,
            [word] => self.tokens.iter().any(|t| token_matches(t, word)),
            // Leading words match exactly, the last one may prefix a token
            [init @ .., last] => self.tokens.windows(init.len() + 1).any(|window| {
                window[..init.len()].iter().zip(init).all(|(t, w)| t == w)
                    && token_matches(&window[init.len()], last)
            }),
        }
    }

    /// Whether any of the keywords occurs
    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.contains(k))
    }

    /// How many of the keywords occur
    pub fn count_matches(&self, keywords: &[&str]) -> usize {
        keywords.iter().filter(|k| self.contains(k)).count()
    }
}

fn token_matches(token: &str, keyword: &str) -> bool {
    if keyword.len() >= PREFIX_MATCH_LEN {
        token.starts_with(keyword)
    } else {
        token == keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_exact_matching() {
        let text = QueryText::new("Currents near the Graph, pH levels");
        assert!(text.contains("current"));
        assert!(text.contains("ph"));
        assert!(!text.contains("gra"));

        let text = QueryText::new("a photograph");
        assert!(!text.contains("ph"));
    }

    #[test]
    fn test_phrase_matching() {
        let text = QueryText::new("How does the Gulf-Stream change over time?");
        assert!(text.contains("gulf stream"));
        assert!(text.contains("change over time"));
        assert!(!text.contains("stream gulf"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(QueryText::new("  temperature   in the  pacific ").word_count(), 4);
        assert!(QueryText::new("?!").is_empty());
    }
}
