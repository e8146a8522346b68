//! Keyword extraction and text helpers
//!
//! Keywords are the most frequent lowercase word tokens longer than three
//! characters across a cluster's content.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::DataPoint;

/// Default number of keywords kept per cluster
pub const DEFAULT_KEYWORD_LIMIT: usize = 10;

/// Minimum token length (exclusive) for a keyword
const MIN_KEYWORD_LEN: usize = 3;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Lowercase word tokens of a text
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Top keywords by frequency; ties keep first-occurrence order
pub fn extract_keywords(points: &[DataPoint], limit: usize) -> Vec<String> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for token in points.iter().flat_map(|p| tokenize(&p.content)) {
        if token.chars().count() <= MIN_KEYWORD_LEN {
            continue;
        }
        match index.get(&token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token.clone(), counts.len());
                counts.push((token, 1));
            }
        }
    }

    // Stable sort keeps first occurrence ahead on equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(t, _)| t).collect()
}

/// Distinct entities ordered by frequency, first occurrence on ties
pub fn ranked_entities(points: &[DataPoint], limit: usize) -> Vec<String> {
    let mut frequencies = crate::entity_frequencies(points);
    frequencies.sort_by(|a, b| b.1.cmp(&a.1));
    frequencies.into_iter().take(limit).map(|(e, _)| e).collect()
}

/// Distinct entities in first-occurrence order
pub fn distinct_entities(points: &[DataPoint]) -> Vec<String> {
    crate::entity_frequencies(points)
        .into_iter()
        .map(|(e, _)| e)
        .collect()
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn excerpt(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => content[..idx].to_string(),
        None => content.to_string(),
    }
}

/// Jaccard similarity of two string sets; two empty sets are dissimilar
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    use std::collections::HashSet;

    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceType;
    use chrono::Utc;

    fn point(content: &str) -> DataPoint {
        DataPoint::new(SourceType::Social, content, Utc::now())
    }

    #[test]
    fn test_extract_keywords() {
        let points = vec![
            point("Quantum chips are shipping. Quantum!"),
            point("New chips from the quantum lab"),
            point("the lab is big"),
        ];

        let keywords = extract_keywords(&points, 10);
        assert_eq!(keywords[0], "quantum");
        assert_eq!(keywords[1], "chips");
        // short words dropped
        assert!(!keywords.iter().any(|k| k == "the" || k == "lab" || k == "big"));
        // ties keep first occurrence
        assert_eq!(keywords[2], "shipping");
    }

    #[test]
    fn test_extract_keywords_limit() {
        let points = vec![point("alpha bravo charlie delta echoes foxtrot")];
        assert_eq!(extract_keywords(&points, 2), vec!["alpha", "bravo"]);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let text = "héllo wörld";
        assert_eq!(excerpt(text, 4), "héll");
        assert_eq!(excerpt(text, 100), text);
    }

    #[test]
    fn test_jaccard() {
        let a = vec!["ai".to_string(), "chips".to_string()];
        let b = vec!["chips".to_string(), "cloud".to_string()];
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard(&[], &[]), 0.0);
    }

    #[test]
    fn test_ranked_entities() {
        let points = vec![
            point("a").with_entities(["Acme", "Initech"]),
            point("b").with_entities(["Initech"]),
        ];
        assert_eq!(ranked_entities(&points, 10), vec!["Initech", "Acme"]);
        assert_eq!(distinct_entities(&points), vec!["Acme", "Initech"]);
    }
}
