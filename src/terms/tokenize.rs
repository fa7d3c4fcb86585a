// Tokenization shared by term extraction and the document-term matrix.
//
// Text is split into phrases at punctuation, then each phrase is lower-cased
// and split into tokens at every non-alphanumeric character. Both stages
// must tokenize identically, otherwise extracted terms would fail to match
// the documents they came from.

use std::sync::LazyLock;

use regex_lite::Regex;

static PHRASE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.,;:!?()\[\]{}"|/\\]+"#).expect("phrase break pattern is valid")
});

/// Split text into phrases of normalized tokens. Empty phrases are dropped.
pub fn phrases(text: &str) -> Vec<Vec<String>> {
    PHRASE_BREAK
        .split(text)
        .map(tokens)
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

/// Lower-case a phrase and split it into alphanumeric tokens.
pub fn tokens(phrase: &str) -> Vec<String> {
    phrase
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Normalize free text into terms: one space-joined term per phrase.
///
/// Used for tags, so that "Remote-Sensing" and "remote sensing" name the
/// same term.
pub fn normalize_terms(text: &str) -> Vec<String> {
    phrases(text).into_iter().map(|t| t.join(" ")).collect()
}

/// True for tokens made only of digits ("2019", "42").
pub fn is_numeric(token: &str) -> bool {
    token.chars().all(|c| c.is_numeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrases_split_on_punctuation() {
        let p = phrases("Soil erosion, GIS-based (mapping). Done!");
        assert_eq!(
            p,
            vec![
                vec!["soil", "erosion"],
                vec!["gis", "based"],
                vec!["mapping"],
                vec!["done"],
            ]
        );
    }

    #[test]
    fn test_normalize_terms_for_tags() {
        assert_eq!(normalize_terms("  Remote-Sensing "), vec!["remote sensing"]);
        assert_eq!(normalize_terms("GIS; LiDAR"), vec!["gis", "lidar"]);
        assert!(normalize_terms(" -- ").is_empty());
    }

    #[test]
    fn test_unicode_letters_kept() {
        assert_eq!(tokens("Évaluation des sols"), vec!["évaluation", "des", "sols"]);
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("2019"));
        assert!(!is_numeric("3d"));
    }
}
