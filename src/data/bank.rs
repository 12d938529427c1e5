use std::collections::BTreeMap;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use super::loader::{self, LoadError};
use crate::models::Question;

/// Categorized questions, loaded once and never structurally mutated.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    categories: BTreeMap<String, Vec<Question>>,
}

impl QuestionBank {
    /// Load and validate the document at `path`, shuffling each category once.
    pub fn load<P: AsRef<Path>, R: Rng + ?Sized>(path: P, rng: &mut R) -> Result<Self, LoadError> {
        let json = loader::read_document(&path)?;
        let mut bank = Self::from_json_str(&json)?;
        for questions in bank.categories.values_mut() {
            questions.shuffle(rng);
        }
        info!(
            path = %path.as_ref().display(),
            categories = bank.categories.len(),
            "loaded question bank"
        );
        Ok(bank)
    }

    /// Parse and validate a JSON document without touching the filesystem.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(Self {
            categories: loader::parse_document(json)?,
        })
    }

    pub fn from_categories(categories: BTreeMap<String, Vec<Question>>) -> Self {
        Self { categories }
    }

    /// Category names, sorted.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn questions(&self, category: &str) -> Option<&[Question]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }
}

/// Uniformly random reordering (Fisher-Yates) into a new sequence.
pub fn shuffle<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<Question> {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// The question's options in a fresh random display order.
pub fn shuffled_options<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> Vec<String> {
    let mut options = question.options.clone();
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::new(format!("q{}", i), &["a", "b", "c", "d"], "a"))
            .collect()
    }

    fn sorted_texts(qs: &[Question]) -> Vec<String> {
        let mut texts: Vec<_> = qs.iter().map(|q| q.text.clone()).collect();
        texts.sort();
        texts
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let original = questions(10);
        let mut rng = StdRng::seed_from_u64(7);
        let shuffled = shuffle(&original, &mut rng);
        assert_eq!(shuffled.len(), original.len());
        assert_eq!(sorted_texts(&shuffled), sorted_texts(&original));
    }

    #[test]
    fn test_shuffle_changes_order_eventually() {
        let original = questions(5);
        let mut rng = StdRng::seed_from_u64(42);
        let changed = (0..50).any(|_| shuffle(&original, &mut rng) != original);
        assert!(changed);
    }

    #[test]
    fn test_shuffled_options_keeps_answer() {
        let question = Question::new("q", &["a", "b", "c", "d"], "c");
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let mut options = shuffled_options(&question, &mut rng);
            assert!(options.contains(&"c".to_string()));
            options.sort();
            assert_eq!(options, vec!["a", "b", "c", "d"]);
        }
    }

    #[test]
    fn test_categories_sorted() {
        let bank = QuestionBank::from_json_str(
            r#"{"javascript": [], "css": [], "html": []}"#,
        )
        .unwrap();
        let names: Vec<_> = bank.categories().collect();
        assert_eq!(names, vec!["css", "html", "javascript"]);
        assert!(bank.contains("css"));
        assert!(bank.questions("python").is_none());
    }

    #[test]
    fn test_load_shuffles_but_keeps_questions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        let doc: BTreeMap<_, _> = [("css".to_string(), questions(6))].into_iter().collect();
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let bank = QuestionBank::load(&path, &mut rng).unwrap();
        let loaded = bank.questions("css").unwrap();
        assert_eq!(sorted_texts(loaded), sorted_texts(&questions(6)));
    }
}
