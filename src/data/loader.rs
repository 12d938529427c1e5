use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use thiserror::Error;

use crate::models::Question;

pub const DEFAULT_QUESTIONS_PATH: &str = "questions.json";

/// The question document could not be used. Fatal for the whole quiz.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Unreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("category '{category}', question {index}: {reason}")]
    Invalid {
        category: String,
        index: usize,
        reason: &'static str,
    },

    #[error("category '{0}' appears more than once")]
    DuplicateCategory(String),

    #[error("question document contains no categories")]
    NoCategories,
}

/// Top-level entries in document order, duplicates included.
struct Document(Vec<(String, Vec<Question>)>);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping category names to question lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(Document(entries))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

pub(crate) fn read_document<P: AsRef<Path>>(path: P) -> Result<String, LoadError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| LoadError::Unreachable {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn parse_document(json: &str) -> Result<BTreeMap<String, Vec<Question>>, LoadError> {
    let Document(entries) = serde_json::from_str(json)?;

    let mut categories = BTreeMap::new();
    for (category, questions) in entries {
        if categories.contains_key(&category) {
            return Err(LoadError::DuplicateCategory(category));
        }
        categories.insert(category, questions);
    }

    if categories.is_empty() {
        return Err(LoadError::NoCategories);
    }

    for (category, questions) in &categories {
        for (index, question) in questions.iter().enumerate() {
            validate_question(question).map_err(|reason| LoadError::Invalid {
                category: category.clone(),
                index,
                reason,
            })?;
        }
    }

    Ok(categories)
}

fn validate_question(question: &Question) -> Result<(), &'static str> {
    if question.text.trim().is_empty() {
        return Err("question text is empty");
    }

    if question.options.len() < 2 {
        return Err("needs at least two options");
    }

    let mut seen = HashSet::with_capacity(question.options.len());
    if !question.options.iter().all(|option| seen.insert(option.as_str())) {
        return Err("options are not unique");
    }

    if !question.options.contains(&question.answer) {
        return Err("answer is not one of the options");
    }

    Ok(())
}
