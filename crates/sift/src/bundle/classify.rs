use std::sync::Arc;

use super::layout::FormatGeneration;
use super::parser::ParserKind;
use super::rules::RuleBook;
use super::FileReference;

/// Pure path → parser lookup over a shared [`RuleBook`].
///
/// Holds no mutable state, so one classifier can be shared across threads
/// classifying files of the same bundle in parallel.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    rules: Arc<RuleBook>,
}

impl PathClassifier {
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self { rules }
    }

    /// First rule of `generation` matching `file`, or `None` when the file is
    /// supplementary (kept in the bundle but not parsed).
    pub fn classify(&self, generation: FormatGeneration, file: &FileReference) -> Option<ParserKind> {
        self.rules
            .for_generation(generation)
            .first_match(file)
            .map(|rule| rule.kind())
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }
}
