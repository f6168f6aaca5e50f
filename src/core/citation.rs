//! Citation placeholders and their resolution against the message's
//! retrieved documents and sub-questions.

use std::fmt;

use crate::api::{SearchDocument, SubQuestionDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationKind {
    Question,
    Document,
    /// Bare `{{n}}` markers. These index into the documents.
    Numbered,
}

impl CitationKind {
    fn prefix(self) -> &'static str {
        match self {
            CitationKind::Question => "Q",
            CitationKind::Document => "D",
            CitationKind::Numbered => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CitationMarker {
    pub kind: CitationKind,
    /// 1-based.
    pub number: u32,
}

impl CitationMarker {
    pub fn new(kind: CitationKind, number: u32) -> Self {
        Self { kind, number }
    }

    /// The markdown link written into normalized text, e.g. `[[Q3]]()`.
    pub fn placeholder(&self) -> String {
        format!("[[{self}]]()")
    }

    /// Parses the visible text of a placeholder link. Accepts both `Q3` and
    /// the bracketed `[Q3]` the markdown parser reports as link text.
    pub fn parse_label(label: &str) -> Option<Self> {
        let inner = label
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(label.trim());

        let (kind, digits) = match inner.as_bytes().first()? {
            b'Q' => (CitationKind::Question, &inner[1..]),
            b'D' => (CitationKind::Document, &inner[1..]),
            _ => (CitationKind::Numbered, inner),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(|number| Self::new(kind, number))
    }
}

impl fmt::Display for CitationMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCitation<'a> {
    Document {
        marker: CitationMarker,
        document: &'a SearchDocument,
    },
    SubQuestion {
        marker: CitationMarker,
        question: &'a SubQuestionDetail,
    },
    Unresolved(CitationMarker),
}

impl ResolvedCitation<'_> {
    pub fn marker(&self) -> CitationMarker {
        match self {
            ResolvedCitation::Document { marker, .. }
            | ResolvedCitation::SubQuestion { marker, .. }
            | ResolvedCitation::Unresolved(marker) => *marker,
        }
    }

    /// Short text for a sources footer.
    pub fn title(&self) -> Option<String> {
        match self {
            ResolvedCitation::Document { document, .. } => {
                Some(document.semantic_identifier.clone())
            }
            ResolvedCitation::SubQuestion { question, .. } => Some(question.question.clone()),
            ResolvedCitation::Unresolved(_) => None,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            ResolvedCitation::Document { document, .. } => document.link.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationLookup {
    pub documents: Vec<SearchDocument>,
    pub sub_questions: Vec<SubQuestionDetail>,
}

impl CitationLookup {
    pub fn new(documents: Vec<SearchDocument>, sub_questions: Vec<SubQuestionDetail>) -> Self {
        Self {
            documents,
            sub_questions,
        }
    }

    pub fn resolve(&self, marker: CitationMarker) -> ResolvedCitation<'_> {
        let index = (marker.number as usize).checked_sub(1);
        let resolved = match marker.kind {
            CitationKind::Question => index
                .and_then(|i| self.sub_questions.get(i))
                .map(|question| ResolvedCitation::SubQuestion { marker, question }),
            CitationKind::Document | CitationKind::Numbered => index
                .and_then(|i| self.documents.get(i))
                .map(|document| ResolvedCitation::Document { marker, document }),
        };
        resolved.unwrap_or(ResolvedCitation::Unresolved(marker))
    }

    pub fn resolve_label(&self, label: &str) -> Option<ResolvedCitation<'_>> {
        CitationMarker::parse_label(label).map(|marker| self.resolve(marker))
    }
}
