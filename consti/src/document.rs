//! The current state of the constitution.

use serde::{Deserialize, Serialize};

use crate::error::ConstiError;

const SECTION_PREFIX: &str = "article-";

/// The constitution document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstitutionDocument {
    /// Incremented once per amendment.
    pub version: u64,
    /// Articles in adoption order.
    pub articles: Vec<Article>,
    /// Highest `article-<n>` ever assigned. Repealed numbers are not reused.
    pub last_article_number: u64,
}

/// A single article in the constitution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable key proposals refer to in `affectedSections`.
    pub section: String,
    pub title: String,
    pub text: String,
    /// The amendment that introduced or last rewrote this article.
    pub introduced_by_amendment: u64,
}

impl Default for ConstitutionDocument {
    fn default() -> Self {
        Self::genesis()
    }
}

impl ConstitutionDocument {
    /// The empty constitution, version 0.
    pub fn genesis() -> Self {
        Self {
            version: 0,
            articles: Vec::new(),
            last_article_number: 0,
        }
    }

    pub fn article(&self, section: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.section == section)
    }

    /// Apply an amendment's text.
    ///
    /// With no affected sections a new article is appended. Otherwise the
    /// first affected section receives `text` (created if missing) and the
    /// rest are repealed. Returns the superseded text of every affected
    /// section that existed, separated by blank lines.
    pub fn amend(
        &mut self,
        amendment: u64,
        title: &str,
        text: &str,
        affected_sections: &[String],
    ) -> Option<String> {
        self.version += 1;

        let Some((first, repealed)) = affected_sections.split_first() else {
            let section = self.next_section();
            self.articles.push(Article {
                section,
                title: title.to_string(),
                text: text.to_string(),
                introduced_by_amendment: amendment,
            });
            return None;
        };

        for section in affected_sections {
            self.reserve(section);
        }

        let before: Vec<String> = affected_sections
            .iter()
            .filter_map(|s| self.article(s).map(|a| a.text.clone()))
            .collect();

        self.articles.retain(|a| !repealed.contains(&a.section));
        match self.articles.iter_mut().find(|a| &a.section == first) {
            Some(article) => {
                article.text = text.to_string();
                article.introduced_by_amendment = amendment;
            }
            None => self.articles.push(Article {
                section: first.clone(),
                title: title.to_string(),
                text: text.to_string(),
                introduced_by_amendment: amendment,
            }),
        }

        if before.is_empty() {
            None
        } else {
            Some(before.join("\n\n"))
        }
    }

    /// Claim the next unused `article-<n>` key.
    fn next_section(&mut self) -> String {
        self.last_article_number += 1;
        format!("{SECTION_PREFIX}{}", self.last_article_number)
    }

    /// Keep appended articles clear of a number a proposal named explicitly,
    /// whether it was created or repealed.
    fn reserve(&mut self, section: &str) {
        if let Some(n) = section
            .strip_prefix(SECTION_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n < u64::MAX)
        {
            self.last_article_number = self.last_article_number.max(n);
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConstiError> {
        bincode::serialize(self).map_err(|e| ConstiError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConstiError> {
        bincode::deserialize(bytes).map_err(|e| ConstiError::Encoding(e.to_string()))
    }
}
