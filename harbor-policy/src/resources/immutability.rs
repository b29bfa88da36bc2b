//! Tag immutability rules of a project.

use serde::{Deserialize, Serialize};

use super::{Identified, Selector, null_as_default};
use crate::clients::registry::decode;
use crate::error::Result;

pub const IMMUTABLE_ACTION: &str = "immutable";
pub const IMMUTABLE_TEMPLATE: &str = "immutable_template";

pub fn rules_path(project_id: i64) -> String {
    format!("/projects/{project_id}/immutabletagrules")
}

pub fn rule_path(project_id: i64, rule_id: i64) -> String {
    format!("{}/{rule_id}", rules_path(project_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepoDecoration {
    #[serde(rename = "repoMatches")]
    RepoMatches,
    #[serde(rename = "repoExcludes")]
    RepoExcludes,
}

impl RepoDecoration {
    pub fn as_str(self) -> &'static str {
        match self {
            RepoDecoration::RepoMatches => "repoMatches",
            RepoDecoration::RepoExcludes => "repoExcludes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagDecoration {
    #[serde(rename = "matches")]
    Matches,
    #[serde(rename = "excludes")]
    Excludes,
}

impl TagDecoration {
    pub fn as_str(self) -> &'static str {
        match self {
            TagDecoration::Matches => "matches",
            TagDecoration::Excludes => "excludes",
        }
    }
}

/// Declared pattern, `kind` restricted to the decorations the registry accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDecl<K> {
    pub kind: K,
    pub pattern: String,
}

/// One declared immutability rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImmutabilityDecl {
    pub repository: PatternDecl<RepoDecoration>,
    pub tag: PatternDecl<TagDecoration>,
}

impl ImmutabilityDecl {
    pub fn new(
        repo_kind: RepoDecoration,
        repo_pattern: impl Into<String>,
        tag_kind: TagDecoration,
        tag_pattern: impl Into<String>,
    ) -> Self {
        Self {
            repository: PatternDecl {
                kind: repo_kind,
                pattern: repo_pattern.into(),
            },
            tag: PatternDecl {
                kind: tag_kind,
                pattern: tag_pattern.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSelectors {
    #[serde(default, deserialize_with = "null_as_default")]
    pub repository: Vec<Selector>,
}

/// Canonical immutability rule; also the POST payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableRule {
    pub disabled: bool,
    pub action: String,
    pub scope_selectors: ScopeSelectors,
    pub tag_selectors: Vec<Selector>,
    pub project_id: i64,
    pub priority: i64,
    pub template: String,
}

impl ImmutableRule {
    pub fn desired(decl: &ImmutabilityDecl, project_id: i64) -> Self {
        Self {
            disabled: false,
            action: IMMUTABLE_ACTION.to_string(),
            scope_selectors: ScopeSelectors {
                repository: vec![Selector::doublestar(
                    decl.repository.kind.as_str(),
                    decl.repository.pattern.clone(),
                )],
            },
            tag_selectors: vec![Selector::doublestar(
                decl.tag.kind.as_str(),
                decl.tag.pattern.clone(),
            )],
            project_id,
            priority: 0,
            template: IMMUTABLE_TEMPLATE.to_string(),
        }
    }

    pub fn desired_list(decls: &[ImmutabilityDecl], project_id: i64) -> Vec<Self> {
        decls.iter().map(|d| Self::desired(d, project_id)).collect()
    }
}

/// An immutability rule as the registry returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImmutableRule {
    pub id: i64,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope_selectors: ScopeSelectors,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_selectors: Vec<Selector>,
    #[serde(default)]
    pub template: String,
}

impl RemoteImmutableRule {
    /// Strip the id and pin the fields the desired side fixes.
    pub fn canonicalize(self, project_id: i64) -> Identified<ImmutableRule> {
        Identified {
            id: self.id,
            item: ImmutableRule {
                disabled: false,
                action: self.action,
                scope_selectors: self.scope_selectors,
                tag_selectors: self.tag_selectors,
                project_id,
                priority: 0,
                template: self.template,
            },
        }
    }
}

/// Canonicalize a fetched rule list, keeping ids in fetch order.
pub fn from_wire(path: &str, body: &str, project_id: i64) -> Result<Vec<Identified<ImmutableRule>>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let remote: Option<Vec<RemoteImmutableRule>> = decode(path, body)?;
    Ok(remote
        .unwrap_or_default()
        .into_iter()
        .map(|rule| rule.canonicalize(project_id))
        .collect())
}
