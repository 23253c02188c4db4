//! Rules: ordered dispatch tables, one per format generation.
//!
//! Patterns are anchored and case-sensitive and run against the file name.
//! Classic rules also carry a directory scope: the file must sit somewhere
//! under a directory with that exact name, at any depth (`solr/localhost_log.txt`
//! and `solr/sub/localhost_log.txt` both qualify).
//!
//! Order is significant. When more than one rule matches a file the earliest
//! rule in the table wins, so broader patterns go after the narrower ones
//! they overlap with.

use super::layout::FormatGeneration;
use super::parser::ParserKind;
use super::FileReference;
use crate::pattern::{Pattern, PatternError};

const CLASSIC_RULES: &[(Option<&str>, &str, ParserKind)] = &[
    (Some("httpd"), r"^access\..*\.log", ParserKind::Apache),
    (Some("backgrounder"), r"^backgrounder-\d+\.log", ParserKind::Backgrounder),
    (Some("config"), r"^workgroup\.yml$", ParserKind::Config),
    (Some("config"), r"^tabsvc\.yml$", ParserKind::Config),
    (Some("dataserver"), r"^dataserver-\d+\.log", ParserKind::Dataserver),
    (Some("pgsql"), r"^postgresql-.*\.log", ParserKind::Postgres),
    (Some("searchserver"), r"^searchserver-\d+\.log", ParserKind::Searchserver),
    (Some("solr"), r"^localhost_log.*", ParserKind::Solr),
    (Some("logs"), r"^tabadmin\.log", ParserKind::Tabadmin),
    (Some("vizportal"), r"^vizportal-\d+\.log", ParserKind::Vizportal),
    (Some("vizqlserver"), r"^vizqlserver_\d+_.*\.txt", ParserKind::VizqlserverCpp),
    (Some("vizqlserver"), r"^vizqlserver-\d+\.log", ParserKind::Vizqlserver),
    (Some("zookeeper"), r"^zookeeper\.log", ParserKind::Zookeeper),
    (None, r"^netstat-info\.txt$", ParserKind::Netstat),
];

const TSM_LEGACY_RULES: &[(&str, ParserKind)] = &[
    (r"^access\..*\.log", ParserKind::Apache),
    (r"^backgrounder-\d+\.log", ParserKind::Backgrounder),
    (r"^clustercontroller\.log", ParserKind::ClusterController),
    (r"^workgroup\.yml$", ParserKind::Config),
    (r"^tabsvc\.yml$", ParserKind::Config),
    (r"^dataserver-\d+\.log", ParserKind::Dataserver),
    (r"^filestore\.log", ParserKind::Filestore),
    (r"^hyper_\d+_.*\.log", ParserKind::Hyper),
    (r"^netstat-anp\.txt$", ParserKind::Netstat),
    (r"^postgresql-.*\.csv", ParserKind::Postgres),
    (r"^searchserver-\d+\.log", ParserKind::Searchserver),
    (r"^tabadminagent.*\.log", ParserKind::TabadminAgent),
    (r"^tabadmincontroller.*\.log", ParserKind::TabadminController),
    (r"^tabadmin.*\.log", ParserKind::Tabadmin),
    (r"^vizportal-\d+\.log", ParserKind::Vizportal),
    (r"^nativeapi_vizqlserver_\d+-\d+_.*\.txt", ParserKind::VizqlserverCpp),
    (r"^vizqlserver-\d+\.log", ParserKind::Vizqlserver),
    (r"^zookeeper.*\.log", ParserKind::Zookeeper),
];

const TSM_CURRENT_RULES: &[(&str, ParserKind)] = &[
    (r"^access\..*\.log", ParserKind::Apache),
    (r"^backgrounder_node\d+-\d+\.log", ParserKind::Backgrounder),
    (r"^clustercontroller\.log", ParserKind::ClusterController),
    (r"^workgroup\.yml$", ParserKind::Config),
    (r"^tabsvc\.yml$", ParserKind::Config),
    (r"^dataserver_node\d+-\d+\.log", ParserKind::Dataserver),
    (r"^filestore\.log", ParserKind::Filestore),
    (r"^hyper_\d+_.*\.log", ParserKind::Hyper),
    (r"^netstat-anp\.txt$", ParserKind::Netstat),
    (r"^postgresql-.*\.csv", ParserKind::Postgres),
    (r"^searchserver_node\d+-\d+\.log", ParserKind::Searchserver),
    (r"^tabadminagent_node\d+-\d+\.log", ParserKind::TabadminAgent),
    (r"^tabadmincontroller_node\d+-\d+\.log", ParserKind::TabadminController),
    (r"^vizportal_node\d+-\d+\.log", ParserKind::Vizportal),
    (r"^nativeapi_vizqlserver_\d+-\d+_.*\.txt", ParserKind::VizqlserverCpp),
    (r"^vizqlserver_node\d+-\d+\.log", ParserKind::Vizqlserver),
    (r"^zookeeper.*\.log", ParserKind::Zookeeper),
];

#[derive(Debug, Clone)]
pub struct PatternRule {
    scope: Option<String>,
    pattern: Pattern,
    kind: ParserKind,
}

impl PatternRule {
    pub fn new(pattern: &str, kind: ParserKind) -> Result<Self, PatternError> {
        Ok(Self {
            scope: None,
            pattern: Pattern::new(pattern)?,
            kind,
        })
    }

    /// Restrict the rule to files with an ancestor directory named `scope`.
    pub fn in_directory(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    pub fn kind(&self) -> ParserKind {
        self.kind
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn matches(&self, file: &FileReference) -> bool {
        if let Some(scope) = &self.scope {
            if !file.directories().any(|dir| dir == scope) {
                return false;
            }
        }
        self.pattern.is_match(file.file_name())
    }
}

/// The ordered rules of one generation.
#[derive(Debug, Clone)]
pub struct RuleSet {
    generation: FormatGeneration,
    rules: Vec<PatternRule>,
}

impl RuleSet {
    pub fn new(generation: FormatGeneration, rules: Vec<PatternRule>) -> Self {
        Self { generation, rules }
    }

    pub fn generation(&self) -> FormatGeneration {
        self.generation
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn first_match(&self, file: &FileReference) -> Option<&PatternRule> {
        self.rules.iter().find(|rule| rule.matches(file))
    }

    /// Every rule matching `file`, in table order. More than one entry means
    /// the table relies on ordering for this file.
    pub fn all_matches<'a>(&'a self, file: &'a FileReference) -> impl Iterator<Item = &'a PatternRule> + 'a {
        self.rules.iter().filter(move |rule| rule.matches(file))
    }
}

/// Immutable dispatch configuration for all generations.
#[derive(Debug, Clone)]
pub struct RuleBook {
    classic: RuleSet,
    tsm_legacy: RuleSet,
    tsm_current: RuleSet,
}

impl RuleBook {
    pub fn new(classic: RuleSet, tsm_legacy: RuleSet, tsm_current: RuleSet) -> Self {
        Self {
            classic,
            tsm_legacy,
            tsm_current,
        }
    }

    /// The built-in tables for every supported server generation.
    pub fn standard() -> Result<Self, PatternError> {
        let classic = CLASSIC_RULES
            .iter()
            .map(|(scope, pattern, kind)| {
                let rule = PatternRule::new(pattern, *kind)?;
                Ok(match scope {
                    Some(scope) => rule.in_directory(scope),
                    None => rule,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(Self {
            classic: RuleSet::new(FormatGeneration::Classic, classic),
            tsm_legacy: file_name_rules(FormatGeneration::TsmLegacy, TSM_LEGACY_RULES)?,
            tsm_current: file_name_rules(FormatGeneration::TsmCurrent, TSM_CURRENT_RULES)?,
        })
    }

    pub fn for_generation(&self, generation: FormatGeneration) -> &RuleSet {
        match generation {
            FormatGeneration::Classic => &self.classic,
            FormatGeneration::TsmLegacy => &self.tsm_legacy,
            FormatGeneration::TsmCurrent => &self.tsm_current,
        }
    }
}

fn file_name_rules(
    generation: FormatGeneration,
    table: &[(&str, ParserKind)],
) -> Result<RuleSet, PatternError> {
    let rules = table
        .iter()
        .map(|(pattern, kind)| PatternRule::new(pattern, *kind))
        .collect::<Result<Vec<_>, PatternError>>()?;
    Ok(RuleSet::new(generation, rules))
}
