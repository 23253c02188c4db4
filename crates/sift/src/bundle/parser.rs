//! Parser identifiers and parser construction.
//!
//! Field extraction lives in the downstream parsers; this module only decides
//! which parser a file gets and where its records are stored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Apache,
    Backgrounder,
    #[serde(rename = "clustercontroller")]
    ClusterController,
    Config,
    Dataserver,
    Filestore,
    Hyper,
    Netstat,
    Postgres,
    Searchserver,
    Solr,
    Tabadmin,
    #[serde(rename = "tabadminagent")]
    TabadminAgent,
    #[serde(rename = "tabadmincontroller")]
    TabadminController,
    Vizportal,
    Vizqlserver,
    VizqlserverCpp,
    Zookeeper,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Apache => "apache",
            ParserKind::Backgrounder => "backgrounder",
            ParserKind::ClusterController => "clustercontroller",
            ParserKind::Config => "config",
            ParserKind::Dataserver => "dataserver",
            ParserKind::Filestore => "filestore",
            ParserKind::Hyper => "hyper",
            ParserKind::Netstat => "netstat",
            ParserKind::Postgres => "postgres",
            ParserKind::Searchserver => "searchserver",
            ParserKind::Solr => "solr",
            ParserKind::Tabadmin => "tabadmin",
            ParserKind::TabadminAgent => "tabadminagent",
            ParserKind::TabadminController => "tabadmincontroller",
            ParserKind::Vizportal => "vizportal",
            ParserKind::Vizqlserver => "vizqlserver",
            ParserKind::VizqlserverCpp => "vizqlserver_cpp",
            ParserKind::Zookeeper => "zookeeper",
        }
    }
}

/// Shape of the file content a parser consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentShape {
    /// One event per line
    Line,
    /// Java-style lines with continuation (stack traces)
    MultiLine,
    /// One JSON object per line
    Json,
    /// Whole-file YAML document
    Yaml,
    /// CSV rows
    Csv,
    /// Whole-file free text
    Text,
}

/// A parser instance for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogParser {
    pub kind: ParserKind,
    /// Store collection the parsed records land in
    pub collection: &'static str,
    pub shape: ContentShape,
}

impl LogParser {
    pub fn for_kind(kind: ParserKind) -> Self {
        let (collection, shape) = match kind {
            ParserKind::Apache => ("httpd", ContentShape::Line),
            ParserKind::Backgrounder => ("backgrounder", ContentShape::MultiLine),
            ParserKind::ClusterController => ("clustercontroller", ContentShape::MultiLine),
            ParserKind::Config => ("config", ContentShape::Yaml),
            ParserKind::Dataserver => ("dataserver", ContentShape::MultiLine),
            ParserKind::Filestore => ("filestore", ContentShape::MultiLine),
            ParserKind::Hyper => ("hyper", ContentShape::Json),
            ParserKind::Netstat => ("netstat", ContentShape::Text),
            ParserKind::Postgres => ("pgsql", ContentShape::Csv),
            ParserKind::Searchserver => ("searchserver", ContentShape::MultiLine),
            ParserKind::Solr => ("solr", ContentShape::MultiLine),
            ParserKind::Tabadmin => ("tabadmin", ContentShape::Line),
            ParserKind::TabadminAgent => ("tabadminagent", ContentShape::MultiLine),
            ParserKind::TabadminController => ("tabadmincontroller", ContentShape::MultiLine),
            ParserKind::Vizportal => ("vizportal", ContentShape::MultiLine),
            ParserKind::Vizqlserver => ("vizqlserver", ContentShape::MultiLine),
            ParserKind::VizqlserverCpp => ("vizqlserver_cpp", ContentShape::Json),
            ParserKind::Zookeeper => ("zookeeper", ContentShape::MultiLine),
        };

        Self {
            kind,
            collection,
            shape,
        }
    }
}
