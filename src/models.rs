use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// --- Input Document ---

/// One top-level element of the input document.
///
/// Fields are optional at parse time so that a record missing a field is
/// reported when it is inserted, not when the document is read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WordRecord {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<DefinitionRecord>>,
}

/// One element of a record's `data` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefinitionRecord {
    /// The definition header. The source document names this field `word`.
    #[serde(rename = "word", default)]
    pub header: Option<String>,
    /// The definition body, any JSON value. `None` only when the key is absent;
    /// an explicit `null` is kept as `Some(Value::Null)`.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub definition: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// --- Stored Rows ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub id: i64,
    pub word_id: i64,
    /// JSON text of the definition body.
    pub definition: String,
    pub definition_header: String,
}

impl Definition {
    /// Renders the stored body as plain text for terminal output.
    pub fn render_body(&self) -> String {
        render_definition(&self.definition)
    }

    /// Words the body links to.
    pub fn links(&self) -> Vec<String> {
        definition_links(&self.definition)
    }
}

/// Row counts of both tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub words: u64,
    pub definitions: u64,
}

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub words_inserted: u64,
    pub definitions_inserted: u64,
}

// --- Definition Bodies ---

/// A node of a structured definition body: plain text or a markup tag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BodyNode {
    Text(String),
    Tag(BodyTag),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BodyTag {
    #[serde(rename = "type")]
    pub tag_type: String,
    #[serde(default)]
    pub children: Option<Vec<BodyNode>>,
    /// Link target of `label-onclick` tags.
    #[serde(default)]
    pub to: Option<String>,
}

impl BodyNode {
    fn render_into(&self, out: &mut String) {
        match self {
            BodyNode::Text(text) => out.push_str(text),
            BodyNode::Tag(tag) => tag.render_into(out),
        }
    }

    fn collect_links(&self, links: &mut Vec<String>) {
        if let BodyNode::Tag(tag) = self {
            if tag.tag_type == "label-onclick" {
                if let Some(target) = tag.link_target() {
                    if !links.iter().any(|l| l == target) {
                        links.push(target.to_string());
                    }
                }
            }
            for child in tag.children.iter().flatten() {
                child.collect_links(links);
            }
        }
    }
}

impl BodyTag {
    fn render_into(&self, out: &mut String) {
        if self.tag_type == "br" {
            out.push('\n');
            return;
        }
        // i, sup, sub, label-onclick and unknown tags all reduce to their text
        if let Some(children) = &self.children {
            for child in children {
                child.render_into(out);
            }
        }
    }

    /// The word a `label-onclick` tag points at, e.g. `lookupWord1('cat')` -> `cat`.
    pub fn link_target(&self) -> Option<&str> {
        let to = self.to.as_deref()?;
        Some(
            to.strip_prefix("lookupWord1('")
                .and_then(|rest| rest.strip_suffix("')"))
                .unwrap_or(to),
        )
    }
}

fn parse_body_nodes(value: &Value) -> Option<Vec<BodyNode>> {
    match value {
        Value::Array(_) => Vec::<BodyNode>::deserialize(value).ok(),
        _ => None,
    }
}

/// Renders the JSON text stored in the `definition` column as plain text.
///
/// Strings render as themselves, arrays of body nodes are flattened, other
/// JSON values render as compact JSON and non-JSON text is returned verbatim.
pub fn render_definition(stored: &str) -> String {
    let value: Value = match serde_json::from_str(stored) {
        Ok(value) => value,
        Err(_) => return stored.to_string(),
    };
    if let Value::String(text) = value {
        return text;
    }
    match parse_body_nodes(&value) {
        Some(nodes) => {
            let mut out = String::new();
            for node in &nodes {
                node.render_into(&mut out);
            }
            out
        }
        None => value.to_string(),
    }
}

/// Collects the distinct `label-onclick` targets of a stored body, in order.
pub fn definition_links(stored: &str) -> Vec<String> {
    let mut links = Vec::new();
    let nodes = serde_json::from_str::<Value>(stored)
        .ok()
        .and_then(|value| parse_body_nodes(&value));
    for node in nodes.iter().flatten() {
        node.collect_links(&mut links);
    }
    links
}
