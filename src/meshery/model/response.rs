use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::meshery::model::error::{ImportError, Result};

/// Label used when the registry reply cannot be decoded.
pub const RESPONSE_BODY: &str = "response body";

/// Entity type tag marking a file the registry could not read at all.
pub const UNKNOWN_ENTITY: &str = "Unknown";
/// Entity type tag for component definitions.
pub const COMPONENT_ENTITY: &str = "component";
/// Entity type tag for relationship definitions.
pub const RELATIONSHIP_ENTITY: &str = "relationship";

/// Entity counters reported by the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntityCount {
    #[serde(rename = "comp_count")]
    pub components: u64,
    #[serde(rename = "rel_count")]
    pub relationships: u64,
    #[serde(rename = "total_err_count", alias = "total_count")]
    pub errors: u64,
}

/// Owning model of a registered component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelRef {
    pub name: String,
    pub category: String,
    pub version: String,
}

/// A component the registry accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRecord {
    pub display_name: String,
    pub model: ModelRef,
}

/// First allowed `from` and `to` kinds of one relationship selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEndpoints {
    pub from: String,
    pub to: String,
}

/// A relationship the registry accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRecord {
    pub kind: String,
    pub subtype: String,
    pub model_name: String,
    pub endpoints: Vec<SelectorEndpoints>,
}

/// A group of entities the registry rejected with a shared error.
///
/// `names` and `entity_types` are parallel; an index past the end of
/// `entity_types` has no type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntityRecord {
    pub names: Vec<String>,
    pub entity_types: Vec<String>,
    pub long_description: String,
}

impl FailedEntityRecord {
    /// Entity type at `index`, or `""` when the type list is shorter.
    pub fn entity_type(&self, index: usize) -> &str {
        self.entity_types.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Response list a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Components,
    Relationships,
    UnsuccessfulEntities,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Components => write!(f, "successful_components"),
            Section::Relationships => write!(f, "successful_relationships"),
            Section::UnsuccessfulEntities => write!(f, "unsuccessful_entity_name_with_error"),
        }
    }
}

/// A record-level problem found while decoding the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub section: Section,
    pub index: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.section, self.index, self.message)
    }
}

/// Structured form of the registry's reply to a registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryResponse {
    pub message: String,
    pub model_names: Vec<String>,
    pub entity_count: EntityCount,
    pub components: Vec<ComponentRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub failed_entities: Vec<FailedEntityRecord>,
    /// Records that were skipped or partially read, in decode order.
    pub diagnostics: Vec<Diagnostic>,
}

impl RegistryResponse {
    /// Decodes a raw response body.
    ///
    /// Fails only when the body is not a JSON object of the expected outer
    /// shape. Malformed entries inside the three entity lists are skipped and
    /// recorded in [`RegistryResponse::diagnostics`].
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let raw: RawResponse =
            serde_json::from_slice(body).map_err(|source| ImportError::Deserialize {
                origin: RESPONSE_BODY,
                source,
            })?;
        Ok(Self::from_raw(raw))
    }

    /// Decodes an already parsed JSON document.
    pub fn from_value(value: Value) -> Result<Self> {
        let raw: RawResponse =
            serde_json::from_value(value).map_err(|source| ImportError::Deserialize {
                origin: RESPONSE_BODY,
                source,
            })?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawResponse) -> Self {
        let summary = raw.entity_type_summary.unwrap_or_default();
        let mut diagnostics = Vec::new();

        let components = decode_section(
            Section::Components,
            summary.successful_components.unwrap_or_default(),
            &mut diagnostics,
            |raw: RawComponent, _| Ok(raw.into_record()),
        );
        let relationships = decode_section(
            Section::Relationships,
            summary.successful_relationships.unwrap_or_default(),
            &mut diagnostics,
            |raw: RawRelationship, _| raw.into_record(),
        );
        let failed_entities = decode_section(
            Section::UnsuccessfulEntities,
            summary.unsuccessful_entity_name_with_error.unwrap_or_default(),
            &mut diagnostics,
            |raw: RawFailedEntity, notes| Ok(raw.into_record(notes)),
        );

        debug!(
            components = components.len(),
            relationships = relationships.len(),
            failed_entities = failed_entities.len(),
            diagnostics = diagnostics.len(),
            "decoded registry response"
        );

        Self {
            message: raw.err_msg.unwrap_or_default(),
            model_names: raw.model_name.unwrap_or_default(),
            entity_count: raw.entity_count.unwrap_or_default(),
            components,
            relationships,
            failed_entities,
            diagnostics,
        }
    }

    /// Distinct non-empty model names in first-seen order, joined by `", "`.
    pub fn model_names_joined(&self) -> String {
        let mut seen = HashSet::new();
        self.model_names
            .iter()
            .filter(|name| !name.is_empty() && seen.insert(name.as_str()))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Notes gathered while converting one record that does not get skipped.
type Notes = Vec<String>;

fn decode_section<R, T>(
    section: Section,
    values: Vec<Value>,
    diagnostics: &mut Vec<Diagnostic>,
    mut convert: impl FnMut(R, &mut Notes) -> std::result::Result<T, String>,
) -> Vec<T>
where
    R: DeserializeOwned,
{
    let mut records = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let mut notes = Notes::new();
        let outcome = serde_json::from_value::<R>(value)
            .map_err(|err| err.to_string())
            .and_then(|raw| convert(raw, &mut notes));

        for note in notes {
            record_diagnostic(diagnostics, section, index, note);
        }

        match outcome {
            Ok(record) => records.push(record),
            Err(reason) => {
                record_diagnostic(diagnostics, section, index, format!("record skipped: {reason}"))
            }
        }
    }

    records
}

fn record_diagnostic(
    diagnostics: &mut Vec<Diagnostic>,
    section: Section,
    index: usize,
    message: String,
) {
    warn!(%section, index, "{message}");
    diagnostics.push(Diagnostic {
        section,
        index,
        message,
    });
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResponse {
    err_msg: Option<String>,
    model_name: Option<Vec<String>>,
    entity_count: Option<EntityCount>,
    entity_type_summary: Option<RawEntityTypeSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEntityTypeSummary {
    successful_components: Option<Vec<Value>>,
    successful_relationships: Option<Vec<Value>>,
    unsuccessful_entity_name_with_error: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    #[serde(rename = "DisplayName", default)]
    display_name: Option<String>,
    #[serde(rename = "Model")]
    model: RawModel,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<RawNamed>,
    #[serde(default)]
    model: Option<RawVersion>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    #[serde(default)]
    version: Option<String>,
}

impl RawComponent {
    fn into_record(self) -> ComponentRecord {
        ComponentRecord {
            display_name: self.display_name.unwrap_or_default(),
            model: ModelRef {
                name: self.model.name.unwrap_or_default(),
                category: self
                    .model
                    .category
                    .and_then(|category| category.name)
                    .unwrap_or_default(),
                version: self
                    .model
                    .model
                    .and_then(|model| model.version)
                    .unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "Subtype")]
    subtype: String,
    #[serde(rename = "Model")]
    model: RawModelName,
    #[serde(rename = "Selectors")]
    selectors: Vec<RawSelector>,
}

#[derive(Debug, Deserialize)]
struct RawModelName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawSelector {
    allow: RawAllow,
}

#[derive(Debug, Deserialize)]
struct RawAllow {
    from: Vec<RawKind>,
    to: Vec<RawKind>,
}

#[derive(Debug, Deserialize)]
struct RawKind {
    kind: String,
}

impl RawRelationship {
    fn into_record(self) -> std::result::Result<RelationshipRecord, String> {
        let mut endpoints = Vec::with_capacity(self.selectors.len());
        for (position, selector) in self.selectors.into_iter().enumerate() {
            let RawAllow { from, to } = selector.allow;
            let from = from
                .into_iter()
                .next()
                .ok_or_else(|| format!("selector {position} allows no `from` kind"))?;
            let to = to
                .into_iter()
                .next()
                .ok_or_else(|| format!("selector {position} allows no `to` kind"))?;
            endpoints.push(SelectorEndpoints {
                from: from.kind,
                to: to.kind,
            });
        }

        Ok(RelationshipRecord {
            kind: self.kind,
            subtype: self.subtype,
            model_name: self.model.name,
            endpoints,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawFailedEntity {
    name: Vec<String>,
    #[serde(rename = "entityType")]
    entity_type: Vec<String>,
    error: RawErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RawErrorDetail {
    #[serde(rename = "LongDescription", default)]
    long_description: Value,
}

impl RawFailedEntity {
    fn into_record(self, notes: &mut Notes) -> FailedEntityRecord {
        FailedEntityRecord {
            names: self.name,
            entity_types: self.entity_type,
            long_description: join_long_description(&self.error.long_description, notes),
        }
    }
}

/// Joins the description fragments with single spaces, skipping anything
/// that is not a string.
fn join_long_description(value: &Value, notes: &mut Notes) -> String {
    let Some(fragments) = value.as_array() else {
        notes.push(format!("LongDescription is not a list of strings: {value}"));
        return String::new();
    };

    let mut parts = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        match fragment.as_str() {
            Some(text) => parts.push(text),
            None => notes.push(format!("LongDescription fragment is not a string: {fragment}")),
        }
    }
    parts.join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> RegistryResponse {
        RegistryResponse::from_value(value).expect("response decoded")
    }

    #[test]
    fn missing_lists_decode_as_empty() {
        let response = decode(json!({"err_msg": "nothing to do", "extra": 1}));

        assert_eq!(response.message, "nothing to do");
        assert!(response.model_names.is_empty());
        assert!(response.components.is_empty());
        assert!(response.relationships.is_empty());
        assert!(response.failed_entities.is_empty());
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let response = decode(json!({
            "model_name": null,
            "entity_type_summary": {
                "successful_components": null,
                "successful_relationships": null,
                "unsuccessful_entity_name_with_error": null
            }
        }));

        assert!(response.model_names.is_empty());
        assert!(response.components.is_empty());
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn entity_counts_accept_both_error_field_names() {
        let response = decode(json!({
            "entity_count": {"comp_count": 3, "rel_count": 2, "total_err_count": 1}
        }));
        assert_eq!(
            response.entity_count,
            EntityCount {
                components: 3,
                relationships: 2,
                errors: 1
            }
        );

        let response = decode(json!({"entity_count": {"total_count": 4}}));
        assert_eq!(response.entity_count.errors, 4);
    }

    #[test]
    fn component_with_partial_model_keeps_empty_cells() {
        let response = decode(json!({
            "entity_type_summary": {
                "successful_components": [
                    {"DisplayName": "Pod", "Model": {"name": "k8s"}}
                ]
            }
        }));

        assert_eq!(
            response.components,
            vec![ComponentRecord {
                display_name: "Pod".into(),
                model: ModelRef {
                    name: "k8s".into(),
                    category: String::new(),
                    version: String::new(),
                },
            }]
        );
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn component_without_model_is_skipped() {
        let response = decode(json!({
            "entity_type_summary": {
                "successful_components": [
                    {"DisplayName": "Orphan"},
                    {"DisplayName": "Pod", "Model": {"name": "k8s"}}
                ]
            }
        }));

        assert_eq!(response.components.len(), 1);
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].section, Section::Components);
        assert_eq!(response.diagnostics[0].index, 0);
    }

    #[test]
    fn relationship_selectors_use_first_kinds() {
        let response = decode(json!({
            "entity_type_summary": {
                "successful_relationships": [{
                    "Kind": "edge",
                    "Subtype": "network",
                    "Model": {"name": "k8s"},
                    "Selectors": [
                        {"allow": {
                            "from": [{"kind": "Service"}, {"kind": "Ingress"}],
                            "to": [{"kind": "Pod"}, {"kind": "Deployment"}]
                        }}
                    ]
                }]
            }
        }));

        assert_eq!(
            response.relationships[0].endpoints,
            vec![SelectorEndpoints {
                from: "Service".into(),
                to: "Pod".into()
            }]
        );
    }

    #[test]
    fn relationship_with_empty_allow_list_is_skipped() {
        let response = decode(json!({
            "entity_type_summary": {
                "successful_relationships": [{
                    "Kind": "edge",
                    "Subtype": "network",
                    "Model": {"name": "k8s"},
                    "Selectors": [{"allow": {"from": [], "to": [{"kind": "Pod"}]}}]
                }]
            }
        }));

        assert!(response.relationships.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].message.contains("`from`"));
    }

    #[test]
    fn long_description_fragments_are_joined_and_trimmed() {
        let response = decode(json!({
            "entity_type_summary": {
                "unsuccessful_entity_name_with_error": [{
                    "name": ["m1"],
                    "entityType": ["component"],
                    "error": {"LongDescription": ["  schema", "validation", 7, "failed "]}
                }]
            }
        }));

        assert_eq!(
            response.failed_entities[0].long_description,
            "schema validation failed"
        );
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].section, Section::UnsuccessfulEntities);
    }

    #[test]
    fn non_list_long_description_keeps_record() {
        let response = decode(json!({
            "entity_type_summary": {
                "unsuccessful_entity_name_with_error": [{
                    "name": ["m1"],
                    "entityType": ["component"],
                    "error": {"LongDescription": "flat string"}
                }]
            }
        }));

        assert_eq!(response.failed_entities.len(), 1);
        assert_eq!(response.failed_entities[0].long_description, "");
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[test]
    fn failed_entity_type_past_end_is_empty() {
        let record = FailedEntityRecord {
            names: vec!["a".into(), "b".into()],
            entity_types: vec!["component".into()],
            long_description: String::new(),
        };

        assert_eq!(record.entity_type(0), "component");
        assert_eq!(record.entity_type(1), "");
    }

    #[test]
    fn non_object_body_is_a_deserialization_error() {
        let error = RegistryResponse::from_slice(b"\"just text\"").unwrap_err();
        assert!(matches!(
            error,
            ImportError::Deserialize {
                origin: RESPONSE_BODY,
                ..
            }
        ));
        assert!(error.to_string().contains("response body"));
    }

    #[test]
    fn model_names_joined_drops_blanks_and_repeats() {
        let response = decode(json!({"model_name": ["a", "", "b", "a", "c.yaml"]}));
        assert_eq!(response.model_names_joined(), "a, b, c.yaml");
    }
}
