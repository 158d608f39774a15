use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::meshery::model::response::{
    COMPONENT_ENTITY, FailedEntityRecord, RELATIONSHIP_ENTITY, RegistryResponse, UNKNOWN_ENTITY,
};

pub mod render;

pub use render::render;

/// Suffixes that mark a model name as a file reference rather than a
/// logical model.
pub const FILE_EXTENSIONS: [&str; 7] =
    [".json", ".yaml", ".yml", ".tar.gz", ".tar", ".zip", ".tgz"];

/// Column headers of the per-model component table.
pub const COMPONENT_HEADERS: [&str; 3] = ["Component", "Category", "Version"];
/// Column headers of each relationship table.
pub const RELATIONSHIP_HEADERS: [&str; 2] = ["From", "To"];

/// One unit of report output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBlock {
    /// Free-text message returned by the registry.
    Summary(String),
    /// Header introducing a logical model's details.
    Model(String),
    /// Rows of `(display name, category, version)`.
    Components(Vec<Vec<String>>),
    /// Deduplicated `(from, to)` rows of one relationship group.
    Relationships {
        kind: String,
        subtype: String,
        rows: Vec<Vec<String>>,
    },
    /// A file the registry could not read at all.
    UnreadableFile { file: String, description: String },
    /// Entities of a model that were not imported.
    ImportFailed { entities: String, description: String },
}

/// Builds the report for one registry response.
///
/// A summary block comes first, then one detail section per referenced model.
/// Logical model names come before file names, and relationship rows are
/// deduplicated per `(kind, subtype)` group. [`render`] writes the blocks to a
/// sink.
pub fn build_report(response: &RegistryResponse) -> Vec<ReportBlock> {
    let mut blocks = vec![ReportBlock::Summary(response.message.clone())];

    if is_empty_result(response) {
        debug!("registry recorded no entity activity; reporting summary only");
        return blocks;
    }

    let (logical, files) = partition_model_names(&response.model_names);
    for model in logical {
        blocks.push(ReportBlock::Model(model.to_string()));
        push_model_details(response, model, &mut blocks);
    }
    for model in files {
        push_model_details(response, model, &mut blocks);
    }

    blocks
}

/// True when the response names a model but reports no components, no
/// relationships and no errors.
pub fn is_empty_result(response: &RegistryResponse) -> bool {
    let counts = &response.entity_count;
    !response.model_names.is_empty()
        && counts.components == 0
        && counts.relationships == 0
        && counts.errors == 0
}

/// Whether `name` ends with one of [`FILE_EXTENSIONS`].
pub fn has_file_extension(name: &str) -> bool {
    FILE_EXTENSIONS.iter().any(|extension| name.ends_with(extension))
}

/// Splits model names into `(logical names, file names)`, keeping each
/// group's order and repeats. Empty names are dropped.
pub fn partition_model_names(names: &[String]) -> (Vec<&str>, Vec<&str>) {
    names
        .iter()
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .partition(|name| !has_file_extension(name))
}

fn push_model_details(response: &RegistryResponse, model: &str, blocks: &mut Vec<ReportBlock>) {
    let components = component_rows(response, model);
    if !components.is_empty() {
        blocks.push(ReportBlock::Components(components));
    }

    for group in relationship_groups(response, model) {
        blocks.push(ReportBlock::Relationships {
            kind: group.kind.to_string(),
            subtype: group.subtype.to_string(),
            rows: group.rows,
        });
    }

    for entity in &response.failed_entities {
        push_failures(entity, model, blocks);
    }
}

/// Component rows owned by `model`, in response order.
pub fn component_rows(response: &RegistryResponse, model: &str) -> Vec<Vec<String>> {
    response
        .components
        .iter()
        .filter(|component| component.model.name == model)
        .map(|component| {
            vec![
                component.display_name.clone(),
                component.model.category.clone(),
                component.model.version.clone(),
            ]
        })
        .collect()
}

/// Relationship rows of one `(kind, subtype)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipGroup<'a> {
    pub kind: &'a str,
    pub subtype: &'a str,
    pub rows: Vec<Vec<String>>,
}

/// Groups `model`'s relationships by `(kind, subtype)` in first-seen order,
/// dropping any `(kind, subtype, from, to)` row already emitted.
pub fn relationship_groups<'a>(
    response: &'a RegistryResponse,
    model: &str,
) -> Vec<RelationshipGroup<'a>> {
    let mut groups: Vec<RelationshipGroup<'a>> = Vec::new();
    let mut group_index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut seen: HashSet<(&str, &str, &str, &str)> = HashSet::new();

    for relationship in response.relationships.iter().filter(|rel| rel.model_name == model) {
        let kind = relationship.kind.as_str();
        let subtype = relationship.subtype.as_str();

        for endpoints in &relationship.endpoints {
            let (from, to) = (endpoints.from.as_str(), endpoints.to.as_str());
            if !seen.insert((kind, subtype, from, to)) {
                continue;
            }

            let index = *group_index.entry((kind, subtype)).or_insert_with(|| {
                groups.push(RelationshipGroup {
                    kind,
                    subtype,
                    rows: Vec::new(),
                });
                groups.len() - 1
            });
            groups[index].rows.push(vec![from.to_string(), to.to_string()]);
        }
    }

    groups
}

/// Failures of one record that apply to a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureTally {
    /// Names tagged `Unknown`, in record order.
    pub unreadable: Vec<String>,
    pub components: usize,
    pub relationships: usize,
}

/// Counts the entries of `entity` that belong to `model`.
///
/// With a non-empty model only names equal to it count. With an empty model
/// only entries typed `Unknown` count, which covers errors not attributed to
/// any model.
pub fn tally_failures(entity: &FailedEntityRecord, model: &str) -> FailureTally {
    let mut tally = FailureTally::default();

    for (index, name) in entity.names.iter().enumerate() {
        let entity_type = entity.entity_type(index);
        let applies = if model.is_empty() {
            entity_type == UNKNOWN_ENTITY
        } else {
            name == model
        };
        if !applies {
            continue;
        }

        match entity_type {
            UNKNOWN_ENTITY => tally.unreadable.push(name.clone()),
            COMPONENT_ENTITY => tally.components += 1,
            RELATIONSHIP_ENTITY => tally.relationships += 1,
            _ => {}
        }
    }

    tally
}

/// Describes the counted entities, e.g. `2 entities of type component and
/// 1 entity of type relationship`. Empty when both counts are zero.
pub fn entity_phrase(components: usize, relationships: usize) -> String {
    let parts: Vec<String> = [(components, COMPONENT_ENTITY), (relationships, RELATIONSHIP_ENTITY)]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, entity_type)| {
            let noun = if count == 1 { "entity" } else { "entities" };
            format!("{count} {noun} of type {entity_type}")
        })
        .collect();
    parts.join(" and ")
}

fn push_failures(entity: &FailedEntityRecord, model: &str, blocks: &mut Vec<ReportBlock>) {
    let tally = tally_failures(entity, model);

    for file in tally.unreadable {
        blocks.push(ReportBlock::UnreadableFile {
            file,
            description: entity.long_description.clone(),
        });
    }

    let entities = entity_phrase(tally.components, tally.relationships);
    if !entities.is_empty() {
        blocks.push(ReportBlock::ImportFailed {
            entities,
            description: entity.long_description.clone(),
        });
    }
}
