use std::io;

use crate::meshery::model::report::{COMPONENT_HEADERS, RELATIONSHIP_HEADERS, ReportBlock};
use crate::meshery::model::sink::ReportSink;

/// Writes report blocks to a sink in order.
pub fn render(blocks: &[ReportBlock], sink: &mut dyn ReportSink) -> io::Result<()> {
    for block in blocks {
        render_block(block, sink)?;
    }
    Ok(())
}

fn render_block(block: &ReportBlock, sink: &mut dyn ReportSink) -> io::Result<()> {
    match block {
        ReportBlock::Summary(message) => {
            let label = sink.emphasize("SUMMARY");
            sink.line(&format!("{label}: {message}"))
        }
        ReportBlock::Model(name) => {
            let label = sink.emphasize("MODEL");
            sink.line("")?;
            sink.line(&format!("{label}: {name}"))
        }
        ReportBlock::Components(rows) => {
            sink.line("")?;
            sink.table(&COMPONENT_HEADERS, rows)
        }
        ReportBlock::Relationships {
            kind,
            subtype,
            rows,
        } => {
            let label = if rows.len() > 1 {
                sink.emphasize("RELATIONSHIPS:")
            } else {
                sink.emphasize("RELATIONSHIP:")
            };
            sink.line("")?;
            sink.line(&format!("  {label} Kind of {kind} and sub type {subtype}"))?;
            sink.table(&RELATIONSHIP_HEADERS, rows)
        }
        ReportBlock::UnreadableFile { file, description } => {
            let label = sink.emphasize("ERROR");
            sink.line("")?;
            sink.line(&format!(
                "{label}: Import process for file {file} encountered error:"
            ))?;
            sink.line(&format!("    {description}"))
        }
        ReportBlock::ImportFailed {
            entities,
            description,
        } => {
            let label = sink.emphasize("ERROR");
            sink.line("")?;
            sink.line(&format!(
                "  {label}: Import did not occur for {entities} error:"
            ))?;
            sink.line(&format!("  {description}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshery::model::sink::{MemorySink, SinkItem};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn relationship_label_is_plural_for_several_rows() {
        let mut sink = MemorySink::new();
        let blocks = vec![
            ReportBlock::Relationships {
                kind: "edge".into(),
                subtype: "network".into(),
                rows: vec![row(&["Service", "Pod"]), row(&["Ingress", "Service"])],
            },
            ReportBlock::Relationships {
                kind: "hierarchical".into(),
                subtype: "parent".into(),
                rows: vec![row(&["Mesh", "Gateway"])],
            },
        ];

        render(&blocks, &mut sink).expect("report rendered");

        assert_eq!(
            sink.lines(),
            vec![
                "",
                "  RELATIONSHIPS: Kind of edge and sub type network",
                "",
                "  RELATIONSHIP: Kind of hierarchical and sub type parent",
            ]
        );
    }

    #[test]
    fn model_and_component_blocks_render_header_then_table() {
        let mut sink = MemorySink::new();
        let blocks = vec![
            ReportBlock::Summary("imported".into()),
            ReportBlock::Model("istio".into()),
            ReportBlock::Components(vec![row(&["Gateway", "Networking", "v1"])]),
        ];

        render(&blocks, &mut sink).expect("report rendered");

        assert_eq!(
            sink.items,
            vec![
                SinkItem::Line("SUMMARY: imported".into()),
                SinkItem::Line("".into()),
                SinkItem::Line("MODEL: istio".into()),
                SinkItem::Line("".into()),
                SinkItem::Table {
                    headers: row(&["Component", "Category", "Version"]),
                    rows: vec![row(&["Gateway", "Networking", "v1"])],
                },
            ]
        );
    }

    #[test]
    fn error_blocks_carry_the_description() {
        let mut sink = MemorySink::new();
        let blocks = vec![
            ReportBlock::UnreadableFile {
                file: "broken.yaml".into(),
                description: "unable to parse".into(),
            },
            ReportBlock::ImportFailed {
                entities: "2 entities of type component".into(),
                description: "missing schema".into(),
            },
        ];

        render(&blocks, &mut sink).expect("report rendered");

        assert_eq!(
            sink.lines(),
            vec![
                "",
                "ERROR: Import process for file broken.yaml encountered error:",
                "    unable to parse",
                "",
                "  ERROR: Import did not occur for 2 entities of type component error:",
                "  missing schema",
            ]
        );
    }
}
