use std::io::{self, IsTerminal, Stdout, Write};

/// Destination for rendered report lines and tables.
pub trait ReportSink {
    /// Writes one line of text.
    fn line(&mut self, text: &str) -> io::Result<()>;

    /// Writes a table with the given column headers.
    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()>;

    /// Decorates a label such as `SUMMARY` or `ERROR`.
    fn emphasize(&self, label: &str) -> String {
        label.to_string()
    }
}

/// Sink writing plain text tables to any writer.
pub struct TerminalSink<W> {
    writer: W,
    bold: bool,
}

impl TerminalSink<Stdout> {
    /// Writes to stdout, using ANSI bold only when stdout is a terminal.
    pub fn stdout() -> Self {
        let stdout = io::stdout();
        let bold = stdout.is_terminal();
        Self::new(stdout, bold)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(writer: W, bold: bool) -> Self {
        Self { writer, bold }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TerminalSink<W> {
    fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{text}")
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
        for line in format_table(headers, rows) {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()
    }

    fn emphasize(&self, label: &str) -> String {
        if self.bold {
            format!("\x1b[1m{label}\x1b[0m")
        } else {
            label.to_string()
        }
    }
}

/// Something written to a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkItem {
    Line(String),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Sink that keeps everything in memory, for callers that post-process the
/// report.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub items: Vec<SinkItem>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text lines only, in order, skipping tables.
    pub fn lines(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SinkItem::Line(text) => Some(text.as_str()),
                SinkItem::Table { .. } => None,
            })
            .collect()
    }

    /// Rows of every table, in order.
    pub fn tables(&self) -> Vec<&[Vec<String>]> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SinkItem::Table { rows, .. } => Some(rows.as_slice()),
                SinkItem::Line(_) => None,
            })
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn line(&mut self, text: &str) -> io::Result<()> {
        self.items.push(SinkItem::Line(text.to_string()));
        Ok(())
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
        self.items.push(SinkItem::Table {
            headers: headers.iter().map(|header| header.to_string()).collect(),
            rows: rows.to_vec(),
        });
        Ok(())
    }
}

/// Lays out a borderless table: upper-case headers, columns padded to the
/// widest cell and separated by three spaces.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let headers: Vec<String> = headers.iter().map(|header| header.to_uppercase()).collect();

    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(index) {
                Some(current) => *current = (*current).max(width),
                None => widths.push(width),
            }
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(&headers, &widths));
    for row in rows {
        lines.push(format_row(row, &widths));
    }
    lines
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    format!("  {}", padded.join("   ")).trim_end().to_string()
}
