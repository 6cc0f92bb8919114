//! Plain-text tables for the front-end
//!
//! Cells are padded before they are painted, so escape sequences added by a
//! [`Palette`] never disturb column alignment.

use crate::formatting::{format_ratio, pad};
use crate::indicators::{ColorTag, RowStyle};
use crate::status::{ContainerSummary, PodSummary};

pub const POD_HEADERS: [&str; 5] = ["NAME", "READY", "STATUS", "RESTARTS", "AGE"];
pub const CONTAINER_HEADERS: [&str; 5] = ["POD", "NAME", "READY", "STATUS", "IMAGE"];

/// Minimum widths of the columns after the first; the last column is never padded
const POD_WIDTHS: [usize; 4] = [8, 20, 10, 0];
const CONTAINER_WIDTHS: [usize; 4] = [24, 7, 20, 0];

/// Maps a semantic tag to output text
pub trait Palette: Send + Sync {
    fn paint(&self, tag: ColorTag, text: &str) -> String;
}

/// Emits text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPalette;

impl Palette for PlainPalette {
    fn paint(&self, _tag: ColorTag, text: &str) -> String {
        text.to_string()
    }
}

struct Table<'a> {
    headers: &'a [&'a str],
    widths: &'a [usize],
    rows: Vec<(Vec<String>, RowStyle)>,
}

impl Table<'_> {
    fn render(&self, palette: &dyn Palette) -> String {
        let first_width = self
            .rows
            .iter()
            .filter_map(|(cells, _)| cells.first().map(|c| c.chars().count()))
            .chain(self.headers.first().map(|h| h.len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let headers: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        out.push_str(&self.line(
            &headers,
            &RowStyle::Uniform(ColorTag::Header),
            first_width,
            palette,
        ));
        for (cells, style) in &self.rows {
            out.push_str(&self.line(cells, style, first_width, palette));
        }
        out
    }

    fn line(
        &self,
        cells: &[String],
        style: &RowStyle,
        first_width: usize,
        palette: &dyn Palette,
    ) -> String {
        let last = cells.len().saturating_sub(1);
        let painted: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let text = if i == last {
                    cell.clone()
                } else if i == 0 {
                    pad(cell, first_width)
                } else {
                    pad(cell, self.widths.get(i - 1).copied().unwrap_or(0))
                };
                palette.paint(style.tag(i), &text)
            })
            .collect();
        let mut line = painted.join(" ");
        line.push('\n');
        line
    }
}

/// Render the pods table
pub fn render_pods(pods: &[PodSummary], palette: &dyn Palette) -> String {
    Table {
        headers: &POD_HEADERS,
        widths: &POD_WIDTHS,
        rows: pods
            .iter()
            .map(|p| {
                (
                    vec![
                        p.name.clone(),
                        format_ratio(p.ready_count, p.total_count),
                        p.status.clone(),
                        p.restarts.to_string(),
                        p.age.clone(),
                    ],
                    p.style.clone(),
                )
            })
            .collect(),
    }
    .render(palette)
}

/// Render the containers table
pub fn render_containers(containers: &[ContainerSummary], palette: &dyn Palette) -> String {
    Table {
        headers: &CONTAINER_HEADERS,
        widths: &CONTAINER_WIDTHS,
        rows: containers
            .iter()
            .map(|c| {
                (
                    vec![
                        c.pod_name.clone(),
                        c.container_name.clone(),
                        c.ready.to_string(),
                        c.state.clone(),
                        c.image.clone(),
                    ],
                    c.style.clone(),
                )
            })
            .collect(),
    }
    .render(palette)
}

/// Render kubeconfig contexts, marking the active one
pub fn render_contexts(names: &[String], current: &str, palette: &dyn Palette) -> String {
    Table {
        headers: &["NAME", "CURRENT"],
        widths: &[0],
        rows: names
            .iter()
            .map(|name| {
                let active = name == current;
                let marker = if active { "*" } else { "" };
                let style = if active {
                    RowStyle::Uniform(ColorTag::Ok)
                } else {
                    RowStyle::Uniform(ColorTag::Plain)
                };
                (vec![name.clone(), marker.to_string()], style)
            })
            .collect(),
    }
    .render(palette)
}

/// Render a single-column list of names under a header
pub fn render_names(header: &str, names: &[String], palette: &dyn Palette) -> String {
    let headers = [header];
    Table {
        headers: &headers,
        widths: &[],
        rows: names
            .iter()
            .map(|n| (vec![n.clone()], RowStyle::Uniform(ColorTag::Plain)))
            .collect(),
    }
    .render(palette)
}

/// Keep the header line plus the rows whose first column equals `value`
pub fn filter_rows(table: &str, value: &str) -> String {
    let mut lines = table.lines();
    let mut out = String::new();
    if let Some(header) = lines.next() {
        out.push_str(header);
        out.push('\n');
    }
    for line in lines {
        let plain = strip_ansi(line);
        if plain.split_whitespace().next() == Some(value) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Remove CSI escape sequences (`ESC [ ... final-byte`)
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
