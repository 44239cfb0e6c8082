//! Side-by-side rendering of two records for an oracle

use std::fmt::Write;

use crate::matching::Record;

/// Render two records' fields side by side under a caption
///
/// `score` is shown next to the caption (the population's agreement count
/// when asking questions). When `properties` is empty every field either
/// record has is shown.
pub fn pretty_compare(
    r1: &Record,
    r2: &Record,
    score: f64,
    caption: &str,
    properties: &[String],
) -> String {
    let mut fields: Vec<String> = if properties.is_empty() {
        r1.field_names()
            .chain(r2.field_names())
            .map(str::to_string)
            .collect()
    } else {
        properties.to_vec()
    };
    fields.sort();
    fields.dedup();

    let rows: Vec<(String, String, String)> = std::iter::once((
        "ID".to_string(),
        r1.id().to_string(),
        r2.id().to_string(),
    ))
    .chain(fields.iter().map(|field| {
        (
            field.to_uppercase(),
            r1.values(field).join(", "),
            r2.values(field).join(", "),
        )
    }))
    .collect();

    let width_name = rows.iter().map(|r| r.0.chars().count()).max().unwrap_or(0);
    let width_left = rows.iter().map(|r| r.1.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", caption, score);
    for (name, left, right) in &rows {
        let _ = writeln!(
            out,
            "{:<wn$}  {:<wl$}  {}",
            name,
            left,
            right,
            wn = width_name,
            wl = width_left
        );
    }
    out
}
