use anyhow::{Context, Result};
use fundamental_ratios::ReportFormatter;
use ratio_core::{RatioReport, RawFinancials};
use std::io::Write;

/// Left-aligned plain text table with a dashed rule under the header.
pub fn render(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}", w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(header.to_vec()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

pub fn ratio_table(formatter: &ReportFormatter, reports: &[RatioReport]) -> String {
    let rows: Vec<Vec<String>> = reports.iter().map(|r| formatter.record(r)).collect();
    render(&formatter.header(), &rows)
}

pub fn metrics_table(formatter: &ReportFormatter, raws: &[RawFinancials]) -> String {
    let Some(first) = raws.first() else {
        return String::new();
    };
    let header: Vec<&str> = formatter
        .key_metrics(first)
        .into_iter()
        .map(|(label, _)| label)
        .collect();
    let rows: Vec<Vec<String>> = raws
        .iter()
        .map(|raw| {
            formatter
                .key_metrics(raw)
                .into_iter()
                .map(|(_, value)| value)
                .collect()
        })
        .collect();
    render(&header, &rows)
}

/// Header plus one row per report, same column order as the console table.
pub fn write_csv<W: Write>(
    writer: W,
    formatter: &ReportFormatter,
    reports: &[RatioReport],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(formatter.header())
        .context("failed to write CSV header")?;
    for report in reports {
        csv_writer
            .write_record(formatter.record(report))
            .with_context(|| format!("failed to write CSV row for {}", report.symbol))?;
    }
    csv_writer.flush().context("failed to flush CSV output")?;
    Ok(())
}
