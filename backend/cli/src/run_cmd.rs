//! `docsift run`: one batch over the input directory.

use std::path::PathBuf;

use anyhow::Result;
use docsift_core::CancelFlag;
use docsift_pipeline::{OutputRecord, Pipeline, RunPaths, RunReport};
use tracing::warn;

use crate::config::Settings;
use crate::terminal_output::{note_success, note_warn, render_table, supports_color, Column, DIM, RESET};

pub async fn run(
    settings: &Settings,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    settings.ensure_valid()?;

    let mut paths = RunPaths::from_config(&settings.config.paths.clone().unwrap_or_default());
    if let Some(dir) = input {
        paths = paths.with_input_dir(dir);
    }
    if let Some(dir) = output {
        paths = paths.with_output_dir(dir);
    }

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling run");
            on_signal.cancel();
        }
    });

    let pipeline = Pipeline::from_config(&settings.config).await?;
    let report = pipeline.run(&paths, &cancel).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    for skipped in &report.documents_skipped {
        note_warn(&format!("Skipped {skipped}"));
    }
    print!("{}", sections_table(&report.record, supports_color()));
    note_success(&format!(
        "Wrote {} sections from {} chunks to {} in {:.2}s",
        report.record.extracted_sections.len(),
        report.chunk_count,
        report.output.display(),
        report.elapsed.as_secs_f64()
    ));
}

fn sections_table(record: &OutputRecord, color: bool) -> String {
    let columns = vec![
        Column::right("Rank"),
        Column::left("Document").max_width(40),
        Column::left("Section").max_width(48),
        Column::right("Page"),
    ];
    let rows: Vec<Vec<String>> = record
        .extracted_sections
        .iter()
        .map(|s| {
            let page = if color {
                format!("{DIM}{}{RESET}", s.page_number)
            } else {
                s.page_number.to_string()
            };
            vec![
                s.importance_rank.to_string(),
                s.document.clone(),
                s.section_title.clone(),
                page,
            ]
        })
        .collect();
    render_table(&columns, &rows, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_sections_in_rank_order() {
        let record: OutputRecord = serde_json::from_value(serde_json::json!({
            "metadata": {
                "input_documents": ["a.pdf"],
                "persona": "Analyst",
                "job_to_be_done": "find risks",
                "processing_timestamp": "2025-07-10T09:05:03"
            },
            "extracted_sections": [
                {"document": "a.pdf", "section_title": "Market Exposure", "importance_rank": 1, "page_number": 2},
                {"document": "a.pdf", "section_title": "Credit Quality", "importance_rank": 2, "page_number": 4}
            ],
            "subsection_analysis": []
        }))
        .unwrap();
        let table = sections_table(&record, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("Market Exposure"));
        assert!(lines[3].trim_start().starts_with('2'));
        assert!(lines[3].ends_with('4'));
    }
}
