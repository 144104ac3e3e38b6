use crate::{
    analyzer::{self, AbstractSummary, Column, YearMonth},
    cleaner::{CleanedTable, CleaningReport},
    config::Config,
    stats::ColumnSummary,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub total_papers: usize,
    pub time_period: Option<(i32, i32)>,
    pub peak_year: Option<PeakYear>,
    pub yearly_counts: Vec<(i32, usize)>,
    pub monthly_counts: Vec<(YearMonth, usize)>,
    pub top_journals: Vec<(String, usize)>,
    pub top_sources: Vec<(String, usize)>,
    pub title_words: Vec<(String, usize)>,
    pub abstracts: AbstractSummary,
    pub cleaning: CleaningReport,
    pub statistics: Vec<ColumnSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub input_path: String,
    pub version: String,
    pub analysis_duration_ms: u128,
    pub min_year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakYear {
    pub year: i32,
    pub count: usize,
}

pub struct Reporter;

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_report(
        &self,
        table: &CleanedTable,
        cleaning: &CleaningReport,
        config: &Config,
        duration_ms: u128,
    ) -> AnalysisReport {
        let yearly = analyzer::yearly_counts(table, config.min_year);
        let time_period = match (yearly.keys().next(), yearly.keys().next_back()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        };
        // first year wins a tie
        let peak_year = yearly.iter().fold(None, |best: Option<PeakYear>, (&year, &count)| match best {
            Some(b) if b.count >= count => Some(b),
            _ => Some(PeakYear { year, count }),
        });

        let stopwords = analyzer::stopword_set(&config.title_stopwords);

        AnalysisReport {
            metadata: ReportMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                input_path: config.input_path.display().to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                analysis_duration_ms: duration_ms,
                min_year: config.min_year,
            },
            total_papers: table.len(),
            time_period,
            peak_year,
            yearly_counts: yearly.into_iter().collect(),
            monthly_counts: analyzer::monthly_counts(table),
            top_journals: analyzer::top_n(table, &Column::Journal, config.top_journals),
            top_sources: analyzer::top_n(table, &Column::SourceX, config.top_sources),
            title_words: analyzer::word_frequency(table, &Column::Title, &stopwords, config.word_min_len),
            abstracts: analyzer::abstract_summary(table),
            cleaning: cleaning.clone(),
            statistics: analyzer::descriptive_stats(table),
        }
    }

    pub fn export_report(&self, report: &AnalysisReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
        let mut exported_files = Vec::new();

        let json_path = output_dir.join("analysis_report.json");
        fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
        exported_files.push(json_path);

        let html_path = output_dir.join("analysis_report.html");
        fs::write(&html_path, self.generate_html_report(report))?;
        exported_files.push(html_path);

        let md_path = output_dir.join("analysis_summary.md");
        fs::write(&md_path, self.generate_markdown_summary(report))?;
        exported_files.push(md_path);

        Ok(exported_files)
    }

    fn generate_html_report(&self, report: &AnalysisReport) -> String {
        let yearly: Vec<(String, usize)> = report
            .yearly_counts
            .iter()
            .map(|(year, count)| (year.to_string(), *count))
            .collect();
        let monthly: Vec<(String, usize)> = report
            .monthly_counts
            .iter()
            .map(|(month, count)| (month.to_string(), *count))
            .collect();
        let histogram: Vec<(String, usize)> = report
            .abstracts
            .word_count_histogram
            .iter()
            .map(|bin| (format!("{:.0}-{:.0}", bin.start, bin.end), bin.count))
            .collect();

        let mut html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Paper Metadata Report - {}</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; line-height: 1.6; }}
        .header {{ border-bottom: 2px solid #333; padding-bottom: 20px; }}
        .section {{ margin: 30px 0; }}
        .metric {{ display: inline-block; margin: 10px 20px 10px 0; padding: 10px; background: #f5f5f5; border-radius: 5px; }}
        table {{ border-collapse: collapse; margin: 10px 0; }}
        th, td {{ padding: 4px 10px; text-align: left; border-bottom: 1px solid #ddd; }}
        .bar {{ background: #007acc; height: 14px; }}
    </style>
</head>
<body>
    <div class="header">
        <h1>Paper Metadata Report</h1>
        <p>Input: {} &middot; Generated: {} &middot; Duration: {}ms</p>
    </div>
    <div class="section">
        <div class="metric"><strong>Total papers:</strong> {}</div>
        <div class="metric"><strong>With abstracts:</strong> {} ({:.1}%)</div>
        <div class="metric"><strong>Average abstract length:</strong> {}</div>
        <div class="metric"><strong>Peak year:</strong> {}</div>
    </div>
"#,
            escape_html(&report.metadata.input_path),
            escape_html(&report.metadata.input_path),
            report.metadata.generated_at,
            report.metadata.analysis_duration_ms,
            report.total_papers,
            report.abstracts.with_abstract,
            report.abstracts.abstract_rate,
            format_mean_words(report.abstracts.mean_abstract_words),
            report
                .peak_year
                .map_or_else(|| "n/a".to_string(), |p| format!("{} ({} papers)", p.year, p.count)),
        );

        html.push_str(&bar_chart_html("Publications by Year", "Year", &yearly));
        html.push_str(&bar_chart_html("Monthly Publications", "Month", &monthly));
        html.push_str(&bar_chart_html("Top Journals", "Journal", &report.top_journals));
        html.push_str(&bar_chart_html("Top Sources", "Source", &report.top_sources));
        html.push_str(&bar_chart_html("Most Common Words in Titles", "Word", &report.title_words));
        html.push_str(&bar_chart_html("Abstract Word Count Distribution", "Words", &histogram));

        html.push_str("    <div class=\"section\">\n        <h2>Descriptive Statistics</h2>\n        <table>\n");
        html.push_str("            <tr><th>Column</th><th>count</th><th>mean</th><th>std</th><th>min</th><th>25%</th><th>50%</th><th>75%</th><th>max</th></tr>\n");
        for s in &report.statistics {
            html.push_str(&format!(
                "            <tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&s.column),
                s.count,
                s.mean,
                s.std.map_or_else(|| "NaN".to_string(), |v| format!("{:.2}", v)),
                s.min,
                s.q25,
                s.median,
                s.q75,
                s.max
            ));
        }
        html.push_str("        </table>\n    </div>\n</body>\n</html>\n");

        html
    }

    fn generate_markdown_summary(&self, report: &AnalysisReport) -> String {
        let mut md = format!(
            "# Paper Metadata Summary\n\n**Input:** {}\n**Generated:** {}\n**Analysis Duration:** {}ms\n\n",
            report.metadata.input_path, report.metadata.generated_at, report.metadata.analysis_duration_ms
        );

        md.push_str("## Overview\n\n");
        md.push_str(&format!("- **Total papers:** {}\n", report.total_papers));
        if let Some((first, last)) = report.time_period {
            md.push_str(&format!("- **Time period:** {} - {}\n", first, last));
        }
        if let Some(peak) = report.peak_year {
            md.push_str(&format!("- **Peak year:** {} ({} papers)\n", peak.year, peak.count));
        }
        md.push_str(&format!(
            "- **Papers with abstracts:** {} ({:.1}%)\n",
            report.abstracts.with_abstract, report.abstracts.abstract_rate
        ));
        md.push_str(&format!(
            "- **Average abstract length:** {}\n",
            format_mean_words(report.abstracts.mean_abstract_words)
        ));
        md.push_str(&format!("- **Rows removed during cleaning:** {}\n\n", report.cleaning.rows_removed));

        md.push_str("## Top Journals\n\n");
        for (i, (journal, count)) in report.top_journals.iter().enumerate() {
            md.push_str(&format!("{}. {}: {} papers\n", i + 1, journal, count));
        }

        md.push_str("\n## Top Sources\n\n");
        for (i, (source, count)) in report.top_sources.iter().enumerate() {
            md.push_str(&format!("{}. {}: {} papers\n", i + 1, source, count));
        }

        md.push_str("\n## Most Common Title Words\n\n");
        for (word, count) in &report.title_words {
            md.push_str(&format!("- {}: {}\n", word, count));
        }

        md
    }
}

impl AnalysisReport {
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(50));
        println!("COMPREHENSIVE ANALYSIS REPORT");
        println!("{}", "=".repeat(50));

        println!("\nTotal papers analyzed: {}", self.total_papers);
        match self.time_period {
            Some((first, last)) => println!("Time period: {} - {}", first, last),
            None => println!("Time period: n/a"),
        }

        match self.peak_year {
            Some(peak) => println!("\nPublication peak year: {} with {} papers", peak.year, peak.count),
            None => println!("\nPublication peak year: n/a"),
        }

        println!("\nTop 5 Journals:");
        for (i, (journal, count)) in self.top_journals.iter().take(5).enumerate() {
            println!("  {}. {}: {} papers", i + 1, journal, count);
        }

        println!("\nTop 5 Sources:");
        for (i, (source, count)) in self.top_sources.iter().take(5).enumerate() {
            println!("  {}. {}: {} papers", i + 1, source, count);
        }

        println!("\nMost common title words:");
        for (word, count) in &self.title_words {
            println!("  {:<20} {}", word, count);
        }

        println!(
            "\nPapers with abstracts: {} ({:.1}%)",
            self.abstracts.with_abstract, self.abstracts.abstract_rate
        );
        println!("Average abstract length: {}", format_mean_words(self.abstracts.mean_abstract_words));
    }
}

fn format_mean_words(mean: Option<f64>) -> String {
    mean.map_or_else(|| "n/a".to_string(), |m| format!("{:.1} words", m))
}

fn bar_chart_html(title: &str, label: &str, rows: &[(String, usize)]) -> String {
    let max = rows.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let mut html = format!(
        "    <div class=\"section\">\n        <h2>{}</h2>\n        <table>\n            <tr><th>{}</th><th>Count</th><th></th></tr>\n",
        escape_html(title),
        escape_html(label)
    );
    for (name, count) in rows {
        let width = (*count as f64 / max as f64 * 300.0).round() as usize;
        html.push_str(&format!(
            "            <tr><td>{}</td><td>{}</td><td><div class=\"bar\" style=\"width: {}px\"></div></td></tr>\n",
            escape_html(name),
            count,
            width
        ));
    }
    html.push_str("        </table>\n    </div>\n");
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean_with_report;
    use crate::loader::RawTable;
    use crate::schema::Dataset;

    const SAMPLE: &str = "\
title,abstract,journal,publish_time,source_x
Covid Study,Some words here,Lancet,2020-03-01,PMC
Covid results,,Lancet,2021-01-05,Medline
Vaccine <trial>,Two words,BMJ & Co,2020-07-09,PMC
,,,2020-01-01,PMC
Old paper,x,BMJ & Co,2018-01-01,PMC
";

    fn report() -> AnalysisReport {
        let raw = RawTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let (table, cleaning) = clean_with_report(&Dataset::from_raw(&raw).unwrap());
        Reporter::new().generate_report(&table, &cleaning, &Config::default(), 12)
    }

    #[test]
    fn test_report_contents() {
        let report = report();
        assert_eq!(report.total_papers, 4);
        assert_eq!(report.time_period, Some((2020, 2021)));
        assert_eq!(report.peak_year, Some(PeakYear { year: 2020, count: 2 }));
        assert_eq!(report.yearly_counts, vec![(2020, 2), (2021, 1)]);
        assert_eq!(report.top_journals[0], ("Lancet".to_string(), 2));
        assert_eq!(report.top_sources[0], ("PMC".to_string(), 3));
        assert_eq!(report.title_words[0], ("covid".to_string(), 2));
        assert_eq!(report.cleaning.rows_removed, 1);
        assert_eq!(report.abstracts.with_abstract, 3);
    }

    #[test]
    fn test_peak_year_tie_keeps_earliest() {
        let csv = "title,abstract,journal,publish_time,source_x\nA,x,J,2021,\nB,x,J,2020,\n";
        let raw = RawTable::from_reader(csv.as_bytes()).unwrap();
        let (table, cleaning) = clean_with_report(&Dataset::from_raw(&raw).unwrap());
        let report = Reporter::new().generate_report(&table, &cleaning, &Config::default(), 0);
        assert_eq!(report.peak_year, Some(PeakYear { year: 2020, count: 1 }));
    }

    #[test]
    fn test_export_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = Reporter::new().export_report(&report(), dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        for file in &files {
            assert!(file.exists());
        }

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(json["total_papers"], 4);

        let html = fs::read_to_string(&files[1]).unwrap();
        assert!(html.contains("BMJ &amp; Co"));
        assert!(!html.contains("<trial>"));
    }

    #[test]
    fn test_empty_table_report() {
        let report = Reporter::new().generate_report(
            &CleanedTable::default(),
            &clean_with_report(&Dataset::default()).1,
            &Config::default(),
            0,
        );
        assert_eq!(report.total_papers, 0);
        assert_eq!(report.peak_year, None);
        assert!(report.top_journals.is_empty());
        assert!(report.title_words.is_empty());
    }
}
