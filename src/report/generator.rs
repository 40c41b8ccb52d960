//! HTML and JSON report generation.
//!
//! This module turns a computed [`Report`] into chart files plus either a
//! static HTML page referencing them or a JSON export of the aggregates.

use super::charts;
use crate::cli::OutputFormat;
use crate::models::{ProductTotal, Report, ReportMetadata, Series};
use anyhow::{Context, Result};
use html_escape::encode_text;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rendered chart and the file it is saved as.
#[derive(Debug, Clone)]
pub struct ChartFile {
    pub file_name: &'static str,
    pub alt: &'static str,
    pub svg: String,
}

/// Render every chart of the report.
pub fn render_charts(report: &Report) -> Result<Vec<ChartFile>> {
    let yearly = Series {
        name: "Total".to_string(),
        points: report
            .yearly_totals
            .iter()
            .map(|(year, total)| (year.to_string(), *total))
            .collect(),
    };
    let yearly_title = match (report.metadata.first_year, report.metadata.last_year) {
        (Some(first), Some(last)) => format!(
            "Change in Review Counts (as Sales Proxy) from {} to {}",
            first, last
        ),
        _ => "Change in Review Counts (as Sales Proxy)".to_string(),
    };

    let chart = |file_name, alt, svg| ChartFile {
        file_name,
        alt,
        svg,
    };

    Ok(vec![
        chart(
            "review_wordcloud.svg",
            "Review Text Word Cloud",
            charts::word_cloud("Review Text", &report.review_words)?,
        ),
        chart(
            "title_wordcloud.svg",
            "Title Text Word Cloud",
            charts::word_cloud("Title Text", &report.title_words)?,
        ),
        chart(
            "rating_distribution.svg",
            "Rating Distribution",
            charts::pie_chart("Rating Distribution", &report.rating_distribution)?,
        ),
        chart(
            "sentiment_distribution.svg",
            "Sentiment Distribution",
            charts::pie_chart("Sentiment Distribution", &report.sentiment_distribution)?,
        ),
        chart(
            "top_products.svg",
            "Top Products by Review Count",
            charts::hbar_chart(
                &format!("Top {} Products by Review Count", report.most_reviewed.len()),
                &report.most_reviewed,
            )?,
        ),
        chart(
            "bottom_products.svg",
            "Bottom Products by Review Count",
            charts::hbar_chart(
                &format!("Bottom {} Products by Review Count", report.least_reviewed.len()),
                &report.least_reviewed,
            )?,
        ),
        chart(
            "yearly_sales_trend.svg",
            "Yearly Sales Trend",
            charts::line_chart(&yearly_title, "Year", "Total Review Count", &[yearly])?,
        ),
        chart(
            "rating_trends.svg",
            "Rating Trends",
            charts::line_chart(
                "Rating Trends Over Time",
                "Year",
                "Review Count",
                &report.rating_trends,
            )?,
        ),
        chart(
            "brand_mentions.svg",
            "Brand Mentions",
            charts::line_chart(
                "Brand Mentions by Month",
                "Month",
                "Mentions",
                &report.brand_mentions,
            )?,
        ),
    ])
}

/// Generate the complete HTML report.
pub fn generate_html_report(report: &Report, charts: &[ChartFile]) -> String {
    let mut output = String::new();

    output.push_str(&generate_header());
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_products_table(&report.top_products));

    let sections: [(&str, &[&str]); 5] = [
        ("Word Clouds", &["review_wordcloud.svg", "title_wordcloud.svg"]),
        (
            "Rating and Sentiment Distribution",
            &["rating_distribution.svg", "sentiment_distribution.svg"],
        ),
        (
            "Product Review Counts",
            &["top_products.svg", "bottom_products.svg"],
        ),
        ("Yearly Trends", &["yearly_sales_trend.svg", "rating_trends.svg"]),
        ("Brand Mentions", &["brand_mentions.svg"]),
    ];
    for (heading, files) in sections {
        let images: Vec<&ChartFile> = files
            .iter()
            .filter_map(|name| charts.iter().find(|c| c.file_name == *name))
            .collect();
        output.push_str(&generate_chart_section(heading, &images));
    }

    output.push_str("</body>\n</html>\n");
    output
}

fn generate_header() -> String {
    let mut header = String::new();

    header.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    header.push_str("    <meta charset=\"utf-8\">\n");
    header.push_str("    <title>Video Games Review Analysis Report</title>\n");
    header.push_str("    <style>\n");
    header.push_str("        body { font-family: Arial, sans-serif; margin: 20px; }\n");
    header.push_str("        h1 { color: #333366; }\n");
    header.push_str("        h2 { color: #666699; margin-top: 30px; }\n");
    header.push_str("        img { max-width: 800px; border: 1px solid #ddd; margin: 10px 0; }\n");
    header.push_str("        table { border-collapse: collapse; }\n");
    header.push_str("        th, td { border: 1px solid #ddd; padding: 4px 10px; text-align: left; }\n");
    header.push_str("        .section { margin-bottom: 40px; }\n");
    header.push_str("    </style>\n</head>\n<body>\n");
    header.push_str("    <h1>Video Games Review Analysis Report</h1>\n");

    header
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("    <div class=\"section\">\n        <ul>\n");
    section.push_str(&format!(
        "            <li>Generated: {}</li>\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let (Some(first), Some(last)) = (metadata.first_year, metadata.last_year) {
        section.push_str(&format!("            <li>Years: {} to {}</li>\n", first, last));
    }
    section.push_str(&format!(
        "            <li>Total reviews counted: {}</li>\n",
        metadata.total_reviews
    ));
    section.push_str(&format!(
        "            <li>Detailed reviews loaded: {} ({} sampled for word clouds)</li>\n",
        metadata.detailed_reviews, metadata.sampled_reviews
    ));
    section.push_str("        </ul>\n    </div>\n");

    section
}

/// Generate the top-products table.
fn generate_products_table(products: &[ProductTotal]) -> String {
    let mut section = String::new();

    section.push_str("    <div class=\"section\">\n        <h2>Top Products</h2>\n");
    section.push_str(&format!(
        "        <p>Top {} products by review count:</p>\n",
        products.len()
    ));

    if products.is_empty() {
        section.push_str("        <p>No products in the selected years.</p>\n    </div>\n");
        return section;
    }

    section.push_str("        <table>\n");
    section.push_str("            <tr><th></th><th>title</th><th>total_count</th></tr>\n");
    for (idx, product) in products.iter().enumerate() {
        section.push_str(&format!(
            "            <tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            idx,
            encode_text(product.display_title()),
            product.total
        ));
    }
    section.push_str("        </table>\n    </div>\n");

    section
}

fn generate_chart_section(heading: &str, charts: &[&ChartFile]) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "    <div class=\"section\">\n        <h2>{}</h2>\n",
        heading
    ));
    for chart in charts {
        section.push_str(&format!(
            "        <img src=\"{}\" alt=\"{}\">\n",
            chart.file_name, chart.alt
        ));
    }
    section.push_str("    </div>\n");

    section
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write the charts and the report into `output_dir`.
///
/// Returns the path of the written report file.
pub fn write_report(report: &Report, output_dir: &Path, format: OutputFormat) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            output_dir.display()
        )
    })?;

    let rendered = render_charts(report)?;
    for chart in &rendered {
        let path = output_dir.join(chart.file_name);
        charts::save_svg(&chart.svg, &path)?;
        debug!("Saved chart {}", path.display());
    }

    let (file_name, content) = match format {
        OutputFormat::Html => ("analysis_report.html", generate_html_report(report, &rendered)),
        OutputFormat::Json => ("analysis_report.json", generate_json_report(report)?),
    };

    let path = output_dir.join(file_name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(path)
}
