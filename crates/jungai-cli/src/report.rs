//! Read-only report listing.

use chrono::Utc;
use jungai_core::AppConfig;
use jungai_report::{read_reports, Report};

/// Show stored reports, newest first.
///
/// # Errors
///
/// Returns an error if the report file exists but cannot be read.
pub(crate) async fn run_report(
    config: &AppConfig,
    brand_filter: Option<&str>,
    limit: usize,
    markdown: bool,
) -> anyhow::Result<()> {
    let reports = read_reports(&config.report_path, brand_filter, limit).await?;

    if reports.is_empty() {
        println!(
            "no reports found{}; run `analyze` first",
            brand_filter
                .map(|s| format!(" for brand '{s}'"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    if markdown {
        print_markdown(&reports, brand_filter);
    } else {
        print_table(&reports);
    }
    Ok(())
}

fn print_table(reports: &[Report]) {
    println!(
        "{:<28}{:<12}{:<18}{:<9}GAPS",
        "BRAND", "ARCHETYPE", "GENERATED", "SOURCES"
    );
    for report in reports {
        let generated = report.generated_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<28}{:<12}{:<18}{:<9}{}",
            report.brand,
            report.archetype.label(),
            generated,
            report.sources.len(),
            report.source_gaps.len()
        );
    }
}

fn print_markdown(reports: &[Report], brand_filter: Option<&str>) {
    let now = Utc::now().format("%Y-%m-%d %H:%M UTC");
    let filter_label = brand_filter.unwrap_or("All brands");

    println!("# Brand Archetype Report");
    println!();
    println!("**Generated**: {now}");
    println!("**Filter**: {filter_label}");
    println!("**Reports**: {}", reports.len());
    println!();
    println!("---");
    println!();
    println!("| Brand | Archetype | Generated At | Sources | Evidence | Justification |");
    println!("|-------|-----------|--------------|---------|----------|---------------|");

    for report in reports {
        let generated = report.generated_at.format("%Y-%m-%d %H:%M UTC").to_string();
        println!(
            "| {} | {} | {} | {} | {} | {} |",
            report.brand,
            report.archetype.label(),
            generated,
            report.sources.len(),
            report.patterns_found.join(", "),
            report.justification.replace('|', "\\|")
        );
    }
}
