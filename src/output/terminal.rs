// Colored terminal output for keyword tables, histograms and run summaries.
//
// All terminal-specific formatting lives here. The CLI display paths in
// main.rs delegate to these functions.

use colored::Colorize;

use crate::config::PipelineConfig;
use crate::keywords::KeywordResult;
use crate::network::degree::Histogram;
use crate::pipeline::PipelineOutput;

const TERM_WIDTH: usize = 36;
const BAR_WIDTH: usize = 40;

/// Display the ranked keyword list.
pub fn display_keywords(keywords: &KeywordResult, cutoff: f64) {
    if keywords.is_empty() {
        println!("No keywords reached the cutoff ({cutoff:.2}).");
        return;
    }

    println!(
        "\n{}",
        format!("=== Relevant Keywords ({} terms) ===", keywords.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:<width$} {:>10}",
        "Rank".dimmed(),
        "Term".dimmed(),
        "Strength".dimmed(),
        width = TERM_WIDTH,
    );
    println!("  {}", "-".repeat(TERM_WIDTH + 17).dimmed());

    for (i, keyword) in keywords.iter().enumerate() {
        let term = super::truncate_chars(&keyword.term, TERM_WIDTH - 3);
        println!(
            "  {:>4}. {:<width$} {:>10}",
            i + 1,
            term,
            colorize_strength(keyword.strength, cutoff),
            width = TERM_WIDTH,
        );
    }
    println!();
}

/// Display a histogram of the degree distribution as horizontal bars.
pub fn display_histogram(histogram: &Histogram) {
    if histogram.bins.is_empty() {
        println!("Empty degree distribution, nothing to plot.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== {} Distribution ({} nodes, {} bins) ===",
            capitalize(&histogram.metric.to_string()),
            histogram.total(),
            histogram.bins.len()
        )
        .bold()
    );
    println!();

    let peak = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bin in &histogram.bins {
        let len = bin.count * BAR_WIDTH / peak;
        let bar = if bin.count > 0 && len == 0 { 1 } else { len };
        println!(
            "  {:>9.2} - {:<9.2} {:>6}  {}",
            bin.lower,
            bin.upper,
            bin.count,
            "#".repeat(bar).cyan()
        );
    }
    println!();
}

/// Display run counts and the estimated cutoff.
pub fn display_summary(output: &PipelineOutput, config: &PipelineConfig) {
    println!("\n{}", "=== Run Summary ===".bold());
    println!(
        "  Records: {} imported, {} after deduplication",
        output.imported,
        output.store.len()
    );
    println!(
        "  Vocabulary: {} candidate terms ({} from tags)",
        output.vocabulary.len(),
        output.vocabulary.tagged_terms().len()
    );
    println!(
        "  Network: {} nodes, {} edges ({} weighting)",
        output.network.node_count(),
        output.network.edge_count(),
        config.weighting
    );
    println!(
        "  Cutoff: {} {} at rank {}/{} (percent {:.4}, degree {}, {} knots)",
        config.strength_metric,
        format!("{:.2}", output.cutoff.cutoff).yellow().bold(),
        output.cutoff.rank,
        output.distribution.len(),
        output.cutoff.percent,
        config.spline_degrees,
        config.spline_knot_num
    );
    println!(
        "  Keywords: {}",
        output.keywords.len().to_string().green().bold()
    );
}

/// Display the effective configuration as pretty JSON.
pub fn display_config(config: &PipelineConfig) {
    println!("\n{}", "=== Effective Configuration ===".bold());
    match serde_json::to_string_pretty(config) {
        Ok(json) => {
            for line in json.lines() {
                println!("  {line}");
            }
        }
        Err(e) => println!("  {}", format!("could not render config: {e}").red()),
    }
}

/// Terms well above the cutoff stand out.
fn colorize_strength(strength: f64, cutoff: f64) -> colored::ColoredString {
    let text = format!("{strength:.2}");
    if cutoff > 0.0 && strength >= 2.0 * cutoff {
        text.green().bold()
    } else {
        text.normal()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
