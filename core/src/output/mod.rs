//! Output formatting module
//!
//! Renders prompts, answers, reviews and run summaries for the terminal
//! using colored output.

use console::Style;
use std::time::Duration;

use crate::aggregate::BackendResponse;
use crate::llm::{BackendId, Citation};
use crate::pipeline::RunReport;
use crate::template::{ProductKind, RenderedPrompt};

/// Output formatter for CLI results
pub struct OutputFormatter {
    // Styles
    blue: Style,
    green: Style,
    yellow: Style,
    dim: Style,
    bold: Style,
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self {
            blue: Style::new().blue(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

/// `"{Backend}, {Product}, {key phrase}"`
pub fn heading(backend: BackendId, product: ProductKind, key_phrase: &str) -> String {
    format!("{}, {}, {}", backend.name(), product.label(), key_phrase)
}

pub fn format_latency(latency: Duration) -> String {
    format!("Time to generate: {:.2} seconds", latency.as_secs_f64())
}

/// One `- [title](url)` or `- url` line per source
pub fn format_sources(citations: &[Citation]) -> String {
    citations
        .iter()
        .map(|c| format!("- {}\n", c))
        .collect()
}

impl OutputFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Print the rendered prompt before any backend is called
    pub fn print_prompt(&self, prompt: &RenderedPrompt, key_phrase: &str) {
        println!();
        println!("{}", self.bold.apply_to(format!("Prompt for {}:", key_phrase)));
        println!("{}", self.dim.apply_to(prompt.as_str()));
    }

    /// Print one intern answer or reviewer comparison
    pub fn print_response(&self, response: &BackendResponse, product: ProductKind, key_phrase: &str) {
        println!();
        println!(
            "{}",
            self.bold
                .apply_to(heading(response.backend, product, key_phrase))
        );
        println!("{}", response.text);
        println!();
        println!("{}", self.blue.apply_to(format_latency(response.latency)));

        if !response.citations.is_empty() {
            println!("{}", self.bold.apply_to("Sources:"));
            print!("{}", format_sources(&response.citations));
        }
    }

    pub fn print_comparison_prompt(&self, prompt: &str) {
        println!();
        println!("{}", self.bold.apply_to("Comparison prompt:"));
        println!("{}", self.dim.apply_to(prompt));
    }

    /// Print the closing summary of a run
    pub fn print_summary(&self, report: &RunReport) {
        println!();
        println!("{}", self.bold.apply_to("Run complete:"));
        let interns: Vec<&str> = report.bundle.backends().iter().map(|id| id.name()).collect();
        println!("- Interns: {}", self.green.apply_to(interns.join(", ")));
        if report.reviews.is_empty() {
            println!("- Reviewers: {}", self.yellow.apply_to("skipped"));
        } else {
            let reviewers: Vec<&str> = report.reviews.iter().map(|r| r.backend.name()).collect();
            println!("- Reviewers: {}", self.green.apply_to(reviewers.join(", ")));
        }
        println!(
            "- Total time: {}",
            self.blue
                .apply_to(format!("{:.2} seconds", report.elapsed.as_secs_f64()))
        );
    }

    /// Print the backend documentation table
    pub fn print_backends(&self) {
        println!();
        println!("{}", self.bold.apply_to("Interns:"));
        for id in BackendId::default_interns() {
            self.print_backend(id);
        }
        println!();
        println!("{}", self.bold.apply_to("Reviewers:"));
        for id in BackendId::default_reviewers() {
            self.print_backend(id);
        }
        println!();
        println!("{}", self.bold.apply_to("Helper:"));
        self.print_backend(BackendId::Mini);
    }

    fn print_backend(&self, id: BackendId) {
        let access = if id.has_web_access() {
            self.green.apply_to("web search")
        } else {
            self.yellow.apply_to("no internet access")
        };
        println!(
            "- {:<9} {} ({})",
            self.bold.apply_to(id.name()),
            id.description(),
            access
        );
    }

    pub fn print_success(&self, message: &str) {
        println!("{}", self.green.apply_to(message));
    }

    pub fn print_warning(&self, message: &str) {
        eprintln!("{}", self.yellow.apply_to(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_joins_backend_product_and_phrase() {
        assert_eq!(
            heading(BackendId::Deepseek, ProductKind::Factsheet, "Laos"),
            "Deepseek, Factsheet, Laos"
        );
    }

    #[test]
    fn latency_has_two_decimals() {
        assert_eq!(
            format_latency(Duration::from_millis(12_346)),
            "Time to generate: 12.35 seconds"
        );
        assert_eq!(format_latency(Duration::ZERO), "Time to generate: 0.00 seconds");
    }

    #[test]
    fn sources_use_title_when_present() {
        let sources = format_sources(&[
            Citation::titled("World Bank", "https://worldbank.org"),
            Citation::url("https://imf.org"),
        ]);
        assert_eq!(sources, "- [World Bank](https://worldbank.org)\n- https://imf.org\n");
    }
}
