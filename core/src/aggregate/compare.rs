//! Second-order prompt asking reviewers to compare the interns' answers.

use std::sync::OnceLock;
use tera::{Context, Tera};

use super::{ComparisonResponse, ResponseBundle};
use crate::error::{Result, SherwoodError};
use crate::template::ProductKind;

const POINT_BY_POINT: &str = "Your task is to do a point-by-point comparison of the answers below, highlighting (A) where they agree; (B) where they differ; (C) whether any claims raise questions about factual accuracy; (D) any other relevant perspectives not covered in the answers. No need to have a summary table of the similarities and differences.\n\n";

const THEMATIC: &str = concat!(
    "# Task:\n",
    "You are my intelligent reading assistant. Your job is to analyze the provided answers and organize the items into meaningful thematic clusters. Please ignore the text in the <think> tags.\n\n",
    "# Format:\n",
    "Group items under clearly labeled **themes**. For each item:\n",
    "- Start with a **bolded topic sentence** that summarizes the item.\n",
    "- Include a detailed summary if available (2–4 sentences).\n",
    "- Add a link to the original source, where applicable.\n\n",
);

const TEMPLATE_NAME: &str = "comparison_prompt";

const COMPARISON_TEMPLATE: &str = concat!(
    "{{ preamble }}",
    "The answers are contained in the tags below.\n\n",
    "{% for name in names %}",
    "<answer_{{ name }}> (Refer to this answer as **{{ name }}** in your output)\n\n",
    "{% endfor %}",
    "Here are the answers:\n\n",
    "{{ answers }}",
);

/// Instruction block that opens the comparison prompt for `kind`
pub fn comparison_preamble(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::TariffResponse => THEMATIC,
        _ => POINT_BY_POINT,
    }
}

fn engine() -> Result<&'static Tera> {
    static ENGINE: OnceLock<std::result::Result<Tera, String>> = OnceLock::new();
    ENGINE
        .get_or_init(|| {
            let mut tera = Tera::default();
            tera.autoescape_on(vec![]);
            tera.add_raw_template(TEMPLATE_NAME, COMPARISON_TEMPLATE)
                .map_err(|e| e.to_string())?;
            Ok(tera)
        })
        .as_ref()
        .map_err(|e| SherwoodError::Template(e.clone()))
}

/// A bundle worth comparing, paired with the product it answers
#[derive(Debug, Clone)]
pub struct ComparisonRequest<'a> {
    bundle: &'a ResponseBundle,
    kind: ProductKind,
}

impl<'a> ComparisonRequest<'a> {
    /// `None` unless at least two distinct backends answered.
    pub fn new(bundle: &'a ResponseBundle, kind: ProductKind) -> Option<Self> {
        (bundle.distinct_backends() >= 2).then_some(Self { bundle, kind })
    }

    pub fn render(&self) -> Result<String> {
        let names: Vec<&str> = self.bundle.backends().iter().map(|id| id.name()).collect();

        let mut context = Context::new();
        context.insert("preamble", comparison_preamble(self.kind));
        context.insert("names", &names);
        context.insert("answers", &self.bundle.tagged());

        Ok(engine()?.render(TEMPLATE_NAME, &context)?)
    }
}

/// What the reviewers were asked and what they said
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub prompt: String,
    pub reviews: Vec<ComparisonResponse>,
}
