//! Prompt construction.
//!
//! A product kind plus a subject always yields the same prompt text. The
//! four research products substitute the subject into a fixed document;
//! custom products pass the caller's text through untouched.

mod products;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SherwoodError};

/// The kind of product the team is asked to draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Biography,
    CountryDevelopments,
    Factsheet,
    TariffResponse,
    Custom,
}

impl ProductKind {
    pub const ALL: [ProductKind; 5] = [
        ProductKind::Biography,
        ProductKind::Factsheet,
        ProductKind::CountryDevelopments,
        ProductKind::TariffResponse,
        ProductKind::Custom,
    ];

    /// Label used in headings and notifications
    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Biography => "CV",
            ProductKind::CountryDevelopments => "Developments",
            ProductKind::Factsheet => "Factsheet",
            ProductKind::TariffResponse => "Response to US Reciprocal Tariffs",
            ProductKind::Custom => "Custom",
        }
    }

    /// Question asked when collecting the subject
    pub fn subject_hint(&self) -> &'static str {
        match self {
            ProductKind::Biography => {
                "What is the name of the individual? Consider adding details like country and designation."
            }
            ProductKind::CountryDevelopments => "What is the name of the country or region?",
            ProductKind::Factsheet => {
                "What is the name of the country on which you wish to create a factsheet?"
            }
            ProductKind::TariffResponse => "What is the name of the country?",
            ProductKind::Custom => "Please provide the details of the product for the team.",
        }
    }

    fn template(&self) -> Option<&'static str> {
        match self {
            ProductKind::Biography => Some(products::BIOGRAPHY),
            ProductKind::CountryDevelopments => Some(products::COUNTRY_DEVELOPMENTS),
            ProductKind::Factsheet => Some(products::FACTSHEET),
            ProductKind::TariffResponse => Some(products::TARIFF_RESPONSE),
            ProductKind::Custom => None,
        }
    }
}

impl std::str::FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "cv" | "biography" | "bio" => Ok(ProductKind::Biography),
            "developments" | "country-developments" => Ok(ProductKind::CountryDevelopments),
            "factsheet" => Ok(ProductKind::Factsheet),
            "tariffs" | "tariff-response" | "response-to-us-reciprocal-tariffs" => {
                Ok(ProductKind::TariffResponse)
            }
            "custom" => Ok(ProductKind::Custom),
            _ => Err(format!("Unknown product: {}", s)),
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A product kind with the subject it is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    kind: ProductKind,
    subject: String,
}

impl PromptRequest {
    /// Build a request, rejecting blank subjects.
    ///
    /// For `Custom` the subject is the full product description and is kept
    /// byte for byte; other subjects are trimmed.
    pub fn new(kind: ProductKind, subject: impl AsRef<str>) -> Result<Self> {
        let raw = subject.as_ref();
        if raw.trim().is_empty() {
            return Err(SherwoodError::validation(match kind {
                ProductKind::Custom => "custom product text is empty",
                _ => "subject is empty",
            }));
        }
        let subject = match kind {
            ProductKind::Custom => raw,
            _ => raw.trim(),
        };
        Ok(Self {
            kind,
            subject: subject.to_string(),
        })
    }

    pub fn kind(&self) -> ProductKind {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn render(&self) -> RenderedPrompt {
        match self.kind.template() {
            Some(template) => {
                RenderedPrompt(template.replace(products::SUBJECT_PLACEHOLDER, &self.subject))
            }
            None => RenderedPrompt(self.subject.clone()),
        }
    }
}

/// The instruction document sent to every intern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt(String);

impl RenderedPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RenderedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
