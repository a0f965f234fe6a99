//! Decision categories and their clarifying-question tables.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// The kind of architectural decision being made.
///
/// Parsing is case-insensitive and accepts common aliases; any other string
/// becomes [`DecisionCategory::Other`] carrying the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[strum(ascii_case_insensitive)]
pub enum DecisionCategory {
  #[strum(serialize = "authentication", serialize = "auth", serialize = "login")]
  Authentication,
  #[strum(serialize = "database", serialize = "db", serialize = "persistence")]
  Database,
  #[strum(serialize = "api", serialize = "rest", serialize = "endpoints")]
  Api,
  #[strum(serialize = "testing", serialize = "tests", serialize = "test")]
  Testing,
  #[strum(serialize = "deployment", serialize = "deploy", serialize = "release")]
  Deployment,
  #[strum(
    serialize = "error_handling",
    serialize = "error handling",
    serialize = "error-handling",
    serialize = "errors"
  )]
  ErrorHandling,
  #[strum(serialize = "logging", serialize = "logs", serialize = "observability")]
  Logging,
  #[strum(serialize = "frontend", serialize = "ui", serialize = "styling")]
  Frontend,
  #[strum(serialize = "security", serialize = "sec")]
  Security,
  #[strum(default)]
  Other(String),
}

const GENERIC_QUESTIONS: &[&str] = &[
  "What standard or approach should be adopted?",
  "What is the rationale for choosing it over the alternatives?",
  "Where should this decision apply (which services, modules or teams)?",
];

impl DecisionCategory {
  /// Classify a free-text decision type.
  pub fn classify(decision_type: &str) -> Self {
    let t = decision_type.trim();
    t.parse().unwrap_or_else(|_| Self::Other(t.to_string()))
  }

  /// Canonical name, as written to the `Type:` label.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Authentication => "authentication",
      Self::Database => "database",
      Self::Api => "api",
      Self::Testing => "testing",
      Self::Deployment => "deployment",
      Self::ErrorHandling => "error_handling",
      Self::Logging => "logging",
      Self::Frontend => "frontend",
      Self::Security => "security",
      Self::Other(s) => s,
    }
  }

  /// Section of the decision log this category is filed under.
  pub fn section(&self) -> &'static str {
    match self {
      Self::Authentication | Self::Security => "Security Standards",
      Self::Testing | Self::ErrorHandling | Self::Logging => {
        "Code Quality Standards"
      }
      _ => "Technology Stack",
    }
  }

  /// The domain-specific questions for this category. [`Self::Other`] gets
  /// the three generic ones.
  pub fn questions(&self) -> &'static [&'static str] {
    match self {
      Self::Authentication => &[
        "Which authentication mechanism should be used (sessions, JWT, OAuth2, SSO)?",
        "How are credentials and tokens stored, rotated and revoked?",
        "What session lifetime and refresh policy applies?",
        "Which services or endpoints must enforce authentication?",
      ],
      Self::Database => &[
        "Which database engine and access layer should be used?",
        "How are schema migrations authored and applied?",
        "What consistency and transaction guarantees are required?",
        "How are backups and restores handled?",
      ],
      Self::Api => &[
        "Which API style should be used (REST, GraphQL, gRPC)?",
        "How are endpoints versioned and deprecated?",
        "What is the standard error response format?",
        "How are pagination and rate limits exposed to clients?",
      ],
      Self::Testing => &[
        "Which test framework and runner should be used?",
        "What coverage threshold must changes meet?",
        "Which layers need integration or end-to-end tests?",
        "How are fixtures and external services handled in tests?",
      ],
      Self::Deployment => &[
        "Which platform hosts the deployed services?",
        "How are releases promoted and rolled back?",
        "How are secrets and environment configuration supplied?",
        "What health checks gate a rollout?",
      ],
      Self::ErrorHandling => &[
        "How are errors represented in code (result types, exceptions, codes)?",
        "Which errors reach users and which are only logged?",
        "When should an operation be retried?",
        "How are errors correlated across services?",
      ],
      Self::Logging => &[
        "Which logging library and output format should be used?",
        "What log levels apply in each environment?",
        "Which fields must every log line carry?",
        "Where are logs shipped and how long are they kept?",
      ],
      Self::Frontend => &[
        "Which UI framework and component library should be used?",
        "How is client state managed?",
        "Which styling approach applies?",
        "Which browsers and devices must be supported?",
      ],
      Self::Security => &[
        "Which framework guides this decision (OWASP, NIST)?",
        "How is input validated and output encoded?",
        "How are dependencies scanned for vulnerabilities?",
        "Who reviews security-sensitive changes?",
      ],
      Self::Other(_) => GENERIC_QUESTIONS,
    }
  }
}

impl fmt::Display for DecisionCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<String> for DecisionCategory {
  fn from(value: String) -> Self { Self::classify(&value) }
}

impl From<DecisionCategory> for String {
  fn from(value: DecisionCategory) -> Self { value.as_str().to_string() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn aliases_are_case_insensitive() {
    assert_eq!(DecisionCategory::classify("Auth"), DecisionCategory::Authentication);
    assert_eq!(
      DecisionCategory::classify("error handling"),
      DecisionCategory::ErrorHandling
    );
    assert_eq!(DecisionCategory::classify(" DB "), DecisionCategory::Database);
  }

  #[test]
  fn unknown_type_falls_back_to_generic_questions() {
    let c = DecisionCategory::classify("caching");
    assert_eq!(c, DecisionCategory::Other("caching".into()));
    assert_eq!(c.questions().len(), 3);
    assert_eq!(c.to_string(), "caching");
  }

  #[test]
  fn known_categories_have_four_questions() {
    for c in [
      DecisionCategory::Authentication,
      DecisionCategory::Database,
      DecisionCategory::Api,
      DecisionCategory::Testing,
      DecisionCategory::Deployment,
      DecisionCategory::ErrorHandling,
      DecisionCategory::Logging,
      DecisionCategory::Frontend,
      DecisionCategory::Security,
    ] {
      assert_eq!(c.questions().len(), 4, "{c}");
    }
  }

  #[test]
  fn serde_uses_canonical_names() {
    let json = serde_json::to_string(&DecisionCategory::ErrorHandling).unwrap();
    assert_eq!(json, "\"error_handling\"");
    let back: DecisionCategory = serde_json::from_str("\"login\"").unwrap();
    assert_eq!(back, DecisionCategory::Authentication);
  }
}
