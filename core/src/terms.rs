use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Full explanation of one catalog term, as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TermDetail {
    pub term_id: Uuid,
    pub term: String,
    pub category: String,
    /// 1 = beginner, 5 = expert
    pub difficulty: i32,
    pub formal_definition: String,
    pub simple_definition: String,
    pub examples: Vec<String>,
    pub why_it_matters: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TermRequest {
    pub term: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TermListResponse {
    pub terms: Vec<TermDetail>,
    pub total: usize,
}

/// Canonical form of a term name used for duplicate detection: lowercased,
/// trimmed, trailing periods stripped, double spaces collapsed. Comparing
/// normalized strings is the deterministic half of deduplication; anything
/// fuzzier is delegated to the validation collaborator.
pub fn normalize_term(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .trim_end_matches('.')
        .replace("  ", " ")
}

/// Find an existing term whose normalized name matches the candidate's.
/// Returns the original (non-normalized) catalog spelling for the rejection
/// message.
pub fn find_normalized_duplicate<'a, I>(candidate: &str, existing: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = normalize_term(candidate);
    existing
        .into_iter()
        .find(|term| normalize_term(term) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_case_insensitive() {
        let t = "Kubernetes Operator";
        assert_eq!(normalize_term(t), normalize_term(&t.to_uppercase()));
    }

    #[test]
    fn normalize_ignores_trailing_period() {
        assert_eq!(normalize_term("docker"), normalize_term("docker."));
        assert_eq!(normalize_term("docker"), normalize_term("Docker.."));
    }

    #[test]
    fn normalize_trims_and_collapses_double_spaces() {
        assert_eq!(normalize_term("  load  balancer "), "load balancer");
    }

    #[test]
    fn duplicate_lookup_returns_catalog_spelling() {
        let catalog = ["Docker", "Kubernetes", "CI/CD"];
        assert_eq!(
            find_normalized_duplicate("docker.", catalog),
            Some("Docker")
        );
        assert_eq!(find_normalized_duplicate("Terraform", catalog), None);
    }
}
