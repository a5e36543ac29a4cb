use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// Maximum number of companies scraped for career pages per request.
pub const MAX_TARGET_COMPANIES: usize = 5;

/// The candidate a search is run for. Owned by the caller and read-only here.
///
/// List fields accept either a JSON array or a comma-separated string, since
/// profile forms usually submit `"Rust, SQL, Kafka"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub current_role: Option<String>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub target_roles: Vec<String>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub skills: Vec<String>,
    #[serde(default)]
    pub years_experience: Option<u32>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub preferred_locations: Vec<String>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub industries: Vec<String>,
}

impl CandidateProfile {
    /// Skills lowercased, trimmed and deduplicated, in first-seen order.
    pub fn normalized_skills(&self) -> Vec<String> {
        let mut skills: Vec<String> = Vec::with_capacity(self.skills.len());
        for skill in &self.skills {
            let skill = skill.trim().to_lowercase();
            if !skill.is_empty() && !skills.contains(&skill) {
                skills.push(skill);
            }
        }
        skills
    }

    pub fn primary_role(&self) -> Option<&str> {
        first_non_blank(&self.target_roles)
    }

    pub fn primary_location(&self) -> Option<&str> {
        first_non_blank(&self.preferred_locations)
    }
}

/// Body of `POST /api/v1/jobs/search`: the profile fields plus optional companies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationRequest {
    #[serde(flatten)]
    pub profile: CandidateProfile,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub companies: Vec<String>,
}

/// What the source adapters need from a request, derived once after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    /// First target role; adapters search for this keyword.
    pub role: String,
    /// First preferred location, if any.
    pub location: Option<String>,
    /// At most [`MAX_TARGET_COMPANIES`] non-blank company names.
    pub companies: Vec<String>,
}

impl AggregationRequest {
    /// Validates caller input and derives adapter criteria.
    ///
    /// An empty target-role list is the only hard failure; surplus companies
    /// are dropped rather than rejected.
    pub fn criteria(&self) -> Result<SearchCriteria, AppError> {
        let role = self.profile.primary_role().ok_or_else(|| {
            AppError::Validation("targetRoles must contain at least one role".to_string())
        })?;

        let companies: Vec<String> = self
            .companies
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if companies.len() > MAX_TARGET_COMPANIES {
            tracing::debug!(
                requested = companies.len(),
                kept = MAX_TARGET_COMPANIES,
                "Dropping surplus target companies"
            );
        }

        Ok(SearchCriteria {
            role: role.to_string(),
            location: self.profile.primary_location().map(str::to_string),
            companies: companies.into_iter().take(MAX_TARGET_COMPANIES).collect(),
        })
    }
}

fn first_non_blank(values: &[String]) -> Option<&str> {
    values.iter().map(|v| v.trim()).find(|v| !v.is_empty())
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
        Null(()),
    }

    let items = match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(items) => items,
        ListOrCsv::Csv(text) => text.split(',').map(str::to_string).collect(),
        ListOrCsv::Null(()) => Vec::new(),
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_accepts_comma_separated_lists() {
        let request: AggregationRequest = serde_json::from_value(json!({
            "name": "Ada",
            "targetRoles": "Backend Engineer, Platform Engineer",
            "skills": "Rust, SQL ,  ",
            "preferredLocations": "Berlin",
            "companies": ["Acme"]
        }))
        .unwrap();

        assert_eq!(
            request.profile.target_roles,
            vec!["Backend Engineer", "Platform Engineer"]
        );
        assert_eq!(request.profile.skills, vec!["Rust", "SQL"]);
        assert_eq!(request.companies, vec!["Acme"]);
    }

    #[test]
    fn test_profile_accepts_arrays_and_nulls() {
        let request: AggregationRequest = serde_json::from_value(json!({
            "targetRoles": ["Data Engineer"],
            "skills": null,
            "yearsExperience": 4
        }))
        .unwrap();

        assert_eq!(request.profile.target_roles, vec!["Data Engineer"]);
        assert!(request.profile.skills.is_empty());
        assert!(request.companies.is_empty());
        assert_eq!(request.profile.years_experience, Some(4));
    }

    #[test]
    fn test_normalized_skills_are_case_insensitive_set() {
        let profile = CandidateProfile {
            skills: vec!["Python".into(), " python ".into(), "SQL".into(), "".into()],
            ..Default::default()
        };
        assert_eq!(profile.normalized_skills(), vec!["python", "sql"]);
    }

    #[test]
    fn test_empty_target_roles_is_invalid_request() {
        let request = AggregationRequest::default();
        let err = request.criteria().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("targetRoles"));
    }

    #[test]
    fn test_blank_target_roles_is_invalid_request() {
        let request = AggregationRequest {
            profile: CandidateProfile {
                target_roles: vec!["   ".into()],
                ..Default::default()
            },
            companies: vec![],
        };
        assert!(request.criteria().is_err());
    }

    #[test]
    fn test_criteria_uses_first_role_and_location() {
        let request = AggregationRequest {
            profile: CandidateProfile {
                target_roles: vec!["Rust Engineer".into(), "SRE".into()],
                preferred_locations: vec!["Remote".into(), "London".into()],
                ..Default::default()
            },
            companies: vec![],
        };
        let criteria = request.criteria().unwrap();
        assert_eq!(criteria.role, "Rust Engineer");
        assert_eq!(criteria.location.as_deref(), Some("Remote"));
    }

    #[test]
    fn test_criteria_caps_companies_at_five() {
        let request = AggregationRequest {
            profile: CandidateProfile {
                target_roles: vec!["Engineer".into()],
                ..Default::default()
            },
            companies: vec![
                "A".into(),
                " ".into(),
                "B".into(),
                "C".into(),
                "D".into(),
                "E".into(),
                "F".into(),
            ],
        };
        let criteria = request.criteria().unwrap();
        assert_eq!(criteria.companies, vec!["A", "B", "C", "D", "E"]);
    }
}
