use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

/// Majors offered by the search form. Stored records are not validated
/// against this list.
pub const KNOWN_MAJORS: [&str; 20] = [
    "Accounting",
    "Aerospace Engineering",
    "Biomedical Engineering",
    "Business",
    "Chemical Engineering",
    "Civil Engineering",
    "Computer Engineering",
    "Computer Science",
    "Data Science",
    "Economics",
    "Electrical Engineering",
    "Environmental Engineering",
    "Finance",
    "Industrial Engineering",
    "Logistics",
    "Marketing",
    "Materials Science & Engineering",
    "Mechanical Engineering",
    "Nuclear Engineering",
    "Systems Engineering",
];

/// A stored company profile. `id` is assigned by the store and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_projects: Option<String>,
    pub business_model: String,
    pub majors_hiring: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A company profile that has not been assigned an id yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_projects: Option<String>,
    pub business_model: String,
    pub majors_hiring: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl NewCompany {
    pub fn with_id(self, id: impl Into<String>) -> Company {
        Company {
            id: id.into(),
            name: self.name,
            about: self.about,
            example_projects: self.example_projects,
            business_model: self.business_model,
            majors_hiring: self.majors_hiring,
            keywords: self.keywords,
        }
    }
}

/// The projection returned by search: identifier and name only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CompanySummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl From<&Company> for CompanySummary {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id.clone(),
            name: company.name.clone(),
        }
    }
}

/// Body of a search call. Missing and `null` fields both mean "no filter".
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub major: String,

    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub keywords: Vec<String>,

    /// Single-keyword form used by older clients; merged into `keywords`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl SearchRequest {
    pub fn new(major: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            major: major.into(),
            keywords,
            keyword: None,
        }
    }

    pub fn major_filter(&self) -> Option<&str> {
        if self.major.trim().is_empty() {
            None
        } else {
            Some(self.major.as_str())
        }
    }

    pub fn keyword_terms(&self) -> Vec<String> {
        self.keywords
            .iter()
            .chain(self.keyword.iter())
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{NewCompany, SearchRequest};

    #[test]
    fn search_request_treats_missing_and_null_fields_as_empty() {
        let missing: SearchRequest = serde_json::from_str("{}").expect("empty body decodes");
        let nulls: SearchRequest =
            serde_json::from_str(r#"{"major": null, "keywords": null}"#).expect("nulls decode");

        assert_eq!(missing, SearchRequest::default());
        assert_eq!(nulls, SearchRequest::default());
        assert_eq!(missing.major_filter(), None);
        assert!(nulls.keyword_terms().is_empty());
    }

    #[test]
    fn keyword_terms_are_trimmed_and_merge_the_single_keyword_form() {
        let request: SearchRequest = serde_json::from_str(
            r#"{"major": "Finance", "keywords": [" solar ", "", "  "], "keyword": "grid"}"#,
        )
        .expect("request decodes");

        assert_eq!(request.major_filter(), Some("Finance"));
        assert_eq!(request.keyword_terms(), vec!["solar", "grid"]);
    }

    #[test]
    fn search_request_ignores_superseded_company_name_filter() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"companyName": "acme", "keywords": ["robotics"]}"#)
                .expect("unknown fields are ignored");

        assert_eq!(request.keyword_terms(), vec!["robotics"]);
    }

    #[test]
    fn company_serializes_id_as_underscore_id() {
        let company = NewCompany {
            name: "Acme".to_string(),
            about: "Rockets".to_string(),
            example_projects: None,
            business_model: "B2B".to_string(),
            majors_hiring: vec!["Finance".to_string()],
            keywords: vec!["rockets".to_string()],
        }
        .with_id("65a1f0c2e4b0a1b2c3d4e5f6");

        let value = serde_json::to_value(&company).expect("company serializes");
        assert_eq!(value["_id"], "65a1f0c2e4b0a1b2c3d4e5f6");
        assert!(value.get("example_projects").is_none());
        assert_eq!(value["keywords"][0], "rockets");
    }
}
