//! Translates a search request into store queries.
//!
//! With no keywords the plan is a single listing sorted by name. With
//! keywords the plan holds one query per keyword; the caller intersects
//! their results on id and sorts the survivors by name.

use crate::models::SearchRequest;

/// Match on one keyword: exact membership of any case variant in the
/// record's `keywords`, or a text-index hit on the free-text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    pub text: String,
    pub variants: Vec<String>,
}

impl KeywordMatch {
    pub fn new(keyword: &str) -> Self {
        Self {
            text: text_search_term(keyword),
            variants: case_variants(keyword),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyFilter {
    /// Exact, case-sensitive membership in `majors_hiring`.
    pub major: Option<String>,
    pub keyword: Option<KeywordMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyQuery {
    pub filter: CompanyFilter,
    /// Ask the store for collated name order.
    pub sort_by_name: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    Listing(CompanyQuery),
    Intersection(Vec<CompanyQuery>),
}

pub fn plan_search(request: &SearchRequest) -> SearchPlan {
    let major = request.major_filter().map(str::to_string);
    let keywords = request.keyword_terms();

    if keywords.is_empty() {
        return SearchPlan::Listing(CompanyQuery {
            filter: CompanyFilter {
                major,
                keyword: None,
            },
            sort_by_name: true,
        });
    }

    let queries = keywords
        .iter()
        .map(|keyword| CompanyQuery {
            filter: CompanyFilter {
                major: major.clone(),
                keyword: Some(KeywordMatch::new(keyword)),
            },
            sort_by_name: false,
        })
        .collect();

    SearchPlan::Intersection(queries)
}

/// As given, lowercase, uppercase and capitalized, without duplicates.
pub fn case_variants(keyword: &str) -> Vec<String> {
    let candidates = [
        keyword.to_string(),
        keyword.to_lowercase(),
        keyword.to_uppercase(),
        capitalize(keyword),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn capitalize(keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

/// The text index treats `"` as a phrase delimiter and a leading `-` as
/// negation; neither should leak in from a user keyword.
fn text_search_term(keyword: &str) -> String {
    keyword
        .split_whitespace()
        .map(|word| word.trim_start_matches('-').replace('"', ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keywords_plan_a_sorted_listing() {
        let plan = plan_search(&SearchRequest::new("Computer Science", Vec::new()));

        assert_eq!(
            plan,
            SearchPlan::Listing(CompanyQuery {
                filter: CompanyFilter {
                    major: Some("Computer Science".to_string()),
                    keyword: None,
                },
                sort_by_name: true,
            })
        );
    }

    #[test]
    fn blank_major_means_no_major_filter() {
        let plan = plan_search(&SearchRequest::new("   ", Vec::new()));

        match plan {
            SearchPlan::Listing(query) => assert_eq!(query.filter.major, None),
            other => panic!("expected listing, got {other:?}"),
        }
    }

    #[test]
    fn each_keyword_gets_its_own_query_with_the_major_filter() {
        let request = SearchRequest::new(
            "Finance",
            vec!["energy".to_string(), "grid".to_string()],
        );

        let SearchPlan::Intersection(queries) = plan_search(&request) else {
            panic!("keywords should plan an intersection");
        };

        assert_eq!(queries.len(), 2);
        assert!(queries
            .iter()
            .all(|query| query.filter.major.as_deref() == Some("Finance")));
        assert_eq!(
            queries[1].filter.keyword.as_ref().map(|keyword| keyword.text.as_str()),
            Some("grid")
        );
    }

    #[test]
    fn case_variants_cover_all_forms_once() {
        assert_eq!(
            case_variants("eNergy"),
            vec!["eNergy", "energy", "ENERGY", "Energy"]
        );
        assert_eq!(case_variants("energy"), vec!["energy", "ENERGY", "Energy"]);
    }

    #[test]
    fn regex_characters_stay_literal_in_variants() {
        let variants = case_variants("c++");
        assert_eq!(variants, vec!["c++", "C++"]);
    }

    #[test]
    fn text_term_drops_phrase_and_negation_markers() {
        let keyword = KeywordMatch::new("\"solar\" -wind");
        assert_eq!(keyword.text, "solar wind");
        assert_eq!(keyword.variants[0], "\"solar\" -wind");
    }
}
