//! Job browsing: filters, sorting, and offset pagination.
//!
//! Firestore pushes down what it can index (salary range, a single
//! array-contains clause); the remaining predicates — all-skills matching and
//! case-insensitive substring matching — have no server-side operator and are
//! applied in memory after the fetch. Pagination and the total count operate
//! on the fully filtered set so page numbers stay accurate.

use devhire_models::JobRecord;

use crate::types::{
    CollectionSelector, FieldOperator, Filter, StructuredQuery, ToFirestoreValue, Value,
};

/// Default number of jobs per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound on requested page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filter over job postings. All present fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Required skill tags. A job matches only if it carries every one,
    /// compared case-sensitively.
    pub skills: Vec<String>,
    /// Inclusive lower salary bound.
    pub salary_min: Option<f64>,
    /// Inclusive upper salary bound.
    pub salary_max: Option<f64>,
    /// Case-insensitive substring over the location.
    pub location: Option<String>,
    /// Case-insensitive substring over title and description.
    pub search: Option<String>,
}

impl JobFilter {
    /// Parse a comma-separated skills parameter into tags.
    pub fn parse_skills(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.salary_min.is_none()
            && self.salary_max.is_none()
            && self.location.is_none()
            && self.search.is_none()
    }

    /// Predicates that cannot be pushed down to Firestore.
    ///
    /// The first skill rides the query as an ARRAY_CONTAINS clause, so a job
    /// reaching this check already carries it; the check still covers every
    /// skill for clarity, it is just redundant work for the first tag.
    pub fn matches_residual(&self, job: &JobRecord) -> bool {
        if !self.skills.iter().all(|s| job.skills.iter().any(|t| t == s)) {
            return false;
        }

        if let Some(ref location) = self.location {
            if !job
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }

        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !job.title.to_lowercase().contains(&needle)
                && !job.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }
}

/// Result ordering for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobSort {
    /// Creation order (default).
    #[default]
    CreatedAt,
    /// Highest salary first, creation order as tiebreak.
    SalaryDesc,
}

impl JobSort {
    /// Parse from a query parameter, returning the default if unrecognized.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "salary" | "salary_desc" => Self::SalaryDesc,
            _ => Self::CreatedAt,
        }
    }
}

/// Build the pushdown query for a job listing.
///
/// Only indexable predicates go here: the salary range and the first skill
/// tag. Firestore permits a single ARRAY_CONTAINS clause per query, so the
/// remaining skills stay in [`JobFilter::matches_residual`]. No ordering is
/// requested — results are re-sorted in memory after residual filtering.
pub fn build_job_query(collection_id: &str, filter: &JobFilter) -> StructuredQuery {
    let mut filters = Vec::new();

    if let Some(min) = filter.salary_min {
        filters.push(Filter::field(
            "salary",
            FieldOperator::GreaterThanOrEqual,
            min.to_firestore_value(),
        ));
    }
    if let Some(max) = filter.salary_max {
        filters.push(Filter::field(
            "salary",
            FieldOperator::LessThanOrEqual,
            max.to_firestore_value(),
        ));
    }
    if let Some(first_skill) = filter.skills.first() {
        filters.push(Filter::field(
            "skills",
            FieldOperator::ArrayContains,
            Value::StringValue(first_skill.clone()),
        ));
    }

    StructuredQuery {
        from: vec![CollectionSelector {
            collection_id: collection_id.to_string(),
            all_descendants: None,
        }],
        filter: Filter::and(filters),
        order_by: None,
        limit: None,
    }
}

/// Sort jobs in place according to the requested ordering.
///
/// Ties on the sort key fall back to creation order, then document ID, so
/// pagination is stable across requests.
pub fn sort_jobs(jobs: &mut [JobRecord], sort: JobSort) {
    match sort {
        JobSort::CreatedAt => {
            jobs.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.as_str().cmp(b.id.as_str()))
            });
        }
        JobSort::SalaryDesc => {
            jobs.sort_by(|a, b| {
                b.salary
                    .total_cmp(&a.salary)
                    .then_with(|| a.created_at.cmp(&b.created_at))
                    .then_with(|| a.id.as_str().cmp(b.id.as_str()))
            });
        }
    }
}

/// Clamp a requested page to 1-indexed.
pub fn normalize_page(page: Option<u32>) -> u32 {
    page.unwrap_or(1).max(1)
}

/// Clamp a requested page size to the valid range.
pub fn normalize_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Slice one page out of the filtered result set.
///
/// Returns `(page_items, total, pages)`. A page past the end yields an empty
/// slice with the counts intact rather than an error.
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> (Vec<T>, u64, u32) {
    let total = items.len() as u64;
    let pages = total.div_ceil(limit as u64) as u32;

    let start = (page as usize - 1).saturating_mul(limit as usize);
    let page_items = items
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();

    (page_items, total, pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devhire_models::UserId;

    fn job(title: &str, salary: f64, location: &str, skills: &[&str]) -> JobRecord {
        JobRecord::new(
            title,
            format!("{} description", title),
            skills.iter().map(|s| s.to_string()).collect(),
            salary,
            location,
            UserId::from_string("employer-1"),
        )
    }

    #[test]
    fn parse_skills_trims_and_drops_empties() {
        assert_eq!(
            JobFilter::parse_skills("React, Node , ,Go"),
            vec!["React", "Node", "Go"]
        );
        assert!(JobFilter::parse_skills("").is_empty());
    }

    #[test]
    fn skills_filter_requires_all_tags() {
        let job = job("Frontend", 80_000.0, "Remote", &["React", "Node"]);

        let all_present = JobFilter {
            skills: JobFilter::parse_skills("React,Node"),
            ..JobFilter::default()
        };
        assert!(all_present.matches_residual(&job));

        let one_missing = JobFilter {
            skills: JobFilter::parse_skills("React,Go"),
            ..JobFilter::default()
        };
        assert!(!one_missing.matches_residual(&job));
    }

    #[test]
    fn skills_match_is_case_sensitive() {
        let job = job("Frontend", 80_000.0, "Remote", &["React"]);
        let filter = JobFilter {
            skills: vec!["react".to_string()],
            ..JobFilter::default()
        };
        assert!(!filter.matches_residual(&job));
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        let job = job("Backend", 90_000.0, "New York City", &["Go"]);

        let hit = JobFilter {
            location: Some("york".to_string()),
            ..JobFilter::default()
        };
        assert!(hit.matches_residual(&job));

        let miss = JobFilter {
            location: Some("nyc".to_string()),
            ..JobFilter::default()
        };
        assert!(!miss.matches_residual(&job));
    }

    #[test]
    fn search_covers_title_and_description() {
        let job = job("Backend Engineer", 90_000.0, "Remote", &["Go"]);

        let by_title = JobFilter {
            search: Some("backend".to_string()),
            ..JobFilter::default()
        };
        assert!(by_title.matches_residual(&job));

        let by_description = JobFilter {
            search: Some("description".to_string()),
            ..JobFilter::default()
        };
        assert!(by_description.matches_residual(&job));

        let miss = JobFilter {
            search: Some("kubernetes".to_string()),
            ..JobFilter::default()
        };
        assert!(!miss.matches_residual(&job));
    }

    #[test]
    fn pushdown_query_carries_salary_range_and_first_skill() {
        let filter = JobFilter {
            skills: vec!["Go".to_string(), "SQL".to_string()],
            salary_min: Some(80_000.0),
            salary_max: Some(100_000.0),
            ..JobFilter::default()
        };

        let query = build_job_query("jobs", &filter);
        let composite = query.filter.unwrap().composite_filter.unwrap();
        // min + max + one array-contains; the second skill stays residual
        assert_eq!(composite.filters.len(), 3);
    }

    #[test]
    fn pushdown_query_without_predicates_has_no_filter() {
        let query = build_job_query("jobs", &JobFilter::default());
        assert!(query.filter.is_none());
        assert_eq!(query.from[0].collection_id, "jobs");
    }

    #[test]
    fn salary_sort_is_descending_with_stable_ties() {
        let mut a = job("A", 50_000.0, "Remote", &["Go"]);
        let mut b = job("B", 90_000.0, "Remote", &["Go"]);
        let mut c = job("C", 90_000.0, "Remote", &["Go"]);
        // Force a deterministic creation order for the tie
        a.created_at = chrono::Utc::now() - chrono::Duration::hours(3);
        b.created_at = chrono::Utc::now() - chrono::Duration::hours(2);
        c.created_at = chrono::Utc::now() - chrono::Duration::hours(1);

        let mut jobs = vec![a, c.clone(), b.clone()];
        sort_jobs(&mut jobs, JobSort::SalaryDesc);

        assert_eq!(jobs[0].id, b.id); // earlier of the two 90k jobs
        assert_eq!(jobs[1].id, c.id);
        assert_eq!(jobs[2].title, "A");
    }

    #[test]
    fn default_sort_is_creation_order() {
        let mut a = job("A", 50_000.0, "Remote", &["Go"]);
        let mut b = job("B", 90_000.0, "Remote", &["Go"]);
        a.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        b.created_at = chrono::Utc::now() - chrono::Duration::hours(2);

        let mut jobs = vec![a.clone(), b.clone()];
        sort_jobs(&mut jobs, JobSort::CreatedAt);

        assert_eq!(jobs[0].id, b.id);
        assert_eq!(jobs[1].id, a.id);
    }

    #[test]
    fn pagination_math() {
        let items: Vec<u32> = (0..25).collect();

        let (page, total, pages) = paginate(&items, 1, 10);
        assert_eq!(page.len(), 10);
        assert_eq!(total, 25);
        assert_eq!(pages, 3);

        let (page, _, _) = paginate(&items, 3, 10);
        assert_eq!(page, vec![20, 21, 22, 23, 24]);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let items: Vec<u32> = (0..5).collect();
        let (page, total, pages) = paginate(&items, 7, 10);
        assert!(page.is_empty());
        assert_eq!(total, 5);
        assert_eq!(pages, 1);
    }

    #[test]
    fn empty_result_set_has_zero_pages() {
        let items: Vec<u32> = Vec::new();
        let (page, total, pages) = paginate(&items, 1, 10);
        assert!(page.is_empty());
        assert_eq!(total, 0);
        assert_eq!(pages, 0);
    }

    #[test]
    fn normalization_bounds() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(4)), 4);
        assert_eq!(normalize_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1000)), MAX_PAGE_SIZE);
    }

    #[test]
    fn sort_param_parsing() {
        assert_eq!(JobSort::from_str_or_default("salary"), JobSort::SalaryDesc);
        assert_eq!(JobSort::from_str_or_default("anything"), JobSort::CreatedAt);
    }
}
