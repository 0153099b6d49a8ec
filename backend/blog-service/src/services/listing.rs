/// Filter → sort → paginate pipeline shared by post and comment listings
use crate::error::{AppError, Result};
use crate::models::{Post, Record};
use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_POST_LIMIT: usize = 10;
pub const DEFAULT_COMMENT_LIMIT: usize = 20;

/// Conjunctive filter criteria. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCriteria {
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
    /// Exact author match
    pub author_id: Option<Uuid>,
}

impl ListCriteria {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: Some(query.into()),
            ..Default::default()
        }
    }
}

/// Records the criteria can be evaluated against
pub trait Filterable: Record {
    fn category(&self) -> &str;
    fn title(&self) -> &str;
    fn body(&self) -> &str;
    fn author_id(&self) -> Uuid;
}

impl Filterable for Post {
    fn category(&self) -> &str {
        &self.category
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn body(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// 1-based page request. Sanity of `page` is the caller's concern; a zero
/// `limit` is rejected by `paginate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_POST_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_next_page: bool,
    /// `page > 1`, whether or not that page holds anything
    pub has_prev_page: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Keep the records matching every criterion, preserving order.
pub fn filter_records<T: Filterable>(records: Vec<T>, criteria: &ListCriteria) -> Vec<T> {
    let needle = criteria
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    records
        .into_iter()
        .filter(|record| {
            criteria
                .category
                .as_deref()
                .map_or(true, |category| record.category() == category)
        })
        .filter(|record| {
            needle.as_deref().map_or(true, |needle| {
                record.title().to_lowercase().contains(needle)
                    || record.body().to_lowercase().contains(needle)
            })
        })
        .filter(|record| {
            criteria
                .author_id
                .map_or(true, |author_id| record.author_id() == author_id)
        })
        .collect()
}

/// Newest first. Stable, so equal timestamps keep stored order.
pub fn sort_newest_first<T: Record>(records: &mut [T]) {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// Slice `[(page-1)*limit, page*limit)` out of `items`.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Result<Page<T>> {
    if request.limit == 0 {
        return Err(AppError::DivisionError);
    }

    let total = items.len();
    let start = request.page.saturating_sub(1).saturating_mul(request.limit);
    let end = request.page.saturating_mul(request.limit);

    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect();

    Ok(Page {
        items,
        pagination: Pagination {
            current_page: request.page,
            total_pages: total.div_ceil(request.limit),
            total_items: total,
            has_next_page: end < total,
            has_prev_page: request.page > 1,
        },
    })
}

/// Full pipeline: filter, sort newest first, paginate.
///
/// A zero limit surfaces from `paginate` as `DivisionError`.
pub fn query<T: Filterable>(
    records: Vec<T>,
    criteria: &ListCriteria,
    request: PageRequest,
) -> Result<Page<T>> {
    let mut filtered = filter_records(records, criteria);
    sort_newest_first(&mut filtered);
    paginate(filtered, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn post_at(minutes: i64, title: &str, content: &str, category: &str, author: Uuid) -> Post {
        let mut post = Post::new(
            author,
            title.to_string(),
            content.to_string(),
            Some(category.to_string()),
            vec![],
            None,
        );
        post.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        post
    }

    fn numbered_posts(n: i64) -> Vec<Post> {
        let author = Uuid::new_v4();
        (0..n)
            .map(|i| post_at(i, &format!("post {}", i), "body", "General", author))
            .collect()
    }

    #[test]
    fn test_pages_reconstruct_sorted_sequence() {
        let posts = numbered_posts(23);
        let mut expected = posts.clone();
        sort_newest_first(&mut expected);

        for limit in 1..=25 {
            let first = query(posts.clone(), &ListCriteria::default(), PageRequest::new(1, limit))
                .unwrap();
            let total_pages = first.pagination.total_pages;
            assert_eq!(total_pages, 23usize.div_ceil(limit));

            let mut collected = Vec::new();
            for page in 1..=total_pages {
                let page = query(
                    posts.clone(),
                    &ListCriteria::default(),
                    PageRequest::new(page, limit),
                )
                .unwrap();
                collected.extend(page.items.into_iter().map(|p| p.id));
            }
            let expected_ids: Vec<Uuid> = expected.iter().map(|p| p.id).collect();
            assert_eq!(collected, expected_ids, "limit {}", limit);
        }
    }

    #[test]
    fn test_twenty_five_posts_nine_per_page() {
        let posts = numbered_posts(25);
        let sizes: Vec<usize> = (1..=3)
            .map(|page| {
                query(posts.clone(), &ListCriteria::default(), PageRequest::new(page, 9))
                    .unwrap()
                    .items
                    .len()
            })
            .collect();
        assert_eq!(sizes, vec![9, 9, 7]);

        let last = query(posts, &ListCriteria::default(), PageRequest::new(3, 9)).unwrap();
        assert_eq!(last.pagination.total_pages, 3);
        assert_eq!(last.pagination.total_items, 25);
        assert!(!last.pagination.has_next_page);
        assert!(last.pagination.has_prev_page);
    }

    #[test]
    fn test_has_next_page_boundary() {
        // end == total
        let page = paginate((0..10).collect::<Vec<_>>(), PageRequest::new(2, 5)).unwrap();
        assert!(!page.pagination.has_next_page);

        let page = paginate((0..11).collect::<Vec<_>>(), PageRequest::new(2, 5)).unwrap();
        assert!(page.pagination.has_next_page);
    }

    #[test]
    fn test_out_of_range_page_still_reports_previous() {
        let page = paginate(vec![1, 2, 3], PageRequest::new(7, 2)).unwrap();
        assert!(page.items.is_empty());
        assert!(page.pagination.has_prev_page);
        assert!(!page.pagination.has_next_page);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[test]
    fn test_page_zero_is_empty() {
        let page = paginate(vec![1, 2, 3], PageRequest::new(0, 2)).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.pagination.has_prev_page);
    }

    #[test]
    fn test_empty_collection() {
        let page = query(Vec::<Post>::new(), &ListCriteria::default(), PageRequest::default())
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.pagination.has_next_page);
    }

    #[test]
    fn test_zero_limit_is_division_error() {
        let result = query(numbered_posts(3), &ListCriteria::default(), PageRequest::new(1, 0));
        assert!(matches!(result, Err(AppError::DivisionError)));
        let result = query(
            numbered_posts(3),
            &ListCriteria::search("nothing matches"),
            PageRequest::new(1, 0),
        );
        assert!(matches!(result, Err(AppError::DivisionError)));
        assert!(matches!(
            paginate(vec![1], PageRequest::new(1, 0)),
            Err(AppError::DivisionError)
        ));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let author = Uuid::new_v4();
        let posts = vec![
            post_at(0, "Hello World", "greetings", "General", author),
            post_at(1, "Other", "nothing to see", "General", author),
            post_at(2, "Recipes", "a whole WORLD of flavour", "Food", author),
        ];

        let hits = filter_records(posts.clone(), &ListCriteria::search("hello"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Hello World");

        let hits = filter_records(posts, &ListCriteria::search("WORLD"));
        let titles: Vec<&str> = hits.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Hello World", "Recipes"]);
    }

    #[test]
    fn test_criteria_are_conjunctive() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let posts = vec![
            post_at(0, "Rust tips", "", "Technology", alice),
            post_at(1, "Rust travel", "", "Travel", alice),
            post_at(2, "Rust tips", "", "Technology", bob),
        ];

        let criteria = ListCriteria {
            category: Some("Technology".into()),
            search: Some("rust".into()),
            author_id: Some(alice),
        };
        let hits = filter_records(posts, &criteria);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].author_id, alice);
        assert_eq!(hits[0].category, "Technology");
    }

    #[test]
    fn test_category_is_exact_match() {
        let author = Uuid::new_v4();
        let posts = vec![
            post_at(0, "a", "", "Tech", author),
            post_at(1, "b", "", "Technology", author),
        ];
        let hits = filter_records(posts, &ListCriteria::category("Tech"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "a");
    }

    #[test]
    fn test_sorted_newest_first() {
        let page = query(numbered_posts(5), &ListCriteria::default(), PageRequest::new(1, 5))
            .unwrap();
        let titles: Vec<&str> = page.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["post 4", "post 3", "post 2", "post 1", "post 0"]);
    }
}
