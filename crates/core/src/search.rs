//! Multi-criterion document search.
//!
//! Criteria are independent and ANDed together; label lists are ORed within themselves. The
//! filter is assembled as SQL text plus positional parameters, so every value reaches SQLite as
//! a bound parameter and never as SQL.
//!
//! Case-insensitive matching runs against the `*_folded` shadow columns with a folded needle,
//! which keeps Cyrillic titles and usernames matching regardless of case. Label lists compare
//! with `lower()`, which is sufficient because every label and NPA code is ASCII.
//!
//! The total and the requested page are read inside one transaction so they describe the same
//! snapshot.

use crate::config::CoreConfig;
use crate::constants::{DATE_FORMAT, SEARCH_DATE_FLOOR};
use crate::document::{Document, DocumentId};
use crate::store::{connect, document_from_row, timestamp_to_micros, DOCUMENT_COLUMNS};
use crate::text::fold_case;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Days, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::Arc;

// ============================================================================
// CRITERIA
// ============================================================================

/// Which document field the free-text query is matched against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Case-insensitive substring of the title.
    #[default]
    Title,
    /// Case-insensitive substring of the text.
    Text,
    /// Exact document id. A query that is not an integer matches nothing.
    Id,
}

impl SearchMode {
    /// Maps a `search_type` parameter to a mode. Anything unrecognised searches titles.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("text") => SearchMode::Text,
            Some("id") => SearchMode::Id,
            _ => SearchMode::Title,
        }
    }
}

/// Search criteria. Every field is optional; the default matches every document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub query: Option<String>,
    pub mode: SearchMode,
    pub law_types: Vec<String>,
    pub dominant_justifications: Vec<String>,
    pub npa_values: Vec<String>,
    pub status_values: Vec<String>,
    /// `YYYY-MM-DD`, start of day UTC.
    pub from_date: Option<String>,
    /// `YYYY-MM-DD`; documents created during this day are included.
    pub to_date: Option<String>,
    /// Case-insensitive substring of the owner's username.
    pub user: Option<String>,
}

/// Splits a comma-separated parameter into trimmed, non-empty items.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `CoreError::InvalidDate` if `raw` is not a valid calendar date in that format.
pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(raw.to_string()))
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The day after `date`, or `date` itself at the far end of the calendar.
pub(crate) fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

// ============================================================================
// PAGINATION
// ============================================================================

/// A requested page. `page` is 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    /// `None` or zero uses the configured default; larger values are clamped to the maximum.
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, page_size: Option<u32>) -> Self {
        Self { page, page_size }
    }

    pub fn first() -> Self {
        Self::new(1, None)
    }
}

/// Position of a returned page within the full result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub number: u32,
    pub page_size: u32,
    pub num_pages: u32,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }
}

/// One page of search results.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchPage {
    pub items: Vec<Document>,
    /// Number of documents matching the criteria, independent of pagination.
    pub total: u64,
    /// `None` when the whole filtered set was returned.
    pub page: Option<PageInfo>,
}

// ============================================================================
// FILTER BUILDER
// ============================================================================

/// A conjunction of SQL predicates with their bound values.
#[derive(Default)]
struct Filter {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Filter {
    fn push(&mut self, clause: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.clauses.push(clause.into());
        self.values.extend(values);
    }

    fn contains_folded(&mut self, folded_column: &str, needle: &str) {
        self.push(
            format!("instr({folded_column}, ?) > 0"),
            [Value::Text(fold_case(needle))],
        );
    }

    fn any_label(&mut self, column: &str, labels: &[String]) {
        if labels.is_empty() {
            return;
        }
        let placeholders = vec!["?"; labels.len()].join(", ");
        self.push(
            format!("lower({column}) IN ({placeholders})"),
            labels.iter().map(|l| Value::Text(l.to_lowercase())),
        );
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Builds the filter, or `None` when the criteria can match nothing.
fn build_filter(criteria: &SearchCriteria, now: DateTime<Utc>) -> CoreResult<Option<Filter>> {
    let mut filter = Filter::default();

    if let Some(query) = criteria.query.as_deref().filter(|q| !q.is_empty()) {
        match criteria.mode {
            SearchMode::Title => filter.contains_folded("title_folded", query),
            SearchMode::Text => filter.contains_folded("text_folded", query),
            SearchMode::Id => match query.trim().parse::<DocumentId>() {
                Ok(id) => filter.push("id = ?", [Value::Integer(id)]),
                Err(_) => return Ok(None),
            },
        }
    }

    filter.any_label("law_type", &criteria.law_types);
    filter.any_label("dominant_justification", &criteria.dominant_justifications);
    filter.any_label("npa", &criteria.npa_values);
    filter.any_label("status", &criteria.status_values);

    let from_date = criteria.from_date.as_deref().filter(|d| !d.trim().is_empty());
    let to_date = criteria.to_date.as_deref().filter(|d| !d.trim().is_empty());
    if from_date.is_some() || to_date.is_some() {
        let lower = start_of_day(parse_date(from_date.unwrap_or(SEARCH_DATE_FLOOR))?);
        let upper = match to_date {
            Some(raw) => start_of_day(next_day(parse_date(raw)?)),
            None => now,
        };
        filter.push(
            "created_at_us BETWEEN ? AND ?",
            [
                Value::Integer(timestamp_to_micros(lower)),
                Value::Integer(timestamp_to_micros(upper)),
            ],
        );
    }

    if let Some(user) = criteria.user.as_deref().filter(|u| !u.is_empty()) {
        filter.contains_folded("owner_folded", user);
    }

    Ok(Some(filter))
}

// ============================================================================
// SEARCH SERVICE
// ============================================================================

/// Executes document searches.
#[derive(Clone, Debug)]
pub struct SearchService {
    cfg: Arc<CoreConfig>,
}

impl SearchService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Whether search responses are paginated under the current configuration.
    pub fn pagination_enabled(&self) -> bool {
        self.cfg.pagination().enabled()
    }

    /// Effective page size for a request: the default when absent or zero, clamped to the
    /// configured maximum.
    pub fn effective_page_size(&self, requested: Option<u32>) -> u32 {
        let pagination = self.cfg.pagination();
        match requested {
            Some(size) if size > 0 => size.min(pagination.max_page_size()),
            _ => pagination.default_page_size(),
        }
    }

    /// Runs a search. With `page == None` the whole filtered set is returned.
    ///
    /// Results are ordered newest first, ties broken by descending id.
    ///
    /// # Errors
    ///
    /// - `CoreError::InvalidDate` for a malformed date bound
    /// - `CoreError::InvalidPage` when the page lies beyond the last page (page 1 never does)
    /// - `CoreError::Storage` on database failure
    pub fn search(
        &self,
        criteria: &SearchCriteria,
        page: Option<PageRequest>,
    ) -> CoreResult<SearchPage> {
        let Some(filter) = build_filter(criteria, Utc::now())? else {
            return self.paginate_empty(page);
        };

        let mut conn = connect(&self.cfg)?;
        let tx = conn.transaction()?;
        let where_sql = filter.where_sql();

        let total: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM documents{where_sql}"),
            params_from_iter(filter.values.iter()),
            |row| row.get(0),
        )?;
        let total = total.max(0) as u64;

        let result = match page {
            None => {
                let items = select_documents(&tx, &where_sql, &filter.values, None)?;
                SearchPage {
                    items,
                    total,
                    page: None,
                }
            }
            Some(request) => {
                let info = self.page_info(request, total)?;
                let offset = u64::from(info.number - 1) * u64::from(info.page_size);
                let items = select_documents(
                    &tx,
                    &where_sql,
                    &filter.values,
                    Some((info.page_size, offset)),
                )?;
                SearchPage {
                    items,
                    total,
                    page: Some(info),
                }
            }
        };
        tx.commit()?;

        tracing::debug!(
            total = result.total,
            returned = result.items.len(),
            "document search"
        );
        Ok(result)
    }

    fn paginate_empty(&self, page: Option<PageRequest>) -> CoreResult<SearchPage> {
        let page = match page {
            Some(request) => Some(self.page_info(request, 0)?),
            None => None,
        };
        Ok(SearchPage {
            items: Vec::new(),
            total: 0,
            page,
        })
    }

    fn page_info(&self, request: PageRequest, total: u64) -> CoreResult<PageInfo> {
        let page_size = self.effective_page_size(request.page_size);
        let num_pages = total.div_ceil(u64::from(page_size)).max(1);
        let num_pages = u32::try_from(num_pages).unwrap_or(u32::MAX);

        if request.page == 0 || request.page > num_pages {
            return Err(CoreError::InvalidPage(request.page));
        }
        Ok(PageInfo {
            number: request.page,
            page_size,
            num_pages,
        })
    }
}

fn select_documents(
    conn: &Connection,
    where_sql: &str,
    values: &[Value],
    window: Option<(u32, u64)>,
) -> CoreResult<Vec<Document>> {
    let mut sql = format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents{where_sql} ORDER BY created_at_us DESC, id DESC"
    );
    let mut bound: Vec<Value> = values.to_vec();
    if let Some((limit, offset)) = window {
        sql.push_str(" LIMIT ? OFFSET ?");
        bound.push(Value::Integer(i64::from(limit)));
        bound.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bound.iter()), document_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::{MutationGuard, PendingDocument};
    use crate::labels::{DocumentStatus, LawType};
    use crate::scoring::JustificationPoints;
    use crate::store::test_support::test_cfg;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Seed<'a> {
        owner: &'a str,
        title: &'a str,
        text: &'a str,
        law_type: LawType,
        status: DocumentStatus,
        created_at: DateTime<Utc>,
    }

    impl Default for Seed<'_> {
        fn default() -> Self {
            Self {
                owner: "editor",
                title: "Документ",
                text: "текст",
                law_type: LawType::Unchecked,
                status: DocumentStatus::Unmarked,
                created_at: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
            }
        }
    }

    fn seed(cfg: &CoreConfig, seed: Seed<'_>) -> DocumentId {
        let mut conn = connect(cfg).expect("connect should succeed");
        let tx = conn.transaction().expect("transaction should open");
        let outcome = MutationGuard::save(
            &tx,
            PendingDocument {
                id: None,
                owner: seed.owner.into(),
                title: seed.title.into(),
                text: seed.text.into(),
                created_at: seed.created_at,
                points: JustificationPoints::default(),
                law_type: seed.law_type,
                npa: "NOTSELECTED".into(),
                status: seed.status,
            },
        )
        .expect("seed save should succeed");
        tx.commit().expect("commit should succeed");
        outcome.document.id
    }

    fn ids(page: &SearchPage) -> Vec<DocumentId> {
        page.items.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_search_mode_from_param() {
        assert_eq!(SearchMode::from_param(None), SearchMode::Title);
        assert_eq!(SearchMode::from_param(Some("text")), SearchMode::Text);
        assert_eq!(SearchMode::from_param(Some("id")), SearchMode::Id);
        assert_eq!(SearchMode::from_param(Some("TEXT")), SearchMode::Title);
        assert_eq!(SearchMode::from_param(Some("body")), SearchMode::Title);
    }

    #[test]
    fn test_parse_list_drops_empty_items() {
        assert_eq!(parse_list(Some("BAN, DUTY,,")), vec!["BAN", "DUTY"]);
        assert!(parse_list(Some("")).is_empty());
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn test_parse_date_rejects_malformed_input() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(matches!(
            parse_date("2023-02-29"),
            Err(CoreError::InvalidDate(_))
        ));
        assert!(matches!(parse_date("10.03.2024"), Err(CoreError::InvalidDate(_))));
    }

    #[test]
    fn test_id_mode_with_non_integer_query_returns_empty_page() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        seed(&cfg, Seed::default());
        let service = SearchService::new(cfg);

        let criteria = SearchCriteria {
            query: Some("abc".into()),
            mode: SearchMode::Id,
            ..Default::default()
        };
        let page = service
            .search(&criteria, Some(PageRequest::first()))
            .expect("search should succeed");
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.page.map(|p| p.num_pages), Some(1));
    }

    #[test]
    fn test_id_mode_matches_exact_id() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let _first = seed(&cfg, Seed::default());
        let second = seed(&cfg, Seed::default());
        let service = SearchService::new(cfg);

        let criteria = SearchCriteria {
            query: Some(format!(" {second} ")),
            mode: SearchMode::Id,
            ..Default::default()
        };
        let page = service.search(&criteria, None).expect("search should succeed");
        assert_eq!(ids(&page), vec![second]);
    }

    #[test]
    fn test_label_lists_or_within_and_across() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let ban_checked = seed(
            &cfg,
            Seed {
                law_type: LawType::Ban,
                status: DocumentStatus::Checked,
                ..Default::default()
            },
        );
        let duty_checked = seed(
            &cfg,
            Seed {
                law_type: LawType::Duty,
                status: DocumentStatus::Checked,
                ..Default::default()
            },
        );
        seed(
            &cfg,
            Seed {
                law_type: LawType::Ban,
                status: DocumentStatus::Marked,
                ..Default::default()
            },
        );
        seed(
            &cfg,
            Seed {
                law_type: LawType::Allow,
                status: DocumentStatus::Checked,
                ..Default::default()
            },
        );
        let service = SearchService::new(cfg);

        let criteria = SearchCriteria {
            law_types: parse_list(Some("ban,DUTY")),
            status_values: parse_list(Some("CHECKED")),
            ..Default::default()
        };
        let page = service.search(&criteria, None).expect("search should succeed");
        assert_eq!(page.total, 2);
        assert_eq!(ids(&page), vec![duty_checked, ban_checked]);
    }

    #[test]
    fn test_title_and_user_match_cyrillic_case_insensitively() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let wanted = seed(
            &cfg,
            Seed {
                owner: "Иванов",
                title: "Федеральный ЗАКОН о связи",
                ..Default::default()
            },
        );
        seed(
            &cfg,
            Seed {
                owner: "petrov",
                title: "Федеральный закон о торговле",
                ..Default::default()
            },
        );
        let service = SearchService::new(cfg);

        let by_title = SearchCriteria {
            query: Some("закон О СВЯЗИ".into()),
            ..Default::default()
        };
        assert_eq!(ids(&service.search(&by_title, None).unwrap()), vec![wanted]);

        let by_user = SearchCriteria {
            user: Some("ИВАН".into()),
            ..Default::default()
        };
        assert_eq!(ids(&service.search(&by_user, None).unwrap()), vec![wanted]);
    }

    #[test]
    fn test_text_mode_searches_body() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let wanted = seed(
            &cfg,
            Seed {
                text: "Запрещается курение в общественных местах",
                ..Default::default()
            },
        );
        seed(&cfg, Seed::default());
        let service = SearchService::new(cfg);

        let criteria = SearchCriteria {
            query: Some("КУРЕНИЕ".into()),
            mode: SearchMode::Text,
            ..Default::default()
        };
        assert_eq!(ids(&service.search(&criteria, None).unwrap()), vec![wanted]);
    }

    #[test]
    fn test_date_range_includes_whole_to_day() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 5, d, h, 0, 0).unwrap();
        seed(&cfg, Seed { created_at: at(9, 23), ..Default::default() });
        let start = seed(&cfg, Seed { created_at: at(10, 1), ..Default::default() });
        let late = seed(&cfg, Seed { created_at: at(12, 23), ..Default::default() });
        seed(&cfg, Seed { created_at: at(14, 1), ..Default::default() });
        let service = SearchService::new(cfg);

        let criteria = SearchCriteria {
            from_date: Some("2024-05-10".into()),
            to_date: Some("2024-05-12".into()),
            ..Default::default()
        };
        assert_eq!(
            ids(&service.search(&criteria, None).unwrap()),
            vec![late, start]
        );

        let only_to = SearchCriteria {
            to_date: Some("2024-05-09".into()),
            ..Default::default()
        };
        assert_eq!(service.search(&only_to, None).unwrap().total, 1);

        let malformed = SearchCriteria {
            from_date: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.search(&malformed, None),
            Err(CoreError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_total_is_independent_of_pagination() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut created = Vec::new();
        for i in 0..7 {
            created.push(seed(
                &cfg,
                Seed {
                    created_at: base + chrono::Duration::minutes(i),
                    ..Default::default()
                },
            ));
        }
        let service = SearchService::new(cfg);
        let criteria = SearchCriteria::default();

        let first = service
            .search(&criteria, Some(PageRequest::new(1, Some(3))))
            .unwrap();
        let last = service
            .search(&criteria, Some(PageRequest::new(3, Some(3))))
            .unwrap();
        let unpaged = service.search(&criteria, None).unwrap();

        assert_eq!(first.total, 7);
        assert_eq!(last.total, 7);
        assert_eq!(unpaged.total, 7);

        let info = first.page.unwrap();
        assert_eq!(info.num_pages, 3);
        assert_eq!((info.previous(), info.next()), (None, Some(2)));
        assert_eq!(ids(&first), vec![created[6], created[5], created[4]]);
        assert_eq!(ids(&last), vec![created[0]]);
        assert_eq!(last.page.unwrap().next(), None);
    }

    #[test]
    fn test_page_beyond_last_is_invalid() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        seed(&cfg, Seed::default());
        let service = SearchService::new(cfg);
        let criteria = SearchCriteria::default();

        assert!(matches!(
            service.search(&criteria, Some(PageRequest::new(2, None))),
            Err(CoreError::InvalidPage(2))
        ));
        assert!(matches!(
            service.search(&criteria, Some(PageRequest::new(0, None))),
            Err(CoreError::InvalidPage(0))
        ));

        let nothing = SearchCriteria {
            query: Some("нет такого".into()),
            ..Default::default()
        };
        let page = service
            .search(&nothing, Some(PageRequest::first()))
            .expect("page 1 of an empty result should succeed");
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_page_size_clamped_to_configured_maximum() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&temp_dir);
        let service = SearchService::new(cfg);

        assert_eq!(service.effective_page_size(None), 25);
        assert_eq!(service.effective_page_size(Some(0)), 25);
        assert_eq!(service.effective_page_size(Some(40)), 40);
        assert_eq!(service.effective_page_size(Some(10_000)), 100);
    }
}
