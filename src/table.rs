use std::cmp::Ordering;

use serde::Deserialize;

use crate::types::{Municipality, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters for one table view. Column 0 is the municipality
/// name, column 1 the score, columns 2.. the joined detail columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub q: Option<String>,
    pub sort: Option<usize>,
    pub dir: Option<SortOrder>,
    // 1-based page number.
    pub page: Option<usize>,
    pub len: Option<usize>,
}

#[derive(Debug)]
pub struct TablePage<'a> {
    // Rows on the current page, paired with their index in the dataset.
    pub rows: Vec<(usize, &'a Municipality)>,
    pub page: usize,
    pub page_count: usize,
    // 1-based positions of the first and last row shown; 0 when empty.
    pub start: usize,
    pub end: usize,
    pub filtered: usize,
    pub total: usize,
    pub page_length: usize,
}

impl TablePage<'_> {
    pub fn is_filtered(&self) -> bool {
        self.filtered != self.total
    }
}

/// Filter, sort and paginate the municipality list.
pub fn run_query<'a>(
    municipalities: &'a [Municipality],
    query: &TableQuery,
    default_page_length: usize,
) -> TablePage<'a> {
    let total = municipalities.len();

    let needle = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut rows: Vec<(usize, &Municipality)> = municipalities
        .iter()
        .enumerate()
        .filter(|(_, m)| needle.as_deref().is_none_or(|n| row_matches(m, n)))
        .collect();

    if let Some(column) = query.sort {
        let descending = matches!(query.dir, Some(SortOrder::Desc));
        rows.sort_by(|(_, a), (_, b)| {
            let ordering = compare_column(a, b, column);
            if descending { ordering.reverse() } else { ordering }
        });
    }

    let filtered = rows.len();
    let page_length = query.len.unwrap_or(default_page_length).max(1);
    let page_count = filtered.div_ceil(page_length).max(1);
    let page = query.page.unwrap_or(1).clamp(1, page_count);
    let offset = (page - 1) * page_length;

    let rows: Vec<(usize, &Municipality)> = rows.into_iter().skip(offset).take(page_length).collect();
    let start = if rows.is_empty() { 0 } else { offset + 1 };
    let end = offset + rows.len();

    TablePage {
        rows,
        page,
        page_count,
        start,
        end,
        filtered,
        total,
        page_length,
    }
}

/// Case-insensitive substring search over the row's visible text.
fn row_matches(municipality: &Municipality, needle: &str) -> bool {
    if municipality.name.to_lowercase().contains(needle) {
        return true;
    }
    if let Some(score) = municipality.score {
        if score.code().contains(needle) {
            return true;
        }
    }
    municipality
        .details
        .iter()
        .any(|cell| cell.to_lowercase().contains(needle))
}

fn compare_column(a: &Municipality, b: &Municipality, column: usize) -> Ordering {
    match column {
        0 => compare_names(a, b),
        1 => score_rank(a.score)
            .cmp(&score_rank(b.score))
            .then_with(|| compare_names(a, b)),
        n => {
            let index = n - 2;
            a.details
                .get(index)
                .cmp(&b.details.get(index))
                .then_with(|| compare_names(a, b))
        }
    }
}

fn compare_names(a: &Municipality, b: &Municipality) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

// Unknown scores sort after the worst grade.
fn score_rank(score: Option<Score>) -> u8 {
    match score {
        Some(Score::A) => 0,
        Some(Score::B) => 1,
        Some(Score::C) => 2,
        Some(Score::D) => 3,
        Some(Score::E) => 4,
        None => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    fn municipality(name: &str, score: Option<Score>) -> Municipality {
        Municipality {
            name: name.to_string(),
            score,
            site_url: String::new(),
            geometry: MultiPolygon::new(Vec::new()),
            details: Vec::new(),
        }
    }

    fn sixty_rows() -> Vec<Municipality> {
        (0..60)
            .map(|i| municipality(&format!("Kommun {:02}", i), Some(Score::C)))
            .collect()
    }

    #[test]
    fn sixty_rows_at_twenty_five_per_page_yield_three_pages() {
        let rows = sixty_rows();
        let first = run_query(&rows, &TableQuery::default(), 25);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.rows.len(), 25);
        assert_eq!((first.start, first.end), (1, 25));

        let last = run_query(
            &rows,
            &TableQuery { page: Some(3), ..TableQuery::default() },
            25,
        );
        assert_eq!(last.rows.len(), 10);
        assert_eq!((last.start, last.end), (51, 60));
    }

    #[test]
    fn page_number_is_clamped_to_the_valid_range() {
        let rows = sixty_rows();
        let beyond = run_query(
            &rows,
            &TableQuery { page: Some(99), ..TableQuery::default() },
            25,
        );
        assert_eq!(beyond.page, 3);
        assert_eq!(beyond.rows.len(), 10);
    }

    #[test]
    fn search_matching_one_row_keeps_exactly_one_row() {
        let mut rows = sixty_rows();
        rows.push(municipality("Ängelholm", Some(Score::B)));
        let page = run_query(
            &rows,
            &TableQuery { q: Some("ängel".to_string()), ..TableQuery::default() },
            25,
        );
        assert_eq!(page.filtered, 1);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].1.name, "Ängelholm");
        assert!(page.is_filtered());
    }

    #[test]
    fn search_with_no_match_yields_an_empty_page() {
        let rows = sixty_rows();
        let page = run_query(
            &rows,
            &TableQuery { q: Some("zzz".to_string()), ..TableQuery::default() },
            25,
        );
        assert_eq!(page.filtered, 0);
        assert!(page.rows.is_empty());
        assert_eq!((page.start, page.end), (0, 0));
    }

    #[test]
    fn blank_search_is_ignored() {
        let rows = sixty_rows();
        let page = run_query(
            &rows,
            &TableQuery { q: Some("   ".to_string()), ..TableQuery::default() },
            25,
        );
        assert_eq!(page.filtered, 60);
    }

    #[test]
    fn sorts_by_score_with_unknown_last() {
        let rows = vec![
            municipality("Alfa", None),
            municipality("Beta", Some(Score::E)),
            municipality("Gamma", Some(Score::A)),
        ];
        let page = run_query(
            &rows,
            &TableQuery { sort: Some(1), ..TableQuery::default() },
            25,
        );
        let names: Vec<&str> = page.rows.iter().map(|(_, m)| m.name.as_str()).collect();
        assert_eq!(names, ["Gamma", "Beta", "Alfa"]);
    }

    #[test]
    fn descending_sort_reverses_the_order() {
        let rows = vec![
            municipality("Alfa", Some(Score::A)),
            municipality("Beta", Some(Score::B)),
        ];
        let page = run_query(
            &rows,
            &TableQuery {
                sort: Some(0),
                dir: Some(SortOrder::Desc),
                ..TableQuery::default()
            },
            25,
        );
        let names: Vec<&str> = page.rows.iter().map(|(_, m)| m.name.as_str()).collect();
        assert_eq!(names, ["Beta", "Alfa"]);
    }

    #[test]
    fn row_indices_survive_sorting() {
        let rows = vec![
            municipality("Österåker", Some(Score::B)),
            municipality("Ale", Some(Score::A)),
        ];
        let page = run_query(
            &rows,
            &TableQuery { sort: Some(0), ..TableQuery::default() },
            25,
        );
        // "Ale" sorts first but keeps dataset index 1.
        assert_eq!(page.rows[0].0, 1);
    }
}
