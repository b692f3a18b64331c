use crate::config::AppConfig;
use crate::locale::Strings;
use crate::projection::Projection;
use crate::table::{TablePage, TableQuery, SortOrder};
use crate::types::{Dataset, Municipality};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Path as SvgPath, Text as SvgText};
use tracing::info;

/// Render the choropleth: one filled, stroked path per municipality in
/// input order, fill taken from the score color table.
pub fn render_map(config: &AppConfig, municipalities: &[Municipality]) -> Document {
    let map = &config.map;
    let mut document = Document::new()
        .set("width", map.width)
        .set("height", map.height)
        .set("viewBox", (0.0, 0.0, map.width, map.height));

    if municipalities.is_empty() {
        // A visible empty state instead of a blank canvas.
        let notice = SvgText::new(crate::locale::SV.empty_map)
            .set("x", map.width / 2.0)
            .set("y", map.height / 2.0)
            .set("text-anchor", "middle")
            .set("font-size", "20px")
            .set("fill", "#555555");
        return document.add(notice);
    }

    let projection = Projection::from_config(map);
    let screen: Vec<geo::MultiPolygon<f64>> = municipalities
        .par_iter()
        .map(|m| projection.project_multi_polygon(&m.geometry))
        .collect();

    for (index, (municipality, geometry)) in municipalities.iter().zip(&screen).enumerate() {
        let path = SvgPath::new()
            .set("d", region_path(geometry))
            .set("fill", map.colors.fill(municipality.score))
            .set("stroke", map.stroke.as_str())
            .set("stroke-width", map.stroke_width)
            .set("data-kommun", index);
        document = document.add(path);
    }

    document
}

/// Path data for one screen-space region: every ring becomes a closed
/// subpath.
fn region_path(geometry: &geo::MultiPolygon<f64>) -> Data {
    let mut data = Data::new();
    for polygon in &geometry.0 {
        data = ring_path(data, polygon.exterior());
        for interior in polygon.interiors() {
            data = ring_path(data, interior);
        }
    }
    data
}

fn ring_path(mut data: Data, ring: &geo::LineString<f64>) -> Data {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else {
        return data;
    };
    data = data.move_to((round(first.x), round(first.y)));
    for coord in coords {
        data = data.line_to((round(coord.x), round(coord.y)));
    }
    data.close()
}

// Two decimals keep the SVG compact without visible error at screen scale.
fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The full page: map, tooltip element and the table with its controls.
pub fn render_page(
    config: &AppConfig,
    dataset: &Dataset,
    page: &TablePage<'_>,
    query: &TableQuery,
    strings: &Strings,
) -> String {
    let map_svg = render_map(config, &dataset.municipalities).to_string();
    let table_html = render_table(dataset, page, query, strings);

    format!(
        r#"<!DOCTYPE html>
<html lang="sv">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<div id="vis">
{map_svg}
<div id="tooltip" class="hidden">
  <p><strong id="kommun"></strong></p>
  <p id="description"></p>
</div>
</div>
{table_html}
</body>
</html>
"#,
        title = html_escape(strings.title),
        css = PAGE_CSS,
        map_svg = map_svg,
        table_html = table_html,
    )
}

fn render_table(
    dataset: &Dataset,
    page: &TablePage<'_>,
    query: &TableQuery,
    strings: &Strings,
) -> String {
    let mut html = String::new();

    let search = query.q.as_deref().unwrap_or("");
    html.push_str(&format!(
        r#"<form method="get" class="table-controls">
<label>{label} <input type="search" name="q" value="{value}"></label>
<label>{length_label}</label>
<button type="submit">{search_button}</button>
</form>
"#,
        label = html_escape(strings.search),
        value = html_escape(search),
        length_label = strings.length_menu_label(&length_select(page.page_length)),
        search_button = html_escape(strings.search.trim_end_matches(':')),
    ));

    html.push_str("<table class=\"datatable\">\n<thead>\n<tr>");
    let mut columns: Vec<&str> = vec![strings.column_name, strings.column_score];
    columns.extend(dataset.columns.iter().map(String::as_str));
    for (index, column) in columns.iter().enumerate() {
        html.push_str(&sort_header(index, column, query, strings));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    if page.rows.is_empty() {
        html.push_str(&format!(
            "<tr><td colspan=\"{}\" class=\"dataTables_empty\">{}</td></tr>\n",
            columns.len(),
            html_escape(strings.zero_records)
        ));
    } else {
        for (index, municipality) in &page.rows {
            html.push_str(&row_html(*index, municipality));
        }
    }
    html.push_str("</tbody>\n</table>\n");

    let filtered_from = page.is_filtered().then_some(page.total);
    html.push_str(&format!(
        "<p class=\"table-info\">{}</p>\n",
        html_escape(&strings.info_line(page.start, page.end, page.filtered, filtered_from))
    ));
    html.push_str(&pagination_html(page, query, strings));
    html
}

fn row_html(index: usize, municipality: &Municipality) -> String {
    let score = municipality
        .score
        .map_or(crate::locale::SV.score_unknown, |s| s.label());
    let mut row = format!(
        "<tr><td><a href=\"/kommun/{index}\">{name}</a></td><td>{score}</td>",
        index = index,
        name = html_escape(&municipality.name),
        score = score,
    );
    for cell in &municipality.details {
        row.push_str(&format!("<td>{}</td>", html_escape(cell)));
    }
    row.push_str("</tr>\n");
    row
}

fn sort_header(index: usize, column: &str, query: &TableQuery, strings: &Strings) -> String {
    // Clicking a sorted column flips its direction.
    let currently_ascending =
        query.sort == Some(index) && !matches!(query.dir, Some(SortOrder::Desc));
    let (dir, hint) = if currently_ascending {
        ("desc", strings.sort_descending)
    } else {
        ("asc", strings.sort_ascending)
    };
    let q = query.q.as_deref().unwrap_or("");
    format!(
        "<th><a href=\"?{}\" title=\"{}\">{}</a></th>",
        query_string(q, Some((index, dir)), 1, query.len),
        html_escape(hint),
        html_escape(column),
    )
}

fn pagination_html(page: &TablePage<'_>, query: &TableQuery, strings: &Strings) -> String {
    let q = query.q.as_deref().unwrap_or("");
    let sort = current_sort(query);
    let link = |target: usize, label: &str, enabled: bool| {
        if enabled {
            format!(
                "<a href=\"?{}\">{}</a>",
                query_string(q, sort, target, query.len),
                html_escape(label)
            )
        } else {
            format!("<span class=\"disabled\">{}</span>", html_escape(label))
        }
    };

    format!(
        "<nav class=\"pagination\">{} {} <span>{}/{}</span> {} {}</nav>\n",
        link(1, strings.paginate_first, page.page > 1),
        link(page.page.saturating_sub(1).max(1), strings.paginate_previous, page.page > 1),
        page.page,
        page.page_count,
        link(
            (page.page + 1).min(page.page_count),
            strings.paginate_next,
            page.page < page.page_count
        ),
        link(page.page_count, strings.paginate_last, page.page < page.page_count),
    )
}

fn current_sort(query: &TableQuery) -> Option<(usize, &'static str)> {
    query.sort.map(|column| {
        let dir = if matches!(query.dir, Some(SortOrder::Desc)) { "desc" } else { "asc" };
        (column, dir)
    })
}

fn query_string(
    q: &str,
    sort: Option<(usize, &str)>,
    page: usize,
    len: Option<usize>,
) -> String {
    let mut parts = Vec::new();
    if !q.is_empty() {
        parts.push(format!("q={}", url_encode(q)));
    }
    if let Some((column, dir)) = sort {
        parts.push(format!("sort={}&dir={}", column, dir));
    }
    parts.push(format!("page={}", page));
    if let Some(len) = len {
        parts.push(format!("len={}", len));
    }
    parts.join("&")
}

fn length_select(page_length: usize) -> String {
    let mut select = String::from("<select name=\"len\">");
    for choice in [10, 25, 50, 100] {
        let selected = if choice == page_length { " selected" } else { "" };
        select.push_str(&format!(
            "<option value=\"{choice}\"{selected}>{choice}</option>"
        ));
    }
    select.push_str("</select>");
    select
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn url_encode(s: &str) -> String {
    let mut encoded = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

const PAGE_CSS: &str = r#"
body { font-family: sans-serif; margin: 1em; }
#vis { position: relative; float: right; }
#tooltip { position: absolute; padding: 0.5em; background: #ffffff; border: 1px solid #333333; pointer-events: none; }
#tooltip p { margin: 0; }
.hidden { display: none; }
.datatable { border-collapse: collapse; }
.datatable th { position: sticky; top: 0; background: #ffffff; text-align: left; padding: 0.3em 0.8em; }
.datatable td { padding: 0.3em 0.8em; border-top: 1px solid #dddddd; }
.pagination .disabled { color: #999999; }
"#;

/// Write `map.svg` and `index.html` into the output directory.
pub fn generate_site(config: &AppConfig, dataset: &Dataset) -> Result<()> {
    fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create output directory: {:?}", config.output.dir))?;

    let map_path = config.output.dir.join("map.svg");
    let document = render_map(config, &dataset.municipalities);
    svg::save(&map_path, &document)
        .with_context(|| format!("Failed to write {:?}", map_path))?;
    info!("Wrote {:?}", map_path);

    let query = TableQuery::default();
    let page = crate::table::run_query(&dataset.municipalities, &query, config.table.page_length);
    let html = render_page(config, dataset, &page, &query, &crate::locale::SV);
    let index_path = config.output.dir.join("index.html");
    fs::write(&index_path, html)
        .with_context(|| format!("Failed to write {:?}", index_path))?;
    info!("Wrote {:?}", index_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Score;
    use geo::{polygon, MultiPolygon};

    fn test_config() -> AppConfig {
        let toml_str = r#"
            [input]
            geojson = "kommuner.geojson"
            name_property = "KNNAMN"
            score_property = "kommuner_betyg_score"
            url_property = "kommuner_betyg_site_url"

            [map]
            width = 600.0
            height = 1000.0
            rotate = [0.0, 0.0, 0.0]
            translate = [300.0, 500.0]
            scale = 100.0

            [navigation]
            base_url = "https://dataskydd.net/kommuner/kommun"

            [output]
            dir = "site"

            [server]
            port = 8080
        "#;
        toml::from_str(toml_str).unwrap()
    }

    fn municipality(name: &str, score: Option<Score>) -> Municipality {
        Municipality {
            name: name.to_string(),
            score,
            site_url: format!("https://www.{}.se", name.to_lowercase()),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 10.0, y: 58.0),
                (x: 11.0, y: 58.0),
                (x: 11.0, y: 59.0),
                (x: 10.0, y: 59.0),
            ]]),
            details: Vec::new(),
        }
    }

    #[test]
    fn map_has_one_path_per_municipality_with_score_fill() {
        let config = test_config();
        let municipalities = vec![
            municipality("Ale", Some(Score::A)),
            municipality("Boden", None),
        ];
        let rendered = render_map(&config, &municipalities).to_string();
        assert_eq!(rendered.matches("<path").count(), 2);
        assert!(rendered.contains("fill=\"#1ac81a\""));
        assert!(rendered.contains("fill=\"#8f8f8f\""));
        assert!(rendered.contains("stroke=\"black\""));
        assert!(rendered.contains("data-kommun=\"1\""));
    }

    #[test]
    fn empty_dataset_renders_a_visible_notice() {
        let config = test_config();
        let rendered = render_map(&config, &[]).to_string();
        assert!(!rendered.contains("<path"));
        assert!(rendered.contains("Ingen kartdata tillgänglig"));
    }

    #[test]
    fn page_contains_tooltip_element_and_table() {
        let config = test_config();
        let dataset = Dataset {
            columns: Vec::new(),
            municipalities: vec![municipality("Ale", Some(Score::B))],
        };
        let query = TableQuery::default();
        let page = crate::table::run_query(&dataset.municipalities, &query, 25);
        let html = render_page(&config, &dataset, &page, &query, &crate::locale::SV);

        assert!(html.contains("id=\"tooltip\""));
        assert!(html.contains("id=\"kommun\""));
        assert!(html.contains("id=\"description\""));
        assert!(html.contains("class=\"datatable\""));
        assert!(html.contains("Visar 1 till 1 av 1 kommuner"));
        assert!(html.contains("/kommun/0"));
    }

    #[test]
    fn zero_results_show_the_localized_message() {
        let config = test_config();
        let dataset = Dataset {
            columns: Vec::new(),
            municipalities: vec![municipality("Ale", Some(Score::B))],
        };
        let query = TableQuery { q: Some("zzz".to_string()), ..TableQuery::default() };
        let page = crate::table::run_query(&dataset.municipalities, &query, 25);
        let html = render_page(&config, &dataset, &page, &query, &crate::locale::SV);

        assert!(html.contains("Inga matchande kommuner hittades"));
        assert!(html.contains("Visar 0 till 0 av 0 kommuner"));
    }

    #[test]
    fn names_are_html_escaped() {
        let config = test_config();
        let dataset = Dataset {
            columns: Vec::new(),
            municipalities: vec![municipality("<script>alert(1)</script>", None)],
        };
        let query = TableQuery::default();
        let page = crate::table::run_query(&dataset.municipalities, &query, 25);
        let html = render_page(&config, &dataset, &page, &query, &crate::locale::SV);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn region_path_closes_every_ring() {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
        ]]);
        let rendered = SvgPath::new().set("d", region_path(&geometry)).to_string();
        // One closed subpath.
        assert_eq!(rendered.matches('M').count(), 1);
        assert!(rendered.to_lowercase().contains('z'));
    }
}
