use crate::config::{AppConfig, InputConfig};
use crate::types::{Dataset, Municipality, Score};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::GeoJson;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

pub fn load_dataset(config: &AppConfig) -> Result<Dataset> {
    info!("Loading municipality data...");

    let (columns, detail_rows) = match &config.input.results_csv {
        Some(path) => load_results_csv(path, &config.input.join_column)?,
        None => (Vec::new(), HashMap::new()),
    };
    if !columns.is_empty() {
        info!("Loaded result details for {} municipalities", detail_rows.len());
    }

    let file = File::open(&config.input.geojson)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", config.input.geojson))?;
    let reader = BufReader::new(file);
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let municipalities =
        municipalities_from_geojson(geojson, &config.input, &columns, &detail_rows)?;
    info!("Loaded {} municipalities", municipalities.len());

    Ok(Dataset { columns, municipalities })
}

fn municipalities_from_geojson(
    geojson: GeoJson,
    input: &InputConfig,
    columns: &[String],
    detail_rows: &HashMap<String, Vec<String>>,
) -> Result<Vec<Municipality>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut municipalities = Vec::new();

    for feature in collection.features {
        let name_value = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(&input.name_property));

        let name = match name_value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                warn!("Skipping feature without property '{}'", input.name_property);
                continue;
            }
        };

        let score = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(&input.score_property))
            .and_then(|value| value.as_str())
            .and_then(Score::parse);

        let site_url = feature
            .properties
            .as_ref()
            .and_then(|props| props.get(&input.url_property))
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();

        let geometry = match feature.geometry {
            Some(geometry) => {
                let converted: geo::Geometry<f64> = geometry
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry for '{}': {:?}", name, e))?;
                match converted {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        warn!("Skipping non-polygon feature '{}'", name);
                        continue;
                    }
                }
            }
            None => {
                warn!("Skipping feature '{}' without geometry", name);
                continue;
            }
        };

        let details = detail_rows
            .get(&name)
            .cloned()
            .unwrap_or_else(|| vec![String::new(); columns.len()]);

        municipalities.push(Municipality {
            name,
            score,
            site_url,
            geometry,
            details,
        });
    }

    Ok(municipalities)
}

/// Extra table columns joined on municipality name. The header row names
/// the columns; the join column itself is not repeated.
fn load_results_csv(
    path: &Path,
    join_column: &str,
) -> Result<(Vec<String>, HashMap<String, Vec<String>>)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open results CSV: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let join_idx = headers
        .iter()
        .position(|h| h == join_column)
        .ok_or_else(|| anyhow!("Join column '{}' not found in results CSV", join_column))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != join_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows = HashMap::new();
    for result in rdr.records() {
        let record = result?;
        let id = record.get(join_idx).unwrap_or("").trim().to_string();
        if id.is_empty() {
            continue;
        }
        let values: Vec<String> = record
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != join_idx)
            .map(|(_, v)| v.to_string())
            .collect();
        rows.insert(id, values);
    }

    Ok((columns, rows))
}
