use serde::Serialize;
use url::Url;

use crate::config::MapConfig;
use crate::locale::Strings;
use crate::types::Municipality;

/// One visual change to apply to the page. Transitions return these
/// instead of touching any element, so the hover rules can be exercised
/// without a pointer device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualUpdate {
    Recolor {
        region: usize,
        fill: String,
    },
    ShowTooltip {
        region: usize,
        name: String,
        description: String,
        x: f64,
        y: f64,
    },
    HideTooltip,
}

// The tooltip trails the pointer by a fixed vertical offset.
const TOOLTIP_OFFSET_Y: f64 = 20.0;

/// Transient hover state. At most one region is highlighted at a time;
/// the invariant is enforced here rather than assumed from single-pointer
/// input.
#[derive(Debug, Default)]
pub struct ViewState {
    hovered: Option<usize>,
}

impl ViewState {
    pub fn new() -> Self {
        ViewState { hovered: None }
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// Pointer entered (or moved within) `region` at screen position
    /// (`x`, `y`). A previously hovered region is restored before the new
    /// highlight is applied.
    pub fn pointer_enter(
        &mut self,
        region: usize,
        x: f64,
        y: f64,
        municipalities: &[Municipality],
        map: &MapConfig,
        strings: &Strings,
    ) -> Vec<VisualUpdate> {
        let Some(municipality) = municipalities.get(region) else {
            return Vec::new();
        };

        let mut updates = Vec::new();
        match self.hovered {
            Some(previous) if previous == region => {}
            Some(previous) => {
                updates.push(restore(previous, municipalities, map));
                updates.push(VisualUpdate::Recolor {
                    region,
                    fill: map.highlight.clone(),
                });
            }
            None => updates.push(VisualUpdate::Recolor {
                region,
                fill: map.highlight.clone(),
            }),
        }
        self.hovered = Some(region);

        let description = match municipality.score {
            Some(score) => format!("{}{}", strings.tooltip_score_prefix, score.label()),
            None => format!("{}{}", strings.tooltip_score_prefix, strings.score_unknown),
        };
        updates.push(VisualUpdate::ShowTooltip {
            region,
            name: municipality.name.clone(),
            description,
            x,
            y: y + TOOLTIP_OFFSET_Y,
        });
        updates
    }

    /// Pointer left the hovered region. No-op when nothing is hovered.
    pub fn pointer_leave(
        &mut self,
        municipalities: &[Municipality],
        map: &MapConfig,
    ) -> Vec<VisualUpdate> {
        let Some(previous) = self.hovered.take() else {
            return Vec::new();
        };
        vec![restore(previous, municipalities, map), VisualUpdate::HideTooltip]
    }
}

fn restore(region: usize, municipalities: &[Municipality], map: &MapConfig) -> VisualUpdate {
    let score = municipalities.get(region).and_then(|m| m.score);
    VisualUpdate::Recolor {
        region,
        fill: map.colors.fill(score).to_string(),
    }
}

/// Derive the detail-page URL for a municipality's scanned site: the URL
/// host with any leading `www.` stripped, appended to the configured base.
/// Relative, scheme-less or host-less URLs yield no navigation.
pub fn navigation_target(base_url: &str, site_url: &str) -> Option<String> {
    let parsed = Url::parse(site_url).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        return None;
    }
    Some(format!("{}/{}.html", base_url.trim_end_matches('/'), host))
}
