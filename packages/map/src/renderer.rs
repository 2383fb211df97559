//! Turns the risk snapshot into what the surface displays: one style per
//! department, the legend, and the info panel.
//!
//! Departments without a record, or without a value for the selected
//! dimension, are colored as zero risk.

use std::fmt;

use wearisk_risk_models::{RiskSeverity, RiskType};

use crate::color_scale::{ColorScale, Rgb};
use crate::region::Region;
use crate::store::RiskDataStore;
use crate::surface::MapSurface;

/// Placeholder shown when no department is hovered.
pub const PLACEHOLDER_TEXT: &str = "Survolez un département";

/// Note appended to the info panel when data is simulated.
pub const SIMULATED_NOTE: &str = "Données simulées";

/// Shown instead of a value when a metric is absent.
pub const MISSING_VALUE: &str = "N/A";

/// Fill and stroke of one department.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionStyle {
    /// Fill color from the color scale.
    pub fill_color: Rgb,
    /// Border width in pixels.
    pub weight: u8,
    /// Border opacity.
    pub opacity: f64,
    /// Border color.
    pub color: Rgb,
    /// Border dash pattern, if dashed.
    pub dash_array: Option<&'static str>,
    /// Fill opacity.
    pub fill_opacity: f64,
}

impl RegionStyle {
    /// Resting style.
    #[must_use]
    pub const fn base(fill_color: Rgb) -> Self {
        Self {
            fill_color,
            weight: 1,
            opacity: 1.0,
            color: Rgb::new(0xff, 0xff, 0xff),
            dash_array: Some("3"),
            fill_opacity: 0.7,
        }
    }

    /// Hover style.
    #[must_use]
    pub const fn highlighted(fill_color: Rgb) -> Self {
        Self {
            fill_color,
            weight: 3,
            opacity: 1.0,
            color: Rgb::new(0x66, 0x66, 0x66),
            dash_array: None,
            fill_opacity: 0.8,
        }
    }

    /// Whether this is the hover style.
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        self.weight > 1
    }
}

/// One metric line of the info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    /// Dimension shown on this line.
    pub risk_type: RiskType,
    /// Formatted value (`"85.0%"`) or [`MISSING_VALUE`].
    pub text: String,
    /// Severity class of the value.
    pub severity: RiskSeverity,
}

/// Content of the info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoPanel {
    /// No department hovered.
    Placeholder,
    /// A hovered department.
    Region {
        /// Department name.
        name: String,
        /// One line per dimension.
        lines: Vec<InfoLine>,
        /// Whether to show the simulated data note.
        simulated: bool,
    },
}

impl InfoPanel {
    /// Finds the line for a dimension.
    #[must_use]
    pub fn line(&self, risk_type: RiskType) -> Option<&InfoLine> {
        match self {
            Self::Placeholder => None,
            Self::Region { lines, .. } => lines.iter().find(|l| l.risk_type == risk_type),
        }
    }
}

impl fmt::Display for InfoPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Placeholder => f.write_str(PLACEHOLDER_TEXT),
            Self::Region {
                name,
                lines,
                simulated,
            } => {
                writeln!(f, "{name}")?;
                for line in lines {
                    writeln!(
                        f,
                        "  {}: {} ({})",
                        line.risk_type.panel_label(),
                        line.text,
                        line.severity
                    )?;
                }
                if *simulated {
                    writeln!(f, "  {SIMULATED_NOTE}")?;
                }
                Ok(())
            }
        }
    }
}

/// One legend row.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendRow {
    /// Swatch color.
    pub color: Rgb,
    /// Lower bound of the bucket.
    pub from: f64,
    /// Upper bound of the bucket; `None` for the top bucket.
    pub to: Option<f64>,
}

impl LegendRow {
    /// Range label: `"10–30%"`, or `"90%+"` for the top bucket.
    #[must_use]
    pub fn label(&self) -> String {
        self.to.map_or_else(
            || format!("{}%+", self.from),
            |to| format!("{}–{to}%", self.from),
        )
    }
}

/// Legend for the selected dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    /// Dimension the legend describes.
    pub risk_type: RiskType,
    /// One row per bucket, lowest first.
    pub rows: Vec<LegendRow>,
}

impl Legend {
    /// Header text.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.risk_type.label()
    }
}

impl fmt::Display for Legend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title())?;
        for row in &self.rows {
            writeln!(f, "  {} {}", row.color, row.label())?;
        }
        Ok(())
    }
}

/// Builds styles, legend, and info panel from the store.
#[derive(Debug, Clone, Default)]
pub struct MapRenderer {
    scale: ColorScale,
}

impl MapRenderer {
    /// Creates a renderer with the given scale.
    #[must_use]
    pub const fn new(scale: ColorScale) -> Self {
        Self { scale }
    }

    /// The color scale.
    #[must_use]
    pub const fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// Value used for coloring: the selected metric, or 0 when absent.
    #[must_use]
    pub fn display_value(store: &RiskDataStore, code: &str) -> f64 {
        let risk_type = store.selection().risk_type;
        store
            .lookup(code)
            .and_then(|record| record.value(risk_type))
            .unwrap_or(0.0)
    }

    /// Resting style of a department.
    #[must_use]
    pub fn region_style(&self, store: &RiskDataStore, code: &str) -> RegionStyle {
        RegionStyle::base(self.scale.color_for(Self::display_value(store, code)))
    }

    /// Hover style of a department.
    #[must_use]
    pub fn highlight_style(&self, store: &RiskDataStore, code: &str) -> RegionStyle {
        RegionStyle::highlighted(self.scale.color_for(Self::display_value(store, code)))
    }

    /// Info panel for a hovered department, or the placeholder.
    #[must_use]
    pub fn info_panel(&self, store: &RiskDataStore, region: Option<&Region>) -> InfoPanel {
        let Some(region) = region else {
            return InfoPanel::Placeholder;
        };
        let record = store.lookup(&region.code);

        let lines = RiskType::panel_order()
            .iter()
            .map(|&risk_type| {
                let value = record.and_then(|r| r.value(risk_type));
                InfoLine {
                    risk_type,
                    text: value.map_or_else(|| MISSING_VALUE.to_string(), |v| format!("{v:.1}%")),
                    severity: RiskSeverity::classify(value),
                }
            })
            .collect();

        InfoPanel::Region {
            name: region.name.clone(),
            lines,
            simulated: store.is_simulated(),
        }
    }

    /// Legend for a dimension.
    #[must_use]
    pub fn legend(&self, risk_type: RiskType) -> Legend {
        Legend {
            risk_type,
            rows: self
                .scale
                .buckets()
                .map(|(from, to, color)| LegendRow { color, from, to })
                .collect(),
        }
    }

    /// Full re-render: every department's style, a rebuilt legend, and a
    /// rebuilt info panel (for `hovered`, if any).
    pub fn render_all<S: MapSurface + ?Sized>(
        &self,
        store: &RiskDataStore,
        regions: &[Region],
        hovered: Option<&Region>,
        surface: &mut S,
    ) {
        for region in regions {
            let style = if hovered.is_some_and(|h| h.code == region.code) {
                self.highlight_style(store, &region.code)
            } else {
                self.region_style(store, &region.code)
            };
            surface.render_region_style(region, &style);
        }
        surface.render_legend(&self.legend(store.selection().risk_type));
        surface.render_info_panel(&self.info_panel(store, hovered));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_scale::RISK_COLORS;
    use crate::test_support::{record, region};
    use wearisk_risk_models::{RiskRecord, TimestampSelection};

    fn store_with(records: Vec<RiskRecord>, simulated: bool) -> RiskDataStore {
        let mut store = RiskDataStore::new();
        store.replace_records(records, simulated);
        store
    }

    #[test]
    fn missing_record_renders_as_zero() {
        let renderer = MapRenderer::default();
        let store = store_with(vec![record("01", 85.0)], false);
        assert_eq!(
            renderer.region_style(&store, "01").fill_color,
            RISK_COLORS[4]
        );
        assert_eq!(
            renderer.region_style(&store, "02").fill_color,
            RISK_COLORS[0]
        );
    }

    #[test]
    fn missing_field_for_selected_type_renders_as_zero() {
        let renderer = MapRenderer::default();
        let mut store = store_with(vec![record("01", 85.0)], false);
        store.set_selection(RiskType::Heat, TimestampSelection::Latest);
        assert!((MapRenderer::display_value(&store, "01")).abs() < f64::EPSILON);
        assert_eq!(
            renderer.region_style(&store, "01").fill_color,
            renderer.scale().lowest()
        );
    }

    #[test]
    fn base_and_highlight_styles_differ_in_stroke_only() {
        let renderer = MapRenderer::default();
        let store = store_with(vec![record("01", 45.0)], false);
        let base = renderer.region_style(&store, "01");
        let hover = renderer.highlight_style(&store, "01");
        assert_eq!(base.fill_color, hover.fill_color);
        assert_eq!(base.weight, 1);
        assert_eq!(base.dash_array, Some("3"));
        assert_eq!(hover.weight, 3);
        assert_eq!(hover.color.to_string(), "#666666");
        assert!(hover.is_highlighted());
        assert!(!base.is_highlighted());
    }

    #[test]
    fn info_panel_formats_values_and_severity() {
        let renderer = MapRenderer::default();
        let mut full = record("01", 85.0);
        full.electrical_risk = Some(12.345);
        full.flood_risk = Some(30.0);
        full.heat_risk = Some(31.0);
        let store = store_with(vec![full], false);
        let ain = region("01");

        let panel = renderer.info_panel(&store, Some(&ain));
        let overall = panel.line(RiskType::Overall).unwrap();
        assert_eq!(overall.text, "85.0%");
        assert_eq!(overall.severity, RiskSeverity::High);
        assert_eq!(panel.line(RiskType::Electrical).unwrap().text, "12.3%");
        assert_eq!(
            panel.line(RiskType::Flood).unwrap().severity,
            RiskSeverity::Low
        );
        assert_eq!(
            panel.line(RiskType::Heat).unwrap().severity,
            RiskSeverity::Medium
        );
        assert_eq!(panel.line(RiskType::Wind).unwrap().text, MISSING_VALUE);

        let InfoPanel::Region {
            lines, simulated, ..
        } = panel
        else {
            panic!("expected region panel");
        };
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].risk_type, RiskType::Electrical);
        assert_eq!(lines[4].risk_type, RiskType::Overall);
        assert!(!simulated);
    }

    #[test]
    fn info_panel_without_record_shows_na_everywhere() {
        let renderer = MapRenderer::default();
        let store = store_with(vec![record("01", 85.0)], true);
        let panel = renderer.info_panel(&store, Some(&region("02")));
        for risk_type in RiskType::all() {
            let line = panel.line(*risk_type).unwrap();
            assert_eq!(line.text, MISSING_VALUE);
            assert_eq!(line.severity, RiskSeverity::Low);
        }
        assert!(matches!(panel, InfoPanel::Region { simulated: true, .. }));
        assert!(panel.to_string().contains(SIMULATED_NOTE));
    }

    #[test]
    fn info_panel_placeholder_without_hover() {
        let renderer = MapRenderer::default();
        let panel = renderer.info_panel(&RiskDataStore::new(), None);
        assert_eq!(panel, InfoPanel::Placeholder);
        assert_eq!(panel.to_string(), PLACEHOLDER_TEXT);
    }

    #[test]
    fn legend_lists_buckets_for_selected_type() {
        let legend = MapRenderer::default().legend(RiskType::Flood);
        assert_eq!(legend.title(), "Risque d'Inondation");
        let labels: Vec<String> = legend.rows.iter().map(LegendRow::label).collect();
        assert_eq!(
            labels,
            vec!["0–10%", "10–30%", "30–50%", "50–70%", "70–90%", "90%+"]
        );
        assert_eq!(legend.rows[0].color, RISK_COLORS[0]);
        assert_eq!(legend.rows[5].color, RISK_COLORS[5]);
    }
}
