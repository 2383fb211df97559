//! Terminal rendering backend.
//!
//! Prints the legend, banners, and info panel as they change and keeps a
//! [`GeoJsonSurface`] underneath, so the styled map can be ranked on
//! screen or exported at any point.

use console::{Color, style};
use wearisk_map::{
    Bounds, GeoJsonSurface, InfoPanel, Legend, MapContext, MapRenderer, MapSurface, MapView,
    Region, RegionStyle, Rgb, StatusBanner, StatusLevel, TimestampOption,
};

/// [`MapSurface`] that writes to stdout.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    inner: GeoJsonSurface,
}

impl TerminalSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `view` and prints it.
    #[must_use]
    pub fn with_view(view: MapView) -> Self {
        println!(
            "{}",
            style(format!(
                "Vue initiale: {:.2},{:.2} zoom {} ({})",
                view.center[0], view.center[1], view.zoom, view.tile_attribution
            ))
            .dim()
        );
        Self {
            inner: GeoJsonSurface::new().with_view(view),
        }
    }

    /// The recorded map.
    #[must_use]
    pub const fn recorded(&self) -> &GeoJsonSurface {
        &self.inner
    }

    /// Prints the `limit` highest departments for the selected risk type.
    pub fn print_ranking(&self, context: &MapContext, limit: usize) {
        let store = context.store();
        let risk_type = store.selection().risk_type;

        let mut rows: Vec<_> = context
            .regions()
            .iter()
            .map(|region| (region, MapRenderer::display_value(store, &region.code)))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.code.cmp(&b.0.code)));

        println!();
        println!("{}", style(risk_type.label()).bold());
        for (region, value) in rows.into_iter().take(limit) {
            let swatch = self
                .inner
                .style(&region.code)
                .map_or_else(|| style("  ".to_string()), |s| swatch(s.fill_color));
            println!("  {swatch} {:>3} {:<28} {value:>6.1}%", region.code, region.name);
        }
        if store.is_simulated() {
            println!("  {}", style("Données simulées").yellow());
        }
        println!();
    }
}

impl MapSurface for TerminalSurface {
    fn render_region_style(&mut self, region: &Region, style: &RegionStyle) {
        self.inner.render_region_style(region, style);
    }

    fn render_legend(&mut self, legend: &Legend) {
        println!("{}", style(legend.title()).bold());
        for row in &legend.rows {
            println!("  {} {}", swatch(row.color), row.label());
        }
        self.inner.render_legend(legend);
    }

    fn render_info_panel(&mut self, panel: &InfoPanel) {
        match panel {
            InfoPanel::Placeholder => println!("{}", style(panel).dim()),
            InfoPanel::Region { .. } => print!("{panel}"),
        }
        self.inner.render_info_panel(panel);
    }

    fn fit_bounds(&mut self, region: &Region, bounds: &Bounds) {
        let (lon, lat) = bounds.center();
        println!(
            "Zoom sur {} ({}): {:.3},{:.3} → {:.3},{:.3}, centre {lat:.3},{lon:.3}",
            region.name, region.code, bounds.south, bounds.west, bounds.north, bounds.east
        );
        self.inner.fit_bounds(region, bounds);
    }

    fn set_loading(&mut self, loading: bool) {
        if loading && !self.inner.is_loading() {
            println!("{}", style("Chargement...").dim());
        }
        self.inner.set_loading(loading);
    }

    fn show_status(&mut self, status: &StatusBanner) {
        match status.level {
            StatusLevel::Info => println!("{}", style(&status.message).green()),
            StatusLevel::Warning => println!("{}", style(&status.message).yellow()),
        }
        self.inner.show_status(status);
    }

    fn show_load_error(&mut self, message: &str) {
        eprintln!("{}", style(message).red().bold());
        self.inner.show_load_error(message);
    }

    fn set_timestamp_options(&mut self, options: &[TimestampOption]) {
        self.inner.set_timestamp_options(options);
    }
}

fn swatch(color: Rgb) -> console::StyledObject<String> {
    style("  ".to_string()).bg(Color::Color256(ansi256(color)))
}

/// Nearest entry of the 6×6×6 color cube in the 256-color palette.
const fn ansi256(color: Rgb) -> u8 {
    #[allow(clippy::cast_possible_truncation)]
    const fn level(c: u8) -> u8 {
        // 0..=255 → 0..=5, rounded.
        ((c as u16 * 5 + 127) / 255) as u8
    }
    16 + 36 * level(color.r) + 6 * level(color.g) + level(color.b)
}
