//! Event handling for the map: initial load, pointer events, and selector
//! changes.
//!
//! The controller owns the whole session state ([`MapContext`]) and the
//! surface, and is the only place the store is mutated.
//!
//! Every metrics request is numbered. A response is applied only if it
//! answers the most recently issued request, so a slow response to an
//! old selection can never overwrite the data for a newer one.

use rand::SeedableRng as _;
use rand::rngs::StdRng;
use wearisk_risk_models::{RiskType, TimestampSelection};

use crate::MapError;
use crate::api::{MetricsQuery, RiskApi};
use crate::loader::{DataLoader, MetricsOutcome, synthesize_records};
use crate::region::{Bounds, Region};
use crate::renderer::{InfoPanel, MapRenderer};
use crate::store::RiskDataStore;
use crate::surface::{MapSurface, StatusBanner};
use crate::timestamps::timestamp_options;

/// Session state shared by the pipeline stages.
#[derive(Debug, Default)]
pub struct MapContext {
    store: RiskDataStore,
    regions: Vec<Region>,
    renderer: MapRenderer,
}

impl MapContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new(renderer: MapRenderer) -> Self {
        Self {
            store: RiskDataStore::new(),
            regions: Vec::new(),
            renderer,
        }
    }

    /// The risk snapshot.
    #[must_use]
    pub const fn store(&self) -> &RiskDataStore {
        &self.store
    }

    /// Loaded departments, in boundary document order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Looks up a department by code.
    #[must_use]
    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.code == code)
    }

    /// The renderer.
    #[must_use]
    pub const fn renderer(&self) -> &MapRenderer {
        &self.renderer
    }
}

/// Identifies one issued metrics request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefetchTicket {
    seq: u64,
    query: MetricsQuery,
}

impl RefetchTicket {
    /// Sequence number, increasing with every issued request.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// The query to send.
    #[must_use]
    pub const fn query(&self) -> &MetricsQuery {
        &self.query
    }
}

/// Drives a [`MapSurface`] from user and network events.
pub struct InteractionController<A, S> {
    loader: DataLoader<A>,
    surface: S,
    context: MapContext,
    rng: StdRng,
    latest_request: u64,
    hovered: Option<String>,
}

impl<A: RiskApi, S: MapSurface> InteractionController<A, S> {
    /// Creates a controller. Nothing is loaded until [`Self::initialize`].
    pub fn new(api: A, surface: S) -> Self {
        Self {
            loader: DataLoader::new(api),
            surface,
            context: MapContext::default(),
            rng: StdRng::from_entropy(),
            latest_request: 0,
            hovered: None,
        }
    }

    /// Replaces the random source used for simulated data.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Session state.
    pub const fn context(&self) -> &MapContext {
        &self.context
    }

    /// The surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The loader.
    pub const fn loader(&self) -> &DataLoader<A> {
        &self.loader
    }

    /// Code of the hovered department, if any.
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Runs the full pipeline: boundaries, then metrics (or simulated
    /// data), then a full render. Calling it again is the retry action
    /// after a boundaries failure.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the boundaries cannot be loaded. The error
    /// has already been shown on the surface; nothing was rendered.
    pub async fn initialize(&mut self) -> Result<(), MapError> {
        self.surface.set_loading(true);

        let regions = match self.loader.load_regions().await {
            Ok(regions) => regions,
            Err(e) => {
                self.surface.set_loading(false);
                self.surface
                    .show_load_error(&format!("Erreur de chargement des contours: {e}"));
                return Err(e);
            }
        };

        self.context.regions = regions;
        self.hovered = None;
        self.surface.set_loading(false);

        let ticket = self.begin_refetch();
        let outcome = self.loader.load_metrics(ticket.query()).await;
        self.complete_refetch(ticket, outcome);
        Ok(())
    }

    /// Pointer entered a department. Returns `false` for unknown codes.
    pub fn on_region_hover(&mut self, code: &str) -> bool {
        if self.hovered.as_deref().is_some_and(|prev| prev != code) {
            if let Some(prev) = self.hovered.take() {
                self.on_region_leave(&prev);
            }
        }

        let Some(region) = self.context.region(code) else {
            log::debug!("Hover on unknown department {code}");
            return false;
        };

        let renderer = &self.context.renderer;
        let store = &self.context.store;
        self.surface
            .render_region_style(region, &renderer.highlight_style(store, code));
        self.surface
            .render_info_panel(&renderer.info_panel(store, Some(region)));
        self.hovered = Some(code.to_string());
        true
    }

    /// Pointer left a department. The info panel is reset only when
    /// `code` is the hovered department.
    pub fn on_region_leave(&mut self, code: &str) {
        if let Some(region) = self.context.region(code) {
            let style = self.context.renderer.region_style(&self.context.store, code);
            self.surface.render_region_style(region, &style);
        }
        if self.hovered.as_deref() == Some(code) {
            self.hovered = None;
            self.surface.render_info_panel(&InfoPanel::Placeholder);
        }
    }

    /// Department clicked: fit the viewport to it.
    pub fn on_region_activate(&mut self, code: &str) -> Option<Bounds> {
        let region = self.context.region(code)?;
        let bounds = region.bounds?;
        self.surface.fit_bounds(region, &bounds);
        Some(bounds)
    }

    /// Selector changed. Re-fetches live metrics, or re-styles simulated
    /// data, when the selection actually changed.
    ///
    /// Returns whether the selection changed.
    pub async fn on_selection_change(
        &mut self,
        risk_type: RiskType,
        timestamp: TimestampSelection,
    ) -> bool {
        if !self.context.store.set_selection(risk_type, timestamp) {
            return false;
        }

        self.surface.set_loading(true);

        if self.context.regions.is_empty() {
            log::debug!("Selection changed before boundaries were loaded");
        } else if self.context.store.is_simulated() {
            self.render();
        } else {
            let ticket = self.begin_refetch();
            let outcome = self.loader.load_metrics(ticket.query()).await;
            self.complete_refetch(ticket, outcome);
        }

        self.surface.set_loading(false);
        true
    }

    /// Changes only the risk type.
    pub async fn select_risk_type(&mut self, risk_type: RiskType) -> bool {
        let timestamp = self.context.store.selection().timestamp.clone();
        self.on_selection_change(risk_type, timestamp).await
    }

    /// Changes only the timestamp.
    pub async fn select_timestamp(&mut self, timestamp: TimestampSelection) -> bool {
        let risk_type = self.context.store.selection().risk_type;
        self.on_selection_change(risk_type, timestamp).await
    }

    /// Issues a new metrics request for the current selection. Any
    /// earlier ticket becomes stale.
    pub fn begin_refetch(&mut self) -> RefetchTicket {
        self.latest_request += 1;
        RefetchTicket {
            seq: self.latest_request,
            query: MetricsQuery::from(self.context.store.selection()),
        }
    }

    /// Applies the outcome of `ticket`'s request and re-renders, unless a
    /// newer request has been issued since.
    ///
    /// Returns whether the outcome was applied.
    pub fn complete_refetch(&mut self, ticket: RefetchTicket, outcome: MetricsOutcome) -> bool {
        if ticket.seq != self.latest_request {
            log::warn!(
                "Discarding stale metrics response #{} (latest request is #{})",
                ticket.seq,
                self.latest_request
            );
            return false;
        }

        self.apply_metrics(outcome);
        self.render();
        true
    }

    fn apply_metrics(&mut self, outcome: MetricsOutcome) {
        match outcome {
            MetricsOutcome::Live {
                records,
                timestamps,
            } => {
                self.context.store.replace_records(records, false);
                self.surface
                    .set_timestamp_options(&timestamp_options(&timestamps));
                self.context.store.set_available_timestamps(timestamps);
                self.surface.show_status(&StatusBanner::live());
            }
            MetricsOutcome::Fallback { error } => {
                let records = synthesize_records(&self.context.regions, &mut self.rng);
                log::info!("Generated simulated risk data for {} departments", records.len());
                self.context.store.replace_records(records, true);
                self.surface.show_status(&StatusBanner::simulated(&error));
            }
        }
    }

    fn render(&mut self) {
        let hovered = self
            .hovered
            .as_deref()
            .and_then(|code| self.context.region(code));
        self.context.renderer.render_all(
            &self.context.store,
            &self.context.regions,
            hovered,
            &mut self.surface,
        );
    }
}
