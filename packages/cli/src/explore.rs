//! Interactive terminal explorer.
//!
//! Drives the map pipeline against a [`TerminalSurface`]: the menu
//! actions map onto selector changes, hover, and click.

use std::path::Path;

use dialoguer::{Confirm, Input, Select};
use wearisk_config::AppConfig;
use wearisk_map::{GeoJsonSurface, HttpRiskApi, InteractionController, MapView};
use wearisk_risk_models::{RiskType, TimestampSelection};

use crate::terminal::TerminalSurface;

const RANKING_ROWS: usize = 15;

/// Default file name of a map export.
pub const DEFAULT_EXPORT_PATH: &str = "wearisk_map.geojson";

type Controller = InteractionController<HttpRiskApi, TerminalSurface>;

enum Action {
    RiskType,
    Timestamp,
    Inspect,
    Zoom,
    Ranking,
    Export,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::RiskType,
        Self::Timestamp,
        Self::Inspect,
        Self::Zoom,
        Self::Ranking,
        Self::Export,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RiskType => "Changer le type de risque",
            Self::Timestamp => "Changer l'échéance",
            Self::Inspect => "Inspecter un département",
            Self::Zoom => "Zoomer sur un département",
            Self::Ranking => "Classement des départements",
            Self::Export => "Exporter en GeoJSON",
            Self::Quit => "Quitter",
        }
    }
}

/// Runs the explorer until the user quits.
///
/// # Errors
///
/// Returns an error if a prompt fails, the HTTP client cannot be built,
/// or an export cannot be written.
pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpRiskApi::from_config(&config.map)?;
    let surface = TerminalSurface::with_view(MapView::from(&config.map));
    let mut controller = InteractionController::new(api, surface);

    while let Err(e) = controller.initialize().await {
        log::debug!("Initial load failed: {e}");
        if !Confirm::new()
            .with_prompt("Réessayer ?")
            .default(true)
            .interact()?
        {
            return Ok(());
        }
    }

    print_ranking(&controller);

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::RiskType => {
                let risk_type = prompt_risk_type(&controller)?;
                if controller.select_risk_type(risk_type).await {
                    print_ranking(&controller);
                }
            }
            Action::Timestamp => {
                let Some(timestamp) = prompt_timestamp(&controller)? else {
                    println!("Aucune échéance disponible.");
                    continue;
                };
                if controller.select_timestamp(timestamp).await {
                    print_ranking(&controller);
                }
            }
            Action::Inspect => {
                let code = prompt_code()?;
                if !controller.on_region_hover(&code) {
                    println!("Département inconnu: {code}");
                }
            }
            Action::Zoom => {
                let code = prompt_code()?;
                if controller.on_region_activate(&code).is_none() {
                    println!("Département inconnu ou sans géométrie: {code}");
                }
            }
            Action::Ranking => print_ranking(&controller),
            Action::Export => {
                let path: String = Input::new()
                    .with_prompt("Fichier de sortie")
                    .default(DEFAULT_EXPORT_PATH.to_string())
                    .interact_text()?;
                controller.surface().recorded().write_to(Path::new(&path))?;
                println!("Carte exportée vers {path}");
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

/// Loads the map once for `risk_type` and `timestamp` and writes the
/// styled `GeoJSON` to `output`.
///
/// # Errors
///
/// Returns an error if the boundaries cannot be loaded or the file cannot
/// be written. Missing metrics fall back to simulated data.
pub async fn export(
    config: &AppConfig,
    output: &Path,
    risk_type: RiskType,
    timestamp: TimestampSelection,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpRiskApi::from_config(&config.map)?;
    let surface = GeoJsonSurface::new().with_view(MapView::from(&config.map));
    let mut controller = InteractionController::new(api, surface);

    controller.initialize().await?;
    controller.on_selection_change(risk_type, timestamp).await;

    if let Some(status) = controller.surface().status() {
        log::info!("{}", status.message);
    }
    controller.surface().write_to(output)?;
    Ok(())
}

fn print_ranking(controller: &Controller) {
    controller
        .surface()
        .print_ranking(controller.context(), RANKING_ROWS);
}

fn prompt_risk_type(controller: &Controller) -> Result<RiskType, dialoguer::Error> {
    let all = RiskType::all();
    let current = controller.context().store().selection().risk_type;
    let labels: Vec<&str> = all.iter().map(|t| t.label()).collect();

    let idx = Select::new()
        .with_prompt("Type de risque")
        .items(&labels)
        .default(all.iter().position(|t| *t == current).unwrap_or(0))
        .interact()?;
    Ok(all[idx])
}

fn prompt_timestamp(
    controller: &Controller,
) -> Result<Option<TimestampSelection>, dialoguer::Error> {
    let options = controller.surface().recorded().timestamp_options();
    if options.is_empty() {
        return Ok(None);
    }

    let current = &controller.context().store().selection().timestamp;
    let labels: Vec<String> = options
        .iter()
        .map(|o| {
            if o.selected {
                format!("{} (actuelle)", o.label)
            } else {
                o.label.clone()
            }
        })
        .collect();

    let idx = Select::new()
        .with_prompt("Échéance")
        .items(&labels)
        .default(options.iter().position(|o| &o.value == current).unwrap_or(0))
        .interact()?;
    Ok(Some(options[idx].value.clone()))
}

fn prompt_code() -> Result<String, dialoguer::Error> {
    let code: String = Input::new()
        .with_prompt("Code du département (ex. 75, 2A)")
        .interact_text()?;
    Ok(code.trim().to_uppercase())
}
