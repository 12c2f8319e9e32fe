mod script;

use std::{fs, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geofield_engine::{AutocompleteField, FieldSession, GooglePlacesService, HeadlessWidget, NullPlacesService, PlacesService, StaticPlacesService};
use geofield_types::{AutocompleteOptions, Msg};
use geofield_util::{ProviderSettings, Settings, load_settings, load_settings_from_path, redact_sensitive};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geofield", version, about = "Drive a place autocomplete field from the command line")]
struct Cli {
    /// Answer lookups from a YAML/JSON fixture instead of the configured provider.
    #[arg(long, global = true, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Autocomplete options file (YAML or JSON), replacing the options from settings.
    #[arg(long, global = true, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Settings file. Defaults to GEOFIELD_SETTINGS_PATH or the user config directory.
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Mark the field as required.
    #[arg(long, global = true)]
    required: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assign TEXT to a fresh field, wait for resolution and print the final state.
    Resolve {
        text: String,
        /// Resolve through a details lookup.
        #[arg(long)]
        strict: bool,
        /// ISO 3166-1 alpha-2 country restriction.
        #[arg(long)]
        country: Option<String>,
    },
    /// Replay a script of field events and print the effect trace and final state.
    Replay { script: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", redact_sensitive(&format!("{error:#}")));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => load_settings_from_path(path)?,
        None => load_settings()?,
    };
    let places = build_places(&cli, &settings)?;
    let mut options = match &cli.options {
        Some(path) => Some(load_options(path)?),
        None => settings.options.clone(),
    };
    let required = cli.required || settings.required;

    match cli.command {
        Command::Resolve { text, strict, country } => {
            if strict || country.is_some() {
                let options = options.get_or_insert_with(AutocompleteOptions::default);
                options.strict |= strict;
                if country.is_some() {
                    options.country = country;
                }
            }
            let mut session = new_session(places, options, required);
            session.dispatch(Msg::ModelAssigned(Some(text)));
            session.settle().await;
            info!(valid = session.state().valid, "resolution settled");
            print_json(&session.state())
        }
        Command::Replay { script } => {
            let script = script::load_script(&script)?;
            let mut session = new_session(places, options, required).with_trace();
            script::run_script(&mut session, &script).await;
            print_json(&serde_json::json!({
                "trace": session.trace(),
                "state": session.state(),
            }))
        }
    }
}

fn new_session(places: Arc<dyn PlacesService>, options: Option<AutocompleteOptions>, required: bool) -> FieldSession<HeadlessWidget> {
    let field = AutocompleteField::attach(HeadlessWidget::new(), required);
    let mut session = FieldSession::new(field, places);
    session.dispatch(Msg::OptionsChanged(options));
    session
}

fn build_places(cli: &Cli, settings: &Settings) -> Result<Arc<dyn PlacesService>> {
    if let Some(path) = &cli.fixture {
        return Ok(Arc::new(StaticPlacesService::from_path(path)?));
    }
    debug!(provider = ?settings.provider, "selecting places provider");
    Ok(match &settings.provider {
        ProviderSettings::Google => Arc::new(GooglePlacesService::from_env()?),
        ProviderSettings::Fixture { path } => Arc::new(StaticPlacesService::from_path(path)?),
        ProviderSettings::Null => Arc::new(NullPlacesService),
    })
}

fn load_options(path: &std::path::Path) -> Result<AutocompleteOptions> {
    let content = fs::read_to_string(path).with_context(|| format!("read options {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parse options {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["geofield", "resolve", "10 Down", "--strict", "--country", "gb", "--fixture", "places.yaml"]).unwrap();
        assert_eq!(cli.fixture, Some(PathBuf::from("places.yaml")));
        let Command::Resolve { text, strict, country } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(text, "10 Down");
        assert!(strict);
        assert_eq!(country.as_deref(), Some("gb"));
    }

    #[test]
    fn options_file_accepts_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("options.yaml");
        fs::write(&path, "types: \"(cities)\"\ncountry: ca\nwatchEnter: true\n").unwrap();
        let options = load_options(&path).unwrap();
        assert_eq!(options.types.as_deref(), Some("(cities)"));
        assert!(options.watch_enter);
    }

    #[test]
    fn fixture_flag_overrides_settings_provider() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fixture = temp_dir.path().join("places.yaml");
        fs::write(&fixture, "predictions: {}\n").unwrap();
        let cli = Cli::try_parse_from(["geofield", "--fixture", fixture.to_str().unwrap(), "replay", "script.yaml"]).unwrap();
        let places = build_places(&cli, &Settings::default()).unwrap();
        assert!(format!("{places:?}").contains("StaticPlacesService"));
    }
}
