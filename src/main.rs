use clap::{ArgAction, Parser};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

use meteo::config::{default_user_agent, ClientConfig, DEFAULT_GEOCODER_URL, DEFAULT_WEATHER_URL};
use meteo::location::{
    LocationResolver, Nominatim, PresetChoices, PresetThenAsk, Query, Resolution, TerminalPrompt,
};
use meteo::tool::{self, WeatherTool};
use meteo::weather::{OpenMeteo, WeatherProvider};

/// meteo — weather for any place name
///
/// Resolves a place name to coordinates (asking which one you mean when the
/// name exists in several countries) and prints the current weather as JSON.
///
/// Examples:
///   meteo "Porto, Portugal"
///   meteo Paris --forecast
///   meteo Springfield --country "United States"
///   meteo Paris --pick-country France --details
///   meteo --tool-call '{"city": "Richmond", "country": "Canada"}'
///   meteo --serve --port 8080
#[derive(Parser)]
#[command(name = "meteo", version, about, long_about = None)]
struct Cli {
    /// Place name. Example: meteo "Cape Town"
    #[arg(index = 1)]
    place: Option<String>,

    /// Country name used to pick between same-named places (e.g. "France").
    #[arg(long)]
    country: Option<String>,

    /// Include the 7-day forecast.
    #[arg(long, short = 'f')]
    forecast: bool,

    /// Also print the full address record (reverse lookup).
    #[arg(long)]
    details: bool,

    /// Print only the JSON result; no banner or warnings on stderr.
    #[arg(long)]
    json_only: bool,

    /// Answer the country question up front instead of prompting.
    #[arg(long)]
    pick_country: Option<String>,

    /// Answer the place question up front (1-based, as listed).
    #[arg(long)]
    pick: Option<usize>,

    /// Print the tool declaration for a language model and exit.
    #[arg(long)]
    tool_definition: bool,

    /// Run one tool call with the given JSON arguments.
    #[arg(long, value_name = "JSON")]
    tool_call: Option<String>,

    /// Start the HTTP API instead of answering one query.
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// User-Agent sent to the geocoder and weather service.
    #[arg(long, env = "METEO_USER_AGENT")]
    user_agent: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "METEO_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    #[arg(long, env = "METEO_GEOCODER_URL", default_value = DEFAULT_GEOCODER_URL)]
    geocoder_url: String,

    #[arg(long, env = "METEO_WEATHER_URL", default_value = DEFAULT_WEATHER_URL)]
    weather_url: String,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone().unwrap_or_else(default_user_agent),
            timeout: Duration::from_secs(self.timeout),
            geocoder_url: self.geocoder_url.clone(),
            weather_url: self.weather_url.clone(),
        }
    }

    fn preset(&self) -> PresetChoices {
        PresetChoices::new(self.pick_country.clone(), self.pick)
    }

    /// `--pick-country`/`--pick` answer their question; anything else is asked on the terminal.
    fn disambiguator(&self) -> PresetThenAsk<TerminalPrompt<std::io::StdinLock<'static>, std::io::Stderr>> {
        PresetThenAsk::new(self.preset(), TerminalPrompt::stdio())
    }

    /// A stderr line for humans, suppressed by `--json-only`.
    fn notice(&self, line: String) -> Option<String> {
        (!self.json_only).then_some(line)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.client_config();

    if cli.tool_definition {
        println!("{:#}", tool::definition());
        return;
    }

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(meteo::server::start(&cli.host, cli.port, &config));
        return;
    }

    let tool = WeatherTool::new(
        LocationResolver::new(Nominatim::new(&config)),
        OpenMeteo::new(&config),
    );
    let mut prompt = cli.disambiguator();

    if let Some(ref raw) = cli.tool_call {
        let args: Value = serde_json::from_str(raw).unwrap_or_else(|e| {
            eprintln!("Error: --tool-call expects JSON arguments: {}", e);
            std::process::exit(1);
        });
        let output = tool.invoke(&args, &mut prompt);
        println!("{:#}", output);
        if output.get("error").is_some() {
            std::process::exit(1);
        }
        return;
    }

    // ── Resolve location ────────────────────────────────────────

    let Some(ref place) = cli.place else {
        eprintln!("Error: No place specified.");
        eprintln!();
        eprintln!("Usage:");
        eprintln!("  meteo \"Porto, Portugal\"");
        eprintln!("  meteo Paris --forecast");
        eprintln!("  meteo Springfield --country \"United States\"");
        eprintln!("  meteo --serve");
        std::process::exit(1);
    };

    let query = Query::new(place)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        })
        .with_country(cli.country.as_deref());

    let location = match tool.resolver().resolve(&query, &mut prompt) {
        Resolution::Resolved(location) => location,
        Resolution::Unresolved(reason) => {
            eprintln!("Error: Could not resolve '{}': {}", query.text(), reason);
            std::process::exit(1);
        }
    };

    if let Some(line) = cli.notice(format!("  {}", location.display_line())) {
        eprintln!("{}", line);
    }

    let details = if cli.details {
        match tool.resolver().details(&location) {
            Ok(details) => Some(details),
            Err(e) => {
                warn!(error = %e, "reverse lookup failed");
                if let Some(line) = cli.notice(format!("  Warning: details unavailable: {}", e)) {
                    eprintln!("{}", line);
                }
                None
            }
        }
    } else {
        None
    };

    // ── Fetch weather ───────────────────────────────────────────

    let weather = tool
        .weather()
        .fetch(location.latitude, location.longitude, cli.forecast)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    // JSON to stdout
    let output = json!({
        "location": location,
        "details": details,
        "weather": weather,
    });
    println!("{:#}", output);
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("meteo={level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_only_silences_notices() {
        let cli = Cli::try_parse_from(["meteo", "Porto", "--json-only"]).unwrap();
        assert_eq!(cli.notice("  Porto, Portugal".into()), None);

        let cli = Cli::try_parse_from(["meteo", "Porto"]).unwrap();
        assert_eq!(cli.notice("  Porto, Portugal".into()).as_deref(), Some("  Porto, Portugal"));
    }

    #[test]
    fn test_pick_flags_feed_preset() {
        use meteo::location::{Candidate, Choice, Disambiguator};

        let cli = Cli::try_parse_from(["meteo", "Paris", "--pick", "2"]).unwrap();
        let place = |name: &str| Candidate {
            latitude: "0".into(),
            longitude: "0".into(),
            display_name: name.into(),
            country: Some("United States".into()),
            place_type: "town".into(),
        };
        let mut preset = cli.preset();
        assert_eq!(
            preset.choose_candidate(&[place("Paris, Texas"), place("Paris, Tennessee")]),
            Choice::Selected(1)
        );
    }
}
