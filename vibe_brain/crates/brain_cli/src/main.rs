use brain_core::config::{GeminiAuth, GeminiConfig};
use brain_core::gemini::GeminiClient;
use brain_core::{VibeParams, VibeSettingsResolver};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "brain_cli", about = "Turn a scene or mood description into vibe effect settings")]
struct Args {
    #[arg(long, required_unless_present = "prompt_file")]
    prompt: Option<String>,

    /// Read prompt content from a file.
    #[arg(long, value_name = "PATH", conflicts_with = "prompt")]
    prompt_file: Option<PathBuf>,

    /// Overrides GEMINI_MODEL.
    #[arg(long)]
    gemini_model: Option<String>,

    /// Overrides GEMINI_API_KEY with the trimmed contents of this file.
    #[arg(long, value_name = "PATH")]
    api_key_file: Option<PathBuf>,

    /// Overrides GEMINI_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Print the settings as JSON on stdout.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let prompt = if let Some(p) = args.prompt.clone() {
        p
    } else {
        let path = args
            .prompt_file
            .clone()
            .ok_or_else(|| anyhow::anyhow!("missing --prompt or --prompt-file"))?;
        std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read prompt file {}: {e}", path.display()))?
    };

    let mut config = GeminiConfig::from_env()?;
    if let Some(model) = args.gemini_model.as_deref() {
        config = config.with_model(model);
    }
    if let Some(base_url) = args.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    if let Some(path) = args.api_key_file.as_deref() {
        let key = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("failed to read api key file {}: {e}", path.display())
        })?;
        config = config.with_auth(GeminiAuth::api_key(key.trim()));
    }

    let client = GeminiClient::new(config)?;
    tracing::info!(model = client.model(), "resolving vibe settings");
    let resolver = VibeSettingsResolver::new(client);

    let params = resolver.resolve(&prompt).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&params)?);
    } else {
        print_params(&params);
    }
    print_qc(&params);

    Ok(())
}

fn print_params(params: &VibeParams) {
    println!("intensity:     {:.1}", params.intensity);
    println!("spatialWidth:  {:.1}", params.spatial_width);
    println!("distance:      {:.1}", params.distance);
    println!("ambienceNotes: {}", params.ambience_notes);
}

fn print_qc(params: &VibeParams) {
    let out_of_range = params.out_of_range_fields();
    let blank_notes = params.ambience_notes.trim().is_empty();
    if out_of_range.is_empty() && !blank_notes {
        return;
    }

    eprintln!("warnings:");
    for name in out_of_range {
        eprintln!("  - {name} is outside 0-100 (passed through unchanged)");
    }
    if blank_notes {
        eprintln!("  - ambienceNotes is empty");
    }
}
