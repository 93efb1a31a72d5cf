//! Server configuration, merged from four layers in increasing precedence:
//! built-in defaults, a TOML file, `AGORA_*` environment variables, and
//! CLI flags.

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "agora-server", version, about = "Agora community server")]
pub struct Config {
    /// HTTP listen port
    #[arg(long, env = "AGORA_PORT", default_value = "3000")]
    pub port: u16,

    /// Address to bind the listener to
    #[arg(long, env = "AGORA_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// TOML config file path
    #[arg(long, default_value = "./agora.toml")]
    pub config: String,

    /// Emit structured JSON logs instead of pretty console output
    #[arg(long, env = "AGORA_JSON_LOGS")]
    pub json_logs: bool,

    /// Print a commented config template to stdout and exit
    #[arg(long)]
    pub generate_config: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
            config: "./agora.toml".to_string(),
            json_logs: false,
            generate_config: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("AGORA_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

pub fn generate_config_template() -> String {
    r#"# Agora server configuration
# Read from ./agora.toml, or pass --config <path>.
# Every setting also has an AGORA_* environment variable and a CLI flag.

# port = 3000
# bind_address = "0.0.0.0"
# json_logs = false
"#
    .to_string()
}
