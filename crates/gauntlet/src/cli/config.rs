//! The `gauntlet config` command.

use clap::{Args, Subcommand};
use gauntlet_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration and credential status
    Show,

    /// Print the config file location
    Path,

    /// Write a default config file to the platform location
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            print!("{}", config.to_toml()?);

            // Never echo the raw credential; report whether it resolves.
            match config.resolved_api_key() {
                Ok(key) => println!("\n# api key: {} (resolved)", mask_key(&key)),
                Err(_) => println!(
                    "\n# api key: NOT RESOLVED ({} is unset; export it or set api.api_key)",
                    config.api.api_key
                ),
            }
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "A config file already exists at {}; pass --force to replace it.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;

            println!("Wrote default config to {}", path.display());
            println!("Set GAUNTLET_API_KEY (or edit api.api_key) before `gauntlet run`.");
        }
    }

    Ok(())
}

/// Show just enough of a credential to recognize which key is loaded.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key_keeps_edges_only() {
        assert_eq!(mask_key("sk-abcdefghijklmnop"), "sk-a...mnop");
    }

    #[test]
    fn test_mask_key_hides_short_keys_entirely() {
        assert_eq!(mask_key("tiny"), "****");
        assert_eq!(mask_key(""), "****");
    }
}
