//! The `imgsample config` command for configuration management.

use std::fmt::Write as _;

use clap::{Args, Subcommand};
use imgsample_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective sampler settings
    Show {
        /// Print the raw TOML instead of the summary
        #[arg(long)]
        toml: bool,
    },

    /// Show config file path
    Path,

    /// Write a commented config file with the current defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { toml } => {
            if toml {
                println!("{}", config.to_toml()?);
            } else {
                print!("{}", summary(&config));
            }
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();

            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&path, render_template(&Config::default()))?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

/// Human-readable view of what a `sample` run would use.
fn summary(config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Config file:      {}", Config::default_path().display());
    let _ = writeln!(out, "Output directory: {}", config.output_dir().display());
    let _ = writeln!(
        out,
        "File names:       {}<nanos>.{}",
        config.output.file_prefix, config.output.extension
    );
    let _ = writeln!(
        out,
        "Size bound:       {}px (width and height)",
        config.sampler.target_dimension
    );
    let _ = writeln!(out, "JPEG quality:     {}", config.output.jpeg_quality);
    let _ = writeln!(
        out,
        "Source limits:    {} MB, {}px per side",
        config.limits.max_file_size_mb, config.limits.max_image_dimension
    );
    let _ = writeln!(out, "Run timeout:      {} ms", config.limits.decode_timeout_ms);
    let _ = writeln!(
        out,
        "Logging:          {} ({})",
        config.logging.level, config.logging.format
    );
    out
}

fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Commented config file for `config init`.
fn render_template(config: &Config) -> String {
    format!(
        r#"# imgsample configuration

[sampler]
# Bound applied to both width and height; the sample factor is the smallest
# integer that keeps the decoded copy near this size
target_dimension = {target}
# Where sampled copies are written (~ is expanded)
output_dir = {output_dir}

[output]
# Files are named <file_prefix><nanosecond stamp>.<extension>
file_prefix = {prefix}
extension = {extension}
# JPEG quality, 1-100
jpeg_quality = {quality}

[limits]
# Sources above this size are rejected before decoding
max_file_size_mb = {max_mb}
# Sources wider or taller than this are rejected after the header read
max_image_dimension = {max_dim}
# A run that takes longer reports no output and writes nothing
decode_timeout_ms = {timeout}

[logging]
# error, warn, info, debug or trace
level = {level}
# pretty or json
format = {format}
"#,
        target = config.sampler.target_dimension,
        output_dir = quoted(&config.sampler.output_dir.to_string_lossy()),
        prefix = quoted(&config.output.file_prefix),
        extension = quoted(&config.output.extension),
        quality = config.output.jpeg_quality,
        max_mb = config.limits.max_file_size_mb,
        max_dim = config.limits.max_image_dimension,
        timeout = config.limits.decode_timeout_ms,
        level = quoted(&config.logging.level),
        format = quoted(&config.logging.format),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_back_to_defaults() {
        let defaults = Config::default();
        let parsed = Config::from_toml(&render_template(&defaults)).unwrap();

        assert_eq!(parsed.sampler.target_dimension, defaults.sampler.target_dimension);
        assert_eq!(parsed.sampler.output_dir, defaults.sampler.output_dir);
        assert_eq!(parsed.output.file_prefix, defaults.output.file_prefix);
        assert_eq!(parsed.output.extension, defaults.output.extension);
        assert_eq!(parsed.output.jpeg_quality, defaults.output.jpeg_quality);
        assert_eq!(parsed.limits.decode_timeout_ms, defaults.limits.decode_timeout_ms);
        assert_eq!(parsed.logging.format, defaults.logging.format);
    }

    #[test]
    fn test_template_covers_every_section() {
        let template = render_template(&Config::default());
        for section in ["[sampler]", "[output]", "[limits]", "[logging]"] {
            assert!(template.contains(section), "missing {}", section);
        }
    }

    #[test]
    fn test_template_quotes_custom_values() {
        let mut config = Config::default();
        config.sampler.output_dir = "/tmp/with \"quotes\"".into();
        config.output.file_prefix = "shot-".to_string();

        let parsed = Config::from_toml(&render_template(&config)).unwrap();
        assert_eq!(parsed.sampler.output_dir, config.sampler.output_dir);
        assert_eq!(parsed.output.file_prefix, "shot-");
    }

    #[test]
    fn test_summary_shows_resolved_output_dir() {
        let mut config = Config::default();
        config.sampler.output_dir = "/srv/sampled".into();
        config.output.file_prefix = "CAP_".to_string();

        let text = summary(&config);
        assert!(text.contains("/srv/sampled"));
        assert!(text.contains("CAP_<nanos>.jpg"));
        assert!(!text.contains('~'));
    }
}
