//! `wikit instances`: list, add and select Wiki.js instances

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::cli::ui::{prompt_api_key, prompt_overwrite_confirmation, prompt_url};
use crate::config::{Config, DEFAULT_INSTANCE_ENV, InstanceConfig, InstanceSource};

#[derive(Args)]
pub struct InstancesCommands {
    #[command(subcommand)]
    pub command: InstancesSubcommands,
}

#[derive(Subcommand)]
pub enum InstancesSubcommands {
    /// Show every configured instance
    List,
    /// Add or replace an instance in the config file
    Add {
        name: String,
        /// GraphQL endpoint; prompted for when omitted
        #[arg(long)]
        url: Option<String>,
        /// API key; prompted for when omitted
        #[arg(long = "key")]
        api_key: Option<String>,
        /// Display name shown instead of the instance name
        #[arg(long)]
        label: Option<String>,
        /// Also make this the default instance
        #[arg(long)]
        default: bool,
        /// Overwrite an existing instance without asking
        #[arg(long)]
        force: bool,
    },
    /// Make an instance the default
    Use { name: String },
}

pub async fn instances_command(args: InstancesCommands) -> Result<()> {
    let mut config = Config::load()?;

    match args.command {
        InstancesSubcommands::List => list(&config),
        InstancesSubcommands::Add {
            name,
            url,
            api_key,
            label,
            default,
            force,
        } => {
            if config.instances.contains_key(&name) && !force && !prompt_overwrite_confirmation(&name)? {
                println!("{}", "Cancelled".yellow());
                return Ok(());
            }

            let mut instance = InstanceConfig::new(prompt_url(url)?, prompt_api_key(api_key)?);
            instance.label = label;
            config.add_instance(name.clone(), instance);
            if default {
                config.set_default_instance(&name)?;
            }
            config.save()?;

            println!("{} Added instance {}", "✓".bright_green(), name.bright_green().bold());
            if config.default_instance.as_deref() == Some(name.as_str()) {
                println!("  {}", "This is now the default instance".dimmed());
            }
            Ok(())
        }
        InstancesSubcommands::Use { name } => {
            config.set_default_instance(&name)?;
            config.save()?;
            println!("{} Default instance is now {}", "✓".bright_green(), name.bright_green().bold());
            if let Some(env_default) = &config.env_default {
                println!(
                    "  {} {} is set to {} and takes precedence",
                    "⚠".bright_yellow(),
                    DEFAULT_INSTANCE_ENV,
                    env_default.bright_yellow()
                );
            }
            Ok(())
        }
    }
}

fn list(config: &Config) -> Result<()> {
    let instances = config.all_instances();

    println!();
    if instances.is_empty() {
        println!("  {}", "No instances configured".bright_yellow().bold());
        println!("  {}", "Add one with:".dimmed());
        println!("    {}", "wikit instances add NAME --url URL --key KEY".cyan());
        println!("  {}", "or set <PREFIX>_API_URL and <PREFIX>_API_KEY".dimmed());
        return Ok(());
    }

    let current = config.resolve(None).ok().map(|r| r.name);

    println!("  {}", "Configured instances:".bright_white().bold());
    for (name, instance, source) in instances {
        let is_current = current.as_deref() == Some(name);
        let (marker, styled_name) = if is_current {
            ("●", name.bright_green().bold())
        } else {
            ("○", name.white())
        };
        let source = match source {
            InstanceSource::File => "config".dimmed(),
            InstanceSource::Environment => "env".bright_blue(),
        };
        println!("  {} {} {}", marker.bright_green(), styled_name, source);
        if instance.label.is_some() {
            println!("    {}: {}", "Label".dimmed(), instance.display_name(name));
        }
        println!("    {}: {}", "URL".dimmed(), instance.url.cyan());
    }
    println!();
    Ok(())
}
