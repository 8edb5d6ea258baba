use super::commands::instances::InstancesCommands;
use super::commands::pages::PagesCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wikit")]
#[command(version, about = "Administer Wiki.js instances from the terminal")]
pub struct Cli {
    /// Instance to use instead of the default
    #[arg(short, long, global = true)]
    pub instance: Option<String>,

    /// Launches the TUI when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configured Wiki.js instances
    Instances(InstancesCommands),
    /// List, export and delete pages
    Pages(PagesCommands),
    /// Launch the interactive TUI
    Tui,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::instances::InstancesSubcommands;
    use crate::cli::commands::pages::PagesSubcommands;

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["wikit"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.instance.is_none());
    }

    #[test]
    fn test_global_instance_flag() {
        let cli = Cli::try_parse_from(["wikit", "pages", "list", "--instance", "prod"]).unwrap();
        assert_eq!(cli.instance.as_deref(), Some("prod"));
        match cli.command {
            Some(Commands::Pages(args)) => {
                assert!(matches!(args.command, PagesSubcommands::List { search: None }))
            }
            _ => panic!("expected pages command"),
        }
    }

    #[test]
    fn test_delete_takes_many_ids() {
        let cli = Cli::try_parse_from(["wikit", "pages", "delete", "4", "8", "15", "--yes"]).unwrap();
        match cli.command {
            Some(Commands::Pages(args)) => match args.command {
                PagesSubcommands::Delete { ids, yes } => {
                    assert_eq!(ids, vec![4, 8, 15]);
                    assert!(yes);
                }
                _ => panic!("expected delete"),
            },
            _ => panic!("expected pages command"),
        }
    }

    #[test]
    fn test_delete_requires_an_id() {
        assert!(Cli::try_parse_from(["wikit", "pages", "delete"]).is_err());
    }

    #[test]
    fn test_instances_use() {
        let cli = Cli::try_parse_from(["wikit", "instances", "use", "docs"]).unwrap();
        match cli.command {
            Some(Commands::Instances(args)) => {
                assert!(matches!(args.command, InstancesSubcommands::Use { ref name } if name == "docs"))
            }
            _ => panic!("expected instances command"),
        }
    }
}
