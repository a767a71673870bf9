//! CLI argument parsing and command definitions.
//!
//! Defines the `sakbe` binary's surface: ingestion (`add`, `ingest`),
//! retrieval (`search`), introspection (`stats`, `health`, `version`),
//! and configuration tooling (`config`).

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for the `sakbe` binary.
#[derive(Parser, Debug)]
#[command(name = "sakbe", author, version, about, long_about = None)]
pub struct SakbeArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "SAKBE_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Commands of the `sakbe` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest one document and print its ID.
    Add {
        /// Document text.
        text: String,

        /// Language code (e.g. "en", "es", "yua").
        #[arg(short, long)]
        language: String,

        /// Metadata entry as key=value; repeatable.
        #[arg(short, long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Batch-ingest documents from a JSONL file.
    Ingest {
        /// Path to a JSONL file of {"text", "language", "metadata"?} records.
        file: String,
    },

    /// Search for documents similar to a query.
    Search {
        /// Query text.
        query: String,

        /// Language of the query.
        #[arg(short, long)]
        language: String,

        /// Maximum number of results.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity for a result to qualify.
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Only return documents in the query language.
        #[arg(long)]
        same_language: bool,

        /// Score boost for shared cultural tags.
        #[arg(long)]
        cultural_boost: Option<f32>,

        /// Score boost for shared phonetic tags.
        #[arg(long)]
        phonetic_boost: Option<f32>,
    },

    /// Show index, document, and cache statistics.
    Stats,

    /// Configuration operations.
    Config(ConfigCommand),

    /// Print version information.
    Version,

    /// Check configuration and snapshot health.
    Health,
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "embedding.dimension").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "embedding.dimension").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_args_default() {
        // config is not asserted here: clap falls back to SAKBE_CONFIG, which
        // other tests in this binary set and unset.
        let args = SakbeArgs::parse_from(["sakbe"]);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_verbose() {
        let args = SakbeArgs::parse_from(["sakbe", "--verbose"]);
        assert!(args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_args_quiet() {
        let args = SakbeArgs::parse_from(["sakbe", "--quiet"]);
        assert!(!args.verbose);
        assert!(args.quiet);
    }

    #[test]
    fn test_args_config() {
        let args = SakbeArgs::parse_from(["sakbe", "--config", "/path/to/config.toml"]);
        assert_eq!(args.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_add_command() {
        let args = SakbeArgs::parse_from(["sakbe", "add", "ha' chaac", "--language", "yua"]);
        match args.command {
            Some(Command::Add {
                text,
                language,
                meta,
            }) => {
                assert_eq!(text, "ha' chaac");
                assert_eq!(language, "yua");
                assert!(meta.is_empty());
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_add_command_with_metadata() {
        let args = SakbeArgs::parse_from([
            "sakbe",
            "add",
            "water",
            "--language",
            "en",
            "--meta",
            "source=corpus",
            "--meta",
            "region=yucatan",
        ]);
        match args.command {
            Some(Command::Add { meta, .. }) => {
                assert_eq!(meta, vec!["source=corpus", "region=yucatan"]);
            }
            _ => panic!("Expected Add command with metadata"),
        }
    }

    #[test]
    fn test_ingest_command() {
        let args = SakbeArgs::parse_from(["sakbe", "ingest", "corpus.jsonl"]);
        match args.command {
            Some(Command::Ingest { file }) => assert_eq!(file, "corpus.jsonl"),
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_search_command_defaults() {
        let args = SakbeArgs::parse_from(["sakbe", "search", "water", "--language", "en"]);
        match args.command {
            Some(Command::Search {
                query,
                language,
                top_k,
                threshold,
                same_language,
                cultural_boost,
                phonetic_boost,
            }) => {
                assert_eq!(query, "water");
                assert_eq!(language, "en");
                assert!(top_k.is_none());
                assert!(threshold.is_none());
                assert!(!same_language);
                assert!(cultural_boost.is_none());
                assert!(phonetic_boost.is_none());
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_command_full() {
        let args = SakbeArgs::parse_from([
            "sakbe",
            "search",
            "agua",
            "--language",
            "es",
            "--top-k",
            "5",
            "--threshold",
            "0.8",
            "--same-language",
            "--cultural-boost",
            "0.05",
            "--phonetic-boost",
            "0.02",
        ]);
        match args.command {
            Some(Command::Search {
                top_k,
                threshold,
                same_language,
                cultural_boost,
                phonetic_boost,
                ..
            }) => {
                assert_eq!(top_k, Some(5));
                assert_eq!(threshold, Some(0.8));
                assert!(same_language);
                assert_eq!(cultural_boost, Some(0.05));
                assert_eq!(phonetic_boost, Some(0.02));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_search_short_flags() {
        let args =
            SakbeArgs::parse_from(["sakbe", "search", "water", "-l", "en", "-k", "3", "-t", "0.5"]);
        match args.command {
            Some(Command::Search {
                language,
                top_k,
                threshold,
                ..
            }) => {
                assert_eq!(language, "en");
                assert_eq!(top_k, Some(3));
                assert_eq!(threshold, Some(0.5));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_stats_command() {
        let args = SakbeArgs::parse_from(["sakbe", "stats"]);
        assert!(matches!(args.command, Some(Command::Stats)));
    }

    #[test]
    fn test_version_command() {
        let args = SakbeArgs::parse_from(["sakbe", "version"]);
        assert!(matches!(args.command, Some(Command::Version)));
    }

    #[test]
    fn test_health_command() {
        let args = SakbeArgs::parse_from(["sakbe", "health"]);
        assert!(matches!(args.command, Some(Command::Health)));
    }

    // ------------------------------------------------------------------------
    // Config command tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_path_command() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "path"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Path,
            })) => {}
            _ => panic!("Expected Config Path command"),
        }
    }

    #[test]
    fn test_config_get_command() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "get", "embedding.dimension"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Get { key },
            })) => {
                assert_eq!(key, "embedding.dimension");
            }
            _ => panic!("Expected Config Get command"),
        }
    }

    #[test]
    fn test_config_set_command() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "set", "search.top_k", "20"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Set { key, value },
            })) => {
                assert_eq!(key, "search.top_k");
                assert_eq!(value, "20");
            }
            _ => panic!("Expected Config Set command"),
        }
    }

    #[test]
    fn test_config_init_command() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "init"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { file, force },
            })) => {
                assert!(file.is_none());
                assert!(!force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_config_init_force() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "init", "--force"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { force, .. },
            })) => {
                assert!(force);
            }
            _ => panic!("Expected Config Init command with force"),
        }
    }

    #[test]
    fn test_config_export_command() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "export"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Export { docker_env },
            })) => {
                assert!(!docker_env);
            }
            _ => panic!("Expected Config Export command"),
        }
    }

    #[test]
    fn test_config_export_docker_env() {
        let args = SakbeArgs::parse_from(["sakbe", "config", "export", "--docker-env"]);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Export { docker_env },
            })) => {
                assert!(docker_env);
            }
            _ => panic!("Expected Config Export command with docker_env"),
        }
    }
}
