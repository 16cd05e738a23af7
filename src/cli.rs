// CLI module for argument parsing and configuration

use crate::config::UserConfig;
use crate::domain::{ConfirmationPolicy, DeleteMode, TraversalLimits};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Sweepr - delete files wherever they live
///
/// Each path is deleted directly when it sits in the app sandbox, through the
/// media index when the index knows it, or through a granted directory tree.
#[derive(Parser, Debug, Clone)]
#[command(name = "sweepr")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Absolute paths of the files to delete
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// App-private storage root (overrides the config file)
    #[arg(long = "sandbox")]
    pub sandbox: Option<PathBuf>,

    /// Media index catalog file (overrides the config file)
    #[arg(long = "catalog")]
    pub catalog: Option<PathBuf>,

    /// Directory granted for files that are neither sandboxed nor indexed
    #[arg(short = 'g', long = "grant")]
    pub grant: Option<PathBuf>,

    /// Delete index entries without asking for confirmation
    #[arg(long = "no-confirm", action = ArgAction::SetTrue)]
    pub no_confirm: bool,

    /// Move sandbox files to the trash instead of removing them
    #[arg(long = "trash", action = ArgAction::SetTrue)]
    pub trash: bool,

    /// Approve every confirmation request without prompting
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    pub yes: bool,

    /// Dry run mode - print the tier chosen for each path without deleting
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        for path in &self.paths {
            if !path.is_absolute() {
                return Err(format!("Path is not absolute: {}", path.display()));
            }

            if path.file_name().is_none() {
                return Err(format!("Path has no file name: {}", path.display()));
            }
        }

        if let Some(ref grant) = self.grant {
            if !grant.exists() {
                return Err(format!(
                    "Granted directory does not exist: {}",
                    grant.display()
                ));
            }

            if !grant.is_dir() {
                return Err(format!(
                    "Granted path is not a directory: {}",
                    grant.display()
                ));
            }
        }

        if let Some(ref sandbox) = self.sandbox {
            if !sandbox.is_absolute() {
                return Err(format!(
                    "Sandbox root is not absolute: {}",
                    sandbox.display()
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments layered over the user config
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: Vec<PathBuf>,
    pub sandbox_root: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub grant: Option<PathBuf>,
    pub confirmation: ConfirmationPolicy,
    pub delete_mode: DeleteMode,
    pub traversal: TraversalLimits,
    pub auto_approve: bool,
    pub dry_run: bool,
}

impl AppConfig {
    pub fn from_args(args: Args, user: &UserConfig) -> Self {
        let mut paths: Vec<PathBuf> = Vec::with_capacity(args.paths.len());
        for path in args.paths {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        AppConfig {
            paths,
            sandbox_root: args.sandbox.or_else(|| user.resolved_sandbox_root()),
            catalog_path: args.catalog.or_else(|| user.resolved_catalog_path()),
            grant: args.grant,
            confirmation: if args.no_confirm {
                ConfirmationPolicy::NotRequired
            } else {
                user.confirmation
            },
            delete_mode: if args.trash {
                DeleteMode::Trash
            } else {
                user.delete_mode
            },
            traversal: user.traversal,
            auto_approve: args.yes,
            dry_run: args.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(paths: &[&str]) -> Args {
        Args {
            paths: paths.iter().map(PathBuf::from).collect(),
            sandbox: None,
            catalog: None,
            grant: None,
            no_confirm: false,
            trash: false,
            yes: false,
            dry_run: false,
        }
    }

    mod args_tests {
        use super::*;

        #[test]
        fn test_parse_from_command_line() {
            let args = Args::try_parse_from([
                "sweepr",
                "--sandbox",
                "/data/app",
                "-y",
                "-n",
                "/shared/Pictures/img.jpg",
                "/shared/Documents/report.pdf",
            ])
            .unwrap();

            assert_eq!(args.paths.len(), 2);
            assert_eq!(args.sandbox, Some(PathBuf::from("/data/app")));
            assert!(args.yes);
            assert!(args.dry_run);
            assert!(!args.no_confirm);
        }

        #[test]
        fn test_paths_are_required() {
            assert!(Args::try_parse_from(["sweepr"]).is_err());
        }

        #[test]
        fn test_validate_relative_path() {
            let result = args(&["Pictures/img.jpg"]).validate();
            assert!(result.is_err());
            assert!(result.unwrap_err().contains("not absolute"));
        }

        #[test]
        fn test_validate_path_without_file_name() {
            for path in ["/", "/shared/Documents/.."] {
                let result = args(&["/shared/Documents/report.pdf", path]).validate();
                assert!(result.unwrap_err().contains("no file name"));
            }
        }

        #[test]
        fn test_validate_nonexistent_grant() {
            let mut args = args(&["/shared/Documents/report.pdf"]);
            args.grant = Some(PathBuf::from("/nonexistent/path/12345"));

            let result = args.validate();
            assert!(result.is_err());
            assert!(result.unwrap_err().contains("does not exist"));
        }

        #[test]
        fn test_validate_grant_must_be_directory() {
            let temp_dir = tempfile::TempDir::new().unwrap();
            let file = temp_dir.path().join("report.pdf");
            std::fs::write(&file, b"pdf").unwrap();

            let mut args = args(&["/shared/Documents/report.pdf"]);
            args.grant = Some(file);

            let result = args.validate();
            assert!(result.unwrap_err().contains("not a directory"));
        }

        #[test]
        fn test_validate_success() {
            let temp_dir = tempfile::TempDir::new().unwrap();
            let mut args = args(&["/shared/Documents/report.pdf"]);
            args.grant = Some(temp_dir.path().to_path_buf());

            assert!(args.validate().is_ok());
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_app_config_flags_override_user_config() {
            let mut args = args(&["/shared/Pictures/img.jpg"]);
            args.sandbox = Some(PathBuf::from("/cli/sandbox"));
            args.no_confirm = true;
            args.trash = true;
            args.yes = true;

            let user = UserConfig {
                sandbox_root: Some(PathBuf::from("/config/sandbox")),
                ..UserConfig::default()
            };
            let config = AppConfig::from_args(args, &user);

            assert_eq!(config.sandbox_root, Some(PathBuf::from("/cli/sandbox")));
            assert_eq!(config.confirmation, ConfirmationPolicy::NotRequired);
            assert_eq!(config.delete_mode, DeleteMode::Trash);
            assert!(config.auto_approve);
        }

        #[test]
        fn test_app_config_falls_back_to_user_config() {
            let user = UserConfig {
                sandbox_root: Some(PathBuf::from("/config/sandbox")),
                catalog_path: Some(PathBuf::from("/config/catalog.json")),
                ..UserConfig::default()
            };
            let config = AppConfig::from_args(args(&["/shared/Pictures/img.jpg"]), &user);

            assert_eq!(config.sandbox_root, Some(PathBuf::from("/config/sandbox")));
            assert_eq!(
                config.catalog_path,
                Some(PathBuf::from("/config/catalog.json"))
            );
            assert_eq!(config.confirmation, ConfirmationPolicy::Required);
            assert_eq!(config.delete_mode, DeleteMode::Remove);
            assert!(!config.dry_run);
        }

        #[test]
        fn test_app_config_deduplicates_paths() {
            let config = AppConfig::from_args(
                args(&["/a/x.txt", "/b/y.txt", "/a/x.txt"]),
                &UserConfig::default(),
            );

            assert_eq!(
                config.paths,
                vec![PathBuf::from("/a/x.txt"), PathBuf::from("/b/y.txt")]
            );
        }
    }
}
