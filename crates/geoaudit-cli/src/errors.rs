use console::style;
use geoaudit_core::AuditError;
use std::fmt;
use std::path::Path;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for an input folder without shapefiles
pub fn no_input(path: &Path) -> CliError {
    CliError::new("No shapefiles found")
        .with_context(format!(
            "The input folder contains no .shp files, nothing was written.\n\nFolder: {}",
            path.display()
        ))
        .with_suggestion("Check that the folder holds shapefiles (.shp with .shx and .dbf)")
        .with_suggestion(format!("List what would be audited: geoaudit scan {}", path.display()))
        .with_help("Run: geoaudit run --help")
}

/// Create error for a missing input folder
pub fn input_not_found(path: &Path) -> CliError {
    CliError::new("Input folder not found")
        .with_context(format!("The input folder does not exist.\n\nPath: {}", path.display()))
        .with_suggestion("Check the folder path and try again")
        .with_suggestion("Use an absolute path or a path relative to the current directory")
        .with_help("Run: geoaudit run --help")
}

/// Create error for invalid configuration
pub fn invalid_config(key: &str, reason: &str) -> CliError {
    CliError::new(format!("Invalid configuration: {}", key))
        .with_context(format!("Configuration value is invalid.\n\nReason: {}", reason))
        .with_suggestion("Check geoaudit.toml and GEOAUDIT_* environment variables")
        .with_suggestion("Show the effective values: geoaudit config")
        .with_help("Run: geoaudit config --help")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(audit) = error.downcast_ref::<AuditError>() {
        match audit {
            AuditError::NoInput { path } => return no_input(path),
            AuditError::InputNotFound { path } => return input_not_found(path),
            AuditError::ConfigInvalid { key, reason } => return invalid_config(key, reason),
            _ => {}
        }
    }

    let message = format!("{:#}", error);
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.to_lowercase().contains("permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions of the output folder")
            .with_suggestion("Or run with appropriate privileges")
    } else {
        CliError::new(message)
    }
}
