use crate::config::deployment::DeploymentConfig;
use crate::core::engine::OutputFormat;
use crate::core::filter::{Criteria, WeightBucket};
use crate::core::render::CallToAction;
use crate::core::Delimiter;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{self, Validate};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Dogs,
    Activities,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-cards")]
#[command(about = "Render a published spreadsheet feed as filterable cards")]
pub struct CliConfig {
    /// Built-in deployment to use when no --config is given
    #[arg(long, value_enum, default_value = "dogs")]
    pub preset: Preset,

    /// Path to a TOML deployment file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the published sheet URL
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Override the feed delimiter (comma or tab)
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Form link added to every card, `{name}` is replaced by the card title
    #[arg(long, value_name = "URL_TEMPLATE")]
    pub cta_url: Option<String>,

    #[arg(long, default_value = "Apply to Foster")]
    pub cta_label: String,

    /// Free-text search over the name/category/description columns
    #[arg(long, default_value = "")]
    pub search: String,

    /// Exact match on a column, e.g. --select Rescue_Name="Paws of Coronado"
    #[arg(long = "select", value_name = "COLUMN=VALUE")]
    pub selections: Vec<String>,

    /// Weight class: Small, Medium, Large or X-Large
    #[arg(long)]
    pub weight: Option<String>,

    #[arg(long, value_enum, default_value = "html")]
    pub format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 載入部署設定並套用命令列覆蓋
    pub fn deployment(&self) -> Result<DeploymentConfig> {
        let mut deployment = match &self.config {
            Some(path) => DeploymentConfig::from_file(path)?,
            None => match self.preset {
                Preset::Dogs => DeploymentConfig::dogs(),
                Preset::Activities => DeploymentConfig::activities(),
            },
        };

        if let Some(url) = &self.feed_url {
            tracing::info!("🔧 Feed URL overridden to: {}", url);
            deployment.feed.url = url.clone();
        }
        if let Some(delimiter) = &self.delimiter {
            deployment.feed.delimiter = delimiter.parse::<Delimiter>()?;
            tracing::info!("🔧 Delimiter overridden to: {}", deployment.feed.delimiter);
        }

        if let Some(template) = &self.cta_url {
            tracing::info!("🔧 Call to action set to: {}", template);
            deployment.card.call_to_action = Some(CallToAction {
                label: self.cta_label.clone(),
                url_template: template.clone(),
            });
        }

        deployment.validate()?;
        Ok(deployment)
    }

    pub fn criteria(&self) -> Result<Criteria> {
        let mut criteria = Criteria::new().with_search(self.search.clone());

        for selection in &self.selections {
            let (column, value) = parse_selection(selection)?;
            criteria = criteria.with_selection(column, value);
        }

        if let Some(weight) = &self.weight {
            criteria = criteria.with_weight(weight.clone());
        }

        Ok(criteria)
    }
}

fn parse_selection(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(CatalogError::InvalidConfigValueError {
            field: "select".to_string(),
            value: raw.to_string(),
            reason: "Expected COLUMN=VALUE".to_string(),
        }),
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            validation::validate_path("config", path)?;
        }
        if let Some(path) = &self.output {
            validation::validate_path("output", path)?;
        }
        if let Some(url) = &self.feed_url {
            validation::validate_url("feed_url", url)?;
        }
        if let Some(weight) = &self.weight {
            if !weight.is_empty() {
                weight.parse::<WeightBucket>()?;
            }
        }
        for selection in &self.selections {
            parse_selection(selection)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::parse_from(std::iter::once("catalog-cards").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.preset, Preset::Dogs);
        assert_eq!(config.format, OutputFormat::Html);
        assert!(config.criteria().unwrap().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_criteria_from_flags() {
        let config = parse(&[
            "--search",
            "lab",
            "--select",
            "Rescue_Name=Paws of Coronado",
            "--select",
            "Gender=Female",
            "--weight",
            "X-Large",
        ]);

        let criteria = config.criteria().unwrap();
        assert_eq!(criteria.search, "lab");
        assert_eq!(criteria.selections.get("Rescue_Name").unwrap(), "Paws of Coronado");
        assert_eq!(criteria.selections.get("Gender").unwrap(), "Female");
        assert_eq!(criteria.weight, "X-Large");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_flags_fail_validation() {
        assert!(parse(&["--weight", "Huge"]).validate().is_err());
        assert!(parse(&["--select", "no-equals-sign"]).validate().is_err());
        assert!(parse(&["--feed-url", "not a url"]).validate().is_err());
    }

    #[test]
    fn test_deployment_overrides() {
        let config = parse(&[
            "--preset",
            "dogs",
            "--feed-url",
            "https://example.com/dogs.tsv",
            "--delimiter",
            "tab",
        ]);

        let deployment = config.deployment().unwrap();
        assert_eq!(deployment.feed.url, "https://example.com/dogs.tsv");
        assert_eq!(deployment.feed.delimiter, Delimiter::Tab);
    }

    #[test]
    fn test_cta_url_adds_form_link_to_preset() {
        let config = parse(&[
            "--feed-url",
            "https://example.com/dogs.csv",
            "--cta-url",
            "https://forms.example/foster?dog={name}",
        ]);

        let deployment = config.deployment().unwrap();
        let cta = deployment.card.call_to_action.unwrap();
        assert_eq!(cta.label, "Apply to Foster");
        assert_eq!(cta.href_for("Sir Barks"), "https://forms.example/foster?dog=Sir+Barks");
        assert!(deployment.card.collapsible_description);

        let missing_name = parse(&[
            "--feed-url",
            "https://example.com/dogs.csv",
            "--cta-url",
            "https://forms.example/foster",
        ]);
        assert!(missing_name.deployment().is_err());
    }

    #[test]
    fn test_dogs_preset_without_url_fails() {
        let err = parse(&[]).deployment().unwrap_err();
        assert!(matches!(err, CatalogError::MissingConfigError { .. }));
    }
}
