use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use gtm_core::{
    high_risk, Channel, ChatSession, Config, DealInput, DealScore, DealSession, FormField,
    GtmClient, KnowledgeDocument, OutreachForm, OutreachResult, RiskLevel,
};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "gtm")]
#[command(version, about = "Terminal client for the GTM Synergy Suite")]
#[command(long_about = "Runs the interactive TUI when started without a subcommand")]
pub struct Cli {
    /// Base URL of the GTM API (overrides GTM_API_URL and the saved config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the API is up
    Status,
    /// Show knowledge base statistics
    Stats,
    /// Ask the GTM knowledge assistant a question
    Ask {
        question: String,
    },
    /// Clear the assistant's conversation memory
    Reset,
    /// Score every deal in a pipeline CSV
    Deals {
        /// CSV with company_name, deal_value, stage, days_in_pipeline columns
        csv: PathBuf,
        /// Only show deals flagged as High risk
        #[arg(long)]
        high_risk: bool,
    },
    /// Score a single deal
    Deal(DealArgs),
    /// Generate personalized outreach (prompts for missing required fields)
    Outreach(OutreachArgs),
    /// List supported outreach channels
    Channels,
    /// Add a document to the knowledge base
    AddDoc {
        text: String,
        /// JSON object, e.g. '{"source": "faq.md", "category": "sales"}'
        #[arg(short, long)]
        metadata: Option<String>,
    },
    /// Upload a JSON array of documents to the knowledge base
    UploadDocs {
        file: PathBuf,
    },
    /// Show the saved configuration, or update it
    Config {
        /// Save this URL as the default API address
        #[arg(long = "set-api-url")]
        set_api_url: Option<String>,
        /// Default outreach channel (email, linkedin, slack)
        #[arg(long)]
        channel: Option<String>,
    },
}

#[derive(Args)]
pub struct DealArgs {
    company_name: String,
    #[arg(long)]
    value: f64,
    #[arg(long)]
    stage: String,
    #[arg(long, default_value = "0")]
    days_in_pipeline: u32,
    #[arg(long, default_value = "0")]
    last_contact_days: u32,
    #[arg(long)]
    decision_maker: bool,
    #[arg(long)]
    competitor: bool,
    #[arg(long)]
    budget_confirmed: bool,
    #[arg(long, default_value = "D001")]
    id: String,
}

impl DealArgs {
    fn into_input(self) -> DealInput {
        DealInput {
            deal_id: self.id,
            company_name: self.company_name,
            deal_value: self.value,
            stage: self.stage,
            days_in_pipeline: self.days_in_pipeline,
            last_contact_days: self.last_contact_days,
            decision_maker_engaged: self.decision_maker,
            has_competitor: self.competitor,
            budget_confirmed: self.budget_confirmed,
        }
    }
}

#[derive(Args, Default)]
pub struct OutreachArgs {
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    industry: Option<String>,
    #[arg(long)]
    size: Option<String>,
    /// Comma-separated list
    #[arg(long)]
    pain_points: Option<String>,
    #[arg(long)]
    contact_name: Option<String>,
    #[arg(long)]
    contact_title: Option<String>,
    #[arg(long)]
    recent_activity: Option<String>,
    /// email, linkedin or slack
    #[arg(short, long)]
    channel: Option<String>,
    /// Generate several variants for A/B testing
    #[arg(long)]
    versions: Option<u32>,
}

impl OutreachArgs {
    fn to_form(&self, default_channel: Option<Channel>) -> Result<OutreachForm> {
        let channel = match &self.channel {
            Some(name) => parse_channel(name)?,
            None => default_channel.unwrap_or_default(),
        };

        let mut form = OutreachForm::new();
        form.channel = channel;
        let values = [
            (FormField::CompanyName, &self.company),
            (FormField::Industry, &self.industry),
            (FormField::CompanySize, &self.size),
            (FormField::PainPoints, &self.pain_points),
            (FormField::DecisionMakerName, &self.contact_name),
            (FormField::DecisionMakerTitle, &self.contact_title),
            (FormField::RecentActivity, &self.recent_activity),
        ];
        for (field, value) in values {
            if let Some(value) = value {
                *form.field_mut(field) = value.clone();
            }
        }
        Ok(form)
    }
}

fn parse_channel(name: &str) -> Result<Channel> {
    Channel::parse(name).ok_or_else(|| {
        anyhow!("Unknown channel '{}' (expected email, linkedin or slack)", name)
    })
}

fn parse_metadata(raw: Option<&str>) -> Result<Option<Map<String, Value>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(Some(map)),
        _ => bail!("--metadata must be a JSON object"),
    }
}

pub async fn run(command: Commands, client: &GtmClient, config: Config) -> Result<()> {
    match command {
        Commands::Status => show_status(client).await,
        Commands::Stats => show_stats(client).await,
        Commands::Ask { question } => ask(client, &question).await,
        Commands::Reset => reset(client).await,
        Commands::Deals { csv, high_risk } => score_pipeline(client, csv, high_risk).await,
        Commands::Deal(args) => score_deal(client, args.into_input()).await,
        Commands::Outreach(args) => outreach(client, &args, config.default_channel).await,
        Commands::Channels => list_channels(client).await,
        Commands::AddDoc { text, metadata } => {
            let document = KnowledgeDocument {
                text,
                metadata: parse_metadata(metadata.as_deref())?,
            };
            let message = client.add_document(&document).await?;
            println!("{} {}", "✓".green(), message);
            Ok(())
        }
        Commands::UploadDocs { file } => {
            let message = client.upload_docs(&file).await?;
            println!("{} {}", "✓".green(), message);
            Ok(())
        }
        Commands::Config { set_api_url, channel } => update_config(config, set_api_url, channel),
    }
}

async fn show_status(client: &GtmClient) -> Result<()> {
    println!("Checking {}", client.base_url().cyan());
    let info = client.service_info().await?;

    println!("{} {} ({})", "✓".green(), info.message.bold(), info.status.green());
    for tool in &info.tools {
        println!("  • {}", tool);
    }
    Ok(())
}

async fn show_stats(client: &GtmClient) -> Result<()> {
    let stats = client.stats().await?;
    println!(
        "{} documents in the knowledge base",
        stats.total_documents.to_string().bold().green()
    );
    println!("Categories: {}", stats.categories.join(", ").cyan());
    Ok(())
}

async fn ask(client: &GtmClient, question: &str) -> Result<()> {
    let mut chat = ChatSession::new();
    println!("🤔 {}\n", question.bold().cyan());

    let Some(question) = chat.begin_ask(question) else {
        bail!("Question was empty");
    };
    let result = client.ask(&question).await;
    let failure = result.as_ref().err().map(|e| e.to_string());
    chat.finish_ask(result);

    let Some(reply) = chat.last_reply() else {
        bail!("No reply recorded");
    };

    println!("{}", reply.content);
    let citations = reply.citations();
    if !citations.is_empty() {
        println!("\n{}", "Sources:".bold());
        for source in citations {
            println!(
                "{} {}",
                "▸".magenta(),
                format!("{} ({})", source.source, source.category).magenta()
            );
            println!("  {}", source.content.dimmed());
        }
    }

    if let Some(e) = failure {
        bail!("AskGTM request failed: {}", e);
    }
    Ok(())
}

async fn reset(client: &GtmClient) -> Result<()> {
    let mut chat = ChatSession::new();
    chat.reset(client).await?;
    println!("{} Conversation reset", "✓".green());
    Ok(())
}

fn risk_label(level: &RiskLevel) -> ColoredString {
    let label = format!("{} Risk", level);
    match level {
        RiskLevel::High => label.red().bold(),
        RiskLevel::Medium => label.yellow().bold(),
        RiskLevel::Low => label.green().bold(),
        RiskLevel::Other(_) => label.normal(),
    }
}

fn print_deal(index: usize, deal: &DealScore) {
    println!(
        "{}. {}  {}",
        index.to_string().bold().blue(),
        deal.company_name.bold().yellow(),
        crate::ui::format_currency(deal.deal_value).dimmed()
    );
    println!(
        "   {} close  {}",
        format!("{}%", deal.close_probability).green().bold(),
        risk_label(&deal.risk_level)
    );
    println!("   {}", deal.reasoning);
    for action in &deal.next_actions {
        println!("   • {}", action);
    }
    println!();
}

/// The path comes from the shell as-is, so it skips the typed-input trimming
fn pipeline_session(csv: PathBuf) -> DealSession {
    DealSession {
        file: Some(csv),
        ..DealSession::new()
    }
}

async fn score_pipeline(client: &GtmClient, csv: PathBuf, only_high_risk: bool) -> Result<()> {
    println!("📊 Analyzing {}", csv.display().to_string().cyan());
    let mut deals = pipeline_session(csv);
    deals.upload(client).await?;

    let shown: Vec<&DealScore> = if only_high_risk {
        high_risk(&deals.results)
    } else {
        deals.results.iter().collect()
    };

    if shown.is_empty() {
        println!("{}", "No deals to show".red());
        return Ok(());
    }

    println!();
    for (i, deal) in shown.iter().enumerate() {
        print_deal(i + 1, deal);
    }

    println!("{}", "=".repeat(50).dimmed());
    println!(
        "{} deals  pipeline {}  weighted {}  {} high risk",
        deals.results.len().to_string().bold(),
        crate::ui::format_currency(deals.total_value()),
        crate::ui::format_currency(deals.weighted_forecast()).green(),
        deals.high_risk().len().to_string().red()
    );
    Ok(())
}

async fn score_deal(client: &GtmClient, deal: DealInput) -> Result<()> {
    let score = client.analyze_deal(&deal).await?;
    print_deal(1, &score);
    Ok(())
}

/// Ask for each required field still empty after the flags were applied
fn prompt_missing(form: &mut OutreachForm) -> Result<()> {
    for field in form.missing_fields() {
        let value: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(field.label())
            .interact_text()?;
        *form.field_mut(field) = value;
    }
    Ok(())
}

fn print_outreach(result: &OutreachResult) {
    if let Some(subject) = result.subject() {
        println!("{} {}\n", "Subject:".bold(), subject.bold().yellow());
    }
    println!("{}\n", result.body);
    println!("{} {}", "Call to action:".bold(), result.call_to_action.green());
    if !result.personalization_elements.is_empty() {
        println!("{}", "Personalization:".bold());
        for element in &result.personalization_elements {
            println!("  ✓ {}", element);
        }
    }
    if !result.reasoning.is_empty() {
        println!("{} {}", "Why this works:".bold(), result.reasoning.dimmed());
    }
}

async fn outreach(
    client: &GtmClient,
    args: &OutreachArgs,
    default_channel: Option<Channel>,
) -> Result<()> {
    let mut form = args.to_form(default_channel)?;
    prompt_missing(&mut form)?;
    if !form.is_valid() {
        let missing: Vec<&str> = form.missing_fields().iter().map(|f| f.label()).collect();
        bail!("Required: {}", missing.join(", "));
    }

    let request = form.to_request();
    println!(
        "✉️  Generating {} outreach for {}\n",
        request.channel.display_name().cyan(),
        request.company_name.bold()
    );

    match args.versions {
        Some(count) if count > 1 => {
            let versions = client.generate_multiple(&request, count).await?;
            for (i, result) in versions.iter().enumerate() {
                println!("{}", format!("Version {}", i + 1).bold().blue());
                println!("{}", "-".repeat(50).dimmed());
                print_outreach(result);
                println!();
            }
        }
        _ => {
            let result = client.generate(&request).await?;
            print_outreach(&result);
        }
    }
    Ok(())
}

async fn list_channels(client: &GtmClient) -> Result<()> {
    for channel in client.channels().await? {
        println!(
            "{}  {}  {}",
            channel.id.bold().cyan(),
            channel.name.bold(),
            channel.description.dimmed()
        );
    }
    Ok(())
}

fn update_config(
    mut config: Config,
    set_api_url: Option<String>,
    channel: Option<String>,
) -> Result<()> {
    let changed = set_api_url.is_some() || channel.is_some();
    if let Some(url) = set_api_url {
        config.api_url = Some(url.trim_end_matches('/').to_string());
    }
    if let Some(name) = channel {
        config.default_channel = Some(parse_channel(&name)?);
    }
    if changed {
        config.save()?;
        println!("{} Configuration saved", "✓".green());
    }

    println!(
        "api_url:         {}",
        config.api_url.as_deref().unwrap_or("(default)").cyan()
    );
    println!(
        "default_channel: {}",
        config
            .default_channel
            .map(|c| c.as_str())
            .unwrap_or("email")
            .cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["gtm", "--api-url", "http://gtm:8000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.api_url.as_deref(), Some("http://gtm:8000"));
    }

    #[tokio::test]
    async fn test_failed_ask_is_an_error() {
        // Nothing listens on the discard port
        let client = GtmClient::new("http://127.0.0.1:9");

        let result = ask(&client, "How long is implementation?").await;
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("AskGTM request failed"), "{}", message);

        assert!(ask(&client, "   ").await.is_err());
    }

    #[test]
    fn test_pipeline_path_kept_verbatim() {
        let path = PathBuf::from(" q3 pipeline.csv ");
        let deals = pipeline_session(path.clone());
        assert_eq!(deals.file, Some(path));
        assert!(deals.results.is_empty());
    }

    #[test]
    fn test_deal_args() {
        let cli = Cli::try_parse_from([
            "gtm", "deal", "Acme Corp", "--value", "50000", "--stage", "Negotiation",
            "--days-in-pipeline", "45", "--budget-confirmed",
        ])
        .unwrap();
        let Some(Commands::Deal(args)) = cli.command else {
            panic!("expected deal subcommand");
        };
        let input = args.into_input();
        assert_eq!(input.company_name, "Acme Corp");
        assert_eq!(input.deal_value, 50_000.0);
        assert_eq!(input.days_in_pipeline, 45);
        assert!(input.budget_confirmed);
        assert!(!input.has_competitor);
    }

    #[test]
    fn test_outreach_args_fill_form() {
        let args = OutreachArgs {
            company: Some("Acme Corp".to_string()),
            industry: Some("SaaS".to_string()),
            size: Some("50-200".to_string()),
            pain_points: Some("manual processes, , low conversion".to_string()),
            ..OutreachArgs::default()
        };

        let form = args.to_form(Some(Channel::Slack)).unwrap();
        assert!(form.is_valid());
        assert_eq!(form.channel, Channel::Slack);
        assert_eq!(
            form.to_request().pain_points,
            vec!["manual processes".to_string(), "low conversion".to_string()]
        );

        let partial = OutreachArgs {
            company: Some("Acme Corp".to_string()),
            channel: Some("linkedin".to_string()),
            ..OutreachArgs::default()
        };
        let form = partial.to_form(None).unwrap();
        assert_eq!(form.channel, Channel::Linkedin);
        assert_eq!(form.missing_fields().len(), 3);
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let args = OutreachArgs {
            channel: Some("fax".to_string()),
            ..OutreachArgs::default()
        };
        assert!(args.to_form(None).is_err());
    }

    #[test]
    fn test_metadata_must_be_object() {
        assert_eq!(parse_metadata(None).unwrap(), None);
        let map = parse_metadata(Some(r#"{"category": "sales"}"#)).unwrap().unwrap();
        assert_eq!(map["category"], "sales");
        assert!(parse_metadata(Some("[1, 2]")).is_err());
        assert!(parse_metadata(Some("not json")).is_err());
    }
}
