// ABOUTME: Command handlers wiring config, ingestion, sessions and output together
// ABOUTME: Implements the ask and prepare subcommands including the interactive follow-up loop

use anyhow::{Context, Result};
use dialoguer::Input;
use partlens_sdk::constants::urls;
use partlens_sdk::{ChatClient, EncodedImage};
use std::env;
use std::io::IsTerminal;

use crate::cli::{AskArgs, Cli, Commands, PrepareArgs};
use crate::cli_output::CliOutput;
use crate::config::Config;
use crate::constants::{env as env_vars, ui};
use crate::conversation::Conversation;
use crate::images::{prepare_images, summarize};
use crate::output::{reply_heading, JsonFormatter, OutputFormat, ReplyRecord, TableFormatter};
use crate::session::{Reply, RequestSettings, Session};
use crate::validator::{validate_api_key, validate_form};

pub async fn run(cli: Cli, output: &CliOutput) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(ref path) = cli.config {
        config = config.merge(Config::load_from_file(path)?);
    }

    match cli.command {
        Commands::Ask(args) => ask(args, &config, output).await,
        Commands::Prepare(args) => prepare(args, &config, output).await,
    }
}

async fn prepare(args: PrepareArgs, config: &Config, output: &CliOutput) -> Result<()> {
    if args.images.images.is_empty() {
        output.info("No images given. Use --image PATH.");
        return Ok(());
    }

    let ingest = config.ingest_config();
    let budget = ingest
        .compression
        .as_ref()
        .map(|c| c.byte_budget)
        .unwrap_or(usize::MAX);

    let images = prepare_images(&args.images.images, ingest, show_progress(args.json)).await?;
    let summaries = summarize(&images, budget);

    let rendered = if args.json {
        JsonFormatter::new(args.pretty).format_images(&summaries)?
    } else {
        TableFormatter::new(output.use_color()).format_images(&summaries)?
    };
    println!("{}", rendered);
    Ok(())
}

async fn ask(args: AskArgs, config: &Config, output: &CliOutput) -> Result<()> {
    validate_form(&args.fields, &args.images.images)?;

    let settings = RequestSettings {
        model: args.model.unwrap_or_else(|| config.model().to_string()),
        temperature: args.temperature.unwrap_or_else(|| config.temperature()),
        max_tokens: args.max_tokens.unwrap_or_else(|| config.max_tokens()),
    };
    let endpoint = args
        .api_url
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| urls::OPENAI_CHAT_COMPLETIONS.to_string());
    let conversation = Conversation::new(config.persona());
    let debug = args.debug || config.debug();

    let mut session = if debug {
        Session::preview(endpoint, settings, conversation)
    } else {
        let api_key = args.api_key.or_else(|| env::var(env_vars::API_KEY).ok());
        let validated = validate_api_key(api_key.as_deref())?;
        if let Some(warning) = validated.warning {
            output.warning(&warning);
        }

        let client = ChatClient::builder()
            .api_key(validated.key)
            .endpoint(Some(endpoint))
            .build()?;
        Session::connected(client, settings, conversation)
    };

    let ingest = config.ingest_config();
    let budget = ingest.compression.as_ref().map(|c| c.byte_budget);
    let images = prepare_images(&args.images.images, ingest, show_progress(args.json)).await?;
    if let Some(budget) = budget {
        warn_over_budget(&images, budget, output);
    }

    let reply = session
        .start(config.analysis(), &args.fields, &images)
        .await?;
    print_reply(&reply, session.settings(), args.json, output)?;

    if args.interactive {
        follow_up_loop(&mut session, output).await?;
    }
    Ok(())
}

async fn follow_up_loop(session: &mut Session, output: &CliOutput) -> Result<()> {
    loop {
        let text: String = Input::new()
            .with_prompt(ui::FOLLOW_UP_PROMPT)
            .allow_empty(true)
            .interact_text()
            .context("Failed to read follow-up question")?;

        if text.trim().is_empty() {
            return Ok(());
        }

        // A failed turn is reported and the session continues
        match session.follow_up(&text).await {
            Ok(reply) => print_reply(&reply, session.settings(), false, output)?,
            Err(err) => output.failure(&anyhow::Error::from(err)),
        }
    }
}

fn print_reply(
    reply: &Reply,
    settings: &RequestSettings,
    json: bool,
    output: &CliOutput,
) -> Result<()> {
    match reply {
        Reply::Answer(content) if json => {
            let record = ReplyRecord {
                model: &settings.model,
                content: content.as_str(),
            };
            println!("{}", JsonFormatter::new(false).format_value(&record)?);
        }
        Reply::Answer(content) => {
            println!("{}", reply_heading(&settings.model, output.use_color()));
            println!("{}", content);
        }
        Reply::Preview(payload) => {
            println!("{}", JsonFormatter::new(!json).format_value(payload)?);
            if !json {
                output.info("Debug mode: payload generated, no API call was made.");
            }
        }
    }
    Ok(())
}

fn warn_over_budget(images: &[EncodedImage], budget: usize, output: &CliOutput) {
    for summary in summarize(images, budget).iter().filter(|s| s.over_budget) {
        output.warning(&format!(
            "{} is still {} bytes after compression (budget {})",
            summary.name, summary.byte_size, budget
        ));
    }
}

fn show_progress(json: bool) -> bool {
    !json && std::io::stderr().is_terminal()
}
