use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use filingqa_lib::Service;
use fqa_agent::llm::openai_llm::OpenAiChatLlm;
use fqa_agent::source::dart::DartClient;
use fqa_core::config::{AppConfig, Credentials};
use fqa_core::error::{codes, AppError};

#[derive(Parser)]
#[command(name = "filingqa")]
#[command(about = "Evidence-grounded Q&A over DART disclosure filings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the company code table
    #[command(name = "corp-codes")]
    CorpCodes,
    /// List a company's filings in a date range
    Search(SearchArgs),
    /// Download (if needed), chunk and index one filing
    Load(DocArgs),
    /// Answer one question against a filing
    Ask(AskArgs),
    /// Run the fixed question set and save JSON + Markdown reports
    Report(ReportArgs),
    /// Answer questions read line by line from stdin
    Chat(DocArgs),
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    corp_name: String,
    /// YYYYMMDD
    #[arg(long)]
    start: String,
    /// YYYYMMDD
    #[arg(long)]
    end: String,
}

#[derive(Args)]
struct DocArgs {
    #[arg(long)]
    rcept_no: String,
    #[arg(long)]
    report_nm: String,
}

#[derive(Args)]
struct AskArgs {
    #[command(flatten)]
    doc: DocArgs,
    #[arg(long)]
    question: String,
    #[arg(long)]
    top_k: Option<usize>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    doc: DocArgs,
    /// Print the Markdown report instead of the JSON payload
    #[arg(long)]
    markdown: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // ureq logs every connection at info.
    if !cli.verbose {
        builder.filter_module("ureq", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let rendered = serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string());
            eprintln!("{rendered}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let creds = Credentials::from_env();
    log::debug!("config loaded: data_dir={} creds={:?}", config.data_dir.display(), creds);

    match cli.command {
        Commands::CorpCodes => {
            let service = with_dart(Service::new(config), &creds, true)?;
            print_json(&service.corp_codes()?)
        }
        Commands::Search(args) => {
            let service = with_dart(Service::new(config), &creds, true)?;
            print_json(&service.search(&args.corp_name, &args.start, &args.end)?)
        }
        Commands::Load(doc) => {
            let mut service = with_dart(Service::new(config), &creds, false)?;
            print_json(&service.load(&doc.rcept_no, &doc.report_nm)?)
        }
        Commands::Ask(args) => {
            let mut service = with_llm(with_dart(Service::new(config), &creds, false)?, &creds)?;
            service.load(&args.doc.rcept_no, &args.doc.report_nm)?;
            print_json(&service.ask(&args.question, args.top_k)?)
        }
        Commands::Report(args) => {
            let mut service = with_llm(with_dart(Service::new(config), &creds, false)?, &creds)?;
            service.load(&args.doc.rcept_no, &args.doc.report_nm)?;
            let payload = service.report()?;
            if args.markdown {
                println!("{}", payload.md_text);
                Ok(())
            } else {
                print_json(&payload)
            }
        }
        Commands::Chat(doc) => {
            let mut service = with_llm(with_dart(Service::new(config), &creds, false)?, &creds)?;
            service.load(&doc.rcept_no, &doc.report_nm)?;
            chat(&service)
        }
    }
}

/// A stored filing can be reopened without a DART key, so the key is only mandatory for network commands.
fn with_dart(service: Service, creds: &Credentials, required: bool) -> Result<Service, AppError> {
    let key = match creds.dart_api_key() {
        Ok(k) => k,
        Err(e) if required => return Err(e),
        Err(_) => return Ok(service),
    };
    let client = DartClient::from_config(&service.config().dart, key)?;
    Ok(service.with_source(Box::new(client)))
}

fn with_llm(service: Service, creds: &Credentials) -> Result<Service, AppError> {
    let llm = OpenAiChatLlm::from_config(&service.config().llm, creds.openai_api_key()?)?;
    log::debug!("using model {}", llm.model());
    Ok(service.with_llm(Box::new(llm)))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(codes::CLI_OUTPUT_FAILED, "Failed to encode output")
            .with_details(e.to_string())
    })?;
    println!("{text}");
    Ok(())
}

fn chat(service: &Service) -> Result<(), AppError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt_marker(&mut stdout)?;
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| {
            AppError::new(codes::CLI_INPUT_FAILED, "Failed to read question")
                .with_details(e.to_string())
        })?;
        let question = line.trim();
        match question {
            "" => {}
            "/quit" | "/exit" => break,
            "/status" => print_json(&service.status())?,
            _ => match service.ask(question, None) {
                Ok(ans) => {
                    println!("{}", ans.answer.trim());
                    for s in &ans.sources {
                        println!("  [{}] chunk_id={} (score={:.4})", s.sid, s.chunk_id, s.score);
                    }
                }
                // One failed question does not end the session.
                Err(e) => log::error!("{e}"),
            },
        }
        prompt_marker(&mut stdout)?;
    }
    Ok(())
}

fn prompt_marker(stdout: &mut io::Stdout) -> Result<(), AppError> {
    write!(stdout, "> ")
        .and_then(|_| stdout.flush())
        .map_err(|e| {
            AppError::new(codes::CLI_OUTPUT_FAILED, "Failed to write prompt")
                .with_details(e.to_string())
        })
}
