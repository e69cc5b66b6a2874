//! CLI tool for previewing and restyling the text of PowerPoint decks.

mod chat;

use anyhow::{Context, Result};
use chat::ChatCompletionTransform;
use clap::{Parser, Subcommand};
use restyle_core::{
    parse_slide_selection, DeckPreview, PipelineConfig, SlideAnalyzer, StyleProfile,
};
use restyle_translate::{TranslationOrchestrator, TranslationReport};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Preview and restyle the text of .pptx decks for a target audience.
#[derive(Parser, Debug)]
#[command(name = "restyle-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show per-slide text statistics and cost estimates
    Analyze {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restyle the selected slides and write a new deck
    Translate {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// Target style profile (gen-z, millennials, boomers)
        #[arg(short, long)]
        profile: String,

        /// Slides to restyle, e.g. "1,3,4"
        #[arg(short, long)]
        slides: String,

        /// Output file (default: translated_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum concurrent transform calls
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-call timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the translation report as JSON
        #[arg(long)]
        report: bool,
    },

    /// Restyle a single piece of text and print the result
    Text {
        /// Text to restyle
        text: String,

        /// Target style profile (gen-z, millennials, boomers)
        #[arg(short, long)]
        profile: String,

        /// Per-call timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List the supported style profiles
    Profiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut config = load_config(args.config.as_deref())?;

    match &args.command {
        Command::Analyze { input, json } => {
            let preview = analyze_file(input, &config)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                print!("{}", format_preview(&preview));
            }
        }
        Command::Translate {
            input,
            profile,
            slides,
            output,
            concurrency,
            timeout,
            report,
        } => {
            if let Some(limit) = concurrency {
                config.max_concurrent_requests = *limit;
            }
            if let Some(secs) = timeout {
                config.request_timeout_secs = *secs;
            }
            config.validate()?;

            let profile: StyleProfile = profile.parse()?;
            let selection = parse_slide_selection(slides)?;

            let orchestrator = build_orchestrator(&config)?.with_progress(|event| {
                log::info!(
                    "Progress: {}/{} units{}",
                    event.completed,
                    event.total,
                    if event.succeeded { "" } else { " (failed)" }
                );
            });

            if args.verbose {
                eprintln!("Processing: {}", input.display());
            }

            let bytes = read_input(input)?;
            let result = restyle_translate::translate_deck(
                bytes,
                profile.as_str(),
                &selection,
                &orchestrator,
            )
            .await
            .with_context(|| format!("Failed to restyle {}", input.display()))?;

            let output_path = get_output_path(input, output.as_ref());
            write_output(&output_path, &result.bytes)?;

            eprint!("{}", format_summary(&result, &output_path));
            if *report {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Command::Text {
            text,
            profile,
            timeout,
        } => {
            if let Some(secs) = timeout {
                config.request_timeout_secs = *secs;
            }
            config.validate()?;

            let profile: StyleProfile = profile.parse()?;
            let orchestrator = build_orchestrator(&config)?;
            let restyled = restyle_translate::restyle_text(text, profile.as_str(), &orchestrator)
                .await
                .context("Failed to restyle text")?;
            println!("{}", restyled);
        }
        Command::Profiles => {
            for profile in StyleProfile::ALL {
                println!("{}", profile);
            }
        }
    }

    Ok(())
}

/// Load the pipeline configuration, or the defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Create an orchestrator around the chat-completion transform.
fn build_orchestrator(config: &PipelineConfig) -> Result<TranslationOrchestrator> {
    let transform = ChatCompletionTransform::from_env()?;
    log::debug!("Using {:?}", transform);
    Ok(TranslationOrchestrator::from_config(Arc::new(transform), config))
}

/// Build the preview for a single deck.
fn analyze_file(input_path: &Path, config: &PipelineConfig) -> Result<DeckPreview> {
    let bytes = read_input(input_path)?;
    let analyzer = SlideAnalyzer::from_config(config);
    restyle_translate::analyze_deck(bytes, &analyzer)
        .with_context(|| format!("Failed to analyze {}", input_path.display()))
}

fn read_input(input_path: &Path) -> Result<Vec<u8>> {
    std::fs::read(input_path).with_context(|| format!("Failed to open {}", input_path.display()))
}

/// Render a preview as a plain-text table.
fn format_preview(preview: &DeckPreview) -> String {
    let mut out = String::new();
    for slide in &preview.slides {
        let contexts: Vec<&str> = slide.contexts.iter().map(|c| c.as_str()).collect();
        out.push_str(&format!(
            "Slide {:>3}  {:>3} units  {:>4} words  cost {:>4}  [{}]\n",
            slide.slide_number,
            slide.unit_count,
            slide.word_count,
            slide.estimated_cost,
            contexts.join(", ")
        ));
        if !slide.preview.is_empty() {
            out.push_str(&format!("           {}\n", slide.preview));
        }
    }
    out.push_str(&format!(
        "{} slides, estimated total cost {}\n",
        preview.total_slides, preview.total_cost
    ));
    out
}

/// Summarise a finished translation for stderr.
fn format_summary(report: &TranslationReport, output_path: &Path) -> String {
    let mut out = format!(
        "Restyled {} slide(s), written to: {}\n",
        report.translated_slides.len(),
        output_path.display()
    );
    if !report.failures.is_empty() {
        out.push_str(&format!(
            "  {} unit(s) kept their original text after a failed transform\n",
            report.failures.len()
        ));
    }
    if !report.gaps.is_empty() {
        out.push_str(&format!(
            "  {} unit(s) could not be matched back into their slide\n",
            report.gaps.len()
        ));
    }
    if !report.skipped_slides.is_empty() {
        let slides: Vec<String> = report.skipped_slides.iter().map(|n| n.to_string()).collect();
        out.push_str(&format!(
            "  Slide(s) {} skipped because they are not valid UTF-8 text\n",
            slides.join(", ")
        ));
    }
    if !report.rolled_back.is_empty() {
        let slides: Vec<String> = report.rolled_back.iter().map(|n| n.to_string()).collect();
        out.push_str(&format!(
            "  Slide(s) {} left unchanged because the rewrite broke their markup\n",
            slides.join(", ")
        ));
    }
    out
}

/// Determine the output path for a restyled deck.
fn get_output_path(input_path: &Path, output: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = output {
        return path.clone();
    }

    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("presentation.pptx");
    let output_filename = format!("translated_{}", filename);

    match input_path.parent() {
        Some(parent) => parent.join(output_filename),
        None => PathBuf::from(output_filename),
    }
}

/// Write the restyled deck.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use restyle_core::{SlidePreview, TextContext};
    use restyle_translate::UnitIssue;

    #[test]
    fn test_default_output_path() {
        let path = get_output_path(Path::new("decks/launch.pptx"), None);
        assert_eq!(path, PathBuf::from("decks/translated_launch.pptx"));
    }

    #[test]
    fn test_explicit_output_path() {
        let out = PathBuf::from("out/new.pptx");
        assert_eq!(get_output_path(Path::new("launch.pptx"), Some(&out)), out);
    }

    #[test]
    fn test_args_parse_translate() {
        let args = Args::try_parse_from([
            "restyle-deck",
            "translate",
            "deck.pptx",
            "--profile",
            "gen-z",
            "--slides",
            "1,3",
            "--concurrency",
            "2",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Command::Translate {
                profile,
                slides,
                concurrency,
                ..
            } => {
                assert_eq!(profile, "gen-z");
                assert_eq!(slides, "1,3");
                assert_eq!(concurrency, Some(2));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_translate_requires_slides() {
        let args = ["restyle-deck", "translate", "deck.pptx", "-p", "boomers"];
        assert!(Args::try_parse_from(args).is_err());
    }

    #[test]
    fn test_args_parse_text() {
        let args =
            Args::try_parse_from(["restyle-deck", "text", "-p", "gen-z", "Save more today"])
                .unwrap();

        match args.command {
            Command::Text {
                text,
                profile,
                timeout,
            } => {
                assert_eq!(text, "Save more today");
                assert_eq!(profile, "gen-z");
                assert_eq!(timeout, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_text_requires_profile() {
        assert!(Args::try_parse_from(["restyle-deck", "text", "hello"]).is_err());
    }

    #[test]
    fn test_format_preview() {
        let preview = DeckPreview {
            slides: vec![SlidePreview {
                slide_number: 1,
                unit_count: 2,
                word_count: 5,
                estimated_cost: 2,
                contexts: vec![TextContext::Title, TextContext::Body],
                preview: "Welcome | Hello there".to_string(),
            }],
            total_slides: 1,
            total_cost: 2,
        };

        let text = format_preview(&preview);
        assert!(text.contains("[title, body]"));
        assert!(text.contains("Welcome | Hello there"));
        assert!(text.ends_with("1 slides, estimated total cost 2\n"));
    }

    #[test]
    fn test_format_summary_lists_problems() {
        let report = TranslationReport {
            bytes: Vec::new(),
            translated_slides: vec![2, 4],
            failures: vec![UnitIssue {
                slide_number: 2,
                original: "Hi".to_string(),
            }],
            gaps: Vec::new(),
            rolled_back: vec![4],
            skipped_slides: vec![7],
        };

        let text = format_summary(&report, Path::new("out.pptx"));
        assert!(text.starts_with("Restyled 2 slide(s), written to: out.pptx"));
        assert!(text.contains("1 unit(s) kept their original text"));
        assert!(!text.contains("matched back"));
        assert!(text.contains("Slide(s) 4 left unchanged"));
        assert!(text.contains("Slide(s) 7 skipped"));
    }
}
