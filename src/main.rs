use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use podconverge::{
    FsObjectStore, NoopReporter, ProgressEvent, ProgressReporter, PublishOptions,
    SharedProgressReporter, load_declaration, publish_podcast,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static UPLOAD: Emoji<'_, '_> = Emoji("📤 ", "[^] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
static CLOCK: Emoji<'_, '_> = Emoji("⏳ ", "[.] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");

/// Generate and publish a podcast RSS feed from a declaration
#[derive(Parser, Debug)]
#[command(name = "podconverge")]
#[command(about = "Generate and publish a podcast RSS feed from a declaration")]
#[command(version)]
struct Args {
    /// Path to the podcast declaration (JSON)
    declaration: PathBuf,

    /// Directory holding the object store buckets
    #[arg(short = 's', long, default_value = "./storage")]
    storage_root: PathBuf,

    /// Where to write the generated feed document
    #[arg(short, long, default_value = "podcast.xml")]
    output: PathBuf,

    /// Generate the feed without uploading anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Upload every episode even when storage already has it
    #[arg(short, long)]
    force: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    main_bar: ProgressBar,
    upload_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        let upload_style = ProgressStyle::default_bar()
            .template(&format!("  {UPLOAD}[{{bar:30.cyan/blue}}] {{pos}}/{{len}} {{wide_msg}}"))
            .map(|style| style.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let upload_bar = multi.add(ProgressBar::hidden());
        upload_bar.set_style(upload_style);

        Self {
            main_bar,
            upload_bar,
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::DeclarationNormalized {
                podcast_title,
                total_episodes,
            } => {
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} • {} episodes declared",
                    podcast_title.bold().green(),
                    total_episodes.to_string().cyan()
                ));
            }

            ProgressEvent::FetchingRemoteState { bucket } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Listing bucket: {}", bucket.cyan()));
            }

            ProgressEvent::RemoteStateFetched { valid_records } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}{} episodes already in storage",
                    valid_records.to_string().cyan()
                ));
            }

            ProgressEvent::MetadataDrift {
                episode_number,
                key,
                field,
                remote,
                declared,
            } => {
                self.main_bar.println(format!(
                    "{WARNING}Episode {} ({}): stored {} {} differs from declared {}",
                    episode_number.to_string().yellow(),
                    key.dimmed(),
                    field,
                    remote.red(),
                    declared.green()
                ));
            }

            ProgressEvent::EpisodePending {
                episode_number,
                episode_title,
                pub_date,
            } => {
                self.main_bar.println(format!(
                    "{CLOCK}Episode {} {} is scheduled for {}",
                    episode_number.to_string().cyan(),
                    truncate_title(&episode_title, 40),
                    pub_date.yellow()
                ));
            }

            ProgressEvent::PlanReady {
                to_upload,
                already_persisted,
                eligible,
            } => {
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} to upload, {} in storage, {} in feed",
                    to_upload.to_string().yellow(),
                    already_persisted.to_string().cyan(),
                    eligible.to_string().green()
                ));
            }

            ProgressEvent::FeedAssembled { items } => {
                self.main_bar.set_message(format!(
                    "{SUCCESS}Feed assembled with {} items",
                    items.to_string().green()
                ));
            }

            ProgressEvent::FeedWritten { path } => {
                self.main_bar.println(format!(
                    "{FOLDER}Feed written to {}",
                    path.display().to_string().cyan()
                ));
            }

            ProgressEvent::UploadStarting {
                episode_title,
                key,
                upload_index,
                total_to_upload,
                ..
            } => {
                self.upload_bar.set_length(total_to_upload as u64);
                self.upload_bar.set_position(upload_index as u64);
                self.upload_bar.set_message(format!(
                    "{} {}",
                    truncate_title(&episode_title, 40),
                    key.dimmed()
                ));
            }

            ProgressEvent::UploadCompleted { episode_title, .. } => {
                self.upload_bar.inc(1);
                self.upload_bar.println(format!(
                    "  {SUCCESS}{}",
                    truncate_title(&episode_title, 40).green()
                ));
            }

            ProgressEvent::UploadsSkipped { count } => {
                self.main_bar.println(format!(
                    "{WARNING}Dry run: skipping {} episode uploads",
                    count.to_string().yellow()
                ));
            }

            ProgressEvent::DocumentUploaded { name } => {
                self.upload_bar.finish_and_clear();
                self.main_bar
                    .set_message(format!("{UPLOAD}Uploaded feed as {}", name.cyan()));
            }

            ProgressEvent::CacheInvalidation { command } => {
                self.main_bar.println(format!(
                    "{WARNING}Invalidate the CDN cache with:\n    {}",
                    command.bold()
                ));
            }

            ProgressEvent::PublishCompleted {
                uploaded_count,
                persisted_count,
                pending_count,
                item_count,
            } => {
                self.upload_bar.finish_and_clear();
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} items, {} uploaded, {} already stored, {} scheduled",
                    "Publish complete:".bold().green(),
                    item_count.to_string().green().bold(),
                    uploaded_count.to_string().green(),
                    persisted_count.to_string().cyan(),
                    pending_count.to_string().yellow()
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podconverge".bold().magenta(),
            "- Podcast Feed Publisher".dimmed()
        );
    }

    let declaration = load_declaration(&args.declaration)
        .with_context(|| format!("Failed to load {}", args.declaration.display()))?;

    let store = FsObjectStore::new(&args.storage_root);

    let options = PublishOptions {
        force_upload: args.force,
        dry_run: args.dry_run,
        output_path: args.output.clone(),
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let result = publish_podcast(&store, &declaration, &options, reporter, Utc::now())
        .await
        .context("Failed to publish podcast")?;

    if args.quiet
        && let Some(command) = &result.invalidation_command
    {
        println!("{command}");
    }

    Ok(())
}
