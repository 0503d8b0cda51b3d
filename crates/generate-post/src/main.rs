use anyhow::Result;
use clap::Parser;
use shared::{Config, Pipeline, PipelineError};

#[derive(Parser)]
#[command(name = "generate-post")]
#[command(about = "Turn an article or video URL into a ready-to-publish social post")]
struct Args {
    /// Article or video URLs to process
    #[arg(required = true)]
    urls: Vec<String>,

    /// Extract and normalize the content only; skip generation
    #[arg(long)]
    extract_only: bool,

    /// Per-strategy timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(timeout) = args.timeout {
        config.attempt_timeout_secs = timeout;
    }

    let pipeline = Pipeline::new(&config)?;

    let mut failures = 0;

    if args.extract_only {
        for url in &args.urls {
            println!("\n🌐 Extracting content from {}...", url);
            match pipeline.extract_text(url).await {
                Ok(extracted) => {
                    println!(
                        "✓ Extracted via {} in {} ms\n",
                        extracted.source_strategy, extracted.duration_ms
                    );
                    println!("{}", extracted.text.body);
                    if !extracted.text.hashtags.is_empty() {
                        println!("\n{}", extracted.text.hashtags.join(" "));
                    }
                }
                Err(e) => {
                    failures += 1;
                    report_failure(url, &e);
                }
            }
        }
    } else if args.urls.len() == 1 {
        let url = &args.urls[0];
        println!("\n🌐 Extracting content from {}...", url);
        println!("🤖 Generating post...");
        match pipeline.acquire_and_generate(url).await {
            Ok(post) => print_post(&post),
            Err(e) => {
                failures += 1;
                report_failure(url, &e);
            }
        }
    } else {
        println!("\n🌐 Processing {} URLs...", args.urls.len());
        let results = pipeline.process_urls_parallel(args.urls.clone()).await;

        for (url, result) in results {
            match result {
                Ok(post) => {
                    println!("\n━━━ {} ━━━", url);
                    print_post(&post);
                }
                Err(e) => {
                    failures += 1;
                    report_failure(&url, &e);
                }
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} URLs failed", failures, args.urls.len());
    }

    Ok(())
}

fn print_post(post: &shared::Post) {
    println!(
        "✓ Post generated with {} (extract {} ms via {}, generate {} ms)\n",
        post.metadata.model,
        post.metadata.extraction_ms,
        post.metadata.source_strategy,
        post.metadata.generation_ms
    );
    println!("{}", post.post_text);
    if !post.hashtags.is_empty() {
        println!("\n{}", post.hashtags.join(" "));
    }
}

fn report_failure(url: &str, error: &PipelineError) {
    match error {
        PipelineError::ExtractionFailed(attempts) => {
            println!("\n⚠ Could not extract content from {}:", url);
            for attempt in attempts {
                match &attempt.outcome {
                    shared::AttemptOutcome::Failure(reason) => println!(
                        "  ✗ {} ({} ms): {}",
                        attempt.strategy, attempt.duration_ms, reason
                    ),
                    shared::AttemptOutcome::TimedOut => println!(
                        "  ✗ {} timed out after {} ms",
                        attempt.strategy, attempt.timeout_ms
                    ),
                    shared::AttemptOutcome::Success => {}
                }
            }
        }
        other => println!("\n⚠ {} failed: {}", url, other),
    }
}
