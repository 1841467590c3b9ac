//! Command-line front end for mood-based music search.
//!
//! Example:
//!   moodtunes --mood happy --energy 75 --happiness 80 --genre pop --genre electronic

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use moodtunes::query::{Genre, Mood};
use moodtunes::search::{search_with_config, SearchOptions, DEFAULT_RESULT_LIMIT};
use moodtunes::MusicQuery;

#[derive(Parser, Debug)]
#[command(name = "moodtunes", about = "Search MusicByMood for song recommendations")]
struct Args {
    /// Predefined mood button (happy, sad, energetic, relaxed, focused)
    #[arg(long)]
    mood: Option<Mood>,

    /// Energy level, 0 (calm) to 100 (energetic)
    #[arg(long)]
    energy: Option<u8>,

    /// Happiness level, 0 (melancholic) to 100 (joyful)
    #[arg(long)]
    happiness: Option<u8>,

    /// Genre filter, repeatable (e.g. --genre pop --genre "hip hop")
    #[arg(long = "genre")]
    genres: Vec<Genre>,

    /// Maximum number of songs to return
    #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
    limit: usize,

    /// Run with a visible browser window (for debugging selector drift)
    #[arg(long)]
    headful: bool,

    /// Print results as a JSON array instead of a numbered list
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let query = MusicQuery::new(args.mood, args.energy, args.happiness, args.genres)?;
    let options = SearchOptions {
        // --headful forces a visible window; otherwise config.yaml decides.
        headless: args.headful.then_some(false),
        limit: args.limit,
    };
    let config = moodtunes::load_yaml_config()?;

    let songs = search_with_config(&query, &options, &config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&songs)?);
        return Ok(());
    }

    if songs.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    for (i, song) in songs.iter().enumerate() {
        let artist = song.artist.as_deref().unwrap_or("");
        let link = song.link.as_deref().unwrap_or("");
        println!("{:02}. {} - {} {}", i + 1, song.title, artist, link);
    }

    Ok(())
}
