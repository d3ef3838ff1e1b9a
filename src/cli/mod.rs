use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vid2aud",
    about = "Convert online videos to local MP3 files using yt-dlp and ffmpeg",
    version,
    long_about = "A CLI tool that fetches a video's audio track with yt-dlp and stores it \
as an MP3. Pass a URL, run with no arguments for an interactive prompt, or point it at a \
file of URLs for batch processing with per-item failure reporting."
)]
pub struct Cli {
    /// Video URL to convert (prompts on stdin if omitted)
    #[arg(value_name = "URL", conflicts_with = "file")]
    pub url: Option<String>,

    /// Read URLs from a file, one per line, and process them as a batch
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Directory for finished MP3s (defaults to config, then current dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Parallel downloads in batch mode (1 = sequential)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the batch report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_file_conflict() {
        let parsed = Cli::try_parse_from(["vid2aud", "https://youtu.be/a", "-f", "list.txt"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_batch_flags() {
        let cli = Cli::try_parse_from(["vid2aud", "-f", "list.txt", "-j", "4", "--json"]).unwrap();
        assert_eq!(cli.file.unwrap(), PathBuf::from("list.txt"));
        assert_eq!(cli.jobs, Some(4));
        assert!(cli.json);
    }
}
