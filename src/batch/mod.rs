use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::Fetcher;
use crate::utils::{is_supported_url, sanitize_title};
use crate::{ConverterError, Result};

/// Outcome of a single batch item
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    /// URL this item was created for
    pub url: String,

    /// Whether the MP3 landed at its destination
    pub success: bool,

    /// Failure detail, including captured tool diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated view over a finished batch
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub total: usize,
    pub elapsed_secs: f64,
    pub results: Vec<DownloadResult>,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &DownloadResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Read a URL list file into a deduplicated set of valid URLs
///
/// Blank lines are skipped; invalid lines are warned about and counted
/// but never abort the read. Returns the set plus the invalid count.
pub fn read_batch(path: &Path) -> Result<(HashSet<String>, usize)> {
    if !path.exists() {
        return Err(ConverterError::NotFound(path.display().to_string()).into());
    }

    let content = fs_err::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;

    let mut urls = HashSet::new();
    let mut invalid = 0;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if is_supported_url(line) {
            urls.insert(line.to_string());
        } else {
            tracing::warn!("Line {}: not a supported video URL: {}", lineno + 1, line);
            invalid += 1;
        }
    }

    Ok((urls, invalid))
}

/// Applies the fetcher to every URL in a batch, isolating failures
///
/// One worker by default; `jobs > 1` switches to a bounded pool. Either
/// way a failing item only produces a failed [`DownloadResult`], never
/// an aborted batch.
pub struct BatchRunner {
    fetcher: Arc<dyn Fetcher>,
    output_dir: PathBuf,
    jobs: usize,
}

impl BatchRunner {
    pub fn new(fetcher: Arc<dyn Fetcher>, output_dir: PathBuf, jobs: usize) -> Self {
        Self {
            fetcher,
            output_dir,
            jobs: jobs.max(1),
        }
    }

    pub async fn run(&self, urls: HashSet<String>) -> BatchReport {
        let started = Instant::now();

        let results = if self.jobs == 1 {
            self.run_sequential(urls).await
        } else {
            self.run_concurrent(urls).await
        };

        let succeeded = results.iter().filter(|r| r.success).count();
        BatchReport {
            succeeded,
            total: results.len(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            results,
        }
    }

    /// Resolve the destination for one URL and fetch it
    ///
    /// Every error is converted into the result entry here, at the item
    /// boundary.
    async fn process_one(fetcher: &dyn Fetcher, output_dir: &Path, url: String) -> DownloadResult {
        let title = fetcher.resolve_title(&url).await;
        let dest = output_dir.join(format!("{}.mp3", sanitize_title(&title)));

        match fetcher.fetch(&url, &dest).await {
            Ok(()) => DownloadResult {
                url,
                success: true,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Download failed for {}: {:#}", url, e);
                DownloadResult {
                    url,
                    success: false,
                    error: Some(format!("{:#}", e)),
                }
            }
        }
    }

    async fn run_sequential(&self, urls: HashSet<String>) -> Vec<DownloadResult> {
        let progress = ProgressBar::new(urls.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=> "),
        );

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            progress.set_message(url.clone());
            results.push(Self::process_one(self.fetcher.as_ref(), &self.output_dir, url).await);
            progress.inc(1);
        }

        progress.finish_and_clear();
        results
    }

    /// Bounded worker pool; results arrive in completion order
    async fn run_concurrent(&self, urls: HashSet<String>) -> Vec<DownloadResult> {
        let limiter = Arc::new(Semaphore::new(self.jobs));
        let progress = ProgressBar::new(urls.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap()
                .progress_chars("=> "),
        );

        let mut tasks = JoinSet::new();
        for url in urls {
            let fetcher = Arc::clone(&self.fetcher);
            let output_dir = self.output_dir.clone();
            let limiter = Arc::clone(&limiter);

            tasks.spawn(async move {
                let _permit = limiter.acquire_owned().await.expect("semaphore closed");
                Self::process_one(fetcher.as_ref(), &output_dir, url).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    progress.inc(1);
                    results.push(result);
                }
                Err(e) => tracing::error!("Worker task panicked: {}", e),
            }
        }

        progress.finish_and_clear();
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;

    struct StubFetcher {
        fail_on: Option<String>,
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn resolve_title(&self, url: &str) -> String {
            format!("stub {}", url.rsplit('/').next().unwrap_or("x"))
        }

        async fn fetch(&self, url: &str, _dest: &Path) -> Result<()> {
            if self.fail_on.as_deref() == Some(url) {
                anyhow::bail!("stub failure for {}", url);
            }
            Ok(())
        }
    }

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn three_urls() -> HashSet<String> {
        ["https://youtu.be/a", "https://youtu.be/b", "https://youtu.be/c"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_read_batch_dedup_and_invalid_count() {
        let file = write_lines(&["https://youtu.be/a", "", "bad-url", "https://youtu.be/a"]);

        let (urls, invalid) = read_batch(file.path()).unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://youtu.be/a"));
        assert_eq!(invalid, 1);
    }

    #[test]
    fn test_read_batch_trims_lines() {
        let file = write_lines(&["  https://youtu.be/a  ", "\thttps://youtu.be/b"]);

        let (urls, invalid) = read_batch(file.path()).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://youtu.be/a"));
        assert_eq!(invalid, 0);
    }

    #[test]
    fn test_read_batch_missing_file() {
        let err = read_batch(Path::new("/no/such/batch.txt")).unwrap_err();
        let typed = err.downcast_ref::<ConverterError>().expect("typed error");
        assert!(matches!(typed, ConverterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_run_isolates_single_failure() {
        let fetcher = Arc::new(StubFetcher {
            fail_on: Some("https://youtu.be/b".to_string()),
        });
        let runner = BatchRunner::new(fetcher, PathBuf::from("/tmp"), 1);

        let report = runner.run(three_urls()).await;
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed().count(), 1);

        let failed = report.failed().next().unwrap();
        assert_eq!(failed.url, "https://youtu.be/b");
        assert!(failed.error.as_deref().unwrap().contains("stub failure"));
    }

    #[tokio::test]
    async fn test_run_concurrent_isolates_single_failure() {
        let fetcher = Arc::new(StubFetcher {
            fail_on: Some("https://youtu.be/b".to_string()),
        });
        let runner = BatchRunner::new(fetcher, PathBuf::from("/tmp"), 3);

        let report = runner.run(three_urls()).await;
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert!(!report.all_succeeded());
    }

    #[tokio::test]
    async fn test_run_all_succeed() {
        let fetcher = Arc::new(StubFetcher { fail_on: None });
        let runner = BatchRunner::new(fetcher, PathBuf::from("/tmp"), 1);

        let report = runner.run(three_urls()).await;
        assert!(report.all_succeeded());
        assert_eq!(report.succeeded, 3);
    }
}
