use crate::error::Result;
use crate::registry::{DatasetSpec, DownloadPlan};
use regex::Regex;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Resolves a dataset's download plan to the full list of URLs, in
/// download order. Static plans join file names onto the base URL;
/// scraped plans fetch the index page and collect every regex match.
pub fn resolve_urls(spec: &DatasetSpec) -> Result<Vec<String>> {
    match &spec.download {
        DownloadPlan::Static { base, files } => Ok(files
            .iter()
            .map(|file| format!("{}{}", base, file))
            .collect()),
        DownloadPlan::Scraped {
            page,
            base,
            patterns,
        } => {
            let html = client()?.get(*page).send()?.error_for_status()?.text()?;
            let mut urls = Vec::new();
            for pattern in *patterns {
                let regex = Regex::new(pattern)?;
                for capture in regex.captures_iter(&html) {
                    if let Some(url) = capture.name("url") {
                        urls.push(format!("{}{}", base, url.as_str()));
                    }
                }
            }
            Ok(urls)
        }
    }
}

/// Downloads every declared URL for a dataset into its directory,
/// streaming each response body straight to disk.
pub fn download(spec: &DatasetSpec, dir: &Path) -> Result<()> {
    let client = client()?;
    for url in resolve_urls(spec)? {
        copy_url(&client, &url, dir)?;
    }
    info!(dataset = spec.id, "download complete");
    Ok(())
}

fn client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(600))
        .build()?)
}

fn copy_url(client: &reqwest::blocking::Client, url: &str, dir: &Path) -> Result<()> {
    let filename = url.rsplit('/').next().unwrap_or(url);
    let path = dir.join(filename);
    info!(url, file = filename, "downloading");

    let mut response = client.get(url).send()?.error_for_status()?;
    let mut file = File::create(&path)?;
    io::copy(&mut response, &mut file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn static_plan_joins_base_and_files() {
        let spec = registry::get("bls:ce").expect("registered");
        let urls = resolve_urls(spec).expect("resolve");
        assert_eq!(urls.len(), 7);
        assert_eq!(
            urls[0],
            "https://download.bls.gov/pub/time.series/ce/ce.data.0.AllCESSeries"
        );
        assert!(urls.iter().all(|u| u.starts_with("https://")));
    }

    #[test]
    fn scrape_patterns_capture_urls() {
        // Exercise the capture logic without the network.
        let html = r#"<a href="cew/data/files/2016/csv/2016_qtrly_by_industry.zip">2016</a>"#;
        let regex = Regex::new(
            r"(?P<url>cew/data/files/[0-9]{4}/csv/(?P<year>[0-9]{4})_qtrly_by_industry\.zip)",
        )
        .expect("pattern");
        let url = regex
            .captures(html)
            .and_then(|c| c.name("url"))
            .map(|m| m.as_str().to_string());
        assert_eq!(
            url.as_deref(),
            Some("cew/data/files/2016/csv/2016_qtrly_by_industry.zip")
        );
    }
}
