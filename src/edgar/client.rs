// src/edgar/client.rs
use crate::edgar::models::{parse_filing_date, FilingSummary};
use crate::utils::error::EdgarError;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use reqwest::header;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

// IMPORTANT: Replace with your actual details or make configurable
const EDGAR_USER_AGENT: &str = "acq_miner research tool ops@acqminer.example";
// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
const EDGAR_REQUEST_DELAY_MS: u64 = 150;
const BASE_URL: &str = "https://www.sec.gov";
const MAX_PAGE_ITEMS: usize = 100;

static COMPANY_NAME_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span.companyName").expect("Failed to compile COMPANY_NAME_SELECTOR")
});
static RESULTS_TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.tableFile2").expect("Failed to compile RESULTS_TABLE_SELECTOR")
});
static DOC_TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"table[summary="Document Format Files"]"#)
        .expect("Failed to compile DOC_TABLE_SELECTOR")
});
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile CELL_SELECTOR"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to compile LINK_SELECTOR"));

/// Creates a reqwest client configured for EDGAR interaction.
fn build_edgar_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(EDGAR_USER_AGENT) // Set the required User-Agent
        .build()
}

/// A company looked up on EDGAR by CIK, able to page through its filings.
pub struct Company {
    pub cik: String,
    pub name: String,
    client: reqwest::Client,
}

impl Company {
    /// Fetches the browse-edgar company page and resolves the company
    /// name. An unknown CIK surfaces as `CompanyNotFound`.
    pub async fn fetch(cik: &str) -> Result<Self, EdgarError> {
        let client = build_edgar_client()?;
        let url = browse_url(cik);
        let body = get_text(&client, &url).await?;
        let name = parse_company_name(&body)
            .ok_or_else(|| EdgarError::CompanyNotFound(cik.to_string()))?;
        tracing::info!("resolved CIK {} to company '{}'", cik, name);
        Ok(Self {
            cik: cik.to_string(),
            name,
            client,
        })
    }

    /// Fetches one search-results page of filings dated at or before
    /// `prior_to` (empty = latest), in time-descending order.
    async fn search_page(&self, prior_to: &str) -> Result<Vec<FilingSummary>, EdgarError> {
        let url = format!(
            "{}&type=&dateb={}&owner=include&count={}",
            browse_url(&self.cik),
            prior_to,
            MAX_PAGE_ITEMS
        );
        let body = get_text(&self.client, &url).await?;
        Ok(parse_search_results(&body))
    }

    /// Pages backwards through the search results until filings become
    /// older than `since_date`, keeping the ones whose type is wanted.
    /// Results stay in time-descending order.
    pub async fn search_filings(
        &self,
        since_date: &str,
        prior_to: &str,
        filing_types: &[String],
    ) -> Result<Vec<FilingSummary>, EdgarError> {
        let since = parse_filing_date(since_date)?;
        let mut matched: Vec<FilingSummary> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor = prior_to.to_string();

        loop {
            let page = self.search_page(&cursor).await?;
            tracing::debug!("fetched {} result rows prior to '{}'", page.len(), cursor);
            if page.is_empty() {
                break;
            }
            match fold_results_page(page, since, filing_types, &mut seen, &mut matched) {
                Some(next_cursor) => cursor = next_cursor,
                None => break,
            }
            tracing::debug!("oldest item handled: {}", cursor);
        }
        Ok(matched)
    }

    /// Parses the "Filing Detail" page for the URLs of the document-format
    /// files whose type column equals `filing_type`.
    pub async fn document_urls(
        &self,
        detail_url: &str,
        filing_type: &str,
    ) -> Result<Vec<String>, EdgarError> {
        let body = get_text(&self.client, detail_url).await?;
        let urls = parse_document_urls(&body, filing_type);
        if urls.is_empty() {
            tracing::warn!("no document format files found in page: {}", detail_url);
        }
        Ok(urls)
    }

    /// Downloads all wanted filings between `since_date` and `prior_to`,
    /// oldest first, and writes the flat tab-delimited index
    /// (`TYPE\tDATE\tLOCAL_PATH\tSOURCE_URL`). Returns the index path.
    pub async fn download_documents(
        &self,
        since_date: &str,
        prior_to: &str,
        filing_types: &[String],
        root_dir: &Path,
    ) -> Result<PathBuf, EdgarError> {
        let filings = self
            .search_filings(since_date, prior_to, filing_types)
            .await?;
        let result_dir = root_dir.join(&self.cik);
        std::fs::create_dir_all(&result_dir)?;
        let index_path = result_dir.join("download.idx");
        let mut index = std::fs::File::create(&index_path)?;

        // oldest to latest, so the index reads chronologically
        for filing in filings.iter().rev() {
            let date_prefix: String = filing
                .filing_date
                .chars()
                .filter(|c| !matches!(c, ':' | '-' | '/' | '.'))
                .collect();
            for url in self
                .document_urls(&filing.detail_url, &filing.filing_type)
                .await?
            {
                let path = self
                    .download_document(&url, &result_dir, &date_prefix)
                    .await?;
                writeln!(
                    index,
                    "{}\t{}\t{}\t{}",
                    filing.filing_type,
                    filing.filing_date,
                    path.display(),
                    filing.detail_url
                )?;
            }
        }
        Ok(index_path)
    }

    async fn download_document(
        &self,
        url: &str,
        dir: &Path,
        prefix: &str,
    ) -> Result<PathBuf, EdgarError> {
        let basename = url.rsplit('/').next().unwrap_or("document.htm");
        let filename = if prefix.is_empty() {
            basename.to_string()
        } else {
            format!("{}_{}", prefix.trim(), basename)
        };
        let path = dir.join(filename);

        tokio::time::sleep(Duration::from_millis(EDGAR_REQUEST_DELAY_MS)).await;
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/xml,text/html,text/plain,*/*")
            .send()
            .await?;
        let response = check_status(url, response)?;
        let bytes = response.bytes().await?;
        std::fs::write(&path, &bytes)?;
        tracing::info!("downloaded {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

fn browse_url(cik: &str) -> String {
    format!("{BASE_URL}/cgi-bin/browse-edgar?action=getcompany&CIK={cik}")
}

/// Folds one results page into `matched`, keeping rows whose type is
/// wanted. Returns the cursor for the next page, or `None` when paging
/// must stop: either the page reached dates older than `since`, or no
/// row date parsed at all. A page that cannot move the cursor would be
/// re-fetched identically forever, so it ends the search instead.
fn fold_results_page(
    page: Vec<FilingSummary>,
    since: NaiveDateTime,
    filing_types: &[String],
    seen: &mut HashSet<String>,
    matched: &mut Vec<FilingSummary>,
) -> Option<String> {
    let mut cursor = None;
    for filing in page {
        let date = match parse_filing_date(&filing.filing_date) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!("unparseable filing date, skipping row: {}", e);
                continue;
            }
        };
        if date < since {
            return None;
        }
        cursor = Some(date.format("%Y/%m/%d").to_string());
        let row_type = filing.filing_type.trim().to_string();
        if filing_types.iter().any(|wanted| wanted.contains(&row_type))
            && seen.insert(filing.detail_url.clone())
        {
            matched.push(filing);
        }
    }
    if cursor.is_none() {
        tracing::warn!("no parseable filing date on this results page, ending search");
    }
    cursor
}

/// Issues a GET with the polite delay and returns the body text.
async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, EdgarError> {
    tokio::time::sleep(Duration::from_millis(EDGAR_REQUEST_DELAY_MS)).await;
    tracing::debug!("fetching {}", url);
    let response = client.get(url).send().await?;
    let response = check_status(url, response)?;
    Ok(response.text().await?)
}

fn check_status(url: &str, response: reqwest::Response) -> Result<reqwest::Response, EdgarError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    tracing::error!("HTTP error status: {} for URL: {}", status, url);
    if status == reqwest::StatusCode::FORBIDDEN {
        tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
        return Err(EdgarError::RateLimited);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(EdgarError::FilingDocNotFound(url.to_string()));
    }
    Err(EdgarError::Http(status))
}

/// Pulls the company name out of `span.companyName`, which reads like
/// "Sherman Health Systems (Filer) CIK#: 0001287865".
fn parse_company_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let span = document.select(&COMPANY_NAME_SELECTOR).next()?;
    let info = span.text().collect::<String>();
    let name = match info.find("CIK#") {
        Some(pos) => info[..pos].trim().to_string(),
        None => {
            tracing::warn!("failed to cut company name at CIK marker: {}", info.trim());
            info.trim().to_string()
        }
    };
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parses the `tableFile2` search-results table. Rows with fewer than five
/// cells (headers, separators) are skipped.
fn parse_search_results(html: &str) -> Vec<FilingSummary> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&RESULTS_TABLE_SELECTOR).next() else {
        return Vec::new();
    };
    let mut filings = Vec::new();
    for row in table.select(&ROW_SELECTOR) {
        let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
        if cells.len() < 5 {
            continue;
        }
        // the detail-page url is the first hyperlink in the row
        let Some(href) = cells[1]
            .select(&LINK_SELECTOR)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        filings.push(FilingSummary {
            filing_type: cell_text(cells[0]),
            detail_url: format!("{BASE_URL}{href}"),
            description: cell_text(cells[2]),
            filing_date: cell_text(cells[3]),
            filing_number: cell_text(cells[4]),
        });
    }
    filings
}

/// Parses the "Document Format Files" table of a Filing Detail page and
/// returns the URLs whose document-type column equals `filing_type`.
fn parse_document_urls(html: &str, filing_type: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&DOC_TABLE_SELECTOR).next() else {
        return Vec::new();
    };
    let mut urls = Vec::new();
    for row in table.select(&ROW_SELECTOR) {
        let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
        if cells.len() < 5 {
            continue;
        }
        let Some(href) = cells[2]
            .select(&LINK_SELECTOR)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        if cell_text(cells[3]) == filing_type {
            urls.push(format!("{BASE_URL}{href}"));
        }
    }
    urls
}
