use crate::rate_source::{FetchError, RateSource};
use crate::rates::{FetchedRate, RateMap};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Marker class of the reference rate table on the source page.
const TABLE_SELECTOR: &str = "table.forextable";

// EcbProvider implementation for RateSource
pub struct EcbProvider {
    url: String,
    timeout: Duration,
}

impl EcbProvider {
    pub fn new(url: &str, timeout: Duration) -> Self {
        EcbProvider {
            url: url.to_string(),
            timeout,
        }
    }
}

/// Extracts the rate table from the page body. Returns `None` when the
/// marker table is absent. The header row is skipped, cell text is trimmed,
/// rows with fewer than three cells are dropped, and a repeated currency
/// code keeps the last row.
fn parse_rate_table(body: &str) -> Option<RateMap> {
    // Static selectors, cannot fail to parse.
    let table_selector = Selector::parse(TABLE_SELECTOR).unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let document = Html::parse_document(body);
    let table = document.select(&table_selector).next()?;

    let mut rates = RateMap::new();
    for row in table.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if cells.len() < 3 {
            debug!("Skipping rate row with {} cells", cells.len());
            continue;
        }

        rates.insert(
            cells[0].clone(),
            FetchedRate {
                currency_name: cells[1].clone(),
                rate: cells[2].clone(),
            },
        );
    }

    Some(rates)
}

#[async_trait]
impl RateSource for EcbProvider {
    #[instrument(name = "RateTableFetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<RateMap, FetchError> {
        debug!("Requesting rate table from {}", self.url);

        let client = reqwest::Client::builder()
            .user_agent("fxdelta/0.1")
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        match parse_rate_table(&body) {
            Some(rates) => {
                debug!("Parsed {} rates from source table", rates.len());
                Ok(rates)
            }
            None => {
                warn!("No rate table found at {}", self.url);
                Err(FetchError::TableMissing)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub async fn create_mock_server(mock_response: &str, status: u16) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn rate_page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table class="forextable">
            <tr><th>Currency</th><th>Name</th><th>Spot</th></tr>
            {rows}
            </table>
            </body></html>"#
        )
    }

    #[tokio::test]
    async fn test_successful_table_fetch() {
        let page = rate_page(
            r#"<tr><td>USD</td><td>US Dollar</td><td>1.0856</td></tr>
               <tr><td>JPY</td><td>Japanese Yen</td><td>160.12</td></tr>"#,
        );
        let mock_server = create_mock_server(&page, 200).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let rates = provider.fetch().await.unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates["USD"].currency_name, "US Dollar");
        assert_eq!(rates["USD"].rate, "1.0856");
        assert_eq!(rates["JPY"].rate, "160.12");
    }

    #[tokio::test]
    async fn test_cell_text_is_trimmed() {
        let page = rate_page(
            "<tr><td>  USD \n</td><td>\t US Dollar </td><td> 1.0856\n</td></tr>",
        );
        let mock_server = create_mock_server(&page, 200).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let rates = provider.fetch().await.unwrap();

        assert_eq!(rates["USD"].currency_name, "US Dollar");
        assert_eq!(rates["USD"].rate, "1.0856");
    }

    #[tokio::test]
    async fn test_short_rows_are_skipped() {
        let page = rate_page(
            r#"<tr><td>USD</td><td>US Dollar</td><td>1.0856</td></tr>
               <tr><td>GBP</td><td>0.8421</td></tr>
               <tr><td>broken</td></tr>"#,
        );
        let mock_server = create_mock_server(&page, 200).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let rates = provider.fetch().await.unwrap();

        assert_eq!(rates.len(), 1);
        assert!(rates.contains_key("USD"));
    }

    #[tokio::test]
    async fn test_duplicate_code_keeps_last_row() {
        let page = rate_page(
            r#"<tr><td>USD</td><td>US Dollar</td><td>1.0800</td></tr>
               <tr><td>USD</td><td>US Dollar</td><td>1.0856</td></tr>"#,
        );
        let mock_server = create_mock_server(&page, 200).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let rates = provider.fetch().await.unwrap();

        assert_eq!(rates.len(), 1);
        assert_eq!(rates["USD"].rate, "1.0856");
    }

    #[tokio::test]
    async fn test_missing_table_is_table_missing() {
        let page = "<html><body><p>We have moved.</p></body></html>";
        let mock_server = create_mock_server(page, 200).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let result = provider.fetch().await;

        assert!(matches!(result, Err(FetchError::TableMissing)));
    }

    #[tokio::test]
    async fn test_wrong_table_class_is_table_missing() {
        let page = r#"<html><body>
            <table class="pricing">
            <tr><th>Code</th><th>Name</th><th>Rate</th></tr>
            <tr><td>USD</td><td>US Dollar</td><td>1.0856</td></tr>
            </table>
            </body></html>"#;
        let mock_server = create_mock_server(page, 200).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let result = provider.fetch().await;

        assert!(matches!(result, Err(FetchError::TableMissing)));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mock_server = create_mock_server("Service Unavailable", 503).await;

        let provider = EcbProvider::new(&mock_server.uri(), DEFAULT_TIMEOUT);
        let result = provider.fetch().await;

        match result {
            Err(FetchError::Status(status)) => assert_eq!(status.as_u16(), 503),
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_table() {
        let page = rate_page("");
        let rates = parse_rate_table(&page).unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_parse_header_cells_as_code_column() {
        // The source page marks the code cell up as <th>, not <td>.
        let page = rate_page("<tr><th>CHF</th><td>Swiss Franc</td><td>0.9612</td></tr>");
        let rates = parse_rate_table(&page).unwrap();
        assert_eq!(rates["CHF"].rate, "0.9612");
    }
}
