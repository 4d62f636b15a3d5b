use propval::AppCommand;
use propval::core::config::AppConfig;
use propval::core::investment::{LoanParameters, PaymentType};
use propval::core::quota::{QuotaState, QuotaStore, QuotaTracker, period_of};
use propval::store::disk::KvQuotaStore;
use propval::store::file::FileQuotaStore;
use rust_decimal_macros::dec;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

const ADDRESS: &str = "5500 Grand Lake Dr, San Antonio, TX 78244";
const API_KEY: &str = "integration-key";

mod test_utils {
    use super::{ADDRESS, API_KEY};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mount(server: &MockServer, url_path: &str, status: u16, body: &str, calls: u64) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .and(query_param("address", ADDRESS))
            .and(header("X-Api-Key", API_KEY))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    pub async fn create_rentcast_mock_server(status: u16, calls: u64) -> MockServer {
        let server = MockServer::start().await;
        mount(
            &server,
            "/avm/value",
            status,
            r#"{"price": 250000, "priceRangeLow": 230000, "priceRangeHigh": 270000}"#,
            calls,
        )
        .await;
        mount(
            &server,
            "/avm/rent/long-term",
            status,
            r#"{"rent": 1850, "rentRangeLow": 1700, "rentRangeHigh": 2000}"#,
            calls,
        )
        .await;
        server
    }
}

fn write_config(dir: &TempDir, base_url: &str, storage: &str) -> PathBuf {
    let data_path = dir.path().join("data");
    let config = format!(
        r#"
quota:
  max_calls: 5
  storage: {storage}
providers:
  rentcast:
    base_url: "{base_url}"
    api_key: "{API_KEY}"
data_path: "{}"
"#,
        data_path.display()
    );
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, config).expect("Failed to write config");
    config_path
}

fn file_tracker(config_path: &Path) -> QuotaTracker {
    let config = AppConfig::load_from_path(config_path).unwrap();
    QuotaTracker::new(
        Box::new(FileQuotaStore::new(config.quota_path().unwrap())),
        config.quota.max_calls,
    )
}

fn analyze(raw: bool) -> AppCommand {
    AppCommand::Analyze {
        address: ADDRESS.to_string(),
        show_raw: raw,
    }
}

#[test_log::test(tokio::test)]
async fn test_analyze_spends_one_call() {
    let server = test_utils::create_rentcast_mock_server(200, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &server.uri(), "file");

    propval::run_command(analyze(true), config_path.to_str())
        .await
        .unwrap();

    let state = file_tracker(&config_path).load();
    info!(?state, "Quota after analyze");
    assert_eq!(state.remaining, 4);
    assert_eq!(state.period, period_of(chrono::Utc::now()));
}

#[test_log::test(tokio::test)]
async fn test_failed_requests_still_spend_a_call() {
    let server = test_utils::create_rentcast_mock_server(500, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &server.uri(), "file");

    propval::run_command(analyze(false), config_path.to_str())
        .await
        .unwrap();

    assert_eq!(file_tracker(&config_path).load().remaining, 4);
}

#[test_log::test(tokio::test)]
async fn test_exhausted_quota_makes_no_requests() {
    let server = test_utils::create_rentcast_mock_server(200, 0).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &server.uri(), "file");

    let tracker = file_tracker(&config_path);
    tracker
        .persist(&QuotaState {
            remaining: 0,
            period: period_of(chrono::Utc::now()),
        })
        .unwrap();

    let err = propval::run_command(analyze(false), config_path.to_str())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Monthly API pull limit reached (5)"));
    assert_eq!(tracker.load().remaining, 0);
}

#[test_log::test(tokio::test)]
async fn test_legacy_counter_is_adopted() {
    let server = test_utils::create_rentcast_mock_server(200, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &server.uri(), "file");

    let quota_path = AppConfig::load_from_path(&config_path)
        .unwrap()
        .quota_path()
        .unwrap();
    fs::create_dir_all(quota_path.parent().unwrap()).unwrap();
    fs::write(&quota_path, r#"{"remaining": 3}"#).unwrap();

    propval::run_command(analyze(false), config_path.to_str())
        .await
        .unwrap();

    assert_eq!(file_tracker(&config_path).load().remaining, 2);
}

#[test_log::test(tokio::test)]
async fn test_analyze_with_kv_storage() {
    let server = test_utils::create_rentcast_mock_server(200, 2).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &server.uri(), "kv");

    for _ in 0..2 {
        propval::run_command(analyze(false), config_path.to_str())
            .await
            .unwrap();
    }

    let config = AppConfig::load_from_path(&config_path).unwrap();
    let store = KvQuotaStore::open(&config.quota_path().unwrap(), &config.quota.key).unwrap();
    let state = store.read().unwrap().expect("quota should be stored");
    assert_eq!(state.remaining, 3);
}

#[test_log::test(tokio::test)]
async fn test_quota_reset() {
    let server = test_utils::create_rentcast_mock_server(200, 1).await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &server.uri(), "file");

    propval::run_command(analyze(false), config_path.to_str())
        .await
        .unwrap();
    assert_eq!(file_tracker(&config_path).load().remaining, 4);

    propval::run_command(AppCommand::Quota { reset: false }, config_path.to_str())
        .await
        .unwrap();
    assert_eq!(file_tracker(&config_path).load().remaining, 4);

    propval::run_command(AppCommand::Quota { reset: true }, config_path.to_str())
        .await
        .unwrap();
    assert_eq!(file_tracker(&config_path).load().remaining, 5);
}

#[test_log::test(tokio::test)]
async fn test_missing_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let err = propval::run_command(analyze(false), missing.to_str())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config file"));
}

#[test_log::test(tokio::test)]
async fn test_invest_needs_no_config() {
    let params = LoanParameters {
        purchase_price: dec!(1000000),
        down_payment_percent: dec!(20),
        annual_interest_rate_percent: dec!(6.5),
        loan_term_years: 30,
        annual_rent_income: dec!(120000),
        annual_operating_expenses: dec!(40000),
        payment_type: PaymentType::InterestOnly,
    };

    propval::run_command(
        AppCommand::Invest {
            params,
            show_schedule: true,
        },
        Some("/nonexistent/config.yaml"),
    )
    .await
    .unwrap();
}
