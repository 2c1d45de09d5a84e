use std::time::Duration;

use pbmc_core::control::CellTypeQuery;
use pbmc_core::query::UpstreamUrls;
use pbmc_core::upstream::{Fetch, HttpFetcher, HttpFetcherConfig};
use pbmc_core::{PbmcControlPlane, QueryError};
use pbmc_model::{CellTypeBroad, CellTypeFine, Disease, FilterSet};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> HttpFetcher {
    let config = HttpFetcherConfig::new().with_timeout(Duration::from_secs(5));
    HttpFetcher::new(&config).expect("http client")
}

#[tokio::test]
async fn error_status_is_reported_with_its_code() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pathways"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/pathways", mock_server.uri());
    let err = fetcher().get_json(&url).await.expect_err("503");

    assert_eq!(err, QueryError::UpstreamStatus { status: 503 });
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn non_json_body_is_a_transport_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/degs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/degs", mock_server.uri());
    let err = fetcher().get_json(&url).await.expect_err("not json");

    assert!(matches!(err, QueryError::Transport(_)));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let err = fetcher()
        .get_json("http://127.0.0.1:1/api/pathways")
        .await
        .expect_err("connection refused");

    assert!(matches!(err, QueryError::Transport(_)));
}

#[tokio::test]
async fn pathways_run_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pathways"))
        .and(query_param("cell_type", "Treg"))
        .and(query_param("resolution", "fine"))
        .and(query_param("disease", "covid-19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "pathway_decription": "T cell activation",
                "pathway_id": "GO:0042110",
                "score": 3.2,
                "p_value": 0.0001,
                "cell_type": "Treg",
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pathways"))
        .and(query_param("cell_type", "T cell"))
        .and(query_param("resolution", "broad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let control = PbmcControlPlane::new(
        fetcher(),
        UpstreamUrls::new(format!("{base}/api"), format!("{base}/docs")),
    );
    let query = CellTypeQuery::new(FilterSet::new(Disease::Covid19))
        .with_fine([CellTypeFine::Treg])
        .with_broad([CellTypeBroad::TCell]);

    let result = control.pathways(query).await.expect("pathways");

    assert_eq!(
        serde_json::to_value(&result).expect("serialize"),
        json!({
            "fine": [{
                "cell_type": "Treg",
                "pathways": [{
                    "pathway_description": "T cell activation",
                    "pathway_id": "GO:0042110",
                    "score": 3.2,
                    "p_value": 0.0001,
                    "cell_type": "Treg",
                }],
            }],
            "broad": [{ "cell_type": "T cell", "pathways": [] }],
        })
    );
}
