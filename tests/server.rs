mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};

use object_store::path::Path;

use eurostat_sync::catalog::Catalog;
use eurostat_sync::config::MERGED_PATH;
use eurostat_sync::domain::DatasetDescriptor;
use eurostat_sync::error::EurostatError;
use eurostat_sync::pipeline::{Pipeline, RunResult};
use eurostat_sync::server::{RunJob, SUCCESS_MESSAGE, configure};
use eurostat_sync::sink::ObjectStoreSink;

use common::{FnStats, RecordingSink, catalog, response};

#[actix_web::test]
async fn on_demand_ignores_body_and_returns_success() {
    let job: RunJob = Arc::new(RunResult::default);
    let app = test::init_service(App::new().app_data(web::Data::new(job)).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/eurostat")
        .set_payload("{\"anything\": true}")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, SUCCESS_MESSAGE.as_bytes());
}

#[actix_web::test]
async fn empty_catalog_still_reports_success() {
    let pipeline = Arc::new(Pipeline::new(
        FnStats(|_: &DatasetDescriptor| Ok(response(&[("ES", "Spain")], &["2022"], &[(0, 1.0)]))),
        RecordingSink::default(),
    ));
    let job: RunJob = {
        let pipeline = Arc::clone(&pipeline);
        let catalog = Catalog::new(Vec::new()).unwrap();
        Arc::new(move || pipeline.run(&catalog))
    };
    let app = test::init_service(App::new().app_data(web::Data::new(job)).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/eurostat").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(pipeline.sink().paths().is_empty());
}

#[actix_web::test]
async fn partial_failure_is_still_success() {
    let pipeline = Arc::new(Pipeline::new(
        FnStats(|descriptor: &DatasetDescriptor| {
            if descriptor.code.as_str() == "ds1" {
                return Err(EurostatError::EurostatHttp("timed out".to_string()));
            }
            Ok(response(&[("ES", "Spain")], &["2022"], &[(0, 1.0)]))
        }),
        RecordingSink::default(),
    ));
    let job: RunJob = {
        let pipeline = Arc::clone(&pipeline);
        let catalog = catalog(3);
        Arc::new(move || pipeline.run(&catalog))
    };
    let app = test::init_service(App::new().app_data(web::Data::new(job)).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/eurostat").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(pipeline.sink().paths().len(), 3);
}

#[actix_web::test]
async fn panicking_run_returns_internal_error() {
    let job: RunJob = Arc::new(|| -> RunResult { panic!("defect") });
    let app = test::init_service(App::new().app_data(web::Data::new(job)).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/eurostat").to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = test::read_body(resp).await;
    assert!(body.starts_with("Error en la función".as_bytes()));
}

#[actix_web::test]
async fn timer_invocation_returns_host_envelope() {
    let job: RunJob = Arc::new(RunResult::default);
    let app = test::init_service(App::new().app_data(web::Data::new(job)).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::post().uri("/eurostat_timer").to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["ReturnValue"].is_null());
    assert!(body["Outputs"].is_object());
}

#[actix_web::test]
async fn object_store_sink_can_be_dropped_inside_the_server_runtime() {
    let pipeline = Arc::new(Pipeline::new(
        FnStats(|_: &DatasetDescriptor| Ok(response(&[("ES", "Spain")], &["2022"], &[(0, 1.0)]))),
        ObjectStoreSink::in_memory().unwrap(),
    ));
    let store = pipeline.sink().store();
    let job: RunJob = {
        let pipeline = Arc::clone(&pipeline);
        let catalog = catalog(2);
        Arc::new(move || pipeline.run(&catalog))
    };
    let app = test::init_service(App::new().app_data(web::Data::new(job)).configure(configure)).await;

    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/eurostat").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let merged = store.get(&Path::from(MERGED_PATH)).await.unwrap();
    assert!(!merged.bytes().await.unwrap().is_empty());

    drop(app);
    drop(pipeline);
}
