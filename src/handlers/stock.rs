use actix_web::{web, HttpResponse, Result};
use std::io::ErrorKind;

use crate::error::PersistError;
use crate::models::{
    ActionsBundle, ApiResponse, CorporateActionsResponse, PersistQuery, PersistResponse,
};
use crate::services::corporate_actions::{CorporateActionsCollector, PersistFormat};
use crate::services::stock_service;

fn invalid_symbol(raw: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!("无效的股票代码: {}", raw)))
}

pub async fn list_stocks() -> Result<HttpResponse> {
    let response = ApiResponse::success(stock_service::list_stocks());
    Ok(HttpResponse::Ok().json(response))
}

/// 采集公司行动（不落盘）
pub async fn get_corporate_actions(
    collector: web::Data<CorporateActionsCollector>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let raw = path.into_inner();
    let Some(symbol) = stock_service::normalize_symbol(&raw) else {
        return Ok(invalid_symbol(&raw));
    };

    let (report, bundle) = collector.collect_report(&symbol).await;
    match bundle {
        Some(actions) => {
            let response = ApiResponse::success(CorporateActionsResponse {
                symbol,
                resolved_symbol: report.resolved_symbol.clone(),
                actions,
                report,
            });
            Ok(HttpResponse::Ok().json(response))
        }
        None => {
            let message = format!("未找到 {} 的任何公司行动数据", symbol);
            Ok(HttpResponse::NotFound().json(ApiResponse::error_with_data(message, report)))
        }
    }
}

/// 采集公司行动并落盘
pub async fn save_corporate_actions(
    collector: web::Data<CorporateActionsCollector>,
    path: web::Path<String>,
    query: web::Query<PersistQuery>,
) -> Result<HttpResponse> {
    let raw = path.into_inner();
    let Some(symbol) = stock_service::normalize_symbol(&raw) else {
        return Ok(invalid_symbol(&raw));
    };

    // 先校验格式，避免无意义的网络请求
    let format_name = query.format.clone().unwrap_or_else(|| "json".to_string());
    let format = match format_name.parse::<PersistFormat>() {
        Ok(format) => format,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string())));
        }
    };

    let bundle = match collector.collect(&symbol).await {
        Ok(bundle) => bundle,
        Err(e) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error(e.to_string())));
        }
    };

    match collector.persist(&bundle, &symbol, format.as_str()) {
        Ok(files) => {
            let response = ApiResponse::success(PersistResponse {
                symbol,
                format: format.as_str().to_string(),
                files: files.iter().map(|p| p.display().to_string()).collect(),
            });
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::error!("保存 {} 的公司行动数据失败: {}", symbol, e);
            let response = ApiResponse::<()>::error(e.to_string());
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

/// 读取已保存的公司行动
pub async fn get_saved_corporate_actions(
    collector: web::Data<CorporateActionsCollector>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let raw = path.into_inner();
    let Some(symbol) = stock_service::normalize_symbol(&raw) else {
        return Ok(invalid_symbol(&raw));
    };

    match collector.load(&symbol) {
        Ok(bundle) => Ok(HttpResponse::Ok().json(ApiResponse::success(bundle))),
        Err(PersistError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            let response =
                ApiResponse::<ActionsBundle>::error(format!("{} 没有已保存的公司行动数据", symbol));
            Ok(HttpResponse::NotFound().json(response))
        }
        Err(e) => {
            let response = ApiResponse::<ActionsBundle>::error(e.to_string());
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stocks")
            .route("", web::get().to(list_stocks))
            .route("/{symbol}/corporate-actions", web::get().to(get_corporate_actions))
            .route("/{symbol}/corporate-actions", web::post().to(save_corporate_actions))
            .route(
                "/{symbol}/corporate-actions/saved",
                web::get().to(get_saved_corporate_actions),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataSources;
    use crate::error::FetchError;
    use crate::services::corporate_actions::{FetchedPage, Fetcher};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// 只有 bonus 数据源有数据，其余返回 404
    struct BonusOnlyFetcher;

    #[async_trait]
    impl Fetcher for BonusOnlyFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            if url.contains("bonus") {
                Ok(FetchedPage {
                    status: 200,
                    body: r#"[{"subject": "Bonus 1:1", "exDate": "31-May-2018"}]"#.to_string(),
                })
            } else {
                Err(FetchError::HttpStatus(404))
            }
        }
    }

    fn collector(dir: &std::path::Path) -> web::Data<CorporateActionsCollector> {
        let sources: DataSources = serde_json::from_value(serde_json::json!({
            "nse_symbols": {"INFY": "INFY.NS"},
            "corporate_actions": {
                "dividends": "https://nse.test/dividends/{symbol}",
                "splits": "https://nse.test/splits/{symbol}",
                "rights": "https://nse.test/rights/{symbol}",
                "bonus": "https://nse.test/bonus/{symbol}"
            }
        }))
        .unwrap();
        let collector =
            CorporateActionsCollector::new(sources, Arc::new(BonusOnlyFetcher), dir).unwrap();
        web::Data::new(collector)
    }

    #[actix_web::test]
    async fn test_list_stocks() {
        let app = test::init_service(App::new().configure(config)).await;
        let req = test::TestRequest::get().uri("/stocks").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["data"].as_array().unwrap().len(), 5);
    }

    #[actix_web::test]
    async fn test_get_corporate_actions() {
        let tmp = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(collector(tmp.path())).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/infy/corporate-actions").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["symbol"], "INFY");
        assert_eq!(body["data"]["resolved_symbol"], "INFY.NS");
        assert_eq!(body["data"]["actions"]["bonus"][0]["ratio"], "1:1");
        assert!(body["data"]["actions"].get("dividends").is_none());
        assert_eq!(body["data"]["report"]["kinds"][0]["status"], "http_status");
    }

    #[actix_web::test]
    async fn test_invalid_symbol_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(collector(tmp.path())).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/A%2FB/corporate-actions").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let app = test::init_service(App::new().app_data(collector(tmp.path())).configure(config)).await;

        let req = test::TestRequest::get().uri("/stocks/INFY/corporate-actions/saved").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/stocks/INFY/corporate-actions?format=xml")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);

        let req = test::TestRequest::post().uri("/stocks/INFY/corporate-actions").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["format"], "json");
        assert_eq!(body["data"]["files"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/stocks/INFY/corporate-actions/saved").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["bonus"].as_array().unwrap().len(), 1);
    }
}
