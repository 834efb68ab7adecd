//! StockGPT 后端服务
//!
//! 提供股票列表与公司行动（分红、拆股、配股、送股）采集的 RESTful API 服务
//! 数据来源：NSE 公司公告

mod config;     // 配置加载
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use std::sync::Arc;

use crate::config::{AppConfig, DataSources};
use crate::services::corporate_actions::{CorporateActionsCollector, HttpFetcher};

/// 应用程序入口
///
/// 加载配置、构建公司行动采集器并启动 HTTP 服务器
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_note) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 未设置时使用配置中的级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    log::info!("{}", config_note);

    let sources = DataSources::from_file(&config.collector.data_sources)
        .context("加载数据源配置失败")?;
    let fetcher = HttpFetcher::new(&config.api).context("创建 HTTP 客户端失败")?;
    let collector = CorporateActionsCollector::new(sources, Arc::new(fetcher), &config.collector.output_dir)
        .context("初始化公司行动采集器失败")?;
    let collector = web::Data::new(collector);

    let bind_addr = config.bind_addr();
    log::info!("启动 StockGPT 后端服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(collector.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;
    Ok(())
}
