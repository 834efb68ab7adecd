//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod corporate_actions; // 公司行动数据服务
pub mod stock_service;     // 股票列表服务
