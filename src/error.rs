use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 上游无法解析该标识符（消息来自平台注册表，按平台与实体类型区分）
    #[error("{0}")]
    NotFound(String),

    /// 参数校验错误（如平台要求纯数字 ID、颜色格式非法）
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 上游平台返回非成功状态或响应格式异常
    #[error("上游错误: {0}")]
    Upstream(String),

    /// 上游请求超时（超时策略由平台客户端负责，这里只做透传）
    #[error("请求超时: {0}")]
    Timeout(String),

    /// 图像渲染错误（派生数据缺失、SVG 解析失败、PNG 编码失败）
    #[error("图像渲染错误: {0}")]
    ImageRendererError(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// RFC7807 风格的错误响应（Problem Details）。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Not Found")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 404)]
    pub status: u16,

    /// 人类可读的详细信息（尽量稳定，不建议依赖解析）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "NOT_FOUND")]
    pub code: String,

    /// 可选：请求追踪 ID。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ImageRendererError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Timeout(_) => "UPSTREAM_TIMEOUT",
            AppError::ImageRendererError(_) => "IMAGE_RENDER_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::UNPROCESSABLE_ENTITY => "Render Failed",
            StatusCode::BAD_GATEWAY => "Bad Gateway",
            StatusCode::GATEWAY_TIMEOUT => "Gateway Timeout",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Upstream(format!("响应格式异常: {err}"))
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}
