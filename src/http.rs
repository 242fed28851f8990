use once_cell::sync::OnceCell;
use reqwest::Client;

/// 全局复用的上游 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// 说明：
/// - 超时按平台配置在单个请求上设置（`RequestBuilder::timeout`），这里不设全局超时；
/// - 首次初始化时的 User-Agent 生效，之后的调用复用同一实例。
static UPSTREAM_CLIENT: OnceCell<Client> = OnceCell::new();

/// 请求上游平台 API 使用的共享 Client
pub fn upstream_client(user_agent: &str) -> Result<&'static Client, reqwest::Error> {
    UPSTREAM_CLIENT.get_or_try_init(|| {
        Client::builder()
            .user_agent(user_agent.to_string())
            .build()
    })
}
