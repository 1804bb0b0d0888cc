//! # URL 预校验
//!
//! 纯函数：只判断字符串能否解析为 URL 且协议是 `http`/`https`，
//! 不保证资源存在，也不保证内容是图片。

use reqwest::Url;

/// 输入框提交前的校验失败原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UrlInputError {
    #[error("请输入图片 URL")]
    Empty,

    #[error("请输入有效的 URL（以 http:// 或 https:// 开头）")]
    InvalidUrl,
}

/// 当且仅当输入是协议为 `http` 或 `https` 的合法 URL 时返回 `true`。
///
/// # 示例
/// ```rust
/// use image_blob_url::blob_handler::is_valid_url;
///
/// assert!(is_valid_url("http://example.com/a.png"));
/// assert!(!is_valid_url("ftp://x"));
/// assert!(!is_valid_url("not a url"));
/// ```
pub fn is_valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

/// 给调用方用的校验：区分“没填”和“填得不对”。
///
/// 校验的是原始输入，空白只用于判断是否为空。
pub fn validate_url_input(input: &str) -> Result<&str, UrlInputError> {
    if input.trim().is_empty() {
        return Err(UrlInputError::Empty);
    }
    if !is_valid_url(input) {
        return Err(UrlInputError::InvalidUrl);
    }

    Ok(input)
}
