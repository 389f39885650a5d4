use url::Url;
use crate::core::error::MeasureError;

/// 只接受可以直接 GET 的 http/https 地址
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

pub fn validate_urls(urls: &[String]) -> Result<(), MeasureError> {
    if urls.is_empty() {
        return Err(MeasureError::InvalidUrl("URL列表不能为空".to_string()));
    }
    if let Some(bad) = urls.iter().find(|url| !is_valid_url(url)) {
        return Err(MeasureError::InvalidUrl(bad.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://127.0.0.1:8080/speedtest?range=0-100"));
        assert!(!is_valid_url("ftp://example.com/file"));
        assert!(!is_valid_url("invalid-url"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_urls_validation() {
        let valid_urls = vec![
            "https://example.com".to_string(),
            "http://example.com".to_string(),
        ];
        assert!(validate_urls(&valid_urls).is_ok());

        let invalid_urls = vec![
            "https://example.com".to_string(),
            "invalid-url".to_string(),
        ];
        match validate_urls(&invalid_urls) {
            Err(MeasureError::InvalidUrl(url)) => assert_eq!(url, "invalid-url"),
            other => panic!("unexpected: {:?}", other),
        }

        assert!(validate_urls(&[]).is_err());
    }
}
