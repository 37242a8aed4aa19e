use crate::db::website::Category;
use crate::error::ApiError;
use lazy_static::lazy_static;
use regex::Regex;
use std::net::IpAddr;
use url::{Host, Url};

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref JAVASCRIPT_SCHEME: Regex = Regex::new(r"(?i)javascript:").unwrap();
}

/// Raw submission fields as received from the client. Presence is checked
/// here rather than at deserialization so missing fields get the same
/// validation error as empty ones.
#[derive(Clone, Debug, Default)]
pub struct SubmissionInput {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Submission that passed sanitization and every validation rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidSubmission {
    pub title: String,
    pub url: String,
    pub description: String,
    pub category: Category,
}

/// Strips HTML-like tags, neutralizes `javascript:` prefixes and trims.
pub fn sanitize(input: &str) -> String {
    let without_tags = HTML_TAG.replace_all(input, "");
    JAVASCRIPT_SCHEME
        .replace_all(&without_tags, "")
        .trim()
        .to_owned()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// A URL is acceptable when it is absolute, http(s), and does not point at
/// localhost, loopback or private-network hosts.
pub fn is_public_http_url(value: &str) -> bool {
    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(_) => return false,
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => {
            // Hostnames that are really IP literals still parse as domains
            // in some inputs; reject those the same way.
            if let Ok(IpAddr::V4(addr)) = domain.parse::<IpAddr>() {
                return !addr.is_loopback() && !addr.is_private();
            }
            !domain.eq_ignore_ascii_case("localhost")
        }
        Some(Host::Ipv4(addr)) => !addr.is_loopback() && !addr.is_private(),
        Some(Host::Ipv6(addr)) => !addr.is_loopback(),
        None => false,
    }
}

/// Runs the full submission guard checks in the order the API documents:
/// required fields, sanitization, length bounds, URL policy, category.
pub fn validate_submission(input: SubmissionInput) -> Result<ValidSubmission, ApiError> {
    let (title, url, description, category) =
        match (input.title, input.url, input.description, input.category) {
            (Some(title), Some(url), Some(description), Some(category))
                if !title.is_empty()
                    && !url.is_empty()
                    && !description.is_empty()
                    && !category.is_empty() =>
            {
                (title, url, description, category)
            }
            _ => return Err(ApiError::Validation("All fields are required")),
        };

    let title = sanitize(&title);
    let description = sanitize(&description);
    let url = url.trim().to_owned();

    if char_len(&title) < 3 || char_len(&title) > 100 {
        return Err(ApiError::Validation(
            "Title must be between 3 and 100 characters",
        ));
    }
    if char_len(&description) < 10 || char_len(&description) > 500 {
        return Err(ApiError::Validation(
            "Description must be between 10 and 500 characters",
        ));
    }
    if !is_public_http_url(&url) {
        return Err(ApiError::Validation("Please provide a valid public URL"));
    }
    let category = match Category::parse(&category) {
        Some(category) => category,
        None => return Err(ApiError::Validation("Invalid category")),
    };

    Ok(ValidSubmission {
        title,
        url,
        description,
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn input(title: &str, url: &str, description: &str, category: &str) -> SubmissionInput {
        SubmissionInput {
            title: Some(title.to_owned()),
            url: Some(url.to_owned()),
            description: Some(description.to_owned()),
            category: Some(category.to_owned()),
        }
    }

    fn valid_input() -> SubmissionInput {
        input(
            "Rust by Example",
            "https://example.com/rust",
            "A collection of runnable examples for learning Rust.",
            "education",
        )
    }

    #[test]
    fn sanitize_strips_tags_and_script_prefixes() {
        assert_snapshot!(sanitize("<b>Hello</b> world"), @"Hello world");
        assert_snapshot!(sanitize("  JavaScript:alert(1) demo  "), @"alert(1) demo");
        assert_snapshot!(sanitize("<script>x</script>plain"), @"xplain");
    }

    #[test]
    fn accepts_a_fully_valid_submission() {
        let valid = validate_submission(valid_input()).unwrap();
        assert_eq!(valid.category, Category::Education);
        assert_eq!(valid.url, "https://example.com/rust");
    }

    #[test]
    fn rejects_missing_or_empty_fields() {
        let mut missing = valid_input();
        missing.url = None;
        assert!(matches!(
            validate_submission(missing),
            Err(ApiError::Validation("All fields are required"))
        ));

        let mut empty = valid_input();
        empty.title = Some(String::new());
        assert!(matches!(
            validate_submission(empty),
            Err(ApiError::Validation("All fields are required"))
        ));
    }

    #[test]
    fn title_length_bounds_are_inclusive() {
        let check = |title: String| {
            let mut submission = valid_input();
            submission.title = Some(title);
            validate_submission(submission)
        };
        assert!(check("ab".to_owned()).is_err());
        assert!(check("abc".to_owned()).is_ok());
        assert!(check("a".repeat(100)).is_ok());
        assert!(check("a".repeat(101)).is_err());
    }

    #[test]
    fn description_length_bounds_are_inclusive() {
        let check = |description: String| {
            let mut submission = valid_input();
            submission.description = Some(description);
            validate_submission(submission)
        };
        assert!(check("a".repeat(9)).is_err());
        assert!(check("a".repeat(10)).is_ok());
        assert!(check("a".repeat(500)).is_ok());
        assert!(check("a".repeat(501)).is_err());
    }

    #[test]
    fn length_is_measured_after_sanitization() {
        let mut submission = valid_input();
        // 2 visible chars once the tags are gone.
        submission.title = Some("<b>ab</b>".to_owned());
        assert!(matches!(
            validate_submission(submission),
            Err(ApiError::Validation("Title must be between 3 and 100 characters"))
        ));
    }

    #[test]
    fn public_urls_only() {
        assert!(is_public_http_url("https://example.com"));
        assert!(is_public_http_url("http://example.com/path?q=1"));
        assert!(!is_public_http_url("ftp://example.com"));
        assert!(!is_public_http_url("example.com"));
        assert!(!is_public_http_url("https://localhost"));
        assert!(!is_public_http_url("https://localhost:3000"));
        assert!(!is_public_http_url("https://127.0.0.1"));
        assert!(!is_public_http_url("https://127.1.2.3"));
        assert!(!is_public_http_url("https://10.0.0.1"));
        assert!(!is_public_http_url("https://192.168.1.5"));
        assert!(!is_public_http_url("https://172.16.0.1"));
        assert!(!is_public_http_url("https://172.31.255.255"));
        assert!(is_public_http_url("https://172.32.0.1"));
        assert!(is_public_http_url("https://8.8.8.8"));
    }

    #[test]
    fn rejects_unknown_categories() {
        let mut submission = valid_input();
        submission.category = Some("memes".to_owned());
        assert!(matches!(
            validate_submission(submission),
            Err(ApiError::Validation("Invalid category"))
        ));
    }
}
