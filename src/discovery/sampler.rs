//! Bounded, diverse URL sampling.
//!
//! The sample always starts with the homepage, then takes one URL per
//! first-path-segment bucket to spread coverage across site sections, and
//! finally fills remaining capacity in discovery order. No randomness:
//! identical input always produces an identical sample.

/// Pick at most `max_pages` URLs from the discovered list.
pub fn pick_sample(urls: &[String], homepage: &str, max_pages: usize) -> Vec<String> {
    let mut filtered: Vec<&String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for url in urls {
        if (url.starts_with("http://") || url.starts_with("https://")) && seen.insert(url.as_str())
        {
            filtered.push(url);
        }
    }

    let mut sample: Vec<String> = Vec::new();
    let mut sampled = std::collections::HashSet::new();
    if !homepage.is_empty() {
        sample.push(homepage.to_string());
        sampled.insert(homepage.to_string());
    }

    // One representative per bucket, buckets in first-seen order.
    let mut bucket_order: Vec<String> = Vec::new();
    let mut bucket_first: std::collections::HashMap<String, &String> =
        std::collections::HashMap::new();
    for url in &filtered {
        let bucket = path_bucket(url);
        if !bucket_first.contains_key(&bucket) {
            bucket_order.push(bucket.clone());
            bucket_first.insert(bucket, url);
        }
    }

    for bucket in &bucket_order {
        if sample.len() >= max_pages {
            break;
        }
        if let Some(url) = bucket_first.get(bucket) {
            if sampled.insert((*url).clone()) {
                sample.push((*url).clone());
            }
        }
    }

    // Fill remaining capacity in discovery order.
    for url in &filtered {
        if sample.len() >= max_pages {
            break;
        }
        if sampled.insert((*url).clone()) {
            sample.push((*url).clone());
        }
    }

    sample.truncate(max_pages);
    sample
}

/// First path segment of a URL, or `_root` for the bare host.
fn path_bucket(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return "_root".to_string();
    };
    let path = parsed.path().trim_matches('/');
    if path.is_empty() {
        "_root".to_string()
    } else {
        path.split('/').next().unwrap_or("_root").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn homepage_is_always_first() {
        let discovered = urls(&["https://example.com/blog/a", "https://example.com/shop/b"]);
        let sample = pick_sample(&discovered, "https://example.com", 40);
        assert_eq!(sample[0], "https://example.com");
    }

    #[test]
    fn one_per_bucket_before_filling() {
        let discovered = urls(&[
            "https://example.com/blog/a",
            "https://example.com/blog/b",
            "https://example.com/blog/c",
            "https://example.com/shop/x",
            "https://example.com/docs/y",
        ]);
        let sample = pick_sample(&discovered, "https://example.com", 4);
        assert_eq!(
            sample,
            urls(&[
                "https://example.com",
                "https://example.com/blog/a",
                "https://example.com/shop/x",
                "https://example.com/docs/y",
            ])
        );
    }

    #[test]
    fn fills_remaining_capacity_in_discovery_order() {
        let discovered = urls(&[
            "https://example.com/blog/a",
            "https://example.com/blog/b",
            "https://example.com/shop/x",
        ]);
        let sample = pick_sample(&discovered, "https://example.com", 40);
        assert_eq!(
            sample,
            urls(&[
                "https://example.com",
                "https://example.com/blog/a",
                "https://example.com/shop/x",
                "https://example.com/blog/b",
            ])
        );
    }

    #[test]
    fn never_exceeds_max_pages() {
        let discovered: Vec<String> =
            (0..100).map(|i| format!("https://example.com/s{i}/page")).collect();
        let sample = pick_sample(&discovered, "https://example.com", 40);
        assert_eq!(sample.len(), 40);
    }

    #[test]
    fn deterministic_across_calls() {
        let discovered = urls(&[
            "https://example.com/a/1",
            "https://example.com/b/2",
            "https://example.com/a/3",
            "https://example.com/c/4",
        ]);
        let first = pick_sample(&discovered, "https://example.com", 3);
        let second = pick_sample(&discovered, "https://example.com", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn non_http_urls_are_ignored() {
        let discovered = urls(&["ftp://example.com/file", "https://example.com/ok"]);
        let sample = pick_sample(&discovered, "https://example.com", 40);
        assert_eq!(
            sample,
            urls(&["https://example.com", "https://example.com/ok"])
        );
    }
}
