use crate::{success, warning};

pub fn detect(url: &str) {
    match crate::detect::detect(url) {
        Some(provider) => success!("{} playlist", provider),
        None => warning!("Unsupported playlist URL: {}", url),
    }
}
