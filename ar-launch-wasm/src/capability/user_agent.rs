//! User-agent parsing for platform and browser heuristics.

use crate::types::{Browser, Platform};

pub fn detect_platform(user_agent: &str, max_touch_points: u32) -> Platform {
    let ua = user_agent.to_lowercase();

    if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
        return Platform::Ios;
    }

    // iPadOS requests desktop sites with a Macintosh user agent.
    if ua.contains("macintosh") && max_touch_points > 1 {
        return Platform::Ios;
    }

    if ua.contains("android") {
        return Platform::Android;
    }

    Platform::Desktop
}

pub fn detect_browser(user_agent: &str) -> Browser {
    let ua = user_agent.to_lowercase();

    // Chromium derivatives that should not inherit Chrome's heuristics.
    if ua.contains("opr/") || ua.contains("samsungbrowser/") {
        return Browser::Unknown;
    }

    if ua.contains("edg/") || ua.contains("edge/") || ua.contains("edga/") || ua.contains("edgios/")
    {
        return Browser::Edge;
    }

    if ua.contains("firefox/") || ua.contains("fxios/") {
        return Browser::Firefox;
    }

    if ua.contains("crios/") || ua.contains("chrome/") || ua.contains("chromium/") {
        return Browser::Chrome;
    }

    if ua.contains("safari/") {
        return Browser::Safari;
    }

    Browser::Unknown
}

/// Major iOS version from `CPU iPhone OS 16_4 like Mac OS X`, falling back to
/// Safari's `Version/16.4` for iPadOS desktop user agents.
pub fn ios_major_version(user_agent: &str) -> Option<u32> {
    user_agent
        .match_indices("OS ")
        .find_map(|(idx, marker)| leading_number(&user_agent[idx + marker.len()..]))
        .or_else(|| version_after(user_agent, "Version/"))
}

pub fn chrome_major_version(user_agent: &str) -> Option<u32> {
    version_after(user_agent, "Chrome/").or_else(|| version_after(user_agent, "CriOS/"))
}

fn version_after(user_agent: &str, marker: &str) -> Option<u32> {
    let idx = user_agent.find(marker)?;
    leading_number(&user_agent[idx + marker.len()..])
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
