//! Episode metadata from download-log URLs
//!
//! Pure pattern matching over the naming conventions used for uploaded
//! episode files over the years:
//! - `042@Episode_Title.mp3` (numeric code before `@`)
//! - `hpcpodcast_20210315_title.mp3` (exact day)
//! - `mktg_podcast_2021-03_title.mp3` (month only)
//! - `/wp-content/uploads/2021/03/title.mp3` (month from upload folder)
//!
//! Nothing here fails: fields that cannot be resolved are `None`.

use crate::models::{ExtractedMetadata, Feature};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Feed tags in match order; first substring hit wins
const FEATURE_TAGS: &[(&str, Feature)] = &[
    // truncated spelling used by some early uploads
    ("hpcpodcas", Feature::HpcPodcast),
    ("hpcpodcast", Feature::HpcPodcast),
    ("mktg_podcast", Feature::MktgPodcast),
    ("oxd", Feature::Oxd),
    ("hpcnb", Feature::Hpcnb),
];

/// Extensions removed from titles; anything else after a dot is title text
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "m4b", "mp4", "aac", "ogg", "oga", "opus", "wav", "flac", "wma",
];

static CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,4})[@_]").expect("valid code regex"));

static LEADING_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[-_]\d{2}(?:[^0-9]|$)").expect("valid month regex"));

static DAY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[-_]?(\d{2})[-_]?(\d{2})").expect("valid day regex")
});

static MONTH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-_](\d{2})").expect("valid month regex"));

static PATH_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d{4})/(\d{2})/").expect("valid path regex"));

static LEADING_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:\d{8}|\d{4}[-_]\d{2}(?:[-_]\d{2})?)(?:[-_@\s]+|$)|\d{1,4}[@_][-_\s]*)")
        .expect("valid leading token regex")
});

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[_\-\s]|%20)+").expect("valid separator regex"));

/// Extract all metadata fields from a URL or bare filename
pub fn extract(url_or_filename: &str) -> ExtractedMetadata {
    let filename = filename_of(url_or_filename);

    ExtractedMetadata {
        feature: extract_feature(filename),
        code: extract_code(filename),
        date: extract_date(url_or_filename),
        title: extract_title(filename),
    }
}

/// Last path segment with any query string or fragment removed
pub fn filename_of(url: &str) -> &str {
    let without_query = url
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or(url)
        .trim();

    without_query
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(without_query)
}

/// Feed tag by case-insensitive substring match against the filename
pub fn extract_feature(filename: &str) -> Option<Feature> {
    let lowered = filename.to_lowercase();
    FEATURE_TAGS
        .iter()
        .find(|(tag, _)| lowered.contains(tag))
        .map(|(_, feature)| *feature)
}

/// Short numeric prefix before `@` or `_` (`042@title.mp3` -> 42)
///
/// A leading `YYYY_MM` date is not a code.
pub fn extract_code(filename: &str) -> Option<u32> {
    if LEADING_MONTH.is_match(filename) {
        return None;
    }

    CODE_PREFIX
        .captures(filename)
        .and_then(|caps| caps[1].parse().ok())
}

/// Episode date by ordered fallback
///
/// 1. `YYYYMMDD` (or `YYYY-MM-DD`) token in the filename: exact day
/// 2. `YYYY-MM` / `YYYY_MM` token in the filename: first of month
/// 3. `/YYYY/MM/` upload folder in the path: first of month
///
/// Candidates must be real calendar dates. The first rule that yields one
/// wins; later rules are not consulted.
pub fn extract_date(url_or_filename: &str) -> Option<NaiveDate> {
    let filename = filename_of(url_or_filename);

    first_bounded_date(&DAY_TOKEN, filename, Some(3))
        .or_else(|| first_bounded_date(&MONTH_TOKEN, filename, None))
        .or_else(|| {
            PATH_MONTH
                .captures_iter(url_or_filename)
                .find_map(|caps| date_from(&caps, None))
        })
}

/// Filename without extension, leading code/date tokens, or repeated
/// separators; words joined by single spaces
pub fn extract_title(filename: &str) -> String {
    let stem = strip_extension(filename.trim());

    let mut rest = stem;
    loop {
        let trimmed = rest.trim_start_matches(|c: char| c == '_' || c == '-' || c.is_whitespace());
        match LEADING_TOKEN.find(trimmed) {
            Some(m) if m.end() > 0 => rest = &trimmed[m.end()..],
            _ => {
                rest = trimmed;
                break;
            }
        }
    }
    if rest.trim().is_empty() {
        rest = stem;
    }

    SEPARATORS.replace_all(rest, " ").trim().to_string()
}

fn strip_extension(filename: &str) -> &str {
    let mut stem = filename;
    while let Some((rest, ext)) = stem.rsplit_once('.') {
        let known = AUDIO_EXTENSIONS.iter().any(|audio| ext.eq_ignore_ascii_case(audio));
        if rest.is_empty() || !known {
            break;
        }
        stem = rest;
    }
    stem
}

/// First valid date among candidates not glued to neighbouring digits
///
/// A rejected candidate may overlap the real token (`2021_20210315`), so
/// the search resumes one character after a rejected match start.
fn first_bounded_date(re: &Regex, haystack: &str, day_group: Option<usize>) -> Option<NaiveDate> {
    let bytes = haystack.as_bytes();
    let mut start = 0;

    while let Some(caps) = re.captures_at(haystack, start) {
        let whole = caps.get(0)?;
        let digit_before = whole
            .start()
            .checked_sub(1)
            .is_some_and(|i| bytes[i].is_ascii_digit());
        let digit_after = bytes.get(whole.end()).is_some_and(|b| b.is_ascii_digit());

        if !digit_before && !digit_after {
            if let Some(date) = date_from(&caps, day_group) {
                return Some(date);
            }
        }

        let step = haystack[whole.start()..].chars().next()?.len_utf8();
        start = whole.start() + step;
    }

    None
}

fn date_from(caps: &Captures<'_>, day_group: Option<usize>) -> Option<NaiveDate> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;
    let day: u32 = match day_group {
        Some(group) => caps.get(group)?.as_str().parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_upload_folder_scenario() {
        let meta = extract("https://example.com/wp-content/uploads/2021/03/042@Episode_One.mp3");

        assert_eq!(meta.code, Some(42));
        assert_eq!(meta.date, ymd(2021, 3, 1));
        assert_eq!(meta.title, "Episode One");
        assert_eq!(meta.feature, None);
    }

    #[test]
    fn test_filename_date_beats_conflicting_folder() {
        let url = "/wp-content/uploads/2019/11/hpcpodcast_20210315_interview.mp3";
        assert_eq!(extract_date(url), ymd(2021, 3, 15));
    }

    #[test]
    fn test_month_token_beats_folder() {
        let url = "/wp-content/uploads/2019/11/mktg_podcast_2021-07_recap.mp3";
        assert_eq!(extract_date(url), ymd(2021, 7, 1));
    }

    #[test]
    fn test_separated_day_token() {
        assert_eq!(extract_date("oxd_2022-01-09_briefing.mp3"), ymd(2022, 1, 9));
        assert_eq!(extract_date("oxd_2022_01_09_briefing.mp3"), ymd(2022, 1, 9));
    }

    #[test]
    fn test_invalid_day_falls_through_to_next_rule() {
        // 2021-13-45 is not a date; the folder still resolves
        let url = "/wp-content/uploads/2021/06/show_20211345.mp3";
        assert_eq!(extract_date(url), ymd(2021, 6, 1));
    }

    #[test]
    fn test_long_digit_runs_are_not_dates() {
        assert_eq!(extract_date("track_1202103150.mp3"), None);
    }

    #[test]
    fn test_no_date_anywhere() {
        assert_eq!(extract_date("https://example.com/other/file.mp3"), None);
        assert_eq!(extract_date(""), None);
    }

    #[test]
    fn test_feature_first_match_wins() {
        assert_eq!(extract_feature("HPCpodcast_ep1.mp3"), Some(Feature::HpcPodcast));
        assert_eq!(extract_feature("hpcpodcas_ep1.mp3"), Some(Feature::HpcPodcast));
        assert_eq!(extract_feature("Mktg_Podcast_ep.mp3"), Some(Feature::MktgPodcast));
        assert_eq!(extract_feature("OXD-short.mp3"), Some(Feature::Oxd));
        assert_eq!(extract_feature("HPCNB_20200101.mp3"), Some(Feature::Hpcnb));
        // both tags present: the earlier entry in the table decides
        assert_eq!(extract_feature("oxd_hpcnb.mp3"), Some(Feature::Oxd));
        assert_eq!(extract_feature("random.mp3"), None);
    }

    #[test]
    fn test_feature_ignores_directories() {
        let meta = extract("/wp-content/uploads/oxd/2021/03/interview.mp3");
        assert_eq!(meta.feature, None);
    }

    #[test]
    fn test_code_variants() {
        assert_eq!(extract_code("042@Episode.mp3"), Some(42));
        assert_eq!(extract_code("7_Things.mp3"), Some(7));
        assert_eq!(extract_code("2021_03_recap.mp3"), None);
        assert_eq!(extract_code("20210315_recap.mp3"), None);
        assert_eq!(extract_code("Episode042@.mp3"), None);
    }

    #[test]
    fn test_title_strips_leading_tokens_and_separators() {
        assert_eq!(extract_title("042@Episode_One.mp3"), "Episode One");
        assert_eq!(extract_title("20210315_Big--News.mp3"), "Big News");
        assert_eq!(extract_title("2021-03_mktg_podcast_recap.m4a"), "mktg podcast recap");
        assert_eq!(extract_title("Deep%20Dive.mp3"), "Deep Dive");
    }

    #[test]
    fn test_title_keeps_non_audio_dots() {
        assert_eq!(extract_title("Ep.12.mp3"), "Ep.12");
        assert_eq!(extract_title("Ep.12"), "Ep.12");
        assert_eq!(extract_title("Interview.M4A"), "Interview");
    }

    #[test]
    fn test_overlapping_rejected_candidate_does_not_hide_date() {
        assert_eq!(extract_date("x_2021_20210315.mp3"), ymd(2021, 3, 15));
        let url = "/wp-content/uploads/2019/11/show_2021_2021-07_recap.mp3";
        assert_eq!(extract_date(url), ymd(2021, 7, 1));
    }

    #[test]
    fn test_title_keeps_stem_when_only_tokens() {
        assert_eq!(extract_title("20210315.mp3"), "20210315");
    }

    #[test]
    fn test_title_is_stable_under_reextraction() {
        for name in [
            "042@Episode_One.mp3",
            "hpcpodcast_20210315_a-b.mp3",
            "Ep. 5 Wrap up",
            "_20210315_leading_separator.mp3",
            "Ep.12.mp3",
            "v1.2_release_notes.MP3",
            "Recap.mp3.mp3",
        ] {
            let once = extract_title(name);
            assert_eq!(extract_title(&once), once);
            assert_eq!(extract_title(name), once);
        }
    }

    #[test]
    fn test_filename_of_drops_query_and_path() {
        assert_eq!(filename_of("https://x.org/a/b/c.mp3?utm=1#t=30"), "c.mp3");
        assert_eq!(filename_of("c.mp3"), "c.mp3");
        assert_eq!(filename_of("https://x.org/a/"), "");
    }
}
