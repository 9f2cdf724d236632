use crate::errors::{AppError, AppResult};
use url::Url;

const DASHED_ID_LEN: usize = 36;
const UNDASHED_ID_LEN: usize = 32;
const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Result of canonicalising a page or block id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Canonicalized {
    /// Input was already in dashed form and is returned as is.
    Unchanged(String),
    /// Input was rewritten into dashed form.
    Dashed(String),
    /// Input could not be canonicalised and is passed through untouched.
    Malformed(String),
}

impl Canonicalized {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unchanged(value) | Self::Dashed(value) | Self::Malformed(value) => value,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Unchanged(value) | Self::Dashed(value) | Self::Malformed(value) => value,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Structural check only: a 36 character string with any dash passes, even
/// when the dashes are misplaced.
pub fn is_dashed_id(value: &str) -> bool {
    value.len() == DASHED_ID_LEN && value.contains('-')
}

pub fn canonicalize(value: &str) -> Canonicalized {
    if is_dashed_id(value) {
        return Canonicalized::Unchanged(value.to_string());
    }

    let stripped = strip_dashes(value);
    if stripped.len() != UNDASHED_ID_LEN || !stripped.is_ascii() {
        return Canonicalized::Malformed(value.to_string());
    }

    let mut dashed = String::with_capacity(DASHED_ID_LEN);
    let mut start = 0;
    for (index, len) in GROUPS.iter().enumerate() {
        if index > 0 {
            dashed.push('-');
        }
        dashed.push_str(&stripped[start..start + len]);
        start += len;
    }
    Canonicalized::Dashed(dashed)
}

/// Dashed form of `value`, or `value` itself when it cannot be canonicalised.
pub fn to_dashed_id(value: &str) -> String {
    canonicalize(value).into_string()
}

pub fn strip_dashes(value: &str) -> String {
    value.replace('-', "")
}

/// Extracts the page id from a shareable page link such as
/// `https://www.notion.so/team/Reading-list-4044898e951546df9fadbbba4d98c10f?v=...`.
pub fn page_id_from_locator(locator: &str) -> AppResult<String> {
    let path = match Url::parse(locator) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => locator
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    let token = last_segment.rsplit('-').next().unwrap_or_default();
    if token.len() == UNDASHED_ID_LEN {
        Ok(to_dashed_id(token))
    } else {
        Err(AppError::InvalidLocator(locator.to_string()))
    }
}

/// Builds a page link under `base_url` for the given id.
pub fn locator_for_id(base_url: &str, id: &str) -> String {
    let mut locator = base_url.to_string();
    if !locator.ends_with('/') {
        locator.push('/');
    }
    locator.push_str(&strip_dashes(id));
    locator
}

#[cfg(test)]
mod tests {
    use super::{canonicalize, is_dashed_id, locator_for_id, page_id_from_locator, strip_dashes, to_dashed_id, Canonicalized};
    use crate::errors::AppError;
    use proptest::prelude::*;

    const UNDASHED: &str = "80f1b4ba615949faa9625bc42c5fb531";
    const DASHED: &str = "80f1b4ba-6159-49fa-a962-5bc42c5fb531";

    #[test]
    fn dashed_ids_are_left_alone() {
        assert_eq!(canonicalize(DASHED), Canonicalized::Unchanged(DASHED.to_string()));
        assert_eq!(to_dashed_id(DASHED), DASHED);
    }

    #[test]
    fn misplaced_dashes_still_count_as_canonical() {
        let odd = "80f1b4ba615949faa9625bc42c5fb53-1234";
        assert_eq!(odd.len(), 36);
        assert!(is_dashed_id(odd));
        assert_eq!(to_dashed_id(odd), odd);
    }

    #[test]
    fn undashed_ids_round_trip() {
        let dashed = to_dashed_id(UNDASHED);
        assert_eq!(dashed, DASHED);
        assert_eq!(strip_dashes(&dashed), UNDASHED);

        let other = "0131e73ca2b147cc802692d60fd4a56d";
        assert_eq!(strip_dashes(&to_dashed_id(other)), other);
    }

    #[test]
    fn partially_dashed_ids_are_regrouped() {
        assert_eq!(to_dashed_id("80f1b4ba-615949faa9625bc42c5fb531"), DASHED);
    }

    #[test]
    fn malformed_ids_pass_through() {
        let result = canonicalize("abc123");
        assert!(result.is_malformed());
        assert_eq!(result.as_str(), "abc123");
        assert_eq!(to_dashed_id("abc-123"), "abc-123");
    }

    #[test]
    fn extracts_id_from_view_link() {
        let locator = format!("https://www.notion.so/kekefam/{}?v=c1d00e9c432347c189b0055c24722312", UNDASHED);
        assert_eq!(page_id_from_locator(&locator).expect("page id"), DASHED);
    }

    #[test]
    fn extracts_id_after_title_slug() {
        let locator = format!("https://www.notion.so/kekefam/Reading-List-{}", UNDASHED);
        assert_eq!(page_id_from_locator(&locator).expect("page id"), DASHED);
    }

    #[test]
    fn extracts_id_from_pathless_input() {
        let locator = format!("kekefam/{}?v=1", UNDASHED);
        assert_eq!(page_id_from_locator(&locator).expect("page id"), DASHED);
    }

    #[test]
    fn rejects_locator_without_id() {
        let locator = "https://www.notion.so/kekefam/Reading-List-1234";
        let error = page_id_from_locator(locator).expect_err("no id");
        assert!(matches!(error, AppError::InvalidLocator(ref value) if value == locator));
        assert!(error.to_string().contains(locator));
    }

    #[test]
    fn dashed_tail_token_is_rejected() {
        let locator = format!("https://www.notion.so/kekefam/{}", DASHED);
        assert!(page_id_from_locator(&locator).is_err());
    }

    proptest! {
        #[test]
        fn prop_undashed_ids_regroup_and_round_trip(id in "[0-9a-f]{32}") {
            let dashed = to_dashed_id(&id);
            prop_assert_eq!(dashed.len(), 36);
            prop_assert!(is_dashed_id(&dashed));
            prop_assert_eq!(dashed.matches('-').count(), 4);
            prop_assert_eq!(strip_dashes(&dashed), id);
            prop_assert_eq!(to_dashed_id(&dashed), dashed.clone());
        }

        #[test]
        fn prop_dashed_ids_are_returned_unchanged(head in "[0-9a-zA-Z]{0,35}", dash_at in 0usize..36) {
            let mut value = format!("{:0<35}", head);
            value.insert(dash_at.min(value.len()), '-');
            prop_assert_eq!(canonicalize(&value), Canonicalized::Unchanged(value.clone()));
        }

        #[test]
        fn prop_locators_with_32_char_tail_resolve(slug in "[A-Za-z]{1,12}", id in "[0-9a-f]{32}", view in "[0-9a-f]{32}") {
            let locator = format!("https://www.notion.so/team/{}-{}?v={}", slug, id, view);
            prop_assert_eq!(page_id_from_locator(&locator).expect("page id"), to_dashed_id(&id));
        }

        #[test]
        fn prop_locators_without_32_char_tail_are_rejected(
            token in "[0-9a-f]{1,64}".prop_filter("not an id", |token| token.len() != 32)
        ) {
            let locator = format!("https://www.notion.so/team/{}", token);
            let is_invalid = matches!(page_id_from_locator(&locator), Err(AppError::InvalidLocator(_)));
            prop_assert!(is_invalid);
        }
    }

    #[test]
    fn builds_link_from_dashed_id() {
        assert_eq!(
            locator_for_id("https://www.notion.so/kekefam", DASHED),
            format!("https://www.notion.so/kekefam/{}", UNDASHED)
        );
    }
}
