//! Code block extraction from model responses.
//!
//! A response carries its code in one of two shapes:
//!
//! - between the literal `###CODE_START###` and `###CODE_END###` markers that the
//!   system instruction asks for, or
//! - inside a markdown fence (three backticks, optional language tag).
//!
//! [`extract_code`] returns the first block only, while [`strip_code_blocks`]
//! removes every block. A response with two blocks therefore shows prose with
//! both removed but loads only the first one into the editor.

use regex::Regex;
use std::sync::LazyLock;

/// Marker opening a delimited code region.
pub const CODE_START: &str = "###CODE_START###";
/// Marker closing a delimited code region.
pub const CODE_END: &str = "###CODE_END###";

static DELIMITED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)###CODE_START###(.*?)###CODE_END###").expect("Invalid delimiter regex")
});

/// Opening fence, optional language tag on the same line, body, closing fence.
static FENCED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([\w+#.-]*)[ \t]*\r?\n(.*?)```").expect("Invalid fence regex")
});

/// Extract the code embedded in a model response.
///
/// Delimited regions win over fenced blocks. Returns an empty string when the
/// response holds neither.
pub fn extract_code(response: &str) -> String {
    extract_code_with_language(response).0
}

/// Extract the code together with the language tag of the block it came from.
///
/// Delimited regions carry no tag, so the language is `None` for them even when
/// a tagged fence appears further down the response. A region whose raw capture
/// is empty counts as missing; one holding only whitespace is found and yields
/// an empty string.
pub fn extract_code_with_language(response: &str) -> (String, Option<String>) {
    if let Some(body) = DELIMITED_PATTERN
        .captures(response)
        .and_then(|caps| caps.get(1))
        .filter(|m| !m.as_str().is_empty())
    {
        return (body.as_str().trim().to_string(), None);
    }

    let Some(caps) = FENCED_PATTERN.captures(response) else {
        return (String::new(), None);
    };
    let code = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    (code, caps.get(1).and_then(|m| language_tag(m.as_str())))
}

/// Remove every delimited region and every fenced block, returning the prose.
pub fn strip_code_blocks(response: &str) -> String {
    let without_delimited = DELIMITED_PATTERN.replace_all(response, "");
    FENCED_PATTERN
        .replace_all(&without_delimited, "")
        .trim()
        .to_string()
}

/// Language tag of the first fenced block, if it carries one.
pub fn fence_language(response: &str) -> Option<String> {
    FENCED_PATTERN
        .captures(response)
        .and_then(|caps| caps.get(1))
        .and_then(|m| language_tag(m.as_str()))
}

fn language_tag(tag: &str) -> Option<String> {
    (!tag.is_empty()).then(|| tag.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // extract_code
    // =========================================================================

    #[test]
    fn extracts_delimited_region_trimmed() {
        let response = "Here you go:\n\n###CODE_START###\n  print('hi')\n\n###CODE_END###\n\nEnjoy.";
        assert_eq!(extract_code(response), "print('hi')");
    }

    #[test]
    fn extracts_delimited_region_on_one_line() {
        let response = "prose ###CODE_START### x = 1 ###CODE_END### more prose";
        assert_eq!(extract_code(response), "x = 1");
    }

    #[test]
    fn extracts_fenced_block_with_language_tag() {
        let response = "Try this:\n```python\nimport requests\nrequests.get(url)\n```\nDone.";
        assert_eq!(extract_code(response), "import requests\nrequests.get(url)");
    }

    #[test]
    fn extracts_fenced_block_without_language_tag() {
        let response = "```\n  echo = 1\n```";
        assert_eq!(extract_code(response), "echo = 1");
    }

    #[test]
    fn extracts_fenced_block_with_other_language_tag() {
        let response = "```rust\nfn main() {}\n```";
        assert_eq!(extract_code(response), "fn main() {}");
    }

    #[test]
    fn delimiters_win_over_fences() {
        let response = "```python\nfenced()\n```\n###CODE_START###\ndelimited()\n###CODE_END###";
        assert_eq!(extract_code(response), "delimited()");
    }

    #[test]
    fn only_first_delimited_region_is_used() {
        let response = "###CODE_START###first()###CODE_END### and ###CODE_START###second()###CODE_END###";
        assert_eq!(extract_code(response), "first()");
    }

    #[test]
    fn only_first_fenced_block_is_used() {
        let response = "```\none()\n```\ntext\n```\ntwo()\n```";
        assert_eq!(extract_code(response), "one()");
    }

    #[test]
    fn returns_empty_without_any_block() {
        assert_eq!(extract_code("Just an explanation, no code."), "");
        assert_eq!(extract_code(""), "");
    }

    #[test]
    fn unterminated_markers_are_not_blocks() {
        assert_eq!(extract_code("###CODE_START### print(1)"), "");
        assert_eq!(extract_code("```python\nprint(1)"), "");
    }

    #[test]
    fn whitespace_delimited_region_is_found_but_empty() {
        let response = "###CODE_START###   ###CODE_END###\n```\nreal()\n```";
        assert_eq!(extract_code(response), "");
    }

    #[test]
    fn empty_delimited_region_falls_through_to_fence() {
        let response = "###CODE_START######CODE_END###\n```\nreal()\n```";
        assert_eq!(extract_code(response), "real()");
    }

    #[test]
    fn extracted_code_is_substring_of_response() {
        let response = "Intro\n###CODE_START###\ndef f():\n    return 42\n###CODE_END###\nOutro";
        let code = extract_code(response);
        assert!(response.contains(&code));
    }

    #[test]
    fn download_script_scenario() {
        let response = "Here's a script that downloads a file:\n\n```python\nimport requests\n\ndef download(url, dest):\n    r = requests.get(url)\n    with open(dest, 'wb') as f:\n        f.write(r.content)\n```\n\nCall download() with a URL.";
        assert_eq!(
            extract_code(response),
            "import requests\n\ndef download(url, dest):\n    r = requests.get(url)\n    with open(dest, 'wb') as f:\n        f.write(r.content)"
        );
    }

    // =========================================================================
    // strip_code_blocks
    // =========================================================================

    #[test]
    fn strip_removes_every_block() {
        let response = "A\n###CODE_START###x###CODE_END###\nB\n```python\ny\n```\nC\n```\nz\n```";
        let prose = strip_code_blocks(response);
        assert!(!prose.contains(CODE_START));
        assert!(!prose.contains(CODE_END));
        assert!(!prose.contains("```"));
        assert!(prose.starts_with('A'));
        assert!(prose.ends_with('C'));
    }

    #[test]
    fn strip_and_extract_are_independent_views() {
        let response = "Two blocks:\n###CODE_START###one()###CODE_END###\n###CODE_START###two()###CODE_END###";
        assert_eq!(extract_code(response), "one()");
        assert_eq!(strip_code_blocks(response), "Two blocks:");
    }

    #[test]
    fn strip_leaves_plain_prose_trimmed() {
        assert_eq!(strip_code_blocks("  nothing to strip \n"), "nothing to strip");
    }

    // =========================================================================
    // fence_language
    // =========================================================================

    #[test]
    fn fence_language_reads_tag() {
        assert_eq!(fence_language("```Python\nx\n```"), Some("python".to_string()));
    }

    #[test]
    fn fence_language_none_without_tag() {
        assert_eq!(fence_language("```\nx\n```"), None);
        assert_eq!(fence_language("no fences"), None);
    }

    // =========================================================================
    // extract_code_with_language
    // =========================================================================

    #[test]
    fn delimited_code_has_no_language_despite_later_fence() {
        let response = "###CODE_START###\nprint('hi')\n###CODE_END###\nInstall first:\n```bash\npip install requests\n```";
        assert_eq!(
            extract_code_with_language(response),
            ("print('hi')".to_string(), None)
        );
        assert_eq!(fence_language(response), Some("bash".to_string()));
    }

    #[test]
    fn fenced_code_carries_its_tag() {
        let response = "```Rust\nfn main() {}\n```\n```python\nx = 1\n```";
        assert_eq!(
            extract_code_with_language(response),
            ("fn main() {}".to_string(), Some("rust".to_string()))
        );
    }

    #[test]
    fn no_block_yields_nothing() {
        assert_eq!(extract_code_with_language("plain prose"), (String::new(), None));
    }
}
