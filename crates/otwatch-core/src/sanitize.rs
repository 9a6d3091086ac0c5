//! Input sanitization and validation.
//!
//! Pure, synchronous string functions. Every sanitizer here is idempotent:
//! applying it to its own output is a no-op. That property matters because
//! values pass through multiple layers (form field, store, export) and may
//! be sanitized more than once.

/// Maximum length for general text inputs.
const INPUT_MAX: usize = 1000;
/// Maximum length for search queries.
const SEARCH_MAX: usize = 100;
/// Maximum length for filenames.
const FILENAME_MAX: usize = 255;

/// Special characters accepted by [`validate_password`].
const PASSWORD_SPECIALS: &str = "!@#$%^&*(),.?\":{}|<>";

/// The entity escapes this module emits. `escape_html` must not re-escape
/// them, or it would stop being idempotent.
const ENTITIES: &[&str] = &["amp;", "lt;", "gt;", "quot;", "#x27;", "#x2F;"];

/// Escape HTML-significant characters with standard entities.
///
/// An `&` that already begins one of our own entities is left alone, so
/// escaping twice yields the same string as escaping once.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        match c {
            '&' => {
                let tail = &rest[1..];
                if ENTITIES.iter().any(|e| tail.starts_with(e)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Strip `< > " ' &`, trim surrounding whitespace, clip to a limit.
///
/// Stripping happens before trimming so removed characters cannot expose
/// fresh edge whitespace; trimming repeats after the clip for the same
/// reason.
fn strip_and_clip(input: &str, max: usize) -> String {
    let stripped: String = input
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect();
    let trimmed = stripped.trim();
    let clipped: String = trimmed.chars().take(max).collect();
    clipped.trim().to_owned()
}

/// Sanitize a general text input: strip risky characters, trim, clip to 1000.
pub fn sanitize_input(input: &str) -> String {
    strip_and_clip(input, INPUT_MAX)
}

/// Sanitize a search query: same as [`sanitize_input`] but clipped to 100.
pub fn sanitize_search_query(query: &str) -> String {
    strip_and_clip(query, SEARCH_MAX)
}

/// Sanitize a filename: everything outside `[A-Za-z0-9._-]` becomes `_`,
/// leading/trailing dots are stripped, length clipped to 255.
pub fn sanitize_filename(filename: &str) -> String {
    let replaced: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches('.');
    let clipped: String = trimmed.chars().take(FILENAME_MAX).collect();
    clipped.trim_matches('.').to_owned()
}

/// Validate an email address: `local@domain.tld`, no whitespace, exactly
/// one `@`, at least one dot in the domain with text on both sides.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Validate a dotted-quad IPv4 address, each octet 0-255, digits only.
pub fn validate_ipv4(ip: &str) -> bool {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return false;
    }
    octets.iter().all(|o| {
        !o.is_empty()
            && o.len() <= 3
            && o.chars().all(|c| c.is_ascii_digit())
            && o.parse::<u16>().is_ok_and(|n| n <= 255)
    })
}

/// Validate a TCP/UDP port number.
pub fn validate_port(port: i64) -> bool {
    (1..=65_535).contains(&port)
}

/// Validate a MAC address: six hex pairs separated by `:` or `-`.
pub fn validate_mac(mac: &str) -> bool {
    let pairs: Vec<&str> = mac.split(|c| c == ':' || c == '-').collect();
    pairs.len() == 6
        && pairs
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Validate IPv4 CIDR notation: address `/` prefix in [0, 32].
pub fn validate_cidr(cidr: &str) -> bool {
    let Some((addr, prefix)) = cidr.split_once('/') else {
        return false;
    };
    validate_ipv4(addr)
        && !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_digit())
        && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
}

/// Validate password strength: at least 8 characters with an uppercase
/// letter, a lowercase letter, a digit, and a special character.
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Parse a numeric input and clamp it to `[min, max]`. Parse failures
/// resolve to `min`.
pub fn clamp_numeric(value: &str, min: f64, max: f64) -> f64 {
    value.trim().parse::<f64>().map_or(min, |n| n.clamp(min, max))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn escape_html_replaces_all_specials() {
        let out = escape_html(r#"<script>alert("x&y")</script>'/"#);
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert!(!out.contains('"'));
        assert!(!out.contains('\''));
        assert_eq!(
            out,
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;&#x2F;script&gt;&#x27;&#x2F;"
        );
    }

    #[test]
    fn escape_html_leaves_no_raw_ampersand() {
        let out = escape_html("a & b && c");
        for (i, _) in out.match_indices('&') {
            let tail = &out[i + 1..];
            assert!(
                ENTITIES.iter().any(|e| tail.starts_with(e)),
                "raw & at {i} in {out:?}"
            );
        }
    }

    #[test]
    fn sanitizers_are_idempotent() {
        let long = "x".repeat(2000);
        let nasty = [
            "  <b>hello & goodbye</b>  ",
            long.as_str(),
            "..weird  name?.pcap..",
            "plain",
            "",
            "< a >",
            "&amp;&lt;",
        ];
        for s in nasty {
            let once = escape_html(s);
            assert_eq!(escape_html(&once), once, "escape_html on {s:?}");

            let once = sanitize_input(s);
            assert_eq!(sanitize_input(&once), once, "sanitize_input on {s:?}");

            let once = sanitize_search_query(s);
            assert_eq!(
                sanitize_search_query(&once),
                once,
                "sanitize_search_query on {s:?}"
            );

            let once = sanitize_filename(s);
            assert_eq!(sanitize_filename(&once), once, "sanitize_filename on {s:?}");
        }
    }

    #[test]
    fn sanitize_input_strips_and_clips() {
        assert_eq!(sanitize_input("  <b>hi</b> & bye  "), "bhi/b  bye");
        let long = "a".repeat(1500);
        assert_eq!(sanitize_input(&long).len(), 1000);
    }

    #[test]
    fn sanitize_search_clips_to_100() {
        let long = "q".repeat(300);
        assert_eq!(sanitize_search_query(&long).len(), 100);
    }

    #[test]
    fn sanitize_filename_rules() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("my capture (1).pcap"), "my_capture__1_.pcap");
        assert_eq!(sanitize_filename("...dots..."), "dots");
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("ops@plant.example.com"));
        assert!(validate_email("a@b.c"));
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("two@@signs.com"));
        assert!(!validate_email("spaces in@mail.com"));
        assert!(!validate_email("nodot@domain"));
        assert!(!validate_email("@missing.local"));
        assert!(!validate_email("a@.com"));
    }

    #[test]
    fn ipv4_validation() {
        assert!(validate_ipv4("192.168.1.1"));
        assert!(validate_ipv4("0.0.0.0"));
        assert!(validate_ipv4("255.255.255.255"));
        assert!(!validate_ipv4("999.1.1.1"));
        assert!(!validate_ipv4("1.2.3"));
        assert!(!validate_ipv4("1.2.3.4.5"));
        assert!(!validate_ipv4("a.b.c.d"));
        assert!(!validate_ipv4("1.2.3.-4"));
    }

    #[test]
    fn port_validation() {
        assert!(validate_port(1));
        assert!(validate_port(502));
        assert!(validate_port(65_535));
        assert!(!validate_port(0));
        assert!(!validate_port(65_536));
        assert!(!validate_port(-1));
    }

    #[test]
    fn mac_validation() {
        assert!(validate_mac("00:1a:2b:3c:4d:5e"));
        assert!(validate_mac("00-1A-2B-3C-4D-5E"));
        assert!(!validate_mac("00:1a:2b:3c:4d"));
        assert!(!validate_mac("00:1a:2b:3c:4d:zz"));
        assert!(!validate_mac("001a2b3c4d5e"));
    }

    #[test]
    fn cidr_validation() {
        assert!(validate_cidr("10.0.0.0/8"));
        assert!(validate_cidr("192.168.1.0/24"));
        assert!(validate_cidr("0.0.0.0/0"));
        assert!(!validate_cidr("10.0.0.0/33"));
        assert!(!validate_cidr("10.0.0.0"));
        assert!(!validate_cidr("999.0.0.0/8"));
        assert!(!validate_cidr("10.0.0.0/"));
    }

    #[test]
    fn password_strength_iff_all_classes_present() {
        assert!(validate_password("SecureAdmin2024!"));
        assert!(validate_password("Aa1!aaaa"));
        assert!(!validate_password("Aa1!aaa")); // 7 chars
        assert!(!validate_password("aa1!aaaa")); // no upper
        assert!(!validate_password("AA1!AAAA")); // no lower
        assert!(!validate_password("Aaa!aaaa")); // no digit
        assert!(!validate_password("Aa1aaaaa")); // no special
    }

    #[test]
    fn clamp_numeric_bounds_and_fallback() {
        assert_eq!(clamp_numeric("5", 0.0, 10.0), 5.0);
        assert_eq!(clamp_numeric("-3", 0.0, 10.0), 0.0);
        assert_eq!(clamp_numeric("42", 0.0, 10.0), 10.0);
        assert_eq!(clamp_numeric("not a number", 2.5, 10.0), 2.5);
        assert_eq!(clamp_numeric(" 7.5 ", 0.0, 10.0), 7.5);
    }
}
