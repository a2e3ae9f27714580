//! Built-in string format checks registered with every compiled validator
//! Each function takes the already-typed string value and returns
//! whether it satisfies the named format; these are the predicates the
//! schema compiler hands to `jsonschema`'s custom format registration.

use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($pattern).expect("static regex is valid"));
    };
}

lazy_regex!(EMAIL_RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$");
lazy_regex!(
    UUID_RE,
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
);
lazy_regex!(CUID_RE, r"^c[a-z0-9]{24}$");
lazy_regex!(CUID2_RE, r"^[a-z][a-z0-9]{7,31}$");
lazy_regex!(ULID_RE, r"^[0-7][0-9A-HJKMNP-TV-Za-hjkmnp-tv-z]{25}$");
lazy_regex!(NANOID_RE, r"^[A-Za-z0-9_-]{21}$");
lazy_regex!(HOSTNAME_RE, r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)*[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$");
lazy_regex!(DATE_RE, r"^\d{4}-\d{2}-\d{2}$");
lazy_regex!(TIME_RE, r"^\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$");
lazy_regex!(DATE_TIME_RE, r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$");
lazy_regex!(DURATION_RE, r"^P(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+S)?)?$");
lazy_regex!(PHONE_RE, r"^\+?[0-9][0-9\-\s()]{6,18}[0-9]$");
lazy_regex!(BASE64_RE, r"^[A-Za-z0-9+/]*={0,2}$");
lazy_regex!(BASE64URL_RE, r"^[A-Za-z0-9_-]*$");
lazy_regex!(JWT_RE, r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$");
lazy_regex!(HEX_COLOR_RE, r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$");
lazy_regex!(RGB_COLOR_RE, r"^rgb\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*\)$");
lazy_regex!(SLUG_RE, r"^[a-z0-9]+(?:-[a-z0-9]+)*$");
lazy_regex!(SEMVER_RE, r"^\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$");

pub fn email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

pub fn uuid(s: &str) -> bool {
    UUID_RE.is_match(s)
}

pub fn cuid(s: &str) -> bool {
    CUID_RE.is_match(s)
}

pub fn cuid2(s: &str) -> bool {
    CUID2_RE.is_match(s)
}

pub fn ulid(s: &str) -> bool {
    ULID_RE.is_match(s)
}

pub fn nanoid(s: &str) -> bool {
    NANOID_RE.is_match(s)
}

pub fn url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

pub fn ipv4(s: &str) -> bool {
    s.parse::<std::net::Ipv4Addr>().is_ok()
}

pub fn ipv6(s: &str) -> bool {
    s.parse::<std::net::Ipv6Addr>().is_ok()
}

pub fn cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix.parse::<u8>() else {
        return false;
    };
    if let Ok(_v4) = addr.parse::<std::net::Ipv4Addr>() {
        return prefix_len <= 32;
    }
    if let Ok(_v6) = addr.parse::<std::net::Ipv6Addr>() {
        return prefix_len <= 128;
    }
    false
}

pub fn hostname(s: &str) -> bool {
    s.len() <= 253 && HOSTNAME_RE.is_match(s)
}

pub fn date(s: &str) -> bool {
    DATE_RE.is_match(s)
}

pub fn time(s: &str) -> bool {
    TIME_RE.is_match(s)
}

pub fn date_time(s: &str) -> bool {
    DATE_TIME_RE.is_match(s)
}

pub fn duration(s: &str) -> bool {
    s != "P" && DURATION_RE.is_match(s)
}

pub fn phone(s: &str) -> bool {
    PHONE_RE.is_match(s)
}

pub fn base64(s: &str) -> bool {
    !s.is_empty() && s.len() % 4 == 0 && BASE64_RE.is_match(s)
}

pub fn base64url(s: &str) -> bool {
    !s.is_empty() && BASE64URL_RE.is_match(s)
}

pub fn jwt(s: &str) -> bool {
    JWT_RE.is_match(s)
}

pub fn hex_color(s: &str) -> bool {
    HEX_COLOR_RE.is_match(s)
}

pub fn rgb_color(s: &str) -> bool {
    RGB_COLOR_RE.is_match(s)
}

pub fn slug(s: &str) -> bool {
    SLUG_RE.is_match(s)
}

pub fn semver(s: &str) -> bool {
    SEMVER_RE.is_match(s)
}

/// Luhn checksum over the digits of `s`, ignoring spaces and dashes.
pub fn credit_card(s: &str) -> bool {
    let digits: Vec<u32> = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    if digits.len() < 12 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// The full set of built-in formats, as `(name, predicate)` pairs, for
/// registration with the schema compiler.
pub fn all() -> Vec<(&'static str, fn(&str) -> bool)> {
    vec![
        ("email", email),
        ("uuid", uuid),
        ("cuid", cuid),
        ("cuid2", cuid2),
        ("ulid", ulid),
        ("nanoid", nanoid),
        ("url", url),
        ("ipv4", ipv4),
        ("ipv6", ipv6),
        ("cidr", cidr),
        ("hostname", hostname),
        ("date", date),
        ("time", time),
        ("date-time", date_time),
        ("duration", duration),
        ("phone", phone),
        ("base64", base64),
        ("base64url", base64url),
        ("jwt", jwt),
        ("hex-color", hex_color),
        ("rgb-color", rgb_color),
        ("slug", slug),
        ("semver", semver),
        ("credit-card", credit_card),
    ]
}
