//! Attribute validators
//!
//! Each validator checks a single [`Value`] and returns a message on failure.
//! Null values are left to the schema's required check and always pass.

use crate::value::Value;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

type Check = Result<(), String>;

static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?\.)*[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.?$")
        .expect("valid regex")
});

static INSTANCE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+\.[a-zA-Z0-9-]+$").expect("valid regex"));

fn text(value: &Value) -> Result<Option<&str>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(format!("expected a string, got {}", other.type_name())),
    }
}

pub fn port(value: &Value) -> Check {
    match value {
        Value::Null => Ok(()),
        v => match v.as_int() {
            Some(p) if (1..=65535).contains(&p) => Ok(()),
            Some(p) => Err(format!("port {} is out of range 1-65535", p)),
            None => Err(format!("expected a port number, got {}", v.type_name())),
        },
    }
}

/// `start-end` or a single port.
pub fn port_range(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    let (start, end) = match s.split_once('-') {
        Some((a, b)) => (a, b),
        None => (s, s),
    };
    let parse = |p: &str| -> Result<i64, String> {
        p.trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid port range {:?}", s))
    };
    let (start, end) = (parse(start)?, parse(end)?);
    port(&Value::Int(start))?;
    port(&Value::Int(end))?;
    if start > end {
        return Err(format!("port range {:?} is reversed", s));
    }
    Ok(())
}

pub fn dns_name(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    if s.len() > 253 || !DNS_NAME.is_match(s) {
        return Err(format!("{:?} is not a valid DNS name", s));
    }
    Ok(())
}

pub fn uuid(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    if is_uuid(s) {
        Ok(())
    } else {
        Err(format!("{:?} is not a valid UUID", s))
    }
}

pub fn is_uuid(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok() && s.len() == 36
}

pub fn cidr(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    s.parse::<ipnet::IpNet>()
        .map(|_| ())
        .map_err(|_| format!("{:?} is not a valid CIDR block", s))
}

pub fn ip_address(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    s.parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| format!("{:?} is not a valid IP address", s))
}

pub fn ipv4_address(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    match s.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => Ok(()),
        _ => Err(format!("{:?} is not a valid IPv4 address", s)),
    }
}

/// The value must be one of `allowed`.
pub fn one_of(allowed: &'static [&'static str]) -> impl Fn(&Value) -> Check + Send + Sync {
    move |value| {
        let Some(s) = text(value)? else { return Ok(()) };
        if allowed.contains(&s) {
            Ok(())
        } else {
            Err(format!("{:?} must be one of: {}", s, allowed.join(", ")))
        }
    }
}

/// Case-insensitive variant of [`one_of`].
pub fn one_of_ignore_case(
    allowed: &'static [&'static str],
) -> impl Fn(&Value) -> Check + Send + Sync {
    move |value| {
        let Some(s) = text(value)? else { return Ok(()) };
        if allowed.iter().any(|a| a.eq_ignore_ascii_case(s)) {
            Ok(())
        } else {
            Err(format!("{:?} must be one of: {}", s, allowed.join(", ")))
        }
    }
}

pub fn ip_family(value: &Value) -> Check {
    one_of(&["inet4", "inet6"])(value)
}

pub fn hh_mm(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    crate::codec::parse_hh_mm(s)
        .map(|_| ())
        .ok_or_else(|| format!("{:?} is not a valid HH:MM time", s))
}

/// `<family>.<size>`, e.g. `standard.medium`.
pub fn instance_type(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    if INSTANCE_TYPE.is_match(s) {
        Ok(())
    } else {
        Err(format!("{:?} is not of the form <family>.<size>", s))
    }
}

pub fn int_between(min: i64, max: i64) -> impl Fn(&Value) -> Check + Send + Sync {
    move |value| match value {
        Value::Null => Ok(()),
        v => match v.as_int() {
            Some(i) if i >= min && i <= max => Ok(()),
            Some(i) => Err(format!("{} is out of range {}-{}", i, min, max)),
            None => Err(format!("expected an integer, got {}", v.type_name())),
        },
    }
}

pub fn int_at_least(min: i64) -> impl Fn(&Value) -> Check + Send + Sync {
    int_between(min, i64::MAX)
}

pub fn non_empty(value: &Value) -> Check {
    let Some(s) = text(value)? else { return Ok(()) };
    if s.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(())
    }
}
